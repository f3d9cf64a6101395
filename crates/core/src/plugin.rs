//! Dynamic discovery of backend plugins.
//!
//! A backend plugin is a shared library named `librbh-<scheme>.so` exporting
//! a [`PluginEntry`] under the symbol `rbh_backend_plugin`. Libraries are
//! loaded once and pinned for the lifetime of the process: factories (and
//! the backends they create) point into library code, so unloading is never
//! safe.

use std::sync::Arc;

use libloading::{Library, Symbol};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::info;

use crate::backend::BackendFactory;
use crate::error::{Error, Result};

/// The symbol every backend plugin exports.
pub const PLUGIN_ENTRY_SYMBOL: &[u8] = b"rbh_backend_plugin";

/// The signature of the exported factory symbol.
pub type PluginEntry = fn() -> Arc<dyn BackendFactory>;

// Loaded libraries, kept resident until process exit.
static RESIDENT: Lazy<Mutex<Vec<Library>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// The library name serving `scheme`.
pub fn library_name(scheme: &str) -> String {
    format!("librbh-{scheme}.so")
}

/// Load the plugin serving `scheme` and return its backend factory.
///
/// # Errors
/// `backend-unavailable` when the library is missing, unloadable, or does
/// not export the entry symbol.
pub fn import(scheme: &str) -> Result<Arc<dyn BackendFactory>> {
    let name: String = library_name(scheme);

    let library = unsafe { Library::new(&name) }
        .map_err(|error| Error::BackendUnavailable(format!("{name}: {error}")))?;

    let factory: Arc<dyn BackendFactory> = {
        let entry: Symbol<PluginEntry> = unsafe { library.get(PLUGIN_ENTRY_SYMBOL) }
            .map_err(|error| Error::BackendUnavailable(format!("{name}: {error}")))?;
        entry()
    };

    info!(scheme, library = %name, "loaded backend plugin");
    RESIDENT.lock().push(library);
    Ok(factory)
}

/// Declare the plugin entry point of a backend crate built as a
/// `cdylib`/`dylib` named `librbh-<scheme>.so`.
#[macro_export]
macro_rules! declare_backend_plugin {
    ($factory:expr) => {
        #[no_mangle]
        pub extern "Rust" fn rbh_backend_plugin(
        ) -> ::std::sync::Arc<dyn $crate::BackendFactory> {
            $factory
        }
    };
}
