//! The process-wide backend registry.
//!
//! Backends are addressed by URI: `mongo:foo` names the built-in `mongo`
//! backend mirroring filesystem `foo`, while `rbh:myplugin:arg` names the
//! plugin-loaded backend `myplugin`. Built-in factories register themselves
//! at startup; unknown schemes fall back to dynamic plugin loading when the
//! `dynamic-plugins` feature is enabled.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::backend::{Backend, BackendFactory};
use crate::error::{Error, Result};
use crate::uri::{RawUri, RBH_SCHEME};

static FACTORIES: Lazy<RwLock<HashMap<String, Arc<dyn BackendFactory>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a backend factory under its scheme.
///
/// Registering a second factory for the same scheme replaces the first.
pub fn register_backend(factory: Arc<dyn BackendFactory>) {
    let scheme: String = factory.scheme().to_owned();
    debug!(scheme = %scheme, "registering backend factory");
    FACTORIES.write().insert(scheme, factory);
}

/// Look up the factory registered for `scheme`.
pub fn factory_for(scheme: &str) -> Option<Arc<dyn BackendFactory>> {
    FACTORIES.read().get(scheme).cloned()
}

/// Split a parsed URI into a backend name and an fsname.
///
/// The `rbh` scheme addresses plugins: its path is `<plugin>[:<fsname>]`.
/// Any other scheme is itself the backend name, and the path is the fsname.
fn backend_address<'a>(uri: &RawUri<'a>) -> (&'a str, &'a str) {
    if uri.scheme == RBH_SCHEME {
        match uri.path.split_once(':') {
            Some((name, fsname)) => (name, fsname),
            None => (uri.path, ""),
        }
    } else {
        (uri.scheme, uri.path)
    }
}

/// Parse `uri`, resolve its backend, and instantiate it.
///
/// # Errors
/// - `invalid-input`: the URI does not parse, or names no backend;
/// - `backend-unavailable`: no factory is registered for the scheme and no
///   plugin provides it;
/// - anything the factory itself reports.
pub fn backend_from_uri(uri: &str) -> Result<Box<dyn Backend>> {
    let raw: RawUri = RawUri::parse(uri)?;
    let (name, fsname) = backend_address(&raw);
    if name.is_empty() {
        return Err(Error::invalid_input(format!("URI names no backend: {uri:?}")));
    }

    let factory: Arc<dyn BackendFactory> = match factory_for(name) {
        Some(factory) => factory,
        None => load_plugin_factory(name)?,
    };

    debug!(backend = name, fsname, "instantiating backend");
    factory.create(fsname)
}

#[cfg(feature = "dynamic-plugins")]
fn load_plugin_factory(scheme: &str) -> Result<Arc<dyn BackendFactory>> {
    let factory: Arc<dyn BackendFactory> = crate::plugin::import(scheme)?;
    register_backend(Arc::clone(&factory));
    Ok(factory)
}

#[cfg(not(feature = "dynamic-plugins"))]
fn load_plugin_factory(scheme: &str) -> Result<Arc<dyn BackendFactory>> {
    Err(Error::BackendUnavailable(format!(
        "no backend registered for scheme `{scheme}`, and dynamic plugin loading is disabled"
    )))
}
