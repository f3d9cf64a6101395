//! End-to-end tests against the in-memory backend.
//!
//! These drive the whole stack the way a scanner and a finder would: event
//! streams in through `update`, filtered entry cursors out through
//! `filter_entries`.

use robinhood_core::{chunkify, tee, ArrayCursor, Backend, Cursor, Error};
use robinhood_memory::MemoryBackend;
use robinhood_model::{
    statx, ComparisonOperator, EntryMask, Field, Filter, FsEntry, FsEvent, Id, RegexOptions,
    Statx, StatxMask, StatxTimestamp, Value, ValueMap,
};

fn regular_statx(mtime: i64, size: u64) -> Statx {
    Statx {
        mask: StatxMask::TYPE | StatxMask::MODE | StatxMask::MTIME | StatxMask::SIZE,
        mode: statx::file_type::REGULAR | 0o644,
        mtime: StatxTimestamp::from_secs(mtime),
        size,
        ..Default::default()
    }
}

fn directory_statx() -> Statx {
    Statx {
        mask: StatxMask::TYPE | StatxMask::MODE,
        mode: statx::file_type::DIRECTORY | 0o755,
        ..Default::default()
    }
}

/// A mirror holding a root directory and one regular file `foo.c`.
fn small_mirror() -> (MemoryBackend, Id, Id) {
    let backend: MemoryBackend = MemoryBackend::new("testfs");
    let root: Id = Id::new(*b"root-ino");
    let child: Id = Id::new(*b"child-ino");

    let events: Vec<FsEvent> = vec![
        FsEvent::upsert(root.clone(), Some(directory_statx()), None, ValueMap::new()),
        FsEvent::link(root.clone(), Id::root(), ""),
        FsEvent::upsert(
            child.clone(),
            Some(regular_statx(1_700_000_001, 64)),
            None,
            ValueMap::new(),
        ),
        FsEvent::link(child.clone(), root.clone(), "foo.c"),
    ];
    let count: usize = backend.update(&mut ArrayCursor::new(events)).unwrap();
    assert_eq!(count, 4);

    (backend, root, child)
}

fn all_entries(backend: &MemoryBackend) -> Vec<FsEntry> {
    backend
        .filter_entries(&Filter::Null, EntryMask::ALL, StatxMask::ALL)
        .unwrap()
        .collect_remaining()
        .unwrap()
}

#[test]
fn test_empty_update_is_a_noop() {
    let backend: MemoryBackend = MemoryBackend::new("testfs");
    let count: usize = backend
        .update(&mut ArrayCursor::new(Vec::<FsEvent>::new()))
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(backend.entry_count(), 0);
}

#[test]
fn test_link_unlink_delete_leaves_store_empty() {
    let backend: MemoryBackend = MemoryBackend::new("testfs");
    let id: Id = Id::new(*b"X");
    let parent: Id = Id::new(*b"P1");

    let events: Vec<FsEvent> = vec![
        FsEvent::link(id.clone(), parent.clone(), "a"),
        FsEvent::unlink(id.clone(), parent, "a"),
        FsEvent::delete(id),
    ];
    let count: usize = backend.update(&mut ArrayCursor::new(events)).unwrap();

    assert_eq!(count, 3);
    assert_eq!(backend.entry_count(), 0);
    assert!(all_entries(&backend).is_empty());
}

#[test]
fn test_root_query_projects_to_requested_fields() {
    let (backend, root, _child) = small_mirror();

    let entry: FsEntry = backend
        .root(EntryMask::ID | EntryMask::PARENT_ID, StatxMask::empty())
        .unwrap();

    assert_eq!(entry.id, root);
    assert_eq!(entry.parent_id, Some(Id::root()));
    assert_eq!(entry.name, None);
    assert_eq!(entry.statx, None);
    assert_eq!(entry.ns_xattrs, None);
    assert_eq!(entry.xattrs, None);
}

#[test]
fn test_root_on_empty_store_is_no_such_entry() {
    let backend: MemoryBackend = MemoryBackend::new("testfs");
    assert_eq!(
        backend.root(EntryMask::ID, StatxMask::empty()),
        Err(Error::NoSuchEntry)
    );
}

#[test]
fn test_delete_is_idempotent() {
    let (backend, _root, child) = small_mirror();
    let before: usize = backend.entry_count();

    let once: usize = backend
        .update(&mut ArrayCursor::new(vec![FsEvent::delete(child.clone())]))
        .unwrap();
    assert_eq!(once, 1);
    let entries_after_one: Vec<FsEntry> = all_entries(&backend);

    let again: usize = backend
        .update(&mut ArrayCursor::new(vec![FsEvent::delete(child)]))
        .unwrap();
    assert_eq!(again, 1);

    assert_eq!(all_entries(&backend), entries_after_one);
    assert_eq!(backend.entry_count(), before - 1);
}

#[test]
fn test_link_then_unlink_is_inverse_on_fresh_id() {
    let (backend, root, _child) = small_mirror();
    let fresh: Id = Id::new(*b"fresh-ino");

    backend
        .update(&mut ArrayCursor::new(vec![
            FsEvent::link(fresh.clone(), root.clone(), "n"),
            FsEvent::unlink(fresh.clone(), root.clone(), "n"),
        ]))
        .unwrap();

    let under_root = Filter::compare_id(ComparisonOperator::Equal, Field::ParentId, &root)
        .unwrap();
    let entries: Vec<FsEntry> = backend
        .filter_entries(&under_root, EntryMask::ID | EntryMask::NAME, StatxMask::empty())
        .unwrap()
        .collect_remaining()
        .unwrap();

    assert!(entries.iter().all(|entry| entry.id != fresh));
}

#[test]
fn test_relink_moves_the_edge() {
    let (backend, root, child) = small_mirror();
    let other_dir: Id = Id::new(*b"other-dir");

    // Rename foo.c away, then create a second name under another directory.
    backend
        .update(&mut ArrayCursor::new(vec![
            FsEvent::upsert(
                other_dir.clone(),
                Some(directory_statx()),
                None,
                ValueMap::new(),
            ),
            FsEvent::link(other_dir.clone(), root.clone(), "sub"),
            FsEvent::unlink(child.clone(), root.clone(), "foo.c"),
            FsEvent::link(child.clone(), other_dir.clone(), "foo.c"),
        ]))
        .unwrap();

    let by_id = Filter::compare_id(ComparisonOperator::Equal, Field::Id, &child).unwrap();
    let rows: Vec<FsEntry> = backend
        .filter_entries(
            &by_id,
            EntryMask::ID | EntryMask::PARENT_ID | EntryMask::NAME,
            StatxMask::empty(),
        )
        .unwrap()
        .collect_remaining()
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].parent_id, Some(other_dir));
    assert_eq!(rows[0].name.as_deref(), Some("foo.c"));
}

#[test]
fn test_hardlinks_are_observed_once_per_edge() {
    let (backend, root, child) = small_mirror();

    backend
        .update(&mut ArrayCursor::new(vec![FsEvent::link(
            child.clone(),
            root.clone(),
            "hardlink",
        )]))
        .unwrap();

    let by_id = Filter::compare_id(ComparisonOperator::Equal, Field::Id, &child).unwrap();
    let rows: Vec<FsEntry> = backend
        .filter_entries(
            &by_id,
            EntryMask::ID | EntryMask::NAME,
            StatxMask::empty(),
        )
        .unwrap()
        .collect_remaining()
        .unwrap();

    let mut names: Vec<&str> = rows
        .iter()
        .filter_map(|row| row.name.as_deref())
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["foo.c", "hardlink"]);
}

#[test]
fn test_filter_matches_name_and_mtime() {
    let (backend, _root, child) = small_mirror();

    let name = Filter::compare_string(ComparisonOperator::Equal, Field::Name, "foo.c").unwrap();
    let mtime = Filter::compare_u64(
        ComparisonOperator::GreaterOrEqual,
        Field::Mtime,
        1_700_000_000,
    )
    .unwrap();
    let both = Filter::and(&[&name, &mtime]).unwrap();

    let rows: Vec<FsEntry> = backend
        .filter_entries(&both, EntryMask::ID, StatxMask::empty())
        .unwrap()
        .collect_remaining()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, child);
}

#[test]
fn test_null_filter_and_its_negation() {
    let (backend, _root, _child) = small_mirror();

    // The root has one edge and foo.c one: two rows in total.
    assert_eq!(all_entries(&backend).len(), 2);

    let none: Vec<FsEntry> = backend
        .filter_entries(&Filter::none(), EntryMask::ID, StatxMask::empty())
        .unwrap()
        .collect_remaining()
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_single_child_logicals_match_their_child() {
    let (backend, _root, _child) = small_mirror();
    let name = Filter::compare_string(ComparisonOperator::Equal, Field::Name, "foo.c").unwrap();

    let collect = |filter: &Filter| -> Vec<FsEntry> {
        backend
            .filter_entries(filter, EntryMask::ID, StatxMask::empty())
            .unwrap()
            .collect_remaining()
            .unwrap()
    };

    let direct: Vec<FsEntry> = collect(&name);
    assert_eq!(collect(&Filter::and(&[&name]).unwrap()), direct);
    assert_eq!(collect(&Filter::or(&[&name]).unwrap()), direct);
}

#[test]
fn test_type_filter_separates_files_from_directories() {
    let (backend, root, child) = small_mirror();

    let directories = Filter::compare_u32(
        ComparisonOperator::Equal,
        Field::Type,
        u32::from(statx::file_type::DIRECTORY),
    )
    .unwrap();
    let rows: Vec<FsEntry> = backend
        .filter_entries(&directories, EntryMask::ID, StatxMask::empty())
        .unwrap()
        .collect_remaining()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, root);

    let regulars = Filter::compare_u32(
        ComparisonOperator::Equal,
        Field::Type,
        u32::from(statx::file_type::REGULAR),
    )
    .unwrap();
    let rows: Vec<FsEntry> = backend
        .filter_entries(&regulars, EntryMask::ID, StatxMask::empty())
        .unwrap()
        .collect_remaining()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, child);
}

#[test]
fn test_regex_filter_on_names() {
    let (backend, _root, child) = small_mirror();

    let sources =
        Filter::compare_regex(Field::Name, "\\.C$", RegexOptions::CASE_INSENSITIVE).unwrap();
    let rows: Vec<FsEntry> = backend
        .filter_entries(&sources, EntryMask::ID, StatxMask::empty())
        .unwrap()
        .collect_remaining()
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, child);
}

#[test]
fn test_invalid_filter_is_rejected_before_translation() {
    let (backend, _root, _child) = small_mirror();

    let buried_null: Filter = Filter::and(&[&Filter::Null]).unwrap();
    assert!(matches!(
        backend.filter_entries(&buried_null, EntryMask::ID, StatxMask::empty()),
        Err(Error::InvalidFilter(_))
    ));
}

#[test]
fn test_xattr_events_and_filters() {
    let (backend, root, child) = small_mirror();

    let mut inode_xattrs: ValueMap = ValueMap::new();
    inode_xattrs.insert("user.tier".to_owned(), Value::from("cold"));
    let mut ns_xattrs: ValueMap = ValueMap::new();
    ns_xattrs.insert("user.pinned".to_owned(), Value::UInt32(1));

    backend
        .update(&mut ArrayCursor::new(vec![
            FsEvent::inode_xattrs(child.clone(), inode_xattrs),
            FsEvent::namespace_xattrs(child.clone(), root, "foo.c", ns_xattrs),
        ]))
        .unwrap();

    let cold = Filter::compare_string(
        ComparisonOperator::Equal,
        Field::InodeXattr("user.tier".to_owned()),
        "cold",
    )
    .unwrap();
    let pinned = Filter::compare_u32(
        ComparisonOperator::Equal,
        Field::NamespaceXattr("user.pinned".to_owned()),
        1,
    )
    .unwrap();

    for filter in [cold, pinned] {
        let rows: Vec<FsEntry> = backend
            .filter_entries(&filter, EntryMask::ID, StatxMask::empty())
            .unwrap()
            .collect_remaining()
            .unwrap();
        assert_eq!(rows.len(), 1, "filter {filter:?}");
        assert_eq!(rows[0].id, child);
    }
}

#[test]
fn test_statx_projection_masks_fields() {
    let (backend, _root, child) = small_mirror();

    let by_id = Filter::compare_id(ComparisonOperator::Equal, Field::Id, &child).unwrap();
    let entry: FsEntry = backend
        .filter_one(&by_id, EntryMask::ID | EntryMask::STATX, StatxMask::SIZE)
        .unwrap();

    let statx: Statx = entry.statx.unwrap();
    assert_eq!(statx.mask, StatxMask::SIZE);
    assert_eq!(statx.size, 64);
}

#[test]
fn test_partial_iteration_then_drop() {
    let (backend, _root, _child) = small_mirror();

    let mut entries = backend
        .filter_entries(&Filter::Null, EntryMask::ID, StatxMask::empty())
        .unwrap();
    assert!(entries.next().unwrap().is_some());
    drop(entries);

    // The backend is still fully usable afterwards.
    assert_eq!(all_entries(&backend).len(), 2);
}

#[test]
fn test_update_in_chunks_preserves_stream_order() {
    let backend: MemoryBackend = MemoryBackend::new("testfs");
    let id: Id = Id::new(*b"X");
    let parent: Id = Id::new(*b"P");

    let events: Vec<FsEvent> = vec![
        FsEvent::upsert(id.clone(), Some(regular_statx(1, 1)), None, ValueMap::new()),
        FsEvent::link(id.clone(), parent.clone(), "a"),
        FsEvent::unlink(id.clone(), parent.clone(), "a"),
        FsEvent::link(id.clone(), parent.clone(), "b"),
        FsEvent::delete(id.clone()),
        FsEvent::upsert(id.clone(), Some(regular_statx(2, 2)), None, ValueMap::new()),
        FsEvent::link(id.clone(), parent, "c"),
    ];

    // Feed the same stream chunk by chunk, as a scanner flushing batches.
    let mut chunks = chunkify(ArrayCursor::new(events), 3).unwrap();
    let mut total: usize = 0;
    while let Some(mut chunk) = chunks.next().unwrap() {
        total += backend.update(&mut chunk).unwrap();
    }
    assert_eq!(total, 7);

    let rows: Vec<FsEntry> = all_entries(&backend);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert_eq!(rows[0].name.as_deref(), Some("c"));
    assert_eq!(rows[0].statx.as_ref().unwrap().size, 2);
}

#[test]
fn test_teed_stream_feeds_two_mirrors_identically() {
    let primary: MemoryBackend = MemoryBackend::new("primary");
    let replica: MemoryBackend = MemoryBackend::new("replica");
    let id: Id = Id::new(*b"X");

    let events: Vec<FsEvent> = vec![
        FsEvent::upsert(id.clone(), Some(regular_statx(7, 7)), None, ValueMap::new()),
        FsEvent::link(id.clone(), Id::root(), ""),
        FsEvent::link(id, Id::new(*b"P"), "x"),
    ];

    let (mut left, mut right) = tee(ArrayCursor::new(events)).unwrap();
    assert_eq!(primary.update(&mut left).unwrap(), 3);
    assert_eq!(replica.update(&mut right).unwrap(), 3);

    assert_eq!(all_entries(&primary), all_entries(&replica));
}
