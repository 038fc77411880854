use std::sync::Arc;

use mockall::Sequence;

use bucket_browser::app::{AppCore, CancelToken};
use bucket_browser::domain::ListPage;
use bucket_browser::errors::{FolderError, StoreError};
use bucket_browser::ports::MockObjectStorePort;
use bucket_browser::testing::FakeObjectStore;

#[test]
fn test_flat_bucket_has_no_folders() {
    let store = FakeObjectStore::with_objects([("a.txt", "1"), ("b.txt", "2"), ("c", "3")]);
    let core = AppCore::new(Arc::new(store));

    let folders = core.derive_folders(&CancelToken::new()).expect("derive");
    assert!(folders.is_empty(), "flat keys must not imply folders: {folders:?}");
}

#[test]
fn test_deep_key_yields_exactly_its_ancestors() {
    let store = FakeObjectStore::with_objects([("a/b/c/file", "x")]);
    let core = AppCore::new(Arc::new(store));

    assert_eq!(
        core.derive_folders(&CancelToken::new()).expect("derive"),
        vec!["a/".to_string(), "a/b/".to_string(), "a/b/c/".to_string()]
    );
}

#[test]
fn test_folder_is_never_the_key_itself() {
    let store = FakeObjectStore::with_objects([("a/b/file", "x")]);
    let core = AppCore::new(Arc::new(store));

    assert_eq!(
        core.derive_folders(&CancelToken::new()).expect("derive"),
        vec!["a/".to_string(), "a/b/".to_string()]
    );
}

#[test]
fn test_output_is_sorted_and_stable_across_calls() {
    let store = FakeObjectStore::with_objects([
        ("reports/2024/q4.pdf", "4"),
        ("reports/2023/q1.pdf", "1"),
        ("archive/old/file", "o"),
        ("Zebra/first", "z"),
        ("root.txt", "r"),
    ])
    .page_size(2);
    let core = AppCore::new(Arc::new(store));

    let first = core.derive_folders(&CancelToken::new()).expect("first call");
    let second = core.derive_folders(&CancelToken::new()).expect("second call");
    assert_eq!(first, second);

    let mut sorted = first.clone();
    sorted.sort();
    assert_eq!(first, sorted);
    assert_eq!(
        first,
        vec![
            "Zebra/".to_string(),
            "archive/".to_string(),
            "archive/old/".to_string(),
            "reports/".to_string(),
            "reports/2023/".to_string(),
            "reports/2024/".to_string(),
        ]
    );
}

#[test]
fn test_failure_on_a_later_page_aborts_without_partial_result() {
    let mut store = MockObjectStorePort::new();
    let mut seq = Sequence::new();
    store
        .expect_list_page()
        .withf(|req| req.prefix.is_empty() && req.delimiter.is_none() && req.continuation.is_none())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(ListPage {
                keys: vec!["a/b/c".to_string()],
                common_prefixes: vec![],
                next_continuation: Some("page-2".to_string()),
                is_truncated: true,
            })
        });
    store
        .expect_list_page()
        .withf(|req| req.continuation.as_deref() == Some("page-2"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|req| {
            Err(StoreError::List {
                prefix: req.prefix.clone(),
                message: "503 SlowDown".to_string(),
            })
        });
    store.expect_fetch().never();

    let core = AppCore::new(Arc::new(store));
    let err = core.derive_folders(&CancelToken::new()).expect_err("must abort");
    let FolderError::Enumeration(inner) = err;
    assert!(matches!(inner, StoreError::List { .. }));
}

#[test]
fn test_listing_failure_on_first_page_is_reported() {
    let store = FakeObjectStore::with_objects([("a/b", "1")]).failing_list("");
    let core = AppCore::new(Arc::new(store));

    assert!(core.derive_folders(&CancelToken::new()).is_err());
}

#[test]
fn test_cancel_during_first_page_stops_enumeration() {
    let cancel = CancelToken::new();
    let store = Arc::new(
        FakeObjectStore::with_objects([("a/1", "1"), ("b/2", "2"), ("c/3", "3")])
            .page_size(1)
            .cancel_on_list(cancel.clone()),
    );
    let core = AppCore::new(store.clone());

    let err = core.derive_folders(&cancel).expect_err("cancelled");
    let FolderError::Enumeration(inner) = err;
    assert!(matches!(inner, StoreError::Cancelled));
    // The second page is never requested
    assert_eq!(store.list_calls(), 1);
}
