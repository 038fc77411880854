use crate::app::CancelToken;
use crate::domain::{ListPage, ListRequest, ObjectListing};
use crate::errors::StoreError;
use crate::ports::ObjectStorePort;

/// Walk every page for `request`, handing each page to `on_page`.
///
/// Stops at the first failing page. A page that claims more results but carries
/// no cursor is treated as an error rather than looping forever. `cancel` is
/// checked before every page request.
pub fn for_each_page<F>(
    store: &dyn ObjectStorePort,
    request: &ListRequest,
    cancel: &CancelToken,
    mut on_page: F,
) -> Result<(), StoreError>
where
    F: FnMut(ListPage),
{
    let mut next = request.clone();
    loop {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let page = store.list_page(&next)?;
        let truncated = page.is_truncated;
        let cursor = page.next_continuation.clone();
        on_page(page);

        if !truncated {
            return Ok(());
        }
        match cursor {
            Some(token) => next = request.with_continuation(Some(token)),
            None => {
                return Err(StoreError::Pagination {
                    prefix: request.prefix.clone(),
                });
            }
        }
    }
}

/// Every key starting with `prefix`, across all pages, in store order.
pub fn list_all_keys(
    store: &dyn ObjectStorePort,
    prefix: &str,
    cancel: &CancelToken,
) -> Result<Vec<String>, StoreError> {
    let mut keys = Vec::new();
    for_each_page(store, &ListRequest::recursive(prefix), cancel, |page| {
        keys.extend(page.keys);
    })?;
    Ok(keys)
}

/// Prefix-scoped listing with optional delimiter grouping.
///
/// The key equal to `prefix` itself (a folder marker object) is left out of `files`.
pub fn list_objects(
    store: &dyn ObjectStorePort,
    prefix: &str,
    delimiter: &str,
    cancel: &CancelToken,
) -> Result<ObjectListing, StoreError> {
    let request = ListRequest {
        prefix: prefix.to_string(),
        delimiter: (!delimiter.is_empty()).then(|| delimiter.to_string()),
        continuation: None,
    };

    let mut listing = ObjectListing::default();
    for_each_page(store, &request, cancel, |page| {
        listing
            .files
            .extend(page.keys.into_iter().filter(|key| key != prefix));
        listing.folders.extend(page.common_prefixes);
    })?;
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockObjectStorePort;
    use crate::testing::FakeObjectStore;
    use mockall::Sequence;

    #[test]
    fn follows_continuation_tokens_until_done() {
        let mut store = MockObjectStorePort::new();
        let mut seq = Sequence::new();
        store
            .expect_list_page()
            .withf(|req| req.prefix == "docs/" && req.continuation.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(ListPage {
                    keys: vec!["docs/a".into()],
                    next_continuation: Some("t1".into()),
                    is_truncated: true,
                    ..Default::default()
                })
            });
        store
            .expect_list_page()
            .withf(|req| req.continuation.as_deref() == Some("t1"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(ListPage {
                    keys: vec!["docs/b".into()],
                    ..Default::default()
                })
            });

        let keys = list_all_keys(&store, "docs/", &CancelToken::new()).expect("listing");
        assert_eq!(keys, vec!["docs/a".to_string(), "docs/b".to_string()]);
    }

    #[test]
    fn truncated_page_without_cursor_is_an_error() {
        let mut store = MockObjectStorePort::new();
        store.expect_list_page().times(1).returning(|_| {
            Ok(ListPage {
                keys: vec!["x".into()],
                is_truncated: true,
                ..Default::default()
            })
        });

        let err = list_all_keys(&store, "", &CancelToken::new()).expect_err("should not loop");
        assert!(matches!(err, StoreError::Pagination { .. }));
    }

    #[test]
    fn list_objects_drops_the_prefix_marker_and_groups_folders() {
        let store = FakeObjectStore::with_objects([
            ("photos/", ""),
            ("photos/cat.jpg", "meow"),
            ("photos/2024/dog.jpg", "woof"),
            ("photos/2024/bird.jpg", "tweet"),
            ("videos/clip.mp4", "..."),
        ])
        .page_size(2);

        let listing = list_objects(&store, "photos/", "/", &CancelToken::new()).expect("listing");
        assert_eq!(listing.files, vec!["photos/cat.jpg".to_string()]);
        assert_eq!(listing.folders, vec!["photos/2024/".to_string()]);
    }

    #[test]
    fn list_objects_without_delimiter_is_recursive() {
        let store = FakeObjectStore::with_objects([("a/b/c", "1"), ("a/d", "2")]);
        let listing = list_objects(&store, "a/", "", &CancelToken::new()).expect("listing");
        assert_eq!(listing.files, vec!["a/b/c".to_string(), "a/d".to_string()]);
        assert!(listing.folders.is_empty());
    }

    #[test]
    fn cancellation_stops_before_the_next_page() {
        let cancel = CancelToken::new();
        let store = FakeObjectStore::with_objects([("a/1", "1"), ("a/2", "2"), ("a/3", "3")])
            .page_size(1)
            .cancel_on_list(cancel.clone());

        let err = list_all_keys(&store, "a/", &cancel).expect_err("cancelled");
        assert!(matches!(err, StoreError::Cancelled));
        assert_eq!(store.list_calls(), 1);
    }
}
