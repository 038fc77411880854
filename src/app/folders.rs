use crate::app::CancelToken;
use crate::app::listing::for_each_page;
use crate::domain::ListRequest;
use crate::errors::FolderError;
use crate::ports::ObjectStorePort;
use std::collections::BTreeSet;

/// Add every ancestor folder implied by `key` to `folders`.
///
/// `a/b/c/file` yields `a/`, `a/b/` and `a/b/c/`; a key without `/` yields nothing.
/// Empty segments are kept, so `a//b` yields `a/` and `a//`.
pub fn insert_ancestor_folders(key: &str, folders: &mut BTreeSet<String>) {
    for (idx, _) in key.match_indices('/') {
        folders.insert(key[..=idx].to_string());
    }
}

/// Sorted, deduplicated folder paths implied by `keys`.
pub fn folders_from_keys<'a, I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut folders = BTreeSet::new();
    for key in keys {
        insert_ancestor_folders(key, &mut folders);
    }
    folders.into_iter().collect()
}

/// Enumerate the whole bucket and derive every folder path from its keys.
///
/// Any page failure aborts the derivation; a partial folder set is never returned.
/// Cancellation counts as a failure.
pub fn derive_folders(
    store: &dyn ObjectStorePort,
    cancel: &CancelToken,
) -> Result<Vec<String>, FolderError> {
    let mut folders = BTreeSet::new();
    for_each_page(store, &ListRequest::recursive(""), cancel, |page| {
        for key in &page.keys {
            insert_ancestor_folders(key, &mut folders);
        }
    })?;
    Ok(folders.into_iter().collect())
}
