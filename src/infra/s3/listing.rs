use crate::domain::{ListPage, ListRequest};
use crate::errors::StoreError;
use crate::infra::s3::models::S3ObjectStore;
use crate::utils::log_utils;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;

impl S3ObjectStore {
    /// One `ListObjectsV2` call for the given prefix, delimiter and cursor
    pub fn list_objects_page(&self, request: &ListRequest) -> Result<ListPage, StoreError> {
        log_utils::debug(
            &format!(
                "Listing bucket '{}' prefix '{}' delimiter {:?} continuation {:?}",
                self.bucket_name, request.prefix, request.delimiter, request.continuation
            ),
            self.verbose,
        );

        let output = self.block_on_cancellable(async {
            self.client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .set_prefix((!request.prefix.is_empty()).then(|| request.prefix.clone()))
                .set_delimiter(request.delimiter.clone())
                .set_continuation_token(request.continuation.clone())
                .send()
                .await
                .map_err(|e| StoreError::List {
                    prefix: request.prefix.clone(),
                    message: DisplayErrorContext(&e).to_string(),
                })
        })?;

        let page = page_from_output(&output);
        log_utils::debug(
            &format!(
                "Received {} keys and {} common prefixes (truncated: {})",
                page.keys.len(),
                page.common_prefixes.len(),
                page.is_truncated
            ),
            self.verbose,
        );
        Ok(page)
    }
}

/// Convert an SDK listing response into a [`ListPage`]. Entries without a key are dropped.
pub(crate) fn page_from_output(output: &ListObjectsV2Output) -> ListPage {
    ListPage {
        keys: output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect(),
        common_prefixes: output
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect(),
        next_continuation: output.next_continuation_token().map(str::to_string),
        is_truncated: output.is_truncated().unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::types::{CommonPrefix, Object};

    #[test]
    fn maps_keys_prefixes_and_cursor() {
        let output = ListObjectsV2Output::builder()
            .contents(Object::builder().key("photos/cat.jpg").build())
            .contents(Object::builder().build())
            .common_prefixes(CommonPrefix::builder().prefix("photos/2024/").build())
            .is_truncated(true)
            .next_continuation_token("next-page")
            .build();

        let page = page_from_output(&output);
        assert_eq!(page.keys, vec!["photos/cat.jpg".to_string()]);
        assert_eq!(page.common_prefixes, vec!["photos/2024/".to_string()]);
        assert_eq!(page.next_continuation.as_deref(), Some("next-page"));
        assert!(page.is_truncated);
    }

    #[test]
    fn missing_truncation_flag_means_last_page() {
        let output = ListObjectsV2Output::builder().build();
        let page = page_from_output(&output);
        assert!(page.keys.is_empty());
        assert!(!page.is_truncated);
        assert!(page.next_continuation.is_none());
    }
}
