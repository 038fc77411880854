use crate::errors::StoreError;
use crate::infra::s3::models::S3ObjectStore;
use crate::utils::log_utils;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use std::time::Duration;

impl S3ObjectStore {
    /// Presigned `GetObject` URL valid for `lifetime`
    pub fn presigned_get_url(&self, object_key: &str, lifetime: Duration) -> Result<String, StoreError> {
        let presign_error = |message: String| StoreError::Presign {
            key: object_key.to_string(),
            message,
        };

        let presigning = PresigningConfig::expires_in(lifetime).map_err(|e| presign_error(e.to_string()))?;

        let request = self.runtime.block_on(async {
            self.client
                .get_object()
                .bucket(&self.bucket_name)
                .key(object_key)
                .presigned(presigning)
                .await
                .map_err(|e| presign_error(DisplayErrorContext(&e).to_string()))
        })?;

        log_utils::debug(
            &format!(
                "Presigned '{}' for {} seconds",
                object_key,
                lifetime.as_secs()
            ),
            self.verbose,
        );
        Ok(request.uri().to_string())
    }
}
