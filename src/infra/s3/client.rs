use crate::app::CancelToken;
use crate::errors::StoreError;
use crate::infra::s3::models::{S3Config, S3ObjectStore, mask};
use crate::utils::log_utils;
use aws_config::retry::RetryConfig;
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolves once `cancel` is tripped.
pub(crate) async fn wait_for_cancel(cancel: &CancelToken) {
    while !cancel.is_cancelled() {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}

impl S3ObjectStore {
    /// Create a new S3-compatible client from the provided config
    pub fn new(config: S3Config, verbose: u8) -> Result<Self, StoreError> {
        // Create runtime for async operations - will be reused for all operations
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| StoreError::Runtime(format!("Failed to create runtime: {e}")))?;

        log_utils::debug("Creating S3-compatible client with these parameters:", verbose);
        log_utils::debug(&format!("Endpoint: {}", config.endpoint), verbose);
        log_utils::debug(&format!("Region: {}", config.region), verbose);
        log_utils::debug(&format!("Bucket: {}", config.bucket), verbose);
        log_utils::debug(&format!("Key ID: {}", mask(&config.access_key_id)), verbose);

        let client = runtime.block_on(async {
            let credentials = Credentials::new(
                config.access_key_id.clone(),
                config.secret_access_key.clone(),
                None, // No session token
                None, // No expiry
                "StaticCredentials",
            );

            // Most S3-compatible services only support path-style addressing
            let s3_config = aws_sdk_s3::Config::builder()
                .region(Region::new(config.region.clone()))
                .endpoint_url(config.endpoint.clone())
                .credentials_provider(credentials)
                .force_path_style(true)
                .retry_config(RetryConfig::standard().with_max_attempts(3))
                .behavior_version(BehaviorVersion::latest())
                .build();

            Client::from_conf(s3_config)
        });

        Ok(Self {
            bucket_name: config.bucket,
            client,
            runtime: Arc::new(runtime),
            cancel: CancelToken::new(),
            verbose,
        })
    }

    /// Abandon requests and open bodies once `cancel` is tripped
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Drive `request` on the store's runtime, giving up when the cancel token trips
    pub(crate) fn block_on_cancellable<T, F>(&self, request: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        self.runtime.block_on(async {
            tokio::select! {
                biased;
                () = wait_for_cancel(&self.cancel) => Err(StoreError::Cancelled),
                result = request => result,
            }
        })
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}
