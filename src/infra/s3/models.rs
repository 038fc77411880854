use crate::app::CancelToken;
use aws_sdk_s3::Client;
use std::fmt;
use std::sync::Arc;

/// Connection settings for an S3-compatible bucket
#[derive(Clone, PartialEq, Eq)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key_id", &mask(&self.access_key_id))
            .field("secret_access_key", &"****")
            .finish()
    }
}

/// First four characters followed by a mask, as used in debug output.
pub(crate) fn mask(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    format!("{visible}****")
}

/// Object store backed by an S3-compatible service
pub struct S3ObjectStore {
    pub(crate) bucket_name: String,
    pub(crate) client: Client,
    // Shared with open bodies, which keep pulling chunks after fetch returns
    pub(crate) runtime: Arc<tokio::runtime::Runtime>,
    // Tripped by Ctrl+C; in-flight requests and open bodies give up when it is set
    pub(crate) cancel: CancelToken,
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_credentials() {
        let config = S3Config {
            endpoint: "https://storage.example.net".to_string(),
            region: "ru-central1".to_string(),
            bucket: "media".to_string(),
            access_key_id: "AKIAEXAMPLEKEY".to_string(),
            secret_access_key: "super-secret".to_string(),
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("AKIA****"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("EXAMPLEKEY"));
    }
}
