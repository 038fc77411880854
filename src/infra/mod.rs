pub mod interrupt_adapter;
pub mod s3;

use crate::domain::{ListPage, ListRequest};
use crate::errors::StoreError;
use crate::ports::{ObjectBody, ObjectStorePort};
use std::time::Duration;

pub use s3::{S3Config, S3ObjectStore};

impl ObjectStorePort for S3ObjectStore {
    fn list_page(&self, request: &ListRequest) -> Result<ListPage, StoreError> {
        self.list_objects_page(request)
    }

    fn fetch(&self, key: &str) -> Result<ObjectBody, StoreError> {
        self.open_object(key)
    }

    fn presign(&self, key: &str, lifetime: Duration) -> Result<String, StoreError> {
        self.presigned_get_url(key, lifetime)
    }
}
