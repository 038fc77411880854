use crate::domain::{ListPage, ListRequest};
use crate::errors::StoreError;
use mockall::automock;
use std::io::Read;
use std::time::Duration;

/// Readable object body. Dropping it releases the underlying remote resource.
pub type ObjectBody = Box<dyn Read + Send>;

/// The remote object store the folder and archive logic runs against.
#[automock]
pub trait ObjectStorePort: Send + Sync {
    /// Fetch one page of keys. `request.continuation` must carry the previous page's cursor.
    fn list_page(&self, request: &ListRequest) -> Result<ListPage, StoreError>;

    /// Open the body of one object for reading.
    fn fetch(&self, key: &str) -> Result<ObjectBody, StoreError>;

    /// Produce a time-limited GET URL for one object.
    fn presign(&self, key: &str, lifetime: Duration) -> Result<String, StoreError>;
}
