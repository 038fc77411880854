//! In-memory [`ObjectStorePort`] used by unit and integration tests.
//!
//! Keys are kept sorted, as S3 returns them. Bodies count how often they are
//! opened and dropped so tests can assert every fetched body was released.

use crate::app::CancelToken;
use crate::domain::{ListPage, ListRequest};
use crate::errors::StoreError;
use crate::ports::{ObjectBody, ObjectStorePort};
use std::collections::{BTreeMap, HashSet};
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Item {
    Key(String),
    Prefix(String),
}

pub struct FakeObjectStore {
    objects: BTreeMap<String, Vec<u8>>,
    page_size: usize,
    failing_fetch: HashSet<String>,
    failing_read: HashSet<String>,
    failing_list: HashSet<String>,
    cancel_on_fetch: Option<(String, CancelToken)>,
    cancel_on_read: Option<(String, CancelToken)>,
    cancel_on_list: Option<CancelToken>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    body_reads: Arc<AtomicUsize>,
    fetch_log: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            page_size: 1000,
            failing_fetch: HashSet::new(),
            failing_read: HashSet::new(),
            failing_list: HashSet::new(),
            cancel_on_fetch: None,
            cancel_on_read: None,
            cancel_on_list: None,
            opened: Arc::default(),
            closed: Arc::default(),
            body_reads: Arc::default(),
            fetch_log: Mutex::default(),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_objects<K, V, I>(objects: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<[u8]>,
    {
        let mut store = Self::new();
        for (key, body) in objects {
            store.objects.insert(key.into(), body.as_ref().to_vec());
        }
        store
    }

    /// Maximum number of keys plus common prefixes per page.
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// `fetch(key)` returns an error.
    pub fn failing_fetch(mut self, key: &str) -> Self {
        self.failing_fetch.insert(key.to_string());
        self
    }

    /// `fetch(key)` succeeds but reading the body fails partway.
    pub fn failing_read(mut self, key: &str) -> Self {
        self.failing_read.insert(key.to_string());
        self
    }

    /// Any listing whose prefix equals `prefix` fails.
    pub fn failing_list(mut self, prefix: &str) -> Self {
        self.failing_list.insert(prefix.to_string());
        self
    }

    /// Trip `token` while serving `fetch(key)`.
    pub fn cancel_on_fetch(mut self, key: &str, token: CancelToken) -> Self {
        self.cancel_on_fetch = Some((key.to_string(), token));
        self
    }

    /// Trip `token` on the first read of `key`'s body.
    pub fn cancel_on_read(mut self, key: &str, token: CancelToken) -> Self {
        self.cancel_on_read = Some((key.to_string(), token));
        self
    }

    /// Trip `token` while serving the first listing call.
    pub fn cancel_on_list(mut self, token: CancelToken) -> Self {
        self.cancel_on_list = Some(token);
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// `read` calls made on any body handed out so far.
    pub fn body_reads(&self) -> usize {
        self.body_reads.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Keys passed to `fetch`, in call order.
    pub fn fetched(&self) -> Vec<String> {
        match self.fetch_log.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn items_for(&self, request: &ListRequest) -> Vec<Item> {
        let mut items = Vec::new();
        let mut seen_prefixes = HashSet::new();
        for key in self.objects.keys().filter(|k| k.starts_with(&request.prefix)) {
            let rest = &key[request.prefix.len()..];
            let grouped = request
                .delimiter
                .as_deref()
                .and_then(|d| rest.find(d).map(|idx| idx + d.len()));
            match grouped {
                Some(end) => {
                    let common = format!("{}{}", request.prefix, &rest[..end]);
                    if seen_prefixes.insert(common.clone()) {
                        items.push(Item::Prefix(common));
                    }
                }
                None => items.push(Item::Key(key.clone())),
            }
        }
        items
    }
}

impl ObjectStorePort for FakeObjectStore {
    fn list_page(&self, request: &ListRequest) -> Result<ListPage, StoreError> {
        if self.list_calls.fetch_add(1, Ordering::SeqCst) == 0
            && let Some(token) = &self.cancel_on_list
        {
            token.cancel();
        }
        if self.failing_list.contains(&request.prefix) {
            return Err(StoreError::List {
                prefix: request.prefix.clone(),
                message: "injected listing failure".to_string(),
            });
        }

        let start = match request.continuation.as_deref() {
            Some(token) => token.parse::<usize>().map_err(|_| StoreError::List {
                prefix: request.prefix.clone(),
                message: format!("bad continuation token '{token}'"),
            })?,
            None => 0,
        };

        let items = self.items_for(request);
        let total = items.len();
        let end = (start + self.page_size).min(total);
        let mut page = ListPage::default();
        for item in items.into_iter().skip(start).take(end.saturating_sub(start)) {
            match item {
                Item::Key(key) => page.keys.push(key),
                Item::Prefix(prefix) => page.common_prefixes.push(prefix),
            }
        }
        if end < total {
            page.is_truncated = true;
            page.next_continuation = Some(end.to_string());
        }
        Ok(page)
    }

    fn fetch(&self, key: &str) -> Result<ObjectBody, StoreError> {
        match self.fetch_log.lock() {
            Ok(mut guard) => guard.push(key.to_string()),
            Err(poisoned) => poisoned.into_inner().push(key.to_string()),
        }
        if let Some((trigger, token)) = &self.cancel_on_fetch
            && trigger == key
        {
            token.cancel();
        }
        if self.failing_fetch.contains(key) {
            return Err(StoreError::Fetch {
                key: key.to_string(),
                message: "injected fetch failure".to_string(),
            });
        }
        let data = self.objects.get(key).cloned().ok_or_else(|| StoreError::Fetch {
            key: key.to_string(),
            message: "NoSuchKey".to_string(),
        })?;

        self.opened.fetch_add(1, Ordering::SeqCst);
        let cancel_on_read = self
            .cancel_on_read
            .as_ref()
            .filter(|(trigger, _)| trigger == key)
            .map(|(_, token)| token.clone());
        Ok(Box::new(FakeBody {
            data: io::Cursor::new(data),
            fail_read: self.failing_read.contains(key),
            cancel_on_read,
            reads: Arc::clone(&self.body_reads),
            closed: Arc::clone(&self.closed),
        }))
    }

    fn presign(&self, key: &str, lifetime: Duration) -> Result<String, StoreError> {
        Ok(format!(
            "https://fake.invalid/bucket/{key}?X-Amz-Expires={}",
            lifetime.as_secs()
        ))
    }
}

struct FakeBody {
    data: io::Cursor<Vec<u8>>,
    fail_read: bool,
    cancel_on_read: Option<CancelToken>,
    reads: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl Read for FakeBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.cancel_on_read.take() {
            token.cancel();
        }
        if self.fail_read {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "injected body read failure",
            ));
        }
        self.data.read(buf)
    }
}

impl Drop for FakeBody {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for FakeObjectStore {
    fn default() -> Self {
        Self::new()
    }
}
