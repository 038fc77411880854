use crate::app::CancelToken;
use crate::errors::StoreError;
use crate::infra::s3::client::wait_for_cancel;
use crate::infra::s3::models::S3ObjectStore;
use crate::ports::ObjectBody;
use crate::utils::log_utils;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::io::{self, Read};
use std::sync::Arc;
use tokio::runtime::Runtime;

impl S3ObjectStore {
    /// Start a `GetObject` and hand back its body as a blocking reader
    pub fn open_object(&self, object_key: &str) -> Result<ObjectBody, StoreError> {
        log_utils::debug(
            &format!(
                "S3 download request details:\nBucket: {}\nObject key: {}",
                self.bucket_name, object_key
            ),
            self.verbose,
        );

        let resp = self.block_on_cancellable(async {
            self.client
                .get_object()
                .bucket(&self.bucket_name)
                .key(object_key)
                .send()
                .await
                .map_err(|e| StoreError::Fetch {
                    key: object_key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                })
        })?;

        log_utils::debug(
            &format!(
                "S3 download response received\nContent length: {:?}\nE-Tag: {:?}",
                resp.content_length(),
                resp.e_tag()
            ),
            self.verbose,
        );

        Ok(Box::new(S3Body::new(
            Arc::clone(&self.runtime),
            resp.body,
            object_key,
            self.cancel.clone(),
            self.verbose,
        )))
    }
}

/// Blocking [`Read`] over a streaming `GetObject` body.
///
/// Chunks are pulled on demand through the store's runtime. Dropping the
/// reader drops the stream, which releases the HTTP connection. A read that
/// is waiting on the network fails once `cancel` trips.
pub struct S3Body {
    runtime: Arc<Runtime>,
    stream: ByteStream,
    pending: Vec<u8>,
    pos: usize,
    done: bool,
    key: String,
    cancel: CancelToken,
    verbose: u8,
}

impl S3Body {
    pub fn new(
        runtime: Arc<Runtime>,
        stream: ByteStream,
        key: &str,
        cancel: CancelToken,
        verbose: u8,
    ) -> Self {
        Self {
            runtime,
            stream,
            pending: Vec::new(),
            pos: 0,
            done: false,
            key: key.to_string(),
            cancel,
            verbose,
        }
    }

    async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        tokio::select! {
            biased;
            () = wait_for_cancel(&self.cancel) => Err(io::Error::other(format!(
                "download of '{}' cancelled",
                self.key
            ))),
            chunk = self.stream.try_next() => chunk
                .map(|c| c.map(|bytes| bytes.to_vec()))
                .map_err(io::Error::other),
        }
    }
}

impl Read for S3Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.pos < self.pending.len() {
                let n = buf.len().min(self.pending.len() - self.pos);
                buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if self.done {
                return Ok(0);
            }
            let runtime = Arc::clone(&self.runtime);
            match runtime.block_on(self.next_chunk())? {
                Some(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                None => self.done = true,
            }
        }
    }
}

impl Drop for S3Body {
    fn drop(&mut self) {
        log_utils::debug(
            &format!("Released body for '{}' (complete: {})", self.key, self.done),
            self.verbose,
        );
    }
}
