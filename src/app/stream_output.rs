use std::io::{self, Read, Seek, SeekFrom, Write};
use tempfile::SpooledTempFile;

/// Forward-only writer presented to the ZIP encoder as `Write + Seek`.
///
/// Bytes written since the last `flush` stay in a spool, so the encoder can
/// seek back and patch the current entry's local header. `flush` sends them to
/// the inner writer. Seeking into bytes already sent is an error.
pub(crate) struct StreamOutput<W: Write> {
    inner: W,
    window: SpooledTempFile,
    window_limit: usize,
    sent: u64,
}

impl<W: Write> StreamOutput<W> {
    pub(crate) fn new(inner: W, window_limit: usize) -> Self {
        Self {
            inner,
            window: SpooledTempFile::new(window_limit),
            window_limit,
            sent: 0,
        }
    }

    fn send_window(&mut self) -> io::Result<()> {
        let len = self.window.seek(SeekFrom::End(0))?;
        if len > 0 {
            self.window.seek(SeekFrom::Start(0))?;
            if let Err(e) = io::copy(&mut self.window, &mut self.inner) {
                self.window.seek(SeekFrom::End(0))?;
                return Err(e);
            }
            self.sent += len;
            self.window = SpooledTempFile::new(self.window_limit);
        }
        self.inner.flush()
    }

    /// Send whatever is still held back and return the inner writer.
    pub(crate) fn into_inner(mut self) -> io::Result<W> {
        self.send_window()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for StreamOutput<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.window.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_window()
    }
}

/// Required by `zip` 2.4's bound on `set_flush_on_finish_file`; the encoder
/// never reads from its output, so reads are refused.
impl<W: Write> Read for StreamOutput<W> {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "output is write-only"))
    }
}

impl<W: Write> Seek for StreamOutput<W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let local = match pos {
            SeekFrom::Start(offset) => {
                let relative = offset.checked_sub(self.sent).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::Unsupported,
                        format!("cannot seek to {offset}: bytes before {} already sent", self.sent),
                    )
                })?;
                SeekFrom::Start(relative)
            }
            other => other,
        };
        Ok(self.sent + self.window.seek(local)?)
    }
}
