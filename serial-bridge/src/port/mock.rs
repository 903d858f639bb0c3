//! In-memory transport for tests.
//!
//! [`MockTransport`] behaves like a serial link without any hardware:
//! queued bytes come back from `read`, written bytes are recorded, and the
//! number of bytes accepted per `write` can be capped to exercise partial
//! writes.
//!
//! # Example
//! ```
//! use serial_bridge::port::{MockTransport, Transport};
//!
//! let mut link = MockTransport::new().with_max_write(1);
//! link.open("MOCK0").unwrap();
//! link.enqueue_read(b"pong");
//!
//! assert_eq!(link.write(b"ping").unwrap(), 1);
//! assert_eq!(link.sent(), b"p");
//!
//! let mut buf = [0u8; 8];
//! assert_eq!(link.read(&mut buf).unwrap(), 4);
//! assert_eq!(link.read(&mut buf).unwrap(), 0);
//! ```

use {
    crate::{
        error::{Error, Result},
        port::Transport,
    },
    std::{collections::VecDeque, io},
};

/// Mock serial link.
#[derive(Debug, Default)]
pub struct MockTransport {
    path: Option<String>,
    incoming: VecDeque<u8>,
    sent: Vec<u8>,
    max_write: Option<usize>,
    stalled_writes: usize,
    unavailable: Vec<String>,
    write_fault: bool,
    read_fault: bool,
    open_calls: usize,
    close_calls: usize,
    write_calls: usize,
}

impl MockTransport {
    /// Create a mock with no link open and unlimited write acceptance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept at most `limit` bytes per `write` call.
    #[must_use]
    pub fn with_max_write(mut self, limit: usize) -> Self {
        self.max_write = Some(limit);
        self
    }

    /// Make the next `count` writes accept nothing, as a busy link would.
    #[must_use]
    pub fn with_stalled_writes(mut self, count: usize) -> Self {
        self.stalled_writes = count;
        self
    }

    /// Make `open` fail for `path`.
    #[must_use]
    pub fn with_unavailable(mut self, path: impl Into<String>) -> Self {
        self.unavailable
            .push(path.into());
        self
    }

    /// Make every `write` fail with a fatal I/O error.
    pub fn fail_writes(&mut self) {
        self.write_fault = true;
    }

    /// Make every `read` fail with a fatal I/O error.
    pub fn fail_reads(&mut self) {
        self.read_fault = true;
    }

    /// Queue bytes to be returned by subsequent reads.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.incoming
            .extend(data);
    }

    /// Bytes still waiting to be read.
    pub fn pending(&self) -> usize {
        self.incoming
            .len()
    }

    /// Everything accepted by `write` so far, in order.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Number of `open` calls, failed ones included.
    pub fn open_calls(&self) -> usize {
        self.open_calls
    }

    /// Number of `close` calls, including no-op ones.
    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    /// Number of `write` calls, including ones that accepted nothing.
    pub fn write_calls(&self) -> usize {
        self.write_calls
    }
}

impl Transport for MockTransport {
    fn open(&mut self, path: &str) -> Result<()> {
        self.open_calls += 1;
        if self
            .unavailable
            .iter()
            .any(|p| p == path)
        {
            return Err(Error::open(
                path,
                io::Error::new(io::ErrorKind::NotFound, "mock device unavailable"),
            ));
        }
        self.path = Some(path.to_string());
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.write_calls += 1;
        if self.path.is_none() {
            return Err(Error::NotOpen);
        }
        if self.write_fault {
            return Err(Error::Write(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock write fault",
            )));
        }
        if self.stalled_writes > 0 {
            self.stalled_writes -= 1;
            return Ok(0);
        }

        let accepted = self
            .max_write
            .map_or(data.len(), |limit| data.len().min(limit));
        self.sent
            .extend_from_slice(&data[..accepted]);
        Ok(accepted)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.path.is_none() {
            return Err(Error::NotOpen);
        }
        if self.read_fault {
            return Err(Error::Read(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock read fault",
            )));
        }

        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.incoming.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    n += 1;
                },
                None => break,
            }
        }
        Ok(n)
    }

    fn close(&mut self) {
        self.close_calls += 1;
        self.path = None;
    }

    fn is_open(&self) -> bool {
        self.path.is_some()
    }

    fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}
