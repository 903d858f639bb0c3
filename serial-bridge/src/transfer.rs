//! Whole-buffer, whole-file and fixed-length transfers over a [`Transport`].
//!
//! The transport itself never retries. Every "keep going until the link
//! accepts it" loop in this crate goes through [`RetryStrategy`], so the
//! polling behavior can be changed in one place.

use {
    crate::{
        cancel::CancelToken,
        error::{Error, Result},
        port::Transport,
    },
    log::{debug, trace},
    std::{
        fs::File,
        io::{BufReader, Read, Write},
        path::Path,
        time::Duration,
    },
};

/// How to wait between write attempts that made no progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// Retry immediately, forever. Burns CPU on a slow link because the
    /// handle is non-blocking.
    #[default]
    Spin,
    /// Sleep between attempts, doubling from `initial` up to `max`.
    Backoff {
        /// First sleep.
        initial: Duration,
        /// Longest sleep.
        max: Duration,
    },
}

impl RetryStrategy {
    /// Write `data` until the link accepts at least one byte.
    ///
    /// Returns the accepted count. Fatal write errors are returned as-is and
    /// not retried. Empty input returns `Ok(0)` without touching the link.
    pub fn write_accepted<T>(&self, link: &mut T, data: &[u8]) -> Result<usize>
    where
        T: Transport + ?Sized,
    {
        if data.is_empty() {
            return Ok(0);
        }

        let mut attempt: u32 = 0;
        loop {
            let accepted = link.write(data)?;
            if accepted > 0 {
                return Ok(accepted);
            }
            self.pause(attempt);
            attempt = attempt.saturating_add(1);
        }
    }

    fn pause(&self, attempt: u32) {
        match *self {
            Self::Spin => std::hint::spin_loop(),
            Self::Backoff { initial, max } => {
                let factor = 1u32 << attempt.min(16);
                std::thread::sleep(initial.saturating_mul(factor).min(max));
            },
        }
    }
}

/// Send every byte of `data`, resubmitting the unsent remainder after each
/// partial write. Returns the number of bytes sent.
pub fn send_all<T>(link: &mut T, data: &[u8], retry: RetryStrategy) -> Result<usize>
where
    T: Transport + ?Sized,
{
    let mut offset = 0;
    while offset < data.len() {
        offset += retry.write_accepted(link, &data[offset..])?;
        trace!("Sent {offset}/{} byte(s)", data.len());
    }
    Ok(offset)
}

/// Spin-read `count` bytes one at a time, forwarding each to `out` as it
/// arrives.
///
/// Polls without sleeping while nothing is pending. Returns the number of
/// bytes received, which is less than `count` only if `cancel` was
/// triggered first.
pub fn receive_exact<T, W>(
    link: &mut T,
    count: usize,
    out: &mut W,
    cancel: &CancelToken,
) -> Result<usize>
where
    T: Transport + ?Sized,
    W: Write + ?Sized,
{
    let mut byte = [0u8; 1];
    let mut received = 0;
    while received < count {
        if cancel.is_cancelled() {
            debug!("Receive cancelled after {received}/{count} byte(s)");
            return Ok(received);
        }
        if link.read(&mut byte)? == 1 {
            out.write_all(&byte)?;
            out.flush()?;
            received += 1;
        } else {
            std::hint::spin_loop();
        }
    }
    debug!("Received {count} byte(s)");
    Ok(received)
}

/// Streams a byte source through a link one byte at a time.
///
/// Each byte is retried until accepted, so the receiver sees the source in
/// order with nothing dropped. The link is closed once the source is
/// exhausted.
pub struct FileTransmitter<'a, T: Transport + ?Sized> {
    link: &'a mut T,
    retry: RetryStrategy,
}

impl<'a, T: Transport + ?Sized> FileTransmitter<'a, T> {
    /// Transmit through `link`, which the caller has already opened.
    pub fn new(link: &'a mut T) -> Self {
        Self {
            link,
            retry: RetryStrategy::default(),
        }
    }

    /// Use `retry` instead of the default busy spin.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Send the file at `path`.
    ///
    /// Fails with [`Error::SourceUnavailable`] if the file cannot be opened,
    /// leaving the link exactly as it was.
    pub fn send_file(self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Transmitting {}", path.display());
        self.send(file)
    }

    /// Send every byte of `source` in a single pass, then close the link.
    ///
    /// Returns the number of bytes sent.
    pub fn send<S: Read>(self, source: S) -> Result<u64> {
        let mut sent: u64 = 0;
        for byte in BufReader::new(source).bytes() {
            let byte = byte?;
            self.retry
                .write_accepted(self.link, &[byte])?;
            sent += 1;
        }

        debug!("Transmitted {sent} byte(s)");
        self.link.close();
        Ok(sent)
    }
}
