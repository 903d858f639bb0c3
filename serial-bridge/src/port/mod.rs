//! Transport abstraction for cross-platform serial links.
//!
//! This module provides a unified [`Transport`] trait that hides the two
//! native I/O models behind one behavioral contract:
//!
//! - **POSIX** (Linux, macOS, BSD): a termios-configured descriptor polled
//!   without blocking
//! - **Windows**: a COM handle with short timeouts
//!
//! ## Architecture
//!
//! ```text
//! +-------------------+     +-------------------+
//! | InteractiveBridge |     |  FileTransmitter  |
//! +---------+---------+     +---------+---------+
//!           |                         |
//!           v                         v
//! +---------+-------------------------+---------+
//! |               Transport trait               |
//! +---------+-------------------------+---------+
//!           |                         |
//!           v                         v
//! +---------+---------+     +---------+---------+
//! |    Connection     |     |   MockTransport   |
//! |   (serialport)    |     |    (in-memory)    |
//! +-------------------+     +-------------------+
//!   TTYPort / COMPort             tests
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use serial_bridge::port::Transport;
//!
//! fn poll_once<T: Transport>(link: &mut T) -> serial_bridge::Result<()> {
//!     let accepted = link.write(b"AT\r")?;
//!     println!("accepted {accepted} byte(s)");
//!
//!     let mut buf = [0u8; 32];
//!     let n = link.read(&mut buf)?;
//!     println!("received: {:?}", &buf[..n]);
//!     Ok(())
//! }
//! ```

pub mod enumerate;
pub mod mock;
#[cfg(feature = "native")]
pub mod native;

use crate::error::Result;

/// One serial link with non-blocking, count-returning I/O.
///
/// A transport holds at most one live link. Zero counts are progress
/// reports, not failures: `read` returns `Ok(0)` when nothing has arrived
/// and `write` returns `Ok(0)` when nothing could be accepted yet. Callers
/// resubmit whatever was not accepted.
pub trait Transport {
    /// Open `path`, replacing any link that is already open.
    ///
    /// Fails with [`Error::Open`](crate::Error::Open) when the device is
    /// missing or inaccessible.
    fn open(&mut self, path: &str) -> Result<()>;

    /// Send as much of `data` as the link accepts right now.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read whatever is available, up to `buf.len()` bytes, without blocking.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Release the link. Does nothing when no link is open.
    fn close(&mut self);

    /// Whether a link is currently open.
    fn is_open(&self) -> bool;

    /// Path of the open link, if any.
    fn path(&self) -> Option<&str>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn open(&mut self, path: &str) -> Result<()> {
        (**self).open(path)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn path(&self) -> Option<&str> {
        (**self).path()
    }
}

pub use enumerate::{DevDirectory, PlatformPorts, PortEnumerator, list_ports};
pub use mock::MockTransport;
#[cfg(feature = "native")]
pub use native::Connection;
