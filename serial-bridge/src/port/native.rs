//! Native serial link built on the `serialport` crate.
//!
//! The handle type is chosen at compile time: `TTYPort` on POSIX systems and
//! `COMPort` on Windows. Both are opened with the fixed 8N1 format and a
//! timeout short enough that a read with nothing pending comes straight back.

use {
    crate::{
        config::BAUD_RATE,
        error::{Error, Result, is_no_progress},
        port::Transport,
    },
    log::{debug, trace},
    serialport::{DataBits, FlowControl, Parity, StopBits},
    std::{
        io::{Read, Write},
        time::Duration,
    },
};

#[cfg(unix)]
type NativeHandle = serialport::TTYPort;

#[cfg(windows)]
type NativeHandle = serialport::COMPort;

/// Poll timeout used for every read and write.
///
/// POSIX polls the descriptor with a zero timeout. Windows maps a zero
/// timeout to "wait forever" for writes, so it gets the smallest non-zero
/// value instead.
#[cfg(unix)]
const IO_TIMEOUT: Duration = Duration::ZERO;

#[cfg(windows)]
const IO_TIMEOUT: Duration = Duration::from_millis(1);

struct Link {
    handle: NativeHandle,
    path: String,
}

/// An owned serial connection holding at most one open link.
///
/// Reopening is allowed at any time. Opening a different path only replaces
/// the current link once the new one is up, so a failed open leaves the old
/// link usable. Reopening the path that is already open closes it first,
/// because Windows refuses a second handle to the same COM port.
#[derive(Default)]
pub struct Connection {
    link: Option<Link>,
}

impl Connection {
    /// Create a connection with no link open.
    pub const fn new() -> Self {
        Self { link: None }
    }

    /// Create a connection and open `path` on it.
    pub fn open_path(path: &str) -> Result<Self> {
        let mut connection = Self::new();
        connection.open(path)?;
        Ok(connection)
    }

    fn open_handle(path: &str) -> Result<NativeHandle> {
        #[cfg_attr(not(unix), allow(unused_mut))]
        let mut handle = serialport::new(path, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(IO_TIMEOUT)
            .open_native()
            .map_err(|e| Error::open(path, e))?;

        // serialport takes TIOCEXCL by default; a plain open(2) does not.
        #[cfg(unix)]
        {
            handle
                .set_exclusive(false)
                .map_err(|e| Error::open(path, e))?;
            set_nonblocking(&handle).map_err(|e| Error::open(path, e))?;
        }

        Ok(handle)
    }
}

/// Put the descriptor behind `handle` into `O_NONBLOCK`.
///
/// serialport clears the flag once the port is configured, which makes a
/// write sit in the kernel until the whole buffer is drained. With the flag
/// set, a full output queue yields a partial count or `EAGAIN` instead.
#[cfg(unix)]
fn set_nonblocking(handle: &NativeHandle) -> rustix::io::Result<()> {
    use {
        rustix::fs::{OFlags, fcntl_getfl, fcntl_setfl},
        std::os::fd::{AsRawFd, BorrowedFd},
    };

    // SAFETY: the descriptor is owned by `handle`, which outlives this borrow.
    #[allow(unsafe_code)]
    let fd = unsafe { BorrowedFd::borrow_raw(handle.as_raw_fd()) };
    let flags = fcntl_getfl(fd)?;
    fcntl_setfl(fd, flags | OFlags::NONBLOCK)
}

impl Transport for Connection {
    fn open(&mut self, path: &str) -> Result<()> {
        if self.path() == Some(path) {
            self.close();
        }

        let handle = Self::open_handle(path)?;
        debug!("Opened {path} ({})", crate::config::link_summary());

        if let Some(previous) = self.link.replace(Link {
            handle,
            path: path.to_string(),
        }) {
            debug!("Closed {}", previous.path);
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let link = self
            .link
            .as_mut()
            .ok_or(Error::NotOpen)?;

        match link.handle.write(data) {
            Ok(n) => {
                trace!("Wrote {n}/{} byte(s) to {}", data.len(), link.path);
                Ok(n)
            },
            Err(ref e) if is_no_progress(e) => Ok(0),
            Err(e) => Err(Error::Write(e)),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let link = self
            .link
            .as_mut()
            .ok_or(Error::NotOpen)?;

        match link.handle.read(buf) {
            Ok(n) => {
                if n > 0 {
                    trace!("Read {n} byte(s) from {}", link.path);
                }
                Ok(n)
            },
            Err(ref e) if is_no_progress(e) => Ok(0),
            Err(e) => Err(Error::Read(e)),
        }
    }

    fn close(&mut self) {
        // Dropping the handle closes the descriptor.
        if let Some(link) = self.link.take() {
            debug!("Closed {}", link.path);
        }
    }

    fn is_open(&self) -> bool {
        self.link.is_some()
    }

    fn path(&self) -> Option<&str> {
        self.link
            .as_ref()
            .map(|link| link.path.as_str())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("path", &self.path())
            .finish()
    }
}
