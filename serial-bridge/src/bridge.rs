//! Bidirectional pass-through between standard streams and a serial link.
//!
//! [`InteractiveBridge`] runs a single-threaded polling loop. Each iteration
//! moves at most one byte in each direction and then checks the
//! [`CancelToken`]. Cancellation is cooperative, so a request is only seen
//! between iterations.

use {
    crate::{
        cancel::CancelToken,
        error::{Error, Result},
        port::Transport,
        terminal::TerminalMode,
    },
    log::{debug, trace, warn},
    std::io::{self, Read, Write},
};

/// Lifecycle of a bridge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Copying bytes in both directions.
    Running,
    /// Stopped. Terminal restored and link closed.
    Cancelled,
}

/// Copies bytes between an input/output pair and a [`Transport`].
///
/// Bytes typed on `input` get exactly one write attempt each. A send the
/// link does not accept is dropped. Bytes arriving from the link are written
/// to `output` one at a time and flushed immediately.
pub struct InteractiveBridge<R, W> {
    input: R,
    output: W,
    cancel: CancelToken,
    state: BridgeState,
}

impl<R: Read, W: Write> InteractiveBridge<R, W> {
    /// Create a bridge that stops once `cancel` is triggered.
    pub fn new(input: R, output: W, cancel: CancelToken) -> Self {
        Self {
            input,
            output,
            cancel,
            state: BridgeState::Running,
        }
    }

    /// Current state.
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Give back the input and output streams.
    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Open `port` on `link`, switch `terminal` to raw mode and pump bytes
    /// until cancelled.
    ///
    /// However the loop ends, by cancellation or by a link fault, the
    /// terminal is restored once and then the link is closed once.
    pub fn run<T, M>(&mut self, link: &mut T, port: &str, terminal: &mut M) -> Result<()>
    where
        T: Transport + ?Sized,
        M: TerminalMode,
    {
        link.open(port)?;
        self.attach(link, terminal)
    }

    /// Like [`run`](Self::run), for a link the caller has already opened.
    ///
    /// Fails with [`Error::NotOpen`] if `link` is closed. The link is closed
    /// when the session ends.
    pub fn attach<T, M>(&mut self, link: &mut T, terminal: &mut M) -> Result<()>
    where
        T: Transport + ?Sized,
        M: TerminalMode,
    {
        if !link.is_open() {
            return Err(Error::NotOpen);
        }

        let snapshot = match terminal.engage() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                link.close();
                return Err(e);
            },
        };
        let guard = RestoreGuard {
            terminal,
            snapshot: Some(snapshot),
        };

        self.state = BridgeState::Running;
        debug!("Bridge running on {}", link.path().unwrap_or("?"));
        let outcome = self.pump(link);
        self.state = BridgeState::Cancelled;
        debug!("Bridge stopped");

        let restored = guard.finish();
        link.close();
        outcome.and(restored)
    }

    fn pump<T: Transport + ?Sized>(&mut self, link: &mut T) -> Result<()> {
        let mut byte = [0u8; 1];
        while !self.cancel.is_cancelled() {
            if self.next_input(&mut byte)? {
                match link.write(&byte) {
                    Ok(0) => trace!("Link busy, dropped input byte {:#04x}", byte[0]),
                    Ok(_) => {},
                    Err(e) => warn!("Dropped input byte {:#04x}: {e}", byte[0]),
                }
            }

            if link.read(&mut byte)? == 1 {
                self.forward(byte[0])?;
            }
        }
        Ok(())
    }

    /// Take one byte from the input if one is ready.
    fn next_input(&mut self, byte: &mut [u8; 1]) -> Result<bool> {
        match self.input.read(byte) {
            Ok(n) => Ok(n == 1),
            Err(ref e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(false)
            },
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Write one received byte to the output.
    ///
    /// Standard output may share a non-blocking file description with raw
    /// standard input, so "would block" is retried here instead of failing.
    fn forward(&mut self, byte: u8) -> Result<()> {
        loop {
            match self.output.write(&[byte]) {
                Ok(0) => return Err(Error::Io(io::ErrorKind::WriteZero.into())),
                Ok(_) => break,
                Err(ref e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) => {},
                Err(e) => return Err(Error::Io(e)),
            }
        }
        loop {
            match self.output.flush() {
                Ok(()) => return Ok(()),
                Err(ref e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) => {},
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

/// Restores a raw-mode snapshot exactly once: explicitly via `finish`, or
/// on drop if the session unwinds.
struct RestoreGuard<'m, M: TerminalMode> {
    terminal: &'m mut M,
    snapshot: Option<M::Snapshot>,
}

impl<M: TerminalMode> RestoreGuard<'_, M> {
    fn finish(mut self) -> Result<()> {
        match self.snapshot.take() {
            Some(snapshot) => self.terminal.restore(snapshot),
            None => Ok(()),
        }
    }
}

impl<M: TerminalMode> Drop for RestoreGuard<'_, M> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            let _ = self.terminal.restore(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockTransport;

    /// Terminal double counting engage/restore calls.
    #[derive(Default)]
    struct CountingTerminal {
        engaged: usize,
        restored: usize,
        fail_engage: bool,
    }

    impl TerminalMode for CountingTerminal {
        type Snapshot = ();

        fn engage(&mut self) -> Result<()> {
            if self.fail_engage {
                return Err(Error::Terminal(io::ErrorKind::Unsupported.into()));
            }
            self.engaged += 1;
            Ok(())
        }

        fn restore(&mut self, (): ()) -> Result<()> {
            self.restored += 1;
            Ok(())
        }
    }

    /// Input that reports "no data" and cancels after a number of polls.
    struct CancelAfter {
        polls: usize,
        cancel: CancelToken,
    }

    impl Read for CancelAfter {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            if self.polls == 0 {
                self.cancel.cancel();
            } else {
                self.polls -= 1;
            }
            Err(io::ErrorKind::WouldBlock.into())
        }
    }

    #[test]
    fn test_pre_cancelled_bridge_restores_and_closes_once() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut link = MockTransport::new();
        let mut terminal = CountingTerminal::default();

        let mut bridge = InteractiveBridge::new(io::empty(), Vec::new(), cancel);
        bridge
            .run(&mut link, "MOCK0", &mut terminal)
            .unwrap();

        assert_eq!(bridge.state(), BridgeState::Cancelled);
        assert_eq!(terminal.engaged, 1);
        assert_eq!(terminal.restored, 1);
        assert_eq!(link.close_calls(), 1);
        assert!(!link.is_open());
    }

    #[test]
    fn test_forwards_link_bytes_to_output() {
        let cancel = CancelToken::new();
        let mut link = MockTransport::new();
        link.enqueue_read(b"hey");
        let mut terminal = CountingTerminal::default();

        let input = CancelAfter {
            polls: 3,
            cancel: cancel.clone(),
        };
        let mut bridge = InteractiveBridge::new(input, Vec::new(), cancel);
        bridge
            .run(&mut link, "MOCK0", &mut terminal)
            .unwrap();

        let (_, output) = bridge.into_parts();
        assert_eq!(output, b"hey");
    }

    #[test]
    fn test_open_failure_skips_raw_mode() {
        let mut link = MockTransport::new().with_unavailable("MISSING");
        let mut terminal = CountingTerminal::default();

        let mut bridge = InteractiveBridge::new(io::empty(), io::sink(), CancelToken::new());
        let err = bridge
            .run(&mut link, "MISSING", &mut terminal)
            .unwrap_err();

        assert!(matches!(err, Error::Open { .. }));
        assert_eq!(terminal.engaged, 0);
        assert_eq!(terminal.restored, 0);
    }

    #[test]
    fn test_attach_requires_open_link() {
        let mut link = MockTransport::new();
        let mut terminal = CountingTerminal::default();

        let mut bridge = InteractiveBridge::new(io::empty(), io::sink(), CancelToken::new());
        let err = bridge
            .attach(&mut link, &mut terminal)
            .unwrap_err();

        assert!(matches!(err, Error::NotOpen));
        assert_eq!(terminal.engaged, 0);
    }

    #[test]
    fn test_attach_closes_caller_opened_link() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut link = MockTransport::new();
        link.open("MOCK0").unwrap();
        let mut terminal = CountingTerminal::default();

        let mut bridge = InteractiveBridge::new(io::empty(), io::sink(), cancel);
        bridge
            .attach(&mut link, &mut terminal)
            .unwrap();

        assert_eq!(link.open_calls(), 1);
        assert_eq!(link.close_calls(), 1);
        assert_eq!(terminal.restored, 1);
    }

    #[test]
    fn test_engage_failure_closes_link() {
        let mut link = MockTransport::new();
        let mut terminal = CountingTerminal {
            fail_engage: true,
            ..CountingTerminal::default()
        };

        let mut bridge = InteractiveBridge::new(io::empty(), io::sink(), CancelToken::new());
        let err = bridge
            .run(&mut link, "MOCK0", &mut terminal)
            .unwrap_err();

        assert!(matches!(err, Error::Terminal(_)));
        assert_eq!(terminal.restored, 0);
        assert!(!link.is_open());
    }
}
