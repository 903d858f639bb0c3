//! Raw terminal mode for interactive sessions.
//!
//! On POSIX systems [`RawModeController`] snapshots the termios attributes
//! and file status flags of the process's standard input, then switches it to
//! a raw, non-blocking configuration. Restoring reapplies both exactly as
//! captured. Windows has no controlling-terminal line discipline to manage,
//! so engaging there is a no-op.

use crate::error::Result;

/// Something that can switch a terminal into raw mode and back.
///
/// The snapshot returned by [`engage`](Self::engage) is consumed by
/// [`restore`](Self::restore), so one engagement is restored at most once.
pub trait TerminalMode {
    /// State captured before entering raw mode.
    type Snapshot;

    /// Capture the current state and enter raw mode.
    fn engage(&mut self) -> Result<Self::Snapshot>;

    /// Return to the captured state.
    fn restore(&mut self, snapshot: Self::Snapshot) -> Result<()>;
}

/// Options for [`RawModeController`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawModeSettings {
    /// Leave signal-generating characters (Ctrl-C, Ctrl-\) active so they
    /// still raise interrupts instead of reaching the input stream as bytes.
    pub keep_signals: bool,
}

/// Raw mode controller for the process's standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawModeController {
    settings: RawModeSettings,
}

impl RawModeController {
    /// Create a controller with the given settings.
    pub fn new(settings: RawModeSettings) -> Self {
        Self { settings }
    }

    /// The settings applied on [`engage`](TerminalMode::engage).
    pub fn settings(&self) -> RawModeSettings {
        self.settings
    }
}

#[cfg(unix)]
pub use self::unix::TerminalSnapshot;

#[cfg(not(unix))]
pub use self::other::TerminalSnapshot;

#[cfg(unix)]
mod unix {
    use {
        super::{RawModeController, TerminalMode},
        crate::error::{Error, Result},
        log::debug,
        rustix::{
            fs::{OFlags, fcntl_getfl, fcntl_setfl},
            io::Errno,
            termios::{
                ControlModes, InputModes, LocalModes, OptionalActions, OutputModes,
                SpecialCodeIndex, Termios, tcgetattr, tcsetattr,
            },
        },
        std::os::fd::{AsFd, BorrowedFd, OwnedFd},
    };

    fn terminal_err(errno: Errno) -> Error {
        Error::Terminal(errno.into())
    }

    /// Terminal state captured by [`RawModeController::engage_fd`].
    ///
    /// `termios` is `None` when the descriptor is not a terminal (a pipe or
    /// file); only the file status flags are managed then.
    pub struct TerminalSnapshot {
        fd: OwnedFd,
        termios: Option<Termios>,
        flags: OFlags,
    }

    impl std::fmt::Debug for TerminalSnapshot {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("TerminalSnapshot")
                .field("fd", &self.fd)
                .field("terminal", &self.termios.is_some())
                .field("flags", &self.flags)
                .finish()
        }
    }

    impl TerminalSnapshot {
        /// Attributes captured before raw mode, if the descriptor is a terminal.
        pub fn termios(&self) -> Option<&Termios> {
            self.termios
                .as_ref()
        }
    }

    impl RawModeController {
        /// Put the terminal behind `fd` into raw, non-blocking mode.
        pub fn engage_fd<Fd: AsFd>(&self, fd: Fd) -> Result<TerminalSnapshot> {
            self.engage_fd_with(fd, |fd, flags| fcntl_setfl(fd, flags))
        }

        /// [`engage_fd`](Self::engage_fd) with the file-flag update supplied
        /// by the caller. If that update fails, the original attributes are
        /// put back before the error is returned.
        pub(super) fn engage_fd_with<Fd, S>(
            &self,
            fd: Fd,
            set_flags: S,
        ) -> Result<TerminalSnapshot>
        where
            Fd: AsFd,
            S: FnOnce(BorrowedFd<'_>, OFlags) -> rustix::io::Result<()>,
        {
            let fd = fd
                .as_fd()
                .try_clone_to_owned()
                .map_err(Error::Terminal)?;

            let flags = fcntl_getfl(&fd).map_err(terminal_err)?;
            let termios = match tcgetattr(&fd) {
                Ok(termios) => Some(termios),
                Err(Errno::NOTTY) => {
                    debug!("Input is not a terminal, leaving line discipline alone");
                    None
                },
                Err(e) => return Err(terminal_err(e)),
            };

            if let Some(original) = &termios {
                let raw = self.raw_attributes(original);
                tcsetattr(&fd, OptionalActions::Now, &raw).map_err(terminal_err)?;
            }
            if let Err(e) = set_flags(fd.as_fd(), flags | OFlags::NONBLOCK) {
                if let Some(original) = &termios {
                    let _ = tcsetattr(&fd, OptionalActions::Now, original);
                }
                return Err(terminal_err(e));
            }

            Ok(TerminalSnapshot {
                fd,
                termios,
                flags,
            })
        }

        /// Reapply a snapshot, discarding input typed while in raw mode.
        pub fn restore_snapshot(&self, snapshot: TerminalSnapshot) -> Result<()> {
            let TerminalSnapshot { fd, termios, flags } = snapshot;
            if let Some(original) = &termios {
                tcsetattr(&fd, OptionalActions::Flush, original).map_err(terminal_err)?;
            }
            fcntl_setfl(&fd, flags).map_err(terminal_err)?;
            Ok(())
        }

        fn raw_attributes(&self, original: &Termios) -> Termios {
            let mut raw = original.clone();

            raw.local_modes &= !(LocalModes::ICANON | LocalModes::IEXTEN | LocalModes::ECHO);
            if !self.settings().keep_signals {
                raw.local_modes &= !LocalModes::ISIG;
            }
            raw.input_modes &= !(InputModes::ICRNL | InputModes::ISTRIP | InputModes::IXON);
            raw.control_modes &= !(ControlModes::CSIZE | ControlModes::PARENB);
            raw.control_modes |= ControlModes::CS8;
            raw.output_modes &= !OutputModes::OPOST;

            // Reads return at once with whatever is buffered.
            raw.special_codes[SpecialCodeIndex::VMIN] = 0;
            raw.special_codes[SpecialCodeIndex::VTIME] = 0;
            raw
        }
    }

    impl TerminalMode for RawModeController {
        type Snapshot = TerminalSnapshot;

        fn engage(&mut self) -> Result<TerminalSnapshot> {
            self.engage_fd(std::io::stdin())
        }

        fn restore(&mut self, snapshot: TerminalSnapshot) -> Result<()> {
            self.restore_snapshot(snapshot)
        }
    }
}

#[cfg(not(unix))]
mod other {
    use super::{RawModeController, TerminalMode};
    use crate::error::Result;

    /// Empty snapshot: there is no terminal state to capture on this platform.
    #[derive(Debug, Default)]
    pub struct TerminalSnapshot {
        _private: (),
    }

    impl TerminalMode for RawModeController {
        type Snapshot = TerminalSnapshot;

        fn engage(&mut self) -> Result<TerminalSnapshot> {
            Ok(TerminalSnapshot::default())
        }

        fn restore(&mut self, _snapshot: TerminalSnapshot) -> Result<()> {
            Ok(())
        }
    }
}
