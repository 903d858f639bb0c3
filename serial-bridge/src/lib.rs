//! # serial-bridge
//!
//! A library for moving raw bytes between a process and a serial port.
//!
//! This crate provides the transport core used by the `serial-bridge` CLI:
//!
//! - A [`Transport`] trait with non-blocking reads and partial-write
//!   semantics, implemented natively by [`Connection`]
//! - Device-path discovery by name substring
//! - Raw terminal mode with an exactly-once restore
//! - An interactive pass-through loop with cooperative cancellation
//! - Whole-buffer, whole-file and fixed-length transfers
//!
//! The link format is fixed at build time: [`config::BAUD_RATE`] baud,
//! 8 data bits, no parity, 1 stop bit, no flow control.
//!
//! ## Features
//!
//! - `native` (default): serial ports via the `serialport` crate
//!
//! ## Example
//!
//! ```rust,no_run
//! use serial_bridge::{Connection, Transport, list_ports, send_all, RetryStrategy};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     for name in list_ports("ttyUSB") {
//!         println!("{name}");
//!     }
//!
//!     let mut connection = Connection::new();
//!     connection.open("/dev/ttyUSB0")?;
//!     send_all(&mut connection, b"hello\r\n", RetryStrategy::Spin)?;
//!
//!     let mut buf = [0u8; 64];
//!     let n = connection.read(&mut buf)?; // 0 if nothing has arrived yet
//!     println!("{:?}", &buf[..n]);
//!
//!     connection.close();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod cancel;
pub mod config;
pub mod error;
pub mod port;
pub mod terminal;
pub mod transfer;

// Re-exports for convenience
#[cfg(feature = "native")]
pub use port::Connection;
pub use {
    bridge::{BridgeState, InteractiveBridge},
    cancel::CancelToken,
    error::{Error, Result},
    port::{
        DevDirectory, MockTransport, PlatformPorts, PortEnumerator, Transport, list_ports,
    },
    terminal::{RawModeController, RawModeSettings, TerminalMode, TerminalSnapshot},
    transfer::{FileTransmitter, RetryStrategy, receive_exact, send_all},
};
