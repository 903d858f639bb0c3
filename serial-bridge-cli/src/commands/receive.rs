//! Receive command implementation.

use {
    crate::CliError,
    anyhow::Result,
    log::debug,
    serial_bridge::{CancelToken, Connection, Transport, receive_exact},
    std::io,
};

/// Receive command implementation.
///
/// Waits for exactly `length` bytes and copies each one to stdout as it
/// arrives. Ctrl-C (via `cancel`) stops the wait early.
pub(crate) fn cmd_receive(port: &str, length: usize, cancel: &CancelToken) -> Result<()> {
    let mut connection = Connection::open_path(port)?;

    let received = receive_exact(&mut connection, length, &mut io::stdout().lock(), cancel)?;
    connection.close();

    if received < length {
        debug!("Stopped after {received} of {length} byte(s)");
        return Err(CliError::Cancelled.into());
    }
    Ok(())
}
