//! Send and send-file command implementations.

use {
    anyhow::{Context, Result},
    console::style,
    serial_bridge::{Connection, FileTransmitter, RetryStrategy, Transport, send_all},
    std::path::Path,
};

/// Send command implementation.
///
/// Writes the whole of `data`, resubmitting whatever the port did not accept,
/// then closes the port.
pub(crate) fn cmd_send(port: &str, data: &str, quiet: bool) -> Result<()> {
    let mut connection = Connection::open_path(port)?;

    let sent = send_all(&mut connection, data.as_bytes(), RetryStrategy::Spin)
        .with_context(|| format!("Transmission to {port} failed"))?;
    connection.close();

    if !quiet {
        eprintln!(
            "{} Sent {sent} byte(s) to {}",
            style("✓").green(),
            style(port).cyan()
        );
    }
    Ok(())
}

/// Send-file command implementation.
///
/// The port is opened before the file, so a missing port is reported first.
pub(crate) fn cmd_send_file(port: &str, file: &Path, quiet: bool) -> Result<()> {
    let mut connection = Connection::open_path(port)?;

    let sent = FileTransmitter::new(&mut connection)
        .send_file(file)
        .with_context(|| format!("Transmission to {port} failed"))?;

    if !quiet {
        eprintln!(
            "{} Sent {} ({sent} byte(s)) to {}",
            style("✓").green(),
            file.display(),
            style(port).cyan()
        );
    }
    Ok(())
}
