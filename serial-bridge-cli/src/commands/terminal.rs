//! Interactive terminal command implementation.
//!
//! Keyboard input goes to the port and port output goes to the screen until
//! Ctrl-C. Status lines are written to stderr so stdout carries only port
//! data.

use {
    anyhow::{Context, Result},
    console::style,
    serial_bridge::{
        CancelToken, Connection, InteractiveBridge, RawModeController, RawModeSettings, config,
    },
    std::io,
};

/// Run the interactive terminal.
///
/// Ctrl-C must still raise SIGINT so `cancel` gets triggered, so the raw
/// mode keeps signal characters enabled.
pub(crate) fn cmd_terminal(port: &str, cancel: CancelToken, quiet: bool) -> Result<()> {
    let mut connection = Connection::open_path(port)?;

    if !quiet {
        eprintln!(
            "{} Connection established: {} ({})",
            style("✓").green(),
            style(port).cyan(),
            config::link_summary()
        );
        eprintln!("{}", style("Close with CTRL + C").dim());
    }

    let mut terminal = RawModeController::new(RawModeSettings { keep_signals: true });
    let mut bridge = InteractiveBridge::new(io::stdin(), io::stdout(), cancel);
    let outcome = bridge
        .attach(&mut connection, &mut terminal)
        .with_context(|| format!("Session on {port} ended with an error"));

    if !quiet {
        eprintln!();
        eprintln!("{}", style("Closing..").dim());
    }
    outcome
}
