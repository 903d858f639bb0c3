//! serial-bridge CLI - send and receive raw bytes over a serial port.
//!
//! ## Features
//!
//! - List serial ports by name substring
//! - Send a string or a file to a port
//! - Receive a fixed number of bytes to stdout
//! - Interactive terminal mode (keyboard to port, port to screen)
//!
//! The legacy single-dash forms (`-s`, `-t`, `-tf`, `-r`, `-rw`) are accepted
//! alongside the subcommand names.

use {
    anyhow::Result,
    clap::{Arg, ArgAction, CommandFactory, FromArgMatches, Parser, Subcommand},
    console::style,
    env_logger::Env,
    log::debug,
    serial_bridge::CancelToken,
    std::{env, ffi::OsString, path::PathBuf, process::ExitCode},
    thiserror::Error,
};

mod commands;

use commands::{
    list::cmd_list,
    receive::cmd_receive,
    send::{cmd_send, cmd_send_file},
    terminal::cmd_terminal,
};

/// Version line printed by `-v` / `--version`.
#[cfg(windows)]
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (Windows)");

/// Version line printed by `-v` / `--version`.
#[cfg(not(windows))]
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (Unix)");

/// Exit status for an operation stopped by Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

/// Failures that map to a dedicated exit status.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// The user interrupted an operation before it finished.
    #[error("Interrupted")]
    Cancelled,
}

/// serial-bridge - send and receive raw bytes over a serial port.
///
/// The link always runs at 19200 baud, 8 data bits, no parity, 1 stop bit,
/// no flow control.
#[derive(Parser)]
#[command(name = "serial-bridge")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(
    after_help = "Legacy forms: -s [FILTER], -t PORT DATA, -tf PORT FILE, -r PORT LENGTH, -rw PORT"
)]
struct Cli {
    /// Verbose output level (--verbose, --verbose --verbose for more detail).
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress status lines).
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// List serial ports whose names contain FILTER.
    #[command(short_flag = 's')]
    List {
        /// Substring to match (platform default if omitted).
        filter: Option<String>,
    },

    /// Send a string to a port.
    #[command(short_flag = 't')]
    Send {
        /// Serial port to use.
        port: String,

        /// Data to send, byte for byte.
        #[arg(allow_hyphen_values = true)]
        data: String,
    },

    /// Stream a file to a port byte by byte (legacy: -tf).
    SendFile {
        /// Serial port to use.
        port: String,

        /// File to send.
        file: PathBuf,
    },

    /// Receive LENGTH bytes from a port and write them to stdout.
    #[command(short_flag = 'r')]
    Receive {
        /// Serial port to use.
        port: String,

        /// Number of bytes to wait for.
        length: usize,
    },

    /// Connect stdin and stdout to a port until Ctrl-C (legacy: -rw).
    Terminal {
        /// Serial port to use.
        port: String,
    },
}

/// Build the clap command with `-v` as the version flag.
fn build_command() -> clap::Command {
    Cli::command()
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .help("Print version and platform")
                .action(ArgAction::Version),
        )
}

/// Rewrite the two-letter legacy flags into subcommand names.
///
/// Only the first token that is not a global option is considered, so data
/// or file names that happen to read `-tf` / `-rw` are left alone.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args: Vec<OsString> = args
        .into_iter()
        .collect();
    for arg in args
        .iter_mut()
        .skip(1)
    {
        let replacement = match arg.to_str() {
            Some("-tf") => "send-file",
            Some("-rw") => "terminal",
            Some("--") => break,
            Some(flag) if flag.starts_with('-') => continue,
            _ => break,
        };
        *arg = OsString::from(replacement);
        break;
    }
    args
}

/// Exit status for a failed command.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CliError>() {
        Some(CliError::Cancelled) => EXIT_CANCELLED,
        None => 1,
    }
}

fn main() -> ExitCode {
    let raw_args = normalize_args(env::args_os());

    let stderr_is_tty = console::Term::stderr().is_term();
    if env::var_os("NO_COLOR").is_some() || !stderr_is_tty {
        console::set_colors_enabled_stderr(false);
    }

    if raw_args.len() <= 1 {
        let _ = build_command().print_help();
        return ExitCode::SUCCESS;
    }

    let cli = build_command()
        .try_get_matches_from(raw_args)
        .and_then(|matches| Cli::from_arg_matches(&matches))
        .unwrap_or_else(|e| e.exit());

    // Setup logging based on verbosity
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();

    debug!(
        "serial-bridge v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code(&err);
            if code != EXIT_CANCELLED || !cli.quiet {
                eprintln!("{} {err:#}", style("Error:").red().bold());
            }
            ExitCode::from(code)
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::List { filter } => cmd_list(filter.as_deref()),
        Commands::Send { port, data } => cmd_send(port, data, cli.quiet),
        Commands::SendFile { port, file } => cmd_send_file(port, file, cli.quiet),
        Commands::Receive { port, length } => cmd_receive(port, *length, &interrupt_token()?),
        Commands::Terminal { port } => cmd_terminal(port, interrupt_token()?, cli.quiet),
    }
}

/// A token that Ctrl-C (and `Ctrl-\` on Unix) cancels.
fn interrupt_token() -> Result<CancelToken> {
    let token = CancelToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())?;
    #[cfg(unix)]
    cancel_on_quit(&token)?;
    Ok(token)
}

/// Cancel `token` on SIGQUIT instead of dumping core.
///
/// The terminal session keeps signal characters enabled, so `Ctrl-\` must end
/// it through the same path as Ctrl-C for raw mode to be undone.
#[cfg(unix)]
fn cancel_on_quit(token: &CancelToken) -> Result<()> {
    signal_hook::flag::register(signal_hook::consts::SIGQUIT, token.shared_flag())?;
    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        let args = normalize_args(
            args.iter()
                .map(OsString::from),
        );
        build_command()
            .try_get_matches_from(args)
            .and_then(|matches| Cli::from_arg_matches(&matches))
    }

    #[test]
    fn test_cli_command_is_valid() {
        build_command().debug_assert();
    }

    #[test]
    fn test_short_list_without_filter() {
        let cli = parse(&["serial-bridge", "-s"]).unwrap();
        assert!(matches!(cli.command, Commands::List { filter: None }));
    }

    #[test]
    fn test_list_with_filter() {
        let cli = parse(&["serial-bridge", "list", "ttyUSB"]).unwrap();
        if let Commands::List { filter } = cli.command {
            assert_eq!(filter.as_deref(), Some("ttyUSB"));
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn test_short_send_keeps_data_verbatim() {
        let cli = parse(&["serial-bridge", "-t", "/dev/ttyS0", "AT+GMR  x"]).unwrap();
        if let Commands::Send { port, data } = cli.command {
            assert_eq!(port, "/dev/ttyS0");
            assert_eq!(data, "AT+GMR  x");
        } else {
            panic!("expected send");
        }
    }

    #[test]
    fn test_legacy_send_file_flag() {
        let cli = parse(&["serial-bridge", "-tf", "COM3", "payload.bin"]).unwrap();
        if let Commands::SendFile { port, file } = cli.command {
            assert_eq!(port, "COM3");
            assert_eq!(file, PathBuf::from("payload.bin"));
        } else {
            panic!("expected send-file");
        }
    }

    #[test]
    fn test_legacy_terminal_flag_after_global_option() {
        let cli = parse(&["serial-bridge", "-q", "-rw", "/dev/ttyUSB0"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Terminal { .. }));
    }

    #[test]
    fn test_short_receive_parses_length() {
        let cli = parse(&["serial-bridge", "-r", "/dev/ttyUSB0", "16"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Receive { length: 16, .. }
        ));
    }

    #[test]
    fn test_receive_rejects_non_numeric_length() {
        let err = parse(&["serial-bridge", "receive", "/dev/ttyUSB0", "lots"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_lowercase_v_prints_version() {
        let err = parse(&["serial-bridge", "-v"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_verbose_is_counted() {
        let cli = parse(&["serial-bridge", "--verbose", "--verbose", "-s"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_normalize_leaves_later_tokens_alone() {
        let args = normalize_args(
            ["serial-bridge", "send", "COM1", "-rw"]
                .iter()
                .map(OsString::from),
        );
        assert_eq!(args[1], "send");
        assert_eq!(args[3], "-rw");
    }

    #[cfg(unix)]
    #[test]
    fn test_quit_signal_cancels_token() {
        let token = CancelToken::new();
        cancel_on_quit(&token).unwrap();

        signal_hook::low_level::raise(signal_hook::consts::SIGQUIT).unwrap();

        assert!(token.is_cancelled());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&CliError::Cancelled.into()), EXIT_CANCELLED);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}
