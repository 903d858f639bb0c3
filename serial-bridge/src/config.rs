//! Build-time link and discovery settings.
//!
//! Nothing here is read from the environment or from files: the serial link
//! always runs at [`BAUD_RATE`] with 8 data bits, no parity, 1 stop bit and
//! no flow control.

/// Fixed symbol rate of the serial link.
pub const BAUD_RATE: u32 = 19_200;

/// Directory scanned for device nodes on POSIX systems.
pub const DEV_DIR: &str = "/dev";

/// Default substring used when listing ports without an explicit filter.
///
/// macOS exposes each device twice (`tty.*` and `cu.*`), so the narrower
/// `tty.` keeps the list readable there.
#[cfg(target_os = "macos")]
pub const DEFAULT_FILTER: &str = "tty.";

/// Default substring used when listing ports without an explicit filter.
#[cfg(all(unix, not(target_os = "macos")))]
pub const DEFAULT_FILTER: &str = "tty";

/// Default substring used when listing ports without an explicit filter.
#[cfg(not(unix))]
pub const DEFAULT_FILTER: &str = "";

/// Platform family name reported by `--version`.
#[cfg(windows)]
pub const PLATFORM: &str = "Windows";

/// Platform family name reported by `--version`.
#[cfg(not(windows))]
pub const PLATFORM: &str = "Unix";

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Human-readable summary of the fixed link format.
pub fn link_summary() -> String {
    format!("{BAUD_RATE} baud, 8N1, no flow control")
}
