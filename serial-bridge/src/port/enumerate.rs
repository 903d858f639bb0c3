//! Device-path discovery.
//!
//! Candidates are matched by name only. Matched entries are never opened to
//! check that they really are serial devices: probing stalls for seconds on
//! some nodes (Bluetooth-backed ports in particular).

use {
    crate::config::{DEFAULT_FILTER, DEV_DIR},
    log::debug,
    std::path::{Path, PathBuf},
};

/// Lists device-path candidates.
///
/// Enumeration never fails. An empty or unreadable namespace yields an
/// empty list. Results follow the order the platform reports them in.
pub trait PortEnumerator {
    /// Every candidate whose full name contains `filter`.
    ///
    /// An empty filter matches every enumerable entry.
    fn list(&self, filter: &str) -> Vec<String>;

    /// Candidates matching the build-time [`DEFAULT_FILTER`].
    fn list_default(&self) -> Vec<String> {
        self.list(DEFAULT_FILTER)
    }
}

/// Keep only the names containing `filter`, preserving order.
fn matching<I>(names: I, filter: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    names
        .into_iter()
        .filter(|name| name.contains(filter))
        .collect()
}

/// Enumerates the entries of a device directory (`/dev` by default).
///
/// Each entry is reported as its full path, and the filter is applied to
/// that path, so `"/dev/tty"` and `"tty"` are both valid filters.
#[derive(Debug, Clone)]
pub struct DevDirectory {
    root: PathBuf,
}

impl DevDirectory {
    /// Enumerate `root` instead of the system device directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory being enumerated.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for DevDirectory {
    fn default() -> Self {
        Self::new(DEV_DIR)
    }
}

impl PortEnumerator for DevDirectory {
    fn list(&self, filter: &str) -> Vec<String> {
        let entries = match std::fs::read_dir(self.root()) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot enumerate {}: {e}", self.root().display());
                return Vec::new();
            },
        };

        let names = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| {
                self.root
                    .join(entry.file_name())
                    .to_string_lossy()
                    .into_owned()
            });
        matching(names, filter)
    }
}

/// Enumerates the ports the operating system reports through its device
/// query interface (the registry-backed COM port list on Windows).
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

#[cfg(feature = "native")]
impl PortEnumerator for SystemPorts {
    fn list(&self, filter: &str) -> Vec<String> {
        match serialport::available_ports() {
            Ok(ports) => matching(ports.into_iter().map(|p| p.port_name), filter),
            Err(e) => {
                debug!("System port query failed: {e}");
                Vec::new()
            },
        }
    }
}

/// The enumerator [`list_ports`] uses on this platform.
#[cfg(all(windows, feature = "native"))]
pub type PlatformPorts = SystemPorts;

/// The enumerator [`list_ports`] uses on this platform.
#[cfg(not(all(windows, feature = "native")))]
pub type PlatformPorts = DevDirectory;

/// List device-path candidates on this platform.
///
/// POSIX systems scan [`DEV_DIR`]. Windows asks the system port query.
pub fn list_ports(filter: &str) -> Vec<String> {
    PlatformPorts::default().list(filter)
}
