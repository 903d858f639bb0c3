//! Port listing command implementation.

use {
    anyhow::Result,
    log::debug,
    serial_bridge::{PlatformPorts, PortEnumerator, list_ports},
    std::io::{self, Write},
};

/// List ports command implementation.
///
/// Prints one port name per line on stdout and nothing else, so the output
/// can be consumed by scripts.
pub(crate) fn cmd_list(filter: Option<&str>) -> Result<()> {
    let ports = match filter {
        Some(filter) => list_ports(filter),
        None => PlatformPorts::default().list_default(),
    };
    debug!("{} port(s) match {filter:?}", ports.len());

    write_ports(&mut io::stdout().lock(), &ports)?;
    Ok(())
}

fn write_ports<W: Write>(out: &mut W, ports: &[String]) -> io::Result<()> {
    for name in ports {
        writeln!(out, "{name}")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_ports_one_per_line() {
        let mut out = Vec::new();
        write_ports(
            &mut out,
            &["/dev/ttyUSB0".to_string(), "/dev/ttyUSB1".to_string()],
        )
        .unwrap();
        assert_eq!(out, b"/dev/ttyUSB0\n/dev/ttyUSB1\n");
    }

    #[test]
    fn test_write_ports_empty_prints_nothing() {
        let mut out = Vec::new();
        write_ports(&mut out, &[]).unwrap();
        assert!(out.is_empty());
    }
}
