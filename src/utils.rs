use anyhow::Result;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::constants::{BYTES_PER_KB, MILLIS_PER_SECOND};

pub fn setup_logging(verbosity: &str) -> Result<()> {
    let level = match verbosity {
        "silent" => Level::ERROR,
        "normal" => Level::INFO,
        "verbose" => Level::DEBUG,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("polyphase_sort={}", level).parse()?);

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

pub fn file_size_bytes(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= BYTES_PER_KB as f64 && unit_index < UNITS.len() - 1 {
        size /= BYTES_PER_KB as f64;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

pub fn format_duration(millis: u64) -> String {
    let seconds = millis as f64 / MILLIS_PER_SECOND;
    if seconds < 1.0 {
        format!("{}ms", millis)
    } else if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else {
        format!("{:.1}h", seconds / 3600.0)
    }
}

/// Records per second, or zero when no time has passed.
pub fn throughput(records: u64, millis: u64) -> f64 {
    if millis == 0 {
        return 0.0;
    }
    records as f64 * MILLIS_PER_SECOND / millis as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512.00 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(30_000), "30.0s");
        assert_eq!(format_duration(90_000), "1.5m");
        assert_eq!(format_duration(3_660_000), "1.0h");
    }

    #[test]
    fn test_throughput() {
        assert_eq!(throughput(1000, 0), 0.0);
        assert_eq!(throughput(1000, 500), 2000.0);
    }

    #[test]
    fn test_file_size_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "abc\n").unwrap();
        assert_eq!(file_size_bytes(&path).unwrap(), 4);
        assert!(file_size_bytes(&dir.path().join("missing")).is_err());
    }
}
