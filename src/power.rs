use crate::sysfs::{parse_signed, read_value_at, ValueKind};
use crate::Error;
use std::fs::File;
use std::path::Path;

/// Convert an instantaneous power reading from microwatt to watt
pub fn microwatts_to_watts(microwatts: u64) -> f64 {
    microwatts as f64 / 1_000_000.0
}

/// Read an instantaneous power counter and return the value in watt
///
/// The file is opened and closed within the call. Negative readings are rejected.
pub fn read_power(path: impl AsRef<Path>) -> Result<f64, Error> {
    let path = path.as_ref();
    let handle = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = read_value_at(&handle, path)?;
    let microwatts = parse_signed(&raw, ValueKind::Power, path)?;
    if microwatts < 0 {
        return Err(Error::NegativePower(microwatts));
    }

    Ok(microwatts_to_watts(microwatts as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_sensor(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("power1_average");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_microwatts_to_watts() {
        assert_eq!(microwatts_to_watts(15_250_000), 15.25);
        assert_eq!(microwatts_to_watts(20_000_000), 20.0);
        assert_eq!(microwatts_to_watts(0), 0.0);
    }

    #[test]
    fn test_read_power() {
        let (_dir, path) = write_sensor("15250000\n");
        assert_eq!(read_power(&path).unwrap(), 15.25);
    }

    #[test]
    fn test_read_power_negative() {
        let (_dir, path) = write_sensor("-5\n");
        assert!(matches!(read_power(&path), Err(Error::NegativePower(-5))));
    }

    #[test]
    fn test_read_power_garbage() {
        let (_dir, path) = write_sensor("N/A\n");
        assert!(matches!(
            read_power(&path),
            Err(Error::Parse {
                kind: ValueKind::Power,
                ..
            })
        ));
    }

    #[test]
    fn test_read_power_empty() {
        let (_dir, path) = write_sensor("");
        assert!(matches!(read_power(&path), Err(Error::EmptyRead(_))));
    }

    #[test]
    fn test_read_power_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_power(dir.path().join("power1_average")),
            Err(Error::Io { .. })
        ));
    }
}
