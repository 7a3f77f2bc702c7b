use crate::sysfs::{parse_unsigned, read_value_at, ValueKind};
use crate::Error;
use log::warn;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

/// Time between the two counter reads
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

const MICRO: f64 = 1_000_000.0;

/// An open cumulative energy counter, in microjoules
pub struct EnergyCounter {
    handle: File,
    path: PathBuf,
}

impl EnergyCounter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let handle = OpenOptions::new()
            .read(true)
            .write(false)
            .open(&path)
            .map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;

        Ok(EnergyCounter { handle, path })
    }

    /// Read the current counter value in microjoules
    pub fn read(&self) -> Result<u64, Error> {
        let raw = read_value_at(&self.handle, &self.path)?;
        parse_unsigned(&raw, ValueKind::Energy, &self.path)
    }

    /// Read the average power draw in watt
    ///
    /// Note that this method will block for ~10ms
    pub fn sample(&self) -> Result<f64, Error> {
        self.sample_with(|| sleep(SAMPLE_INTERVAL))
    }

    /// Read the average power draw in watt, calling `pause` between the two reads
    ///
    /// The result is always computed over the nominal [`SAMPLE_INTERVAL`],
    /// regardless of how long `pause` actually took.
    pub fn sample_with<F: FnOnce()>(&self, pause: F) -> Result<f64, Error> {
        let start = self.read()?;
        pause();
        let end = self.read()?;

        if end < start {
            warn!(
                "Energy counter {} went backwards ({} -> {})",
                self.path.display(),
                start,
                end
            );
        }

        Ok(energy_to_power(start, end))
    }
}

/// Average power in watt for two microjoule readings taken [`SAMPLE_INTERVAL`] apart
///
/// Counter wraparound within the interval is not handled.
pub fn energy_to_power(start: u64, end: u64) -> f64 {
    let joules = end.wrapping_sub(start) as f64 / MICRO;
    joules / SAMPLE_INTERVAL.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn assert_watts(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}W, got {}W",
            expected,
            actual
        );
    }

    #[test]
    fn test_energy_to_power() {
        assert_watts(energy_to_power(1_000_000, 1_050_000), 5.0);
        assert_watts(energy_to_power(0, 10_000), 1.0);
        assert_watts(energy_to_power(42, 42), 0.0);
    }

    #[test]
    fn test_energy_to_power_is_linear() {
        let base = energy_to_power(0, 1_000);
        for factor in 1..10u64 {
            let start = 123_456_789;
            assert_watts(
                energy_to_power(start, start + factor * 1_000),
                base * factor as f64,
            );
        }
    }

    #[test]
    fn test_sample_with_advancing_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energy17_input");
        fs::write(&path, "1000000\n").unwrap();

        let counter = EnergyCounter::open(&path).unwrap();
        let power = counter
            .sample_with(|| fs::write(&path, "1050000\n").unwrap())
            .unwrap();
        assert_watts(power, 5.0);
    }

    #[test]
    fn test_sample_static_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energy17_input");
        fs::write(&path, "5000\n").unwrap();

        let counter = EnergyCounter::open(&path).unwrap();
        assert_watts(counter.sample().unwrap(), 0.0);
    }

    #[test]
    fn test_sample_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energy17_input");
        fs::write(&path, "garbage\n").unwrap();

        let counter = EnergyCounter::open(&path).unwrap();
        assert!(matches!(
            counter.sample(),
            Err(Error::Parse {
                kind: ValueKind::Energy,
                ..
            })
        ));
    }

    #[test]
    fn test_open_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            EnergyCounter::open(dir.path().join("energy17_input")),
            Err(Error::Io { .. })
        ));
    }
}
