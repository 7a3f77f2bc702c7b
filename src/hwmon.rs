use crate::Error;
use log::debug;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Default location of the kernel hardware-monitor class
pub const HWMON_ROOT: &str = "/sys/class/hwmon";

const DEVICE_PREFIX: &str = "hwmon";

/// A single hardware-monitor device, as found during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    id: String,
    name: String,
    path: PathBuf,
}

impl Device {
    /// Directory name of the device, e.g. `hwmon3`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name the driver declares for the device, e.g. `amdgpu`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path of the device directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a metric file of this device, if it exists
    pub fn metric(&self, filename: &str) -> Option<PathBuf> {
        let path = self.path.join(filename);
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }
}

/// Hardware-monitor root that devices are discovered from
///
/// Devices are enumerated fresh on every call, nothing is cached between lookups.
///
/// # Example
///
/// ```rust,no_run
/// # use cgpu_power::{hwmon::Hwmon, Error};
/// #
/// # fn main() -> Result<(), Error> {
///     let hwmon = Hwmon::default();
///     for device in hwmon.devices()? {
///         println!("{}: {}", device.id(), device.name());
///     }
///     if let Some(path) = hwmon.find("amdgpu", "power1_average")? {
///         println!("gpu power at {}", path.display());
///     }
/// #     Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Hwmon {
    root: PathBuf,
}

impl Default for Hwmon {
    fn default() -> Self {
        Hwmon::new(HWMON_ROOT)
    }
}

impl Hwmon {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Hwmon { root: root.into() }
    }

    /// Lazily enumerate devices, reading each `name` only when the device is reached
    fn scan(&self) -> Result<impl Iterator<Item = Device> + '_, Error> {
        let entries = fs::read_dir(&self.root).map_err(|source| Error::HwmonUnavailable {
            path: self.root.clone(),
            source,
        })?;

        Ok(entries.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", self.root.display(), e);
                    return None;
                }
            };
            let id = entry.file_name().to_string_lossy().into_owned();
            if !id.starts_with(DEVICE_PREFIX) {
                return None;
            }

            let path = self.root.join(&id);
            match read_name(&path.join("name")) {
                Some(name) => Some(Device { id, name, path }),
                None => {
                    debug!("Skipping {}, no readable name", path.display());
                    None
                }
            }
        }))
    }

    /// List all devices under the root in the order the filesystem yields them
    ///
    /// Devices without a readable `name` are skipped.
    pub fn devices(&self) -> Result<Vec<Device>, Error> {
        Ok(self.scan()?.collect())
    }

    /// Find the metric file `filename` of the first device named `target`
    ///
    /// Returns `None` when no device with that name exposes the requested file.
    /// If multiple devices share the name, the first one enumerated with the file wins.
    /// Devices after the match are not read.
    pub fn find(&self, target: &str, filename: &str) -> Result<Option<PathBuf>, Error> {
        for device in self.scan()? {
            if device.name != target {
                continue;
            }
            match device.metric(filename) {
                Some(path) => {
                    debug!("Found {} for {} at {}", filename, target, path.display());
                    return Ok(Some(path));
                }
                None => debug!("{} ({}) has no {}", device.id, target, filename),
            }
        }

        Ok(None)
    }
}

/// First line of a `name` file, without the line terminator
fn read_name(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut line = String::new();
    match BufReader::new(file).read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            if line.ends_with('\n') {
                line.pop();
            }
            Some(line)
        }
    }
}
