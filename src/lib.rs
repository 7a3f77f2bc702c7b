//! Read cpu and gpu power usage from linux hwmon sensors
//!
//! Cpu power is derived from the `zenergy` cumulative energy counter, sampled twice ~10ms apart,
//! gpu power is read directly from the `amdgpu` average power sensor.

pub mod energy;
pub mod hwmon;
pub mod power;
mod sysfs;

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

pub use energy::{EnergyCounter, SAMPLE_INTERVAL};
pub use hwmon::{Device, Hwmon, HWMON_ROOT};
pub use power::read_power;
pub use sysfs::ValueKind;

pub const CPU_DEVICE: &str = "zenergy";
pub const CPU_METRIC: &str = "energy17_input";
pub const GPU_DEVICE: &str = "amdgpu";
pub const GPU_METRIC: &str = "power1_average";

/// Which of the two sensors an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Cpu,
    Gpu,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sensor::Cpu => write!(f, "CPU"),
            Sensor::Gpu => write!(f, "GPU"),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to open hwmon directory {}: {source}", .path.display())]
    HwmonUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} sensor file not found.")]
    SensorNotFound(Sensor),
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read {}: no data", .0.display())]
    EmptyRead(PathBuf),
    #[error("Failed to parse {kind} value from {}", .path.display())]
    Parse { kind: ValueKind, path: PathBuf },
    #[error("Invalid negative power value: {0}uW")]
    NegativePower(i64),
    #[error("Failed to write report: {0}")]
    Output(#[source] io::Error),
}

/// Cpu and gpu power draw in watt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub cpu: f64,
    pub gpu: f64,
}

/// Struct that holds one power reading of both sensors
///
/// # Example
///
/// ```rust,no_run
/// # use cgpu_power::{Error, Hwmon, Report, SAMPLE_INTERVAL};
/// #
/// # fn main() -> Result<(), Error> {
///     let hwmon = Hwmon::default();
///     let report = Report::collect_with(&hwmon, || std::thread::sleep(SAMPLE_INTERVAL))?;
///
///     println!("Cpu: {:.2}W", report.cpu);
///     println!("Gpu: {:.2}W", report.gpu);
/// #     Ok(())
/// # }
/// ```
impl Report {
    /// Read both sensors from `hwmon`, calling `pause` between the two energy reads
    pub fn collect_with<F: FnOnce()>(hwmon: &Hwmon, pause: F) -> Result<Self, Error> {
        let cpu = sample_cpu(hwmon, pause)?;
        let gpu = sample_gpu(hwmon)?;
        Ok(Report { cpu, gpu })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}W {:.1}W", self.cpu, self.gpu)
    }
}

fn sample_cpu<F: FnOnce()>(hwmon: &Hwmon, pause: F) -> Result<f64, Error> {
    let path = hwmon
        .find(CPU_DEVICE, CPU_METRIC)?
        .ok_or(Error::SensorNotFound(Sensor::Cpu))?;
    let counter = EnergyCounter::open(&path)?;
    counter.sample_with(pause)
}

fn sample_gpu(hwmon: &Hwmon) -> Result<f64, Error> {
    let path = hwmon
        .find(GPU_DEVICE, GPU_METRIC)?
        .ok_or(Error::SensorNotFound(Sensor::Gpu))?;
    read_power(&path)
}

/// Write the power report line for the system sensors to `out`
///
/// Note that this method will block for ~10ms
pub fn write_report<W: Write>(out: &mut W) -> Result<(), Error> {
    write_report_with(&Hwmon::default(), out, || {
        std::thread::sleep(SAMPLE_INTERVAL)
    })
}

/// Write the power report line to `out`
///
/// The cpu figure is written as soon as it is known, so a failing gpu sensor leaves a partial line.
pub fn write_report_with<W: Write, F: FnOnce()>(
    hwmon: &Hwmon,
    out: &mut W,
    pause: F,
) -> Result<(), Error> {
    let cpu = sample_cpu(hwmon, pause)?;
    write!(out, "{:.1}W ", cpu).map_err(Error::Output)?;
    out.flush().map_err(Error::Output)?;

    let gpu = sample_gpu(hwmon)?;
    writeln!(out, "{:.1}W", gpu).map_err(Error::Output)?;
    out.flush().map_err(Error::Output)
}
