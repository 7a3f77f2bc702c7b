use crate::Error;
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::Path;

/// Sensor files hold a single short decimal value
const BUFFER_SIZE: usize = 128;

/// What a sensor value represents, used for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Energy,
    Power,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Energy => write!(f, "energy"),
            ValueKind::Power => write!(f, "power"),
        }
    }
}

/// Read the raw contents of a sensor file from offset 0
///
/// This uses a positioned read, so the same handle can be read repeatedly without seeking.
pub fn read_value_at(file: &File, path: &Path) -> Result<String, Error> {
    let mut data = [0; BUFFER_SIZE];
    let read = file
        .read_at(&mut data[..BUFFER_SIZE - 1], 0)
        .map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if read == 0 {
        return Err(Error::EmptyRead(path.to_path_buf()));
    }

    Ok(String::from_utf8_lossy(&data[..read]).into_owned())
}

/// Split off leading whitespace and an optional sign, returning the sign and the leading digits
fn leading_digits(raw: &str) -> (bool, &str) {
    let raw = raw.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    (negative, &rest[..end])
}

/// Parse the leading unsigned decimal value, ignoring anything after the digits
pub fn parse_unsigned(raw: &str, kind: ValueKind, path: &Path) -> Result<u64, Error> {
    let parse_error = || Error::Parse {
        kind,
        path: path.to_path_buf(),
    };
    match leading_digits(raw) {
        (false, digits) if !digits.is_empty() => digits.parse().map_err(|_| parse_error()),
        _ => Err(parse_error()),
    }
}

/// Parse the leading signed decimal value, ignoring anything after the digits
pub fn parse_signed(raw: &str, kind: ValueKind, path: &Path) -> Result<i64, Error> {
    let parse_error = || Error::Parse {
        kind,
        path: path.to_path_buf(),
    };
    let (negative, digits) = leading_digits(raw);
    if digits.is_empty() {
        return Err(parse_error());
    }
    let magnitude: i64 = digits.parse().map_err(|_| parse_error())?;
    Ok(if negative { -magnitude } else { magnitude })
}
