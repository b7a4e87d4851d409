//! Release version parsing and ordering
//!
//! Release tags look like `v1.4.0`, `1.4` or `v2.0.0-beta.1`. A version is
//! the tuple of its dot-separated numeric segments: one leading marker
//! character is dropped and anything after the first `-` or `+` is ignored,
//! so `1.2.0-beta` and `1.2.0` compare equal. Shorter tuples are padded with
//! zeros when compared, making `1.2` equal to `1.2.0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, UpdateError};

#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
}

impl Version {
    pub fn parse(input: &str) -> Result<Self> {
        let malformed = || UpdateError::malformed_version(input);

        let trimmed = input.trim();
        let mut chars = trimmed.chars();
        let unmarked = match chars.next() {
            Some(c) if !c.is_ascii_digit() => chars.as_str(),
            Some(_) => trimmed,
            None => return Err(malformed()),
        };

        let core = unmarked
            .split(['-', '+'])
            .next()
            .unwrap_or_default();
        if core.is_empty() {
            return Err(malformed());
        }

        let segments = core
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                segment.parse::<u64>().map_err(|_| malformed())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }
}

/// Compare two version strings, failing if either does not parse
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| {
                let a = self.segments.get(i).copied().unwrap_or(0);
                let b = other.segments.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality follows the zero-padded ordering, not the raw segment list
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        Ok(())
    }
}
