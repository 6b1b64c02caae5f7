//! Provides the set of TCP ports probed on every live host.
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde_derive::Deserialize;

use crate::error::ScanError;

/// Lowest port that can be probed.
pub const LOWEST_PORT_NUMBER: u16 = 1;
/// Highest port that can be probed.
pub const TOP_PORT_NUMBER: u16 = 65535;

/// An inclusive, ascending range of port numbers.
///
/// A single port is the degenerate range `low..=low`. The default covers the
/// well-known ports `1-1024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct PortSet {
    start: u16,
    end: u16,
}

impl PortSet {
    /// Builds the set `start..=end`.
    pub fn new(start: u16, end: u16) -> Result<Self, ScanError> {
        if start < LOWEST_PORT_NUMBER || start > end {
            return Err(ScanError::InvalidPortSpec(format!("{start}-{end}")));
        }
        Ok(Self { start, end })
    }

    /// Parses `"N"` or `"N-M"`.
    ///
    /// ```rust
    /// # use sweepscan::port_set::PortSet;
    /// let ports = PortSet::parse("20-22").unwrap();
    /// assert_eq!(ports.iter().collect::<Vec<_>>(), [20, 21, 22]);
    /// assert!(PortSet::parse("22-20").is_err());
    /// ```
    pub fn parse(spec: &str) -> Result<Self, ScanError> {
        let invalid = || ScanError::InvalidPortSpec(spec.to_owned());

        let tokens = spec
            .split('-')
            .map(|token| token.trim().parse::<u16>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        let (start, end) = match tokens[..] {
            [port] => (port, port),
            [start, end] => (start, end),
            _ => return Err(invalid()),
        };

        Self::new(start, end).map_err(|_| invalid())
    }

    /// First port of the set.
    pub const fn start(&self) -> u16 {
        self.start
    }

    /// Last port of the set.
    pub const fn end(&self) -> u16 {
        self.end
    }

    /// Number of ports in the set.
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    /// Always `false`; a port set holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Yields the ports in ascending order.
    pub const fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl Default for PortSet {
    fn default() -> Self {
        Self {
            start: LOWEST_PORT_NUMBER,
            end: 1024,
        }
    }
}

impl TryFrom<String> for PortSet {
    type Error = ScanError;

    fn try_from(spec: String) -> Result<Self, Self::Error> {
        Self::parse(&spec)
    }
}

impl FromStr for PortSet {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl IntoIterator for &PortSet {
    type Item = u16;
    type IntoIter = RangeInclusive<u16>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
