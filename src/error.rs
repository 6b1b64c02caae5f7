//! Errors raised while turning user input into scan targets.
//!
//! Only input problems are errors. A probe that fails on the network is a
//! negative answer, never a [`ScanError`].
use std::net::Ipv4Addr;

/// Input errors that abort a scan before any probing starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// The value does not parse as a dotted-quad IPv4 address.
    #[error("invalid IPv4 address '{0}'")]
    InvalidAddress(String),

    /// The start of an address range lies after its end.
    #[error("start address {start} is greater than end address {end}")]
    EmptyRange {
        /// First address given.
        start: Ipv4Addr,
        /// Last address given.
        end: Ipv4Addr,
    },

    /// The port specification is not `N` or `N-M` with `1 <= N <= M <= 65535`.
    #[error("invalid port specification '{0}'. Expected 'N' or 'N-M', for example 80 or 1-1024")]
    InvalidPortSpec(String),

    /// The value is not an IPv4 network in CIDR notation.
    #[error("invalid IPv4 CIDR '{0}'")]
    InvalidCidr(String),
}
