//! This crate exposes the scanning engine of the `sweepscan` network sweeper.
//!
//! A sweep walks an IPv4 range, finds the hosts that answer an ICMP echo and
//! enumerates the open TCP ports of every live host.
//!
//! ## Architecture Overview
//!
//! 1. **Input Processing**: an [`AddressRange`](crate::address::AddressRange)
//!    and a [`PortSet`](crate::port_set::PortSet) are parsed and validated.
//!    Malformed input is the only thing that aborts a scan.
//! 2. **Liveness**: hosts are pinged one at a time in ascending order through a
//!    [`LivenessProbe`](crate::scanner::LivenessProbe).
//! 3. **Port probing**: every port of a live host gets its own concurrent
//!    [`PortProbe`](crate::scanner::PortProbe) task.
//! 4. **Aggregation**: results flow through one channel into a
//!    [`ResultAggregator`](crate::scanner::ResultAggregator) that yields the
//!    final [`ScanOutcome`](crate::scanner::ScanOutcome).
//!
//! Probe failures are never errors. A timeout, a refused connection or a
//! missing privilege all read as "not alive" or "not open".
//!
//! ## Basic Usage Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use sweepscan::address::AddressRange;
//! use sweepscan::port_set::PortSet;
//! use sweepscan::scanner::{IcmpProbe, Scanner, TcpConnectProbe};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hosts = AddressRange::parse("192.168.1.1", "192.168.1.20")?;
//!     let ports = PortSet::parse("20-443")?;
//!
//!     let scanner = Scanner::new(
//!         hosts,
//!         ports,
//!         Duration::from_millis(500), // Timeout per ping and per connection
//!         true,                       // Greppable, no progress lines
//!         true,                       // Accessible
//!         IcmpProbe::new(),
//!         TcpConnectProbe,
//!     )
//!     .with_max_in_flight(1_000);
//!
//!     let outcome = scanner.run().await;
//!     for (host, ports) in outcome.hosts() {
//!         println!("{host} -> {ports:?}");
//!     }
//!     Ok(())
//! }
//! ```
#![allow(clippy::needless_doctest_main)]

pub mod tui;

pub mod error;

pub mod address;

pub mod port_set;

pub mod input;

pub mod scanner;
