//! Results of individual probes and their aggregation into a scan outcome.
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use log::{debug, warn};
use tokio::sync::mpsc;

/// The answer of one port probe. Never changes once produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanResult {
    host: Ipv4Addr,
    port: u16,
    open: bool,
}

impl ScanResult {
    pub const fn new(host: Ipv4Addr, port: u16, open: bool) -> Self {
        Self { host, port, open }
    }

    pub const fn host(&self) -> Ipv4Addr {
        self.host
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub const fn is_open(&self) -> bool {
        self.open
    }
}

/// Hosts found alive and the ports found open on each of them.
///
/// Open ports are kept in the order their results arrived, which is not
/// necessarily ascending. Use [`ScanOutcome::sorted_open_ports`] when a
/// stable order is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    alive: BTreeSet<Ipv4Addr>,
    open_ports: BTreeMap<Ipv4Addr, Vec<u16>>,
    probed: BTreeMap<Ipv4Addr, usize>,
}

impl ScanOutcome {
    /// Every host that answered its liveness probe, ascending.
    pub const fn alive_hosts(&self) -> &BTreeSet<Ipv4Addr> {
        &self.alive
    }

    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    pub fn is_alive(&self, host: Ipv4Addr) -> bool {
        self.alive.contains(&host)
    }

    /// Open ports of `host` in arrival order. Empty for hosts with none.
    pub fn open_ports(&self, host: Ipv4Addr) -> &[u16] {
        self.open_ports.get(&host).map_or(&[], Vec::as_slice)
    }

    pub fn sorted_open_ports(&self, host: Ipv4Addr) -> Vec<u16> {
        let mut ports = self.open_ports(host).to_vec();
        ports.sort_unstable();
        ports
    }

    /// How many probe results were consumed for `host`, open or not.
    pub fn probed_count(&self, host: Ipv4Addr) -> usize {
        self.probed.get(&host).copied().unwrap_or_default()
    }

    /// Total number of probe results consumed.
    pub fn total_probed(&self) -> usize {
        self.probed.values().sum()
    }

    /// Alive hosts paired with their open ports, ascending by host.
    pub fn hosts(&self) -> impl Iterator<Item = (Ipv4Addr, &[u16])> + '_ {
        self.alive.iter().map(|&host| (host, self.open_ports(host)))
    }
}

/// Builds a [`ScanOutcome`] from the stream of probe results.
///
/// The outcome only leaves the aggregator through [`ResultAggregator::drain`],
/// which returns once every sender of the channel is gone and the buffer is
/// empty.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    outcome: ScanOutcome,
}

impl ResultAggregator {
    /// Starts an aggregation for the given alive hosts.
    pub fn new(alive: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        Self {
            outcome: ScanOutcome {
                alive: alive.into_iter().collect(),
                ..ScanOutcome::default()
            },
        }
    }

    /// Consumes results until the channel is closed and drained.
    pub async fn drain(mut self, mut results: mpsc::Receiver<ScanResult>) -> ScanOutcome {
        while let Some(result) = results.recv().await {
            self.record(result);
        }

        debug!(
            "Aggregated {} results for {} alive hosts",
            self.outcome.total_probed(),
            self.outcome.alive_count()
        );
        self.outcome
    }

    fn record(&mut self, result: ScanResult) {
        let host = result.host();
        if !self.outcome.alive.contains(&host) {
            warn!("Received a result for {host} which was never found alive");
        }

        *self.outcome.probed.entry(host).or_default() += 1;
        if result.is_open() {
            self.outcome
                .open_ports
                .entry(host)
                .or_default()
                .push(result.port());
        }
    }
}
