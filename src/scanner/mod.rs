//! Core functionality for actual scanning behaviour.
//!
//! [`Scanner`] walks the address range one host at a time, asks the
//! [`LivenessProbe`] whether the host is up and, for every live host, spawns
//! one [`PortProbe`] task per port. All tasks push into a single result
//! channel which is drained by a [`ResultAggregator`] once the last task has
//! finished.
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use log::{debug, error};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::address::AddressRange;
use crate::port_set::PortSet;

pub mod liveness;
pub mod outcome;
pub mod port;

pub use liveness::{IcmpProbe, LivenessProbe};
pub use outcome::{ResultAggregator, ScanOutcome, ScanResult};
pub use port::{PortProbe, TcpConnectProbe};

/// The class for the scanner
/// hosts is the range walked for liveness, in ascending order.
/// ports is probed on every host found alive.
/// timeout bounds both the echo reply wait and every connection attempt.
/// greppable is whether or not progress lines are printed while scanning.
/// max_in_flight optionally caps the number of port probes running at once.
#[derive(Debug)]
pub struct Scanner<L, P> {
    hosts: AddressRange,
    ports: PortSet,
    timeout: Duration,
    greppable: bool,
    accessible: bool,
    liveness: L,
    port_probe: Arc<P>,
    max_in_flight: Option<Arc<Semaphore>>,
}

impl<L, P> Scanner<L, P>
where
    L: LivenessProbe,
    P: PortProbe + 'static,
{
    pub fn new(
        hosts: AddressRange,
        ports: PortSet,
        timeout: Duration,
        greppable: bool,
        accessible: bool,
        liveness: L,
        port_probe: P,
    ) -> Self {
        Self {
            hosts,
            ports,
            timeout,
            greppable,
            accessible,
            liveness,
            port_probe: Arc::new(port_probe),
            max_in_flight: None,
        }
    }

    /// Caps the number of port probes in flight at the same time.
    ///
    /// Every port is still probed exactly once; probes beyond the limit wait
    /// for a free slot. A limit of zero leaves the fan-out unbounded.
    #[must_use]
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight =
            (limit > 0).then(|| Arc::new(Semaphore::new(limit.min(Semaphore::MAX_PERMITS))));
        self
    }

    pub const fn hosts(&self) -> &AddressRange {
        &self.hosts
    }

    pub const fn ports(&self) -> &PortSet {
        &self.ports
    }

    /// Runs the sweep and returns the outcome once every probe has answered.
    ///
    /// Liveness probes run strictly one after another in ascending address
    /// order. Port probes of live hosts run concurrently with each other and
    /// with the liveness probes of the hosts that follow.
    pub async fn run(&self) -> ScanOutcome {
        let (results_tx, results_rx) = mpsc::channel(self.channel_capacity());
        let mut tasks = JoinSet::new();
        let mut alive = Vec::new();

        debug!(
            "Start scanning.\nNumber of hosts {}\nNumber of ports {}\nMax in flight {:?}",
            self.hosts.size(),
            self.ports.len(),
            self.max_in_flight.as_ref().map(|s| s.available_permits())
        );

        for host in self.hosts.iter() {
            if !self.liveness.is_alive(host, self.timeout).await {
                self.fmt_host(host, false);
                continue;
            }

            self.fmt_host(host, true);
            alive.push(host);

            for port in self.ports.iter() {
                let results_tx = results_tx.clone();
                let probe = Arc::clone(&self.port_probe);
                let limit = self.max_in_flight.clone();
                let timeout = self.timeout;

                tasks.spawn(async move {
                    let _permit = match limit {
                        Some(limit) => limit.acquire_owned().await.ok(),
                        None => None,
                    };
                    let result = probe.probe(host, port, timeout).await;
                    if results_tx.send(result).await.is_err() {
                        error!("Result channel closed before {host}:{port} was recorded");
                    }
                });
            }
        }

        // Every task holds its own sender, so the channel closes when the
        // last outstanding probe has pushed its result.
        drop(results_tx);
        debug!(
            "{} hosts alive, {} port probes dispatched",
            alive.len(),
            tasks.len()
        );

        let outcome = ResultAggregator::new(alive).drain(results_rx).await;

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Port probe task failed: {e}");
            }
        }

        outcome
    }

    /// Worst case of `hosts × ports` results, clamped to what the channel accepts.
    fn channel_capacity(&self) -> usize {
        let ports = u64::try_from(self.ports.len()).unwrap_or(u64::MAX);
        bounded_capacity(self.hosts.size().saturating_mul(ports))
    }

    /// Formats and prints the liveness of a host
    fn fmt_host(&self, host: Ipv4Addr, alive: bool) {
        debug!("Host {host} alive: {alive}");
        if self.greppable {
            return;
        }

        match (alive, self.accessible) {
            (true, true) => println!("Host {host} is up, scanning ports..."),
            (true, false) => println!(
                "Host {} is up, scanning ports...",
                host.to_string().green()
            ),
            (false, true) => println!("Host {host} is down, skipping..."),
            (false, false) => println!(
                "Host {} is down, skipping...",
                host.to_string().dimmed()
            ),
        }
    }
}

/// Fits a result count into the range `1..=Semaphore::MAX_PERMITS` accepted
/// by a bounded tokio channel.
fn bounded_capacity(results: u64) -> usize {
    usize::try_from(results)
        .unwrap_or(usize::MAX)
        .clamp(1, Semaphore::MAX_PERMITS)
}
