//! Host liveness through ICMP echo.
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use surge_ping::{Client, Config, PingIdentifier, PingSequence};

const ECHO_SEQUENCE: u16 = 1;
const ECHO_PAYLOAD: [u8; 56] = [0; 56];

/// Decides whether a host is up.
///
/// Implementations never fail: any local or remote problem is reported as
/// `false`, so `false` means "down or unknown".
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn is_alive(&self, host: Ipv4Addr, timeout: Duration) -> bool;
}

/// Sends one ICMP echo request and waits for the matching reply.
///
/// Each call opens its own ICMP socket and releases it before returning.
/// Opening the socket usually needs elevated privileges; without them every
/// host is reported as down and a single warning is logged.
#[derive(Debug, Default)]
pub struct IcmpProbe {
    socket_error_reported: AtomicBool,
}

impl IcmpProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn report_socket_error(&self, err: &std::io::Error) {
        if self.socket_error_reported.swap(true, Ordering::Relaxed) {
            debug!("Could not open ICMP socket: {err}");
        } else {
            warn!(
                "Could not open ICMP socket ({err}). Hosts will be reported as down; try running with elevated privileges."
            );
        }
    }
}

#[async_trait]
impl LivenessProbe for IcmpProbe {
    async fn is_alive(&self, host: Ipv4Addr, timeout: Duration) -> bool {
        let client = match Client::new(&Config::default()) {
            Ok(client) => client,
            Err(e) => {
                self.report_socket_error(&e);
                return false;
            }
        };

        let mut pinger = client
            .pinger(IpAddr::V4(host), PingIdentifier(echo_identifier()))
            .await;
        // The wait starts once the request has been sent.
        pinger.timeout(timeout);

        match pinger.ping(PingSequence(ECHO_SEQUENCE), &ECHO_PAYLOAD).await {
            Ok((_, rtt)) => {
                debug!("Echo reply from {host} after {rtt:?}");
                true
            }
            Err(e) => {
                debug!("No echo reply from {host}: {e}");
                false
            }
        }
    }
}

fn echo_identifier() -> u16 {
    u16::try_from(std::process::id() & 0xffff).unwrap_or_default()
}
