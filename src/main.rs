#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::doc_markdown, clippy::if_not_else, clippy::non_ascii_literal)]

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use colored::Colorize;
use itertools::Itertools;
use log::debug;

use sweepscan::address::{guess_gateway, parse_ipv4, AddressRange};
use sweepscan::input::{Config, Opts, ScanMode};
use sweepscan::scanner::{IcmpProbe, LivenessProbe, ScanOutcome, Scanner, TcpConnectProbe};
use sweepscan::{detail, output, warning};

const INTERNET_PROBE_HOST: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);
const INTERNET_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
/// Sweeps the requested targets and prints a summary of live hosts and open ports.
async fn main() {
    env_logger::init();

    let mut opts = Opts::read();
    let config = match Config::read(opts.config_path.clone()) {
        Ok(config) => config,
        Err(e) => abort(&format!("Invalid configuration file: {e:#}")),
    };
    opts.merge(&config);

    debug!("Main() `opts` arguments are {opts:?}");

    if opts.mode == ScanMode::Internet {
        check_internet_connectivity(&opts).await;
        return;
    }

    let hosts = match resolve_targets(&opts) {
        Ok(hosts) => hosts,
        Err(e) => abort(&format!("{e:#}")),
    };

    #[cfg(unix)]
    {
        let ulimit = adjust_ulimit_size(&opts);
        warn_on_unbounded_fan_out(&opts, &hosts, ulimit);
    }

    let scanner = Scanner::new(
        hosts,
        opts.ports,
        Duration::from_millis(opts.timeout),
        opts.greppable,
        opts.accessible,
        IcmpProbe::new(),
        TcpConnectProbe,
    )
    .with_max_in_flight(opts.max_in_flight.unwrap_or(0));
    debug!("Scanner finished building: {scanner:?}");

    let scan_start = Instant::now();
    let outcome = scanner.run().await;
    debug!("Scan completed in {:?}", scan_start.elapsed());

    print_summary(&opts, &outcome);
}

/// Turns the selected mode into the address range to sweep.
fn resolve_targets(opts: &Opts) -> anyhow::Result<AddressRange> {
    let hosts = match opts.mode {
        ScanMode::Range => match &opts.cidr {
            Some(cidr) => AddressRange::from_cidr(cidr)?,
            None => AddressRange::parse(&opts.start, &opts.end)?,
        },
        ScanMode::Specific => {
            let Some(ip) = &opts.ip else {
                bail!("Please provide a specific IP address using --ip");
            };
            AddressRange::single(parse_ipv4(ip)?)
        }
        ScanMode::Gateway => {
            let gateway = guess_gateway().context("Could not determine gateway IP")?;
            detail!(
                format!("Assuming the gateway is {gateway}"),
                opts.greppable,
                opts.accessible
            );
            AddressRange::single(gateway)
        }
        ScanMode::Internet => bail!("Internet mode has no targets to scan"),
    };

    Ok(hosts)
}

/// Reports a malformed input and stops before anything is scanned.
///
/// Printed even in greppable mode.
fn abort(message: &str) -> ! {
    warning!(message);
    std::process::exit(1);
}

/// Pings a well-known public host. Greppable mode still prints the plain verdict.
async fn check_internet_connectivity(opts: &Opts) {
    let reachable = IcmpProbe::new()
        .is_alive(INTERNET_PROBE_HOST, INTERNET_PROBE_TIMEOUT)
        .await;
    let message = connectivity_message(reachable);

    if opts.greppable {
        println!("{message}");
    } else if reachable {
        output!(message, opts.greppable, opts.accessible);
    } else {
        warning!(message, opts.greppable, opts.accessible);
    }
}

fn connectivity_message(reachable: bool) -> String {
    if reachable {
        format!("Internet is accessible ({INTERNET_PROBE_HOST} responds to ping)")
    } else {
        "No internet connectivity detected".to_owned()
    }
}

fn print_summary(opts: &Opts, outcome: &ScanOutcome) {
    if opts.greppable {
        for (host, _) in outcome.hosts() {
            let ports = outcome.sorted_open_ports(host).iter().join(",");
            println!("{host} -> [{ports}]");
        }
        return;
    }

    println!("\nScan Summary:");
    output!(
        format!("Total active hosts found: {}", outcome.alive_count()),
        opts.greppable,
        opts.accessible
    );

    for (host, ports) in outcome.hosts() {
        if ports.is_empty() {
            detail!(
                format!("Host {host} is up but has no open ports in the specified range"),
                opts.greppable,
                opts.accessible
            );
            continue;
        }

        let count = ports.len();
        let ports = format!("[{}]", ports.iter().join(", "));
        let ports = if opts.accessible {
            ports
        } else {
            ports.as_str().purple().to_string()
        };
        output!(
            format!("Host {host} has {count} open ports: {ports}"),
            opts.greppable,
            opts.accessible
        );
    }
}

#[cfg(unix)]
fn adjust_ulimit_size(opts: &Opts) -> u64 {
    use rlimit::Resource;

    if let Some(limit) = opts.ulimit {
        if Resource::NOFILE.set(limit, limit).is_ok() {
            detail!(
                format!("Automatically increasing ulimit value to {limit}."),
                opts.greppable,
                opts.accessible
            );
        } else {
            warning!(
                "ERROR. Failed to set ulimit value.",
                opts.greppable,
                opts.accessible
            );
        }
    }

    match Resource::NOFILE.get() {
        Ok((soft, _)) => soft,
        Err(e) => {
            debug!("Could not read the open file limit: {e}");
            u64::MAX
        }
    }
}

#[cfg(unix)]
fn warn_on_unbounded_fan_out(opts: &Opts, hosts: &AddressRange, ulimit: u64) {
    if opts.max_in_flight.is_some() {
        return;
    }

    let ports = u64::try_from(opts.ports.len()).unwrap_or(u64::MAX);
    let worst_case = hosts.size().saturating_mul(ports);
    if worst_case > ulimit {
        warning!(
            format!(
                "Up to {worst_case} port probes may run at once but the open file limit is {ulimit}. Use --max-in-flight or --ulimit if ports are reported closed unexpectedly."
            ),
            opts.greppable,
            opts.accessible
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{connectivity_message, resolve_targets};
    use std::net::Ipv4Addr;
    use sweepscan::input::{Opts, ScanMode};

    #[test]
    fn range_mode_uses_start_and_end() {
        let opts = Opts {
            start: "10.0.0.1".to_owned(),
            end: "10.0.0.3".to_owned(),
            ..Opts::default()
        };

        let hosts = resolve_targets(&opts).unwrap();
        assert_eq!(hosts.size(), 3);
    }

    #[test]
    fn range_mode_prefers_cidr() {
        let opts = Opts {
            cidr: Some("10.0.0.0/29".to_owned()),
            ..Opts::default()
        };

        let hosts = resolve_targets(&opts).unwrap();
        assert_eq!(hosts.start(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(hosts.end(), Ipv4Addr::new(10, 0, 0, 7));
    }

    #[test]
    fn specific_mode_needs_an_ip() {
        let missing = Opts {
            mode: ScanMode::Specific,
            ..Opts::default()
        };
        let err = resolve_targets(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("--ip"));

        let given = Opts {
            mode: ScanMode::Specific,
            ip: Some("172.16.4.2".to_owned()),
            ..Opts::default()
        };
        let hosts = resolve_targets(&given).unwrap();
        assert_eq!(hosts.iter().collect::<Vec<_>>(), [Ipv4Addr::new(172, 16, 4, 2)]);
    }

    #[test]
    fn malformed_range_aborts_before_scanning() {
        let opts = Opts {
            start: "10.0.0.9".to_owned(),
            end: "10.0.0.1".to_owned(),
            ..Opts::default()
        };

        let err = resolve_targets(&opts).unwrap_err();
        assert!(format!("{err:#}").contains("10.0.0.9"));
    }

    #[test]
    fn connectivity_verdict_names_the_pinged_host() {
        assert!(connectivity_message(true).contains("8.8.8.8"));
        assert_eq!(
            connectivity_message(false),
            "No internet connectivity detected"
        );
    }
}
