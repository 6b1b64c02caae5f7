//! Provides the IPv4 address range a sweep walks over.
//!
//! Addresses are handled as their 32-bit integer form so that stepping from
//! `x.y.z.255` carries into the next octet like any other increment.
use std::net::Ipv4Addr;
use std::str::FromStr;

use cidr_utils::cidr::Ipv4Inet;
use log::debug;
use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;

use crate::error::ScanError;

/// An inclusive, ascending range of IPv4 addresses.
///
/// The range is never empty: construction fails with
/// [`ScanError::EmptyRange`] when `start > end`. Iterating it is lazy and
/// can be repeated any number of times.
///
/// ```rust
/// # use sweepscan::address::AddressRange;
/// let range = AddressRange::parse("10.0.0.254", "10.0.1.1").unwrap();
/// let hosts: Vec<String> = range.iter().map(|ip| ip.to_string()).collect();
/// assert_eq!(hosts, ["10.0.0.254", "10.0.0.255", "10.0.1.0", "10.0.1.1"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    start: u32,
    end: u32,
}

impl AddressRange {
    /// Builds the range `start..=end`.
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Result<Self, ScanError> {
        let (lower, upper) = (u32::from(start), u32::from(end));
        if lower > upper {
            return Err(ScanError::EmptyRange { start, end });
        }

        Ok(Self {
            start: lower,
            end: upper,
        })
    }

    /// Parses both ends from their dotted-quad form and builds the range.
    pub fn parse(start: &str, end: &str) -> Result<Self, ScanError> {
        Self::new(parse_ipv4(start)?, parse_ipv4(end)?)
    }

    /// A range holding exactly one address.
    pub fn single(addr: Ipv4Addr) -> Self {
        let addr = u32::from(addr);
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Expands an IPv4 network such as `192.168.1.0/24` into the range from
    /// its network address to its broadcast address.
    ///
    /// Host bits are ignored, so `192.168.1.7/24` covers the same range.
    pub fn from_cidr(cidr: &str) -> Result<Self, ScanError> {
        let inet = Ipv4Inet::from_str(cidr.trim())
            .map_err(|_| ScanError::InvalidCidr(cidr.to_owned()))?;
        let network = inet.network();

        Self::new(network.first_address(), network.last_address())
    }

    /// First address of the range.
    pub const fn start(&self) -> Ipv4Addr {
        Ipv4Addr::from_bits(self.start)
    }

    /// Last address of the range.
    pub const fn end(&self) -> Ipv4Addr {
        Ipv4Addr::from_bits(self.end)
    }

    /// Number of addresses in the range, `end - start + 1`.
    ///
    /// A `/0` holds 2^32 addresses, hence the `u64`.
    pub fn size(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    /// Whether `addr` lies within the range.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        (self.start..=self.end).contains(&u32::from(addr))
    }

    /// Yields every address from start to end in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> {
        (self.start..=self.end).map(Ipv4Addr::from)
    }
}

impl<'a> IntoIterator for &'a AddressRange {
    type Item = Ipv4Addr;
    type IntoIter = Box<dyn Iterator<Item = Ipv4Addr> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Parses a dotted-quad IPv4 address, ignoring surrounding whitespace.
pub fn parse_ipv4(input: &str) -> Result<Ipv4Addr, ScanError> {
    input
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| ScanError::InvalidAddress(input.to_owned()))
}

/// Guesses the default gateway of this machine.
///
/// This is a heuristic, not a routing table lookup: it takes the first
/// non-loopback IPv4 address of any interface that is up and assumes the
/// gateway is host `.1` of that network. Returns `None` when no such address
/// exists.
pub fn guess_gateway() -> Option<Ipv4Addr> {
    let local = first_local_ipv4(datalink::interfaces())?;

    let gateway = gateway_for(local);
    debug!("Guessed gateway {gateway} from local address {local}");
    Some(gateway)
}

/// First non-loopback IPv4 address among the interfaces that are up.
fn first_local_ipv4(interfaces: impl IntoIterator<Item = NetworkInterface>) -> Option<Ipv4Addr> {
    interfaces
        .into_iter()
        .filter(|iface| iface.is_up() && !iface.is_loopback())
        .flat_map(|iface| iface.ips)
        .find_map(|network| match network {
            IpNetwork::V4(net) if !net.ip().is_loopback() => Some(net.ip()),
            _ => None,
        })
}

/// Replaces the last octet of `local` with 1.
fn gateway_for(local: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = local.octets();
    Ipv4Addr::new(a, b, c, 1)
}

#[cfg(test)]
mod tests {
    use super::{first_local_ipv4, gateway_for, parse_ipv4, AddressRange};
    use crate::error::ScanError;
    use std::net::Ipv4Addr;

    #[test]
    fn carries_across_octet_boundary() {
        let range = AddressRange::parse("10.0.0.254", "10.0.1.1").unwrap();
        let ips = range.iter().collect::<Vec<_>>();

        assert_eq!(
            ips,
            [
                Ipv4Addr::new(10, 0, 0, 254),
                Ipv4Addr::new(10, 0, 0, 255),
                Ipv4Addr::new(10, 0, 1, 0),
                Ipv4Addr::new(10, 0, 1, 1),
            ]
        );
    }

    #[test]
    fn carries_through_every_octet() {
        let range = AddressRange::parse("9.255.255.255", "10.0.0.0").unwrap();
        let ips = range.iter().collect::<Vec<_>>();

        assert_eq!(
            ips,
            [Ipv4Addr::new(9, 255, 255, 255), Ipv4Addr::new(10, 0, 0, 0)]
        );
    }

    #[test]
    fn yields_size_addresses_strictly_ascending() {
        let range = AddressRange::parse("192.168.0.200", "192.168.3.17").unwrap();
        let ips = range.iter().map(u32::from).collect::<Vec<_>>();

        assert_eq!(ips.len() as u64, range.size());
        assert_eq!(range.size(), 3 * 256 + 17 - 200 + 1);
        assert!(ips.windows(2).all(|pair| pair[1] == pair[0] + 1));
        assert_eq!(ips.first().copied(), Some(u32::from(range.start())));
        assert_eq!(ips.last().copied(), Some(u32::from(range.end())));
    }

    #[test]
    fn iteration_is_restartable() {
        let range = AddressRange::parse("172.16.0.1", "172.16.0.9").unwrap();

        let first = range.iter().collect::<Vec<_>>();
        let second = (&range).into_iter().collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn top_of_address_space_does_not_overflow() {
        let range = AddressRange::parse("255.255.255.254", "255.255.255.255").unwrap();

        assert_eq!(range.iter().count(), 2);
        assert_eq!(range.size(), 2);
    }

    #[test]
    fn single_address_range() {
        let ip = Ipv4Addr::new(127, 0, 0, 1);
        let range = AddressRange::single(ip);

        assert_eq!(range.iter().collect::<Vec<_>>(), [ip]);
        assert_eq!(range, AddressRange::new(ip, ip).unwrap());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let result = AddressRange::parse("10.0.0.5", "10.0.0.1");

        assert_eq!(
            result,
            Err(ScanError::EmptyRange {
                start: Ipv4Addr::new(10, 0, 0, 5),
                end: Ipv4Addr::new(10, 0, 0, 1),
            })
        );
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert_eq!(
            AddressRange::parse("10.0.0.256", "10.0.1.1"),
            Err(ScanError::InvalidAddress("10.0.0.256".to_owned()))
        );
        assert_eq!(
            AddressRange::parse("10.0.0.1", "not-an-ip"),
            Err(ScanError::InvalidAddress("not-an-ip".to_owned()))
        );
        assert!(parse_ipv4("::1").is_err());
        assert_eq!(parse_ipv4(" 10.1.2.3 "), Ok(Ipv4Addr::new(10, 1, 2, 3)));
    }

    #[test]
    fn cidr_expands_to_network_and_broadcast() {
        let range = AddressRange::from_cidr("192.168.0.0/30").unwrap();

        assert_eq!(
            range.iter().collect::<Vec<_>>(),
            [
                Ipv4Addr::new(192, 168, 0, 0),
                Ipv4Addr::new(192, 168, 0, 1),
                Ipv4Addr::new(192, 168, 0, 2),
                Ipv4Addr::new(192, 168, 0, 3),
            ]
        );

        let with_host_bits = AddressRange::from_cidr("192.168.0.2/30").unwrap();
        assert_eq!(range, with_host_bits);
        assert!(AddressRange::from_cidr("192.168.0.0/33").is_err());
    }

    #[test]
    fn contains_respects_bounds() {
        let range = AddressRange::parse("10.0.0.10", "10.0.0.20").unwrap();

        assert!(range.contains(Ipv4Addr::new(10, 0, 0, 10)));
        assert!(range.contains(Ipv4Addr::new(10, 0, 0, 20)));
        assert!(!range.contains(Ipv4Addr::new(10, 0, 0, 21)));
        assert!(!range.contains(Ipv4Addr::new(10, 0, 0, 9)));
    }

    #[test]
    fn gateway_is_host_one_of_local_network() {
        assert_eq!(
            gateway_for(Ipv4Addr::new(192, 168, 1, 57)),
            Ipv4Addr::new(192, 168, 1, 1)
        );
    }

    #[cfg(unix)]
    fn interface(name: &str, ip: Ipv4Addr, up: bool) -> pnet::datalink::NetworkInterface {
        use pnet::ipnetwork::{IpNetwork, Ipv4Network};

        pnet::datalink::NetworkInterface {
            name: name.to_owned(),
            description: String::new(),
            index: 0,
            mac: None,
            ips: vec![IpNetwork::V4(Ipv4Network::new(ip, 24).unwrap())],
            flags: u8::from(up).into(),
        }
    }

    #[test]
    #[cfg(unix)]
    fn local_address_skips_interfaces_that_are_down() {
        let interfaces = vec![
            interface("lo", Ipv4Addr::LOCALHOST, true),
            interface("eth0", Ipv4Addr::new(10, 9, 8, 7), false),
            interface("wlan0", Ipv4Addr::new(192, 168, 1, 57), true),
        ];

        assert_eq!(
            first_local_ipv4(interfaces),
            Some(Ipv4Addr::new(192, 168, 1, 57))
        );
    }

    #[test]
    #[cfg(unix)]
    fn no_local_address_when_every_interface_is_down() {
        let interfaces = vec![interface("eth0", Ipv4Addr::new(10, 9, 8, 7), false)];

        assert_eq!(first_local_ipv4(interfaces), None);
    }
}
