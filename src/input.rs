//! Provides a means to read, parse and hold configuration options for scans.
use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde_derive::Deserialize;

use crate::port_set::PortSet;

/// Default wait for an echo reply or a TCP handshake, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Which targets a run covers.
///   - Range sweeps every address from `--start` to `--end`, or a `--cidr`.
///   - Specific scans the single address given with `--ip`.
///   - Gateway scans the guessed default gateway of this machine.
///   - Internet only checks whether 8.8.8.8 answers a ping.
#[derive(Deserialize, Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Range,
    Specific,
    Gateway,
    Internet,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sweepscan",
    version = env!("CARGO_PKG_VERSION"),
    max_term_width = 120,
    help_template = "{bin} {version}\n{about}\n\nUSAGE:\n    {usage}\n\nOPTIONS:\n{options}",
)]
#[allow(clippy::struct_excessive_bools)]
/// Finds live hosts in an IPv4 range and lists their open TCP ports.
/// Host discovery uses ICMP echo, which usually needs elevated privileges.
pub struct Opts {
    /// Scan mode.
    #[arg(short, long, value_enum, ignore_case = true, default_value = "range")]
    pub mode: ScanMode,

    /// First address of the range to sweep.
    #[arg(short, long, default_value = "192.168.1.1")]
    pub start: String,

    /// Last address of the range to sweep.
    #[arg(short, long, default_value = "192.168.1.255")]
    pub end: String,

    /// A single address to scan, used with `--mode specific`.
    #[arg(long)]
    pub ip: Option<String>,

    /// An IPv4 network to sweep instead of start and end. Example: 192.168.1.0/24.
    #[arg(long)]
    pub cidr: Option<String>,

    /// Port or port range to scan. Examples: 80 or 1-1024.
    #[arg(short, long, default_value = "1-1024", value_parser = PortSet::parse)]
    pub ports: PortSet,

    /// The timeout in milliseconds for each ping and each connection attempt.
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// Maximum number of port probes in flight at once. Unbounded when unset;
    /// large ranges may then exhaust the open file limit of your OS.
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Automatically ups the ULIMIT with the value you provided.
    #[arg(short, long)]
    pub ulimit: Option<u64>,

    /// Greppable mode. Only output the hosts and their open ports.
    #[arg(short, long)]
    pub greppable: bool,

    /// Accessible mode. Turns off features which negatively affect screen readers.
    #[arg(long)]
    pub accessible: bool,

    /// Whether to ignore the configuration file or not.
    #[arg(short, long)]
    pub no_config: bool,

    /// Custom path to config file
    #[arg(short, long, value_parser)]
    pub config_path: Option<PathBuf>,
}

#[cfg(not(tarpaulin_include))]
impl Opts {
    pub fn read() -> Self {
        Self::parse()
    }

    /// Merges values found within the user configuration file into the
    /// command line options.
    pub fn merge(&mut self, config: &Config) {
        if !self.no_config {
            self.merge_required(config);
            self.merge_optional(config);
        }
    }

    fn merge_required(&mut self, config: &Config) {
        macro_rules! merge_required {
            ($($field: ident),+) => {
                $(
                    if let Some(e) = &config.$field {
                        self.$field = e.clone();
                    }
                )+
            }
        }

        merge_required!(mode, start, end, ports, timeout, greppable, accessible);
    }

    fn merge_optional(&mut self, config: &Config) {
        macro_rules! merge_optional {
            ($($field: ident),+) => {
                $(
                    if config.$field.is_some() {
                        self.$field = config.$field.clone();
                    }
                )+
            }
        }

        merge_optional!(ip, cidr, max_in_flight, ulimit);
    }
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            mode: ScanMode::Range,
            start: "192.168.1.1".to_owned(),
            end: "192.168.1.255".to_owned(),
            ip: None,
            cidr: None,
            ports: PortSet::default(),
            timeout: DEFAULT_TIMEOUT_MS,
            max_in_flight: None,
            ulimit: None,
            greppable: false,
            accessible: false,
            no_config: true,
            config_path: None,
        }
    }
}

/// Struct used to deserialize the options specified within our config file.
/// These will be further merged with our command line arguments in order to
/// generate the final Opts struct.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    mode: Option<ScanMode>,
    start: Option<String>,
    end: Option<String>,
    ip: Option<String>,
    cidr: Option<String>,
    ports: Option<PortSet>,
    timeout: Option<u64>,
    max_in_flight: Option<usize>,
    ulimit: Option<u64>,
    greppable: Option<bool>,
    accessible: Option<bool>,
}

impl Config {
    /// Reads the configuration file with TOML format and parses it into a
    /// Config struct. A missing file yields an empty configuration.
    ///
    /// # Format
    ///
    /// mode = "range"
    /// start = "10.0.0.1"
    /// end = "10.0.0.254"
    /// ports = "1-1024"
    /// timeout = 300
    /// max_in_flight = 2000
    ///
    pub fn read(custom_config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let Some(config_path) = custom_config_path.or_else(default_config_path) else {
            return Ok(Self::default());
        };
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Constructs default path to config toml
pub fn default_config_path() -> Option<PathBuf> {
    let mut config_path = dirs::home_dir()?;
    config_path.push(".sweepscan.toml");
    Some(config_path)
}
