use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::net::SocketAddr;
use std::time::Duration;

pub static SERVICE_NAME: &str = "admission-server";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub metrics_enabled: bool,
    pub request_timeout: Duration,
    pub max_request_body_bytes: usize,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

pub struct TlsConfig {
    pub cert_file: String,
    pub key_file: String,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let (cert_file, key_file) = tls_files(matches)?;
        let tls_config = if cert_file.is_empty() {
            None
        } else {
            Some(TlsConfig {
                cert_file,
                key_file,
            })
        };

        let request_timeout = Duration::from_secs(parse_arg::<u64>(matches, "request-timeout")?);
        if request_timeout.is_zero() {
            return Err(anyhow!(
                "error parsing arguments: --request-timeout must be greater than zero"
            ));
        }
        let max_request_body_bytes = parse_arg::<usize>(matches, "max-request-body-bytes")?;

        Ok(Self {
            addr,
            tls_config,
            metrics_enabled: flag(matches, "enable-metrics"),
            request_timeout,
            max_request_body_bytes,
            log_level: string_arg(matches, "log-level")?,
            log_fmt: string_arg(matches, "log-fmt")?,
            log_no_color: flag(matches, "log-no-color"),
        })
    }
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        string_arg(matches, "address")?,
        string_arg(matches, "port")?
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_files(matches: &ArgMatches) -> Result<(String, String)> {
    let cert_file = string_arg(matches, "cert-file")?;
    let key_file = string_arg(matches, "key-file")?;
    if cert_file.is_empty() != key_file.is_empty() {
        Err(anyhow!("error parsing arguments: either both --cert-file and --key-file must be provided, or neither"))
    } else {
        Ok((cert_file, key_file))
    }
}

fn string_arg(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| anyhow!("error parsing arguments: --{} is not set", id))
}

fn parse_arg<T>(matches: &ArgMatches, id: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    string_arg(matches, id)?
        .parse::<T>()
        .map_err(|e| anyhow!("error parsing arguments: invalid value for --{}: {}", id, e))
}

fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches.get_flag(id)
}
