use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::time::Duration;
use fizzbuzz::{RecordPolicy, RendererConfig};
use std::path::PathBuf;

/// Deployment environment, selects the logging format and default level.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// Human-readable logs at `debug`.
    #[default]
    Development,
    /// JSON logs at `info`.
    Production,
}

/// Runtime configuration for the `fizzbuzz-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file is loaded first if present).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fizzbuzz-server",
    version,
    about = "An HTTP service rendering FizzBuzz sequences"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Server environment.
    ///
    /// Environment variable: `SERVER_ENV`
    #[arg(long, env = "SERVER_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    /// TLS certificate file (PEM). TLS is enabled when both the certificate
    /// and the key are given.
    ///
    /// Environment variable: `SERVER_TLSCERTFILE`
    #[arg(long, env = "SERVER_TLSCERTFILE")]
    pub tls_cert: Option<PathBuf>,

    /// TLS private key file (PEM).
    ///
    /// Environment variable: `SERVER_TLSKEYFILE`
    #[arg(long, env = "SERVER_TLSKEYFILE")]
    pub tls_key: Option<PathBuf>,

    /// Capacity of the buffer between an item producer and the response
    /// writer.
    ///
    /// Lower values keep production closer to consumption; higher values
    /// reduce task wake-ups on large renders.
    ///
    /// Environment variable: `ITEM_BUFFER_SIZE`
    #[arg(long, env = "ITEM_BUFFER_SIZE", default_value_t = 1)]
    pub item_buffer_size: usize,

    /// Maximum time, in seconds, spent rendering a single request.
    ///
    /// Environment variable: `RENDER_TIMEOUT`
    #[arg(long, env = "RENDER_TIMEOUT", default_value_t = 60)]
    pub render_timeout: u64,

    /// Largest `limit` accepted by `/render`.
    ///
    /// Environment variable: `MAX_LIMIT`
    #[arg(long, env = "MAX_LIMIT", default_value_t = 10_000_000)]
    pub max_limit: i64,

    /// Whether requests failing validation count towards the statistics.
    ///
    /// Environment variable: `RECORD_INVALID_REQUESTS`
    #[arg(
        long,
        env = "RECORD_INVALID_REQUESTS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub record_invalid: bool,
}

/// TLS certificate and key locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub environment: Environment,
    pub tls: Option<TlsConfig>,
    pub render_timeout: Duration,
    pub max_limit: i64,
    pub renderer: RendererConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_addr: String::from("0.0.0.0:8080"),
            environment: Environment::default(),
            tls: None,
            render_timeout: Duration::from_secs(60),
            max_limit: 10_000_000,
            renderer: RendererConfig::default(),
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.item_buffer_size == 0 {
            bail!("ITEM_BUFFER_SIZE must be greater than 0");
        }

        if args.render_timeout == 0 {
            bail!("RENDER_TIMEOUT must be greater than 0");
        }

        if args.max_limit < 1 {
            bail!("MAX_LIMIT must be greater than 0");
        }

        let tls = match (args.tls_cert, args.tls_key) {
            (Some(cert), Some(key)) => Some(TlsConfig { cert, key }),
            (None, None) => None,
            (Some(_), None) => bail!("SERVER_TLSCERTFILE is set but SERVER_TLSKEYFILE is missing"),
            (None, Some(_)) => bail!("SERVER_TLSKEYFILE is set but SERVER_TLSCERTFILE is missing"),
        };

        let record_policy = if args.record_invalid {
            RecordPolicy::AllAttempts
        } else {
            RecordPolicy::ValidOnly
        };

        Ok(Self {
            server_addr: args.server_addr,
            environment: args.environment,
            tls,
            render_timeout: Duration::from_secs(args.render_timeout),
            max_limit: args.max_limit,
            renderer: RendererConfig {
                item_buffer_size: args.item_buffer_size,
                record_policy,
            },
        })
    }
}
