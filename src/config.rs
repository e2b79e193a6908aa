// src/config.rs
use crate::api::ReferenceMap;
use crate::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_PAGE_LIMIT, DEFAULT_RETRY_SLEEP_SECS, DEFAULT_THREAD_COUNT,
    DEFAULT_TIMEOUT_SECS, DEFAULT_URL_MAX_LEN, TOKEN_ENV_VAR,
};
use crate::error::AppError;
use crate::types::{ApiToken, Filters, Host, Scheme, ValidationError};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Collection path below /api/ (e.g., "dcim/devices/")
    pub path: String,

    /// Catalog host name
    #[arg(long)]
    pub host: String,

    /// Access scheme: https or http
    #[arg(long, default_value = "https")]
    pub scheme: String,

    /// TCP port (0 = scheme default)
    #[arg(long, default_value_t = 0)]
    pub port: u16,

    /// Accept any TLS certificate
    #[arg(long, default_value_t = false)]
    pub insecure: bool,

    /// Items requested per page
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    pub limit: u32,

    /// Split requests whose URL would exceed this length
    #[arg(long, default_value_t = DEFAULT_URL_MAX_LEN)]
    pub url_max_len: usize,

    /// Worker count (1 = sequential loop)
    #[arg(long, default_value_t = DEFAULT_THREAD_COUNT)]
    pub threads: usize,

    /// Seconds to wait between requests
    #[arg(long, default_value_t = 0.0)]
    pub interval: f64,

    /// Stop paging a parameter set once this many items arrived (sequential mode only)
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Per-request timeout in seconds (0 = default)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: f64,

    /// Network attempts per request when it times out
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Seconds to sleep before retrying a timed-out request (0 = default)
    #[arg(long, default_value_t = DEFAULT_RETRY_SLEEP_SECS)]
    pub sleep: f64,

    /// Filter as key=value or key=v1,v2 (repeatable)
    #[arg(short = 'f', long = "filter")]
    pub filters: Vec<String>,

    /// Name-to-id reference as key=path:field (repeatable), e.g. site=dcim/sites/:name
    #[arg(long = "reference")]
    pub references: Vec<String>,

    /// Write the JSON result here instead of stdout
    #[arg(short, long)]
    pub output_file: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Where the catalog lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: Host,
    pub scheme: Scheme,
    /// 0 selects the scheme's default port
    pub port: u16,
    pub verify_tls: bool,
    pub token: ApiToken,
}

impl ConnectionConfig {
    /// Creates an https connection with TLS verification and no token.
    pub fn new(host: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            host: Host::new(host)?,
            scheme: Scheme::default(),
            port: 0,
            verify_tls: true,
            token: ApiToken::default(),
        })
    }

    pub fn with_scheme(self, scheme: Scheme) -> Self {
        Self { scheme, ..self }
    }

    pub fn with_port(self, port: u16) -> Self {
        Self { port, ..self }
    }

    pub fn with_token(self, token: ApiToken) -> Self {
        Self { token, ..self }
    }

    pub fn with_verify_tls(self, verify_tls: bool) -> Self {
        Self { verify_tls, ..self }
    }

    /// Base URL without the collection path: `{scheme}://{host}[:port]/api/`.
    pub fn base_url(&self) -> Result<Url, AppError> {
        let authority = if self.port == 0 {
            self.host.to_string()
        } else {
            format!("{}:{}", self.host, self.port)
        };
        Ok(Url::parse(&format!("{}://{}/api/", self.scheme, authority))?)
    }
}

/// Paging and scheduling knobs, fixed for one fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub page_limit: u32,
    pub url_max_len: usize,
    pub thread_count: usize,
    pub interval: Duration,
    /// Advisory cap, honored only by the sequential loop
    pub max_items: Option<usize>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            url_max_len: DEFAULT_URL_MAX_LEN,
            thread_count: DEFAULT_THREAD_COUNT,
            interval: Duration::ZERO,
            max_items: None,
        }
    }
}

impl FetchConfig {
    /// Clamps counts that must be at least one.
    pub fn normalized(self) -> Self {
        Self {
            page_limit: self.page_limit.max(1),
            thread_count: self.thread_count.max(1),
            max_items: self.max_items.filter(|&cap| cap > 0),
            ..self
        }
    }

    /// Whether the worker-pool strategy is selected.
    pub fn is_parallel(&self) -> bool {
        self.thread_count > 1
    }
}

/// Timeout and retry behavior for every page request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    /// Network attempts per request, at least one
    pub max_retries: u32,
    pub sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            sleep: Duration::from_secs_f64(DEFAULT_RETRY_SLEEP_SECS),
        }
    }
}

/// Resolved configuration, validated and ready to drive one fetch.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub connection: ConnectionConfig,
    pub fetch: FetchConfig,
    pub retry: RetryPolicy,
    pub references: ReferenceMap,
    pub path: String,
    pub filters: Filters,
    pub output_file: Option<PathBuf>,
    pub verbose: bool,
}

impl CatalogConfig {
    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let token = match std::env::var(TOKEN_ENV_VAR) {
            Ok(token) => ApiToken::new(token)?,
            Err(_) => {
                log::warn!(
                    "{} environment variable not set, requests are anonymous",
                    TOKEN_ENV_VAR
                );
                ApiToken::default()
            }
        };

        let connection = ConnectionConfig::new(cli.host)?
            .with_scheme(cli.scheme.parse()?)
            .with_port(cli.port)
            .with_verify_tls(!cli.insecure)
            .with_token(token);

        let fetch = FetchConfig {
            page_limit: cli.limit,
            url_max_len: cli.url_max_len,
            thread_count: cli.threads,
            interval: seconds("interval", cli.interval)?,
            max_items: cli.max_items,
        }
        .normalized();

        let retry = RetryPolicy {
            timeout: seconds_or_default("timeout", cli.timeout, DEFAULT_TIMEOUT_SECS)?,
            max_retries: cli.max_retries.max(1),
            sleep: seconds_or_default("sleep", cli.sleep, DEFAULT_RETRY_SLEEP_SECS)?,
        };

        let mut filters = Filters::new();
        for argument in &cli.filters {
            filters.push_argument(argument)?;
        }

        let mut references = ReferenceMap::new();
        for argument in &cli.references {
            references.push_argument(argument)?;
        }

        let path = cli.path.trim_start_matches('/').to_string();
        if path.is_empty() {
            return Err(AppError::MissingConfiguration(
                "collection path is required".to_string(),
            ));
        }

        Ok(CatalogConfig {
            connection,
            fetch,
            retry,
            references,
            path,
            filters,
            output_file: cli.output_file.map(PathBuf::from),
            verbose: cli.verbose,
        })
    }
}

/// Converts a seconds option into a duration, rejecting negative or non-finite input.
fn seconds(name: &'static str, value: f64) -> Result<Duration, ValidationError> {
    const MAX_SECS: f64 = 86_400.0;
    if !value.is_finite() || !(0.0..=MAX_SECS).contains(&value) {
        return Err(ValidationError::OutOfBounds {
            name,
            value,
            min: 0.0,
            max: MAX_SECS,
        });
    }
    Ok(Duration::from_secs_f64(value))
}

/// Like [`seconds`], but 0 means "not set" and selects `default`.
fn seconds_or_default(
    name: &'static str,
    value: f64,
    default: f64,
) -> Result<Duration, ValidationError> {
    if value == 0.0 {
        log::debug!("{}=0 treated as unset, using {}s", name, default);
        return seconds(name, default);
    }
    seconds(name, value)
}
