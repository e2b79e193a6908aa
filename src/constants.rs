// src/constants.rs
//! Domain constants that define the operational boundaries of the engine.
//!
//! Each constant is named for the concept it constrains. Reading them should
//! tell you how the engine talks to a catalog: how much it asks for per page,
//! how long a URL may grow, how patiently it waits.

// ---------------------------------------------------------------------------
// List endpoint contract
// ---------------------------------------------------------------------------

/// How many items are requested per page unless configured otherwise.
pub const DEFAULT_PAGE_LIMIT: u32 = 1000;

/// Longest encoded request URL the engine will emit.
///
/// Most reverse proxies reject request lines above 4 KiB; 3900 leaves room
/// for the request method and protocol version.
pub const DEFAULT_URL_MAX_LEN: usize = 3900;

/// Query key carrying the page size.
pub const LIMIT_KEY: &str = "limit";

/// Query key carrying the page offset.
pub const OFFSET_KEY: &str = "offset";

/// Extra parameters sent with a count probe to keep the payload small.
pub const PROBE_PARAMS: &[(&str, &str)] = &[("brief", "1")];

/// Suffix appended to a reference key once its names are resolved to ids.
pub const REFERENCE_ID_SUFFIX: &str = "_id";

// ---------------------------------------------------------------------------
// Parameter shaping
// ---------------------------------------------------------------------------

/// Filter keys whose values cannot be combined server-side in one request.
///
/// Substring search, status and tag filters are ANDed by the server when
/// repeated, so each value must be sent on its own.
pub const DEFAULT_PARALLEL_KEYS: &[&str] = &["q", "status", "tag"];

/// Keys the splitter may halve when a request grows too long, in priority order.
pub const DEFAULT_SLICE_KEYS: &[&str] = &[
    "id", "name", "slug", "display", "prefix", "address", "cid", "vid", "asn",
];

// ---------------------------------------------------------------------------
// Scheduling and retry
// ---------------------------------------------------------------------------

/// Worker count; 1 selects the sequential loop.
pub const DEFAULT_THREAD_COUNT: usize = 1;

/// Per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 60.0;

/// Network attempts per page request.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Pause between attempts after a timeout, in seconds.
pub const DEFAULT_RETRY_SLEEP_SECS: f64 = 10.0;

/// Case-insensitive pattern a 403 body must match to count as a credentials failure.
pub const CREDENTIALS_ERROR_PATTERN: &str = r"(?i)invalid token";

/// Environment variable holding the API token.
pub const TOKEN_ENV_VAR: &str = "CATALOG_TOKEN";
