//! Constants for the download module (timeouts, concurrency bounds, status policy).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP request timeout (2 minutes; page scans are a few MiB at most).
pub const READ_TIMEOUT_SECS: u64 = 120;

/// Status codes treated as a successful image response.
///
/// 202 is returned by the edge firewall while it is still "processing" the
/// request, but the body already carries the final image payload.
pub const ACCEPTED_STATUS_CODES: [u16; 2] = [200, 202];

/// Default number of worker tasks.
pub const DEFAULT_WORKERS: usize = 8;

/// Default number of simultaneous connections to the image server.
pub const DEFAULT_MAX_CONNECTIONS: usize = 4;

/// Maximum allowed number of worker tasks.
pub const MAX_WORKERS: usize = 64;

/// Maximum allowed number of simultaneous connections.
pub const MAX_CONNECTIONS: usize = 32;

/// Prefix of the hidden temporary file a body is streamed into.
pub(crate) const PARTIAL_FILE_PREFIX: &str = ".";

/// Suffix of the hidden temporary file a body is streamed into.
pub(crate) const PARTIAL_FILE_SUFFIX: &str = ".part";
