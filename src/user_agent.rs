//! Browser identity headers required by the Portale Antenati servers.
//!
//! The image and manifest endpoints reject requests that do not look like
//! they come from the official web viewer: a browser User-Agent and a
//! Referer on the front-end origin are both mandatory (HTTP 403 otherwise).

/// Browser User-Agent sent on every request.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Origin of the official front end.
pub(crate) const FRONTEND_ORIGIN: &str = "https://antenati.cultura.gov.it";

/// Referer matching the official front end.
#[must_use]
pub(crate) fn frontend_referer() -> String {
    format!("{FRONTEND_ORIGIN}/")
}
