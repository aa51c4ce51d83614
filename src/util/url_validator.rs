use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP to a non-loopback host would expose the bearer token.
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    Insecure,
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates the catalog API base URL.
///
/// The bearer token is sent on every request, so the base must be HTTPS.
/// Plain HTTP is accepted only for loopback hosts (local mocks and tests).
///
/// The returned URL always ends with `/` so relative joins append to the
/// base path instead of replacing its last segment.
///
/// # Examples
///
/// ```
/// use podcast_gallery::util::validate_base_url;
///
/// let url = validate_base_url("https://neodb.social/api").unwrap();
/// assert_eq!(url.as_str(), "https://neodb.social/api/");
///
/// assert!(validate_base_url("http://neodb.social/api").is_err());
/// assert!(validate_base_url("http://127.0.0.1:8080").is_ok());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "https" => {}
        "http" => {
            if !is_loopback_host(&url) {
                tracing::error!(base_url = %url, "Rejecting non-HTTPS base URL");
                return Err(UrlValidationError::Insecure);
            }
            tracing::warn!(base_url = %url, "Using non-HTTPS catalog base URL (localhost only)");
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().is_none() {
        return Err(UrlValidationError::MissingHost);
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Validates a catalog-supplied link before it is written into the page.
///
/// Only absolute `http`/`https` URLs with a host are accepted, which keeps
/// `javascript:` and `data:` URLs out of `href` attributes.
pub fn validate_link(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().is_none() {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

fn is_loopback_host(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => {
            // Strip brackets from IPv6 addresses for parsing
            let host = host
                .strip_prefix('[')
                .and_then(|h| h.strip_suffix(']'))
                .unwrap_or(host);
            host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
        }
        None => false,
    }
}
