use thiserror::Error;
use url::Url;

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];
const MIN_HOST_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidUrl {
    #[error("Please enter a URL")]
    Empty,
    #[error("Invalid URL format. Please enter a complete URL starting with http:// or https://")]
    Malformed,
    #[error("URL must use HTTP or HTTPS protocol")]
    Scheme,
    #[error("Invalid domain name")]
    Domain,
}

/// Checks that `input` is an absolute http(s) URL with a plausible host.
pub fn validate_url(input: &str) -> Result<Url, InvalidUrl> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InvalidUrl::Empty);
    }

    let url = Url::parse(trimmed).map_err(|_| InvalidUrl::Malformed)?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(InvalidUrl::Scheme);
    }

    match url.host_str() {
        Some(host) if host.len() >= MIN_HOST_LEN => Ok(url),
        _ => Err(InvalidUrl::Domain),
    }
}
