use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT,
};

use crate::utils::error::FetchError;

/// Build browser-like headers for ev.gogo.gs
///
/// The site serves Japanese pages; `Accept-Language` prefers `ja`.
///
/// # Errors
///
/// Returns `FetchError::InvalidHeader` when the user agent cannot be used as
/// a header value.
///
/// # Examples
///
/// ```
/// use ev_scraper::crawler::headers::build_site_headers;
///
/// let headers = build_site_headers(
///     "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
/// )
/// .unwrap();
/// assert!(headers.contains_key("accept-language"));
/// ```
pub fn build_site_headers(user_agent: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();

    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .map_err(|e| FetchError::InvalidHeader(format!("user agent: {e}")))?,
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("ja,en-US;q=0.9,en;q=0.8"),
    );
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));

    // Sec-Fetch headers for modern browser compatibility
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    Ok(headers)
}
