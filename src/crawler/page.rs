//! The page record delivered to observers
use crate::crawler::parser::extract_title;
use crate::FetchError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

/// One completed fetch, successful or not
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL that was requested
    pub url: String,

    /// The URL after redirects
    pub final_url: String,

    /// HTTP status code; 0 when no response was received
    pub status_code: u16,

    /// Raw response body, absent in slim mode or when the fetch failed
    pub body: Option<Vec<u8>>,

    pub content_type: Option<String>,

    pub headers: Option<HashMap<String, String>>,

    pub fetched_at: DateTime<Utc>,

    /// Why the fetch failed, if it did
    pub error: Option<FetchError>,

    /// Screenshot bytes, when capture is configured to return them
    pub screenshot: Option<Vec<u8>>,

    /// Where the screenshot was written, when capture is configured to save
    pub screenshot_path: Option<PathBuf>,

    /// Links extracted from this page, when requested
    pub links: Option<Vec<String>>,
}

impl Page {
    /// Builds the record for a fetch that produced no HTTP response
    pub fn failed(url: &Url, error: FetchError) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            status_code: 0,
            body: None,
            content_type: None,
            headers: None,
            fetched_at: Utc::now(),
            error: Some(error),
            screenshot: None,
            screenshot_path: None,
            links: None,
        }
    }

    /// Returns true for a 2xx response
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns true when the fetch failed or the server answered 4xx/5xx
    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.status_code >= 400
    }

    /// The body decoded as UTF-8, replacing invalid sequences
    pub fn html(&self) -> Option<String> {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// The `<title>` of the page, if it has a body and a non-empty title
    pub fn title(&self) -> Option<String> {
        self.html().as_deref().and_then(extract_title)
    }
}
