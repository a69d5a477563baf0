//! HTTP-backed preview fetching.

use std::time::Duration;

use bess_map_preview_models::PlaceholderReason;
use reqwest::Url;

use crate::html::parse_html_preview;
use crate::{Preview, PreviewConfig, PreviewError, PreviewService};

/// Title used for PDF links whose URL has no host.
const PDF_TITLE: &str = "PDF Document";

/// Fetches pages over HTTP with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpPreviewService {
    client: reqwest::Client,
    config: PreviewConfig,
}

impl HttpPreviewService {
    /// Builds the service and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::Http`] if the client cannot be built.
    pub fn new(config: PreviewConfig) -> Result<Self, PreviewError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    /// Returns the URL to fetch, or the placeholder for URLs that must not
    /// be fetched.
    ///
    /// # Errors
    ///
    /// The error value is the placeholder preview: [`Preview::placeholder`]
    /// with an invalid URL or skipped domain reason.
    pub fn precheck(&self, url: &str) -> Result<Url, Preview> {
        let Some(parsed) = validate_url(url) else {
            return Err(Preview::placeholder(&PlaceholderReason::InvalidUrl, url));
        };
        let lower = url.to_lowercase();
        match self
            .config
            .skipped_domains
            .iter()
            .find(|domain| lower.contains(&domain.to_lowercase()))
        {
            Some(domain) => Err(Preview::placeholder(
                &PlaceholderReason::SkippedDomain {
                    domain: domain.clone(),
                },
                url,
            )),
            None => Ok(parsed),
        }
    }

    async fn fetch_page(&self, url: &Url) -> Result<Preview, reqwest::Error> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;

        let host = url.host_str().unwrap_or_default().to_string();
        let is_pdf = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/pdf"));

        if is_pdf {
            let title = if host.is_empty() {
                PDF_TITLE.to_string()
            } else {
                host
            };
            return Ok(Preview {
                title,
                description: String::new(),
                image: String::new(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(parse_html_preview(
            &body,
            url.as_str(),
            &host,
            self.config.title_max_chars,
            self.config.description_max_chars,
        ))
    }
}

impl PreviewService for HttpPreviewService {
    async fn fetch(&self, url: &str) -> Preview {
        let parsed = match self.precheck(url) {
            Ok(parsed) => parsed,
            Err(placeholder) => return placeholder,
        };

        match self.fetch_page(&parsed).await {
            Ok(mut preview) => {
                url.clone_into(&mut preview.url);
                preview
            }
            Err(e) => {
                log::debug!("Preview fetch failed for {url}: {e}");
                Preview::unavailable(url)
            }
        }
    }
}

/// Parses `url` if it is a non-empty `http` or `https` URL.
#[must_use]
pub fn validate_url(url: &str) -> Option<Url> {
    let trimmed = url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return None;
    }
    Url::parse(trimmed).ok()
}
