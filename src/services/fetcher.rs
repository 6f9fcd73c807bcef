use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use reqwest::{header::CONTENT_TYPE, Client};

use crate::error::ScrapeError;

pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self, ScrapeError> {
        let user_agent = match user_agent {
            Some(ua) => ua.to_string(),
            None => fake_user_agent::get_rua().to_string(),
        };
        log::info!("Fetching pages as user agent: {}", user_agent);

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(ScrapeError::Client)?;

        Ok(PageFetcher { client })
    }

    /// One GET, no retries. Non-2xx statuses are errors.
    pub async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::Network {
                url: url.to_string(),
                source: e,
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }

        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = res.bytes().await.map_err(|e| ScrapeError::Network {
            url: url.to_string(),
            source: e,
        })?;
        log::info!("Fetched {} bytes from {}", body.len(), url);

        decode_body(&body, content_type.as_deref()).map_err(|reason| ScrapeError::Parse {
            url: url.to_string(),
            reason,
        })
    }
}

/// Decodes with the BOM, the Content-Type charset or a `<meta charset>`, in
/// that order, falling back to utf-8. Malformed bytes are an error.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> Result<String, String> {
    let (encoding, bom_len) = match Encoding::for_bom(body) {
        Some((encoding, bom_len)) => (encoding, bom_len),
        None => {
            let encoding = content_type
                .and_then(charset_label)
                .or_else(|| meta_charset(body))
                .and_then(|label| Encoding::for_label(label.as_bytes()))
                .unwrap_or(UTF_8);
            (encoding, 0)
        }
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(&body[bom_len..])
        .map(|text| text.into_owned())
        .ok_or_else(|| format!("body is not valid {}", encoding.name()))
}

fn charset_label(content_type: &str) -> Option<String> {
    let lower = content_type.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();
    let label = lower[start..]
        .split(';')
        .next()?
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');

    (!label.is_empty()).then(|| label.to_string())
}

fn meta_charset(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(1024)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(|c| c == '"' || c == '\'')
        .chars()
        .take_while(|c| !matches!(c, '"' | '\'' | ';' | '>' | '/') && !c.is_whitespace())
        .collect();

    (!label.is_empty()).then_some(label)
}
