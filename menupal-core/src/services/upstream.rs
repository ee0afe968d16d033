use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{thread_rng, Rng};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use std::{thread, time::Duration};

const BASE_DELAY_MS: u64 = 800;
const MAX_BACKOFF_EXPONENT: usize = 6;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server error ({0})")]
    Server(u16),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

/// Produces the raw menu-analysis response for a batch of photographs.
pub trait MenuSource: Send + Sync {
    fn fetch(&self, images: &[Vec<u8>], target_language: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Serialize)]
struct ImagePayload {
    filename: String,
    image: String,
}

#[derive(Debug, Serialize)]
struct RequestPayload<'a> {
    target_language: &'a str,
    images: Vec<ImagePayload>,
}

#[derive(Debug)]
pub struct HttpMenuSource {
    client: Client,
    cfg: UpstreamConfig,
}

impl HttpMenuSource {
    pub fn new(cfg: UpstreamConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, cfg })
    }
}

impl MenuSource for HttpMenuSource {
    fn fetch(&self, images: &[Vec<u8>], target_language: &str) -> Result<Vec<u8>, FetchError> {
        if images.is_empty() {
            return Err(FetchError::InvalidRequest("no images".into()));
        }

        let body = build_payload(images, target_language);
        let attempts = self.cfg.max_retries.max(1);
        let mut last_err = FetchError::Network("no attempt made".into());

        for attempt in 0..attempts {
            let has_next = attempt + 1 < attempts;

            tracing::info!(
                endpoint = %self.cfg.endpoint,
                images = images.len(),
                attempt,
                "uploading menu images"
            );

            let resp = match self.client.post(&self.cfg.endpoint).json(&body).send() {
                Ok(resp) => resp,
                Err(err) => {
                    tracing::warn!(error = %err, attempt, "upstream request failed");
                    last_err = FetchError::Network(err.to_string());
                    if has_next {
                        thread::sleep(backoff(attempt));
                        continue;
                    }
                    break;
                }
            };

            let status = resp.status();
            tracing::info!(status = status.as_u16(), "upstream responded");

            if status != StatusCode::OK {
                last_err = FetchError::Server(status.as_u16());
                if should_retry_http(status) && has_next {
                    thread::sleep(backoff(attempt));
                    continue;
                }
                break;
            }

            match resp.bytes() {
                Ok(bytes) => return Ok(bytes.to_vec()),
                Err(err) => {
                    last_err = FetchError::Network(err.to_string());
                    if has_next {
                        thread::sleep(backoff(attempt));
                        continue;
                    }
                }
            }
        }

        Err(last_err)
    }
}

fn build_payload<'a>(images: &[Vec<u8>], target_language: &'a str) -> RequestPayload<'a> {
    let images = images
        .iter()
        .enumerate()
        .map(|(i, bytes)| ImagePayload {
            filename: format!("menu_{}.jpg", i + 1),
            image: STANDARD.encode(bytes),
        })
        .collect();

    RequestPayload {
        target_language,
        images,
    }
}

fn backoff(attempt: usize) -> Duration {
    let jitter: u64 = thread_rng().gen_range(0..200);
    let exponent = attempt.min(MAX_BACKOFF_EXPONENT) as u32;
    let ms = BASE_DELAY_MS * 2_u64.pow(exponent) + jitter;
    Duration::from_millis(ms)
}

fn should_retry_http(status: StatusCode) -> bool {
    // 408/429/5xx are usually transient
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}
