//! HTTP client that streams a response body into a file

use super::report::TaskError;
use crate::config::FetcherConfig;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
    pub write_buffer: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::from(&FetcherConfig::default())
    }
}

impl From<&FetcherConfig> for HttpConfig {
    fn from(config: &FetcherConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
            user_agent: config.user_agent.clone(),
            write_buffer: config.write_buffer.as_usize().max(1),
        }
    }
}

/// HTTP downloader
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Create or truncate `destination`, GET `url` and stream the body into it
    ///
    /// Only `200 OK` counts as success. Every await point also watches
    /// `cancel`. Returns the number of bytes written.
    pub async fn download_to(
        &self,
        url: &str,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, TaskError> {
        let create_error = |e: std::io::Error| TaskError::CreateFile {
            path: destination.to_path_buf(),
            reason: e.to_string(),
        };

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TaskError::Cancelled),
                result = fs::create_dir_all(parent) => result.map_err(create_error)?,
            }
        }
        let file = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TaskError::Cancelled),
            result = File::create(destination) => result.map_err(create_error)?,
        };
        let mut writer = BufWriter::with_capacity(self.config.write_buffer, file);

        debug!(url, "Starting download");

        let mut response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TaskError::Cancelled),
            response = self.client.get(url).send() => response.map_err(map_request_error)?,
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TaskError::BadStatus(status.as_u16()));
        }

        let mut written: u64 = 0;
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TaskError::Cancelled),
                chunk = response.chunk() => chunk.map_err(map_body_error)?,
            };
            let Some(chunk) = chunk else {
                break;
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TaskError::Cancelled),
                result = writer.write_all(&chunk) => {
                    result.map_err(|e| TaskError::Write(e.to_string()))?
                }
            }
            written += chunk.len() as u64;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TaskError::Cancelled),
            result = writer.flush() => result.map_err(|e| TaskError::Write(e.to_string()))?,
        }

        debug!(url, size = written, "Download completed");
        Ok(written)
    }
}

fn map_request_error(e: reqwest::Error) -> TaskError {
    if e.is_timeout() {
        TaskError::Timeout
    } else {
        TaskError::Request(e.to_string())
    }
}

fn map_body_error(e: reqwest::Error) -> TaskError {
    if e.is_timeout() {
        TaskError::Timeout
    } else {
        TaskError::Body(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.write_buffer, 64 * 1024);
        assert!(config.user_agent.starts_with("fetchkit/"));
    }

    #[test]
    fn test_client_builds_with_timeout() {
        let config = HttpConfig {
            request_timeout: Some(Duration::from_secs(5)),
            ..HttpConfig::default()
        };
        let client = HttpClient::new(config).unwrap();
        assert_eq!(client.config().request_timeout, Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_touches_nothing() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let destination = temp_dir.path().join("nested/out.bin");
        let client = HttpClient::new(HttpConfig::default()).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client
            .download_to("http://127.0.0.1:9/never", &destination, &cancel)
            .await;

        assert_eq!(result, Err(TaskError::Cancelled));
        assert!(!destination.exists());
        assert!(!temp_dir.path().join("nested").exists());
    }
}
