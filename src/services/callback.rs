use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::models::result::JobResult;

/// Delivers job results to callback addresses. One POST per result, no retry.
#[derive(Clone)]
pub struct CallbackClient {
    http: Client,
}

impl CallbackClient {
    pub fn new(timeout: Duration) -> Result<Self, CallbackError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// POST `result` as JSON to `url`. Anything other than a 2xx answer is an error.
    pub async fn deliver(&self, url: &str, result: &JobResult) -> Result<StatusCode, CallbackError> {
        let response = self.http.post(url).json(result).send().await.map_err(|e| {
            if e.is_timeout() {
                CallbackError::Timeout
            } else {
                CallbackError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallbackError::Rejected(status));
        }
        Ok(status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("callback request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("callback timed out")]
    Timeout,

    #[error("callback rejected with status {0}")]
    Rejected(StatusCode),
}
