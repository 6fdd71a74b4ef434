use crate::core::error::ServiceError;
use crate::core::models::{OccupancyRecord, PollOutcome};
use crate::core::settings::ServiceSettings;
use crate::service::token::extract_token;
use crate::service::{classify_status, OccupancyService, Session};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Response, StatusCode};

const CSRF_HEADER: &str = "X-Csrf-Token";
const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// HTTP client for the Termaria (deporsite) occupancy page.
pub struct TermariaClient {
    client: reqwest::Client,
    landing_url: String,
    ajax_url: String,
}

impl TermariaClient {
    pub fn new(settings: &ServiceSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.request_timeout())
            .build()
            .context("Failed to build HTTP client for occupancy service")?;

        Ok(Self {
            client,
            landing_url: settings.landing_url.clone(),
            ajax_url: settings.ajax_url.clone(),
        })
    }

    fn transport_error(url: &str, source: reqwest::Error) -> ServiceError {
        ServiceError::Transport {
            url: url.to_string(),
            source,
        }
    }
}

fn response_cookies(response: &Response) -> Vec<(String, String)> {
    response
        .cookies()
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
}

#[async_trait]
impl OccupancyService for TermariaClient {
    async fn authenticate(&self) -> Result<Session, ServiceError> {
        let response = self
            .client
            .get(&self.landing_url)
            .send()
            .await
            .map_err(|e| Self::transport_error(&self.landing_url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ServiceError::AuthFailure {
                status_code: status.as_u16(),
            });
        }

        let cookies = response_cookies(&response);
        let body = response
            .text()
            .await
            .map_err(|e| Self::transport_error(&self.landing_url, e))?;

        let token = extract_token(&body)?;
        tracing::debug!(
            token_len = token.len(),
            cookies = cookies.len(),
            "Obtained CSRF token"
        );

        Ok(Session::new(token, cookies))
    }

    async fn poll(&self, session: &Session) -> Result<PollOutcome, ServiceError> {
        let mut request = self
            .client
            .post(&self.ajax_url)
            .header(CSRF_HEADER, session.token())
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE);

        if let Some(cookie) = session.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::transport_error(&self.ajax_url, e))?;

        if let Some(outcome) = classify_status(response.status().as_u16()) {
            return Ok(outcome);
        }

        let cookies = response_cookies(&response);
        let body = response
            .text()
            .await
            .map_err(|e| Self::transport_error(&self.ajax_url, e))?;

        let records: Vec<OccupancyRecord> = serde_json::from_str(&body)?;
        tracing::debug!(records = records.len(), "Fetched occupancy snapshot");

        Ok(PollOutcome::Success { records, cookies })
    }
}
