use crate::core::error::WriteError;
use crate::core::models::{DataPoint, Destination};
use crate::core::settings::InfluxSettings;
use crate::sink::line_protocol;
use crate::sink::PointWriter;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

const WRITE_PATH: &str = "/api/v2/write";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Synchronous InfluxDB v2 writer over the HTTP write API.
pub struct InfluxWriter {
    client: Option<reqwest::Client>,
    write_url: String,
    token: String,
}

impl InfluxWriter {
    pub fn new(settings: &InfluxSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .danger_accept_invalid_certs(!settings.verify_tls);

        let ca_cert = settings
            .ca_cert
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty());
        if let Some(path) = ca_cert {
            let pem = std::fs::read(path)
                .with_context(|| format!("Failed to read CA certificate: {}", path.display()))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .with_context(|| format!("Invalid CA certificate: {}", path.display()))?;
            builder = builder.add_root_certificate(cert);
        }

        if !settings.verify_tls {
            tracing::warn!("TLS certificate verification disabled for InfluxDB");
        }

        let client = builder
            .build()
            .context("Failed to build HTTP client for InfluxDB")?;

        Ok(Self {
            client: Some(client),
            write_url: format!("{}{}", settings.url.trim_end_matches('/'), WRITE_PATH),
            token: settings.token.clone(),
        })
    }
}

#[async_trait]
impl PointWriter for InfluxWriter {
    async fn write(
        &self,
        destination: &Destination,
        points: &[DataPoint],
    ) -> Result<(), WriteError> {
        let client = self.client.as_ref().ok_or(WriteError::Closed)?;

        if points.is_empty() {
            return Ok(());
        }

        let response = client
            .post(&self.write_url)
            .query(&[
                ("org", destination.org.as_str()),
                ("bucket", destination.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line_protocol::encode(points))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WriteError::Rejected {
                status_code: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            points = points.len(),
            bucket = %destination.bucket,
            "Wrote points to InfluxDB"
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<(), WriteError> {
        if self.client.take().is_some() {
            tracing::info!("Closed InfluxDB writer");
        }
        Ok(())
    }
}
