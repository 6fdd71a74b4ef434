use crate::core::models::{DataPoint, PollOutcome};
use crate::core::settings::Settings;
use crate::core::transform::transform;
use crate::service::{OccupancyService, TermariaClient};
use crate::sink::line_protocol;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct CheckOutput {
    #[serde(with = "chrono::serde::ts_seconds")]
    fetched_at: DateTime<Utc>,
    facilities: usize,
    points: Vec<DataPoint>,
}

/// Opens a session, polls once and prints the points that `run` would write.
pub async fn run(settings: &Settings, json: bool) -> Result<()> {
    settings.validate()?;

    let client = TermariaClient::new(&settings.service)?;
    let points = fetch_points(&client, &settings.influx.measurement).await?;

    if json {
        let output = CheckOutput {
            fetched_at: Utc::now(),
            facilities: points.len() / crate::core::transform::POINTS_PER_RECORD,
            points,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", line_protocol::encode(&points));
    }

    Ok(())
}

async fn fetch_points<S>(service: &S, measurement: &str) -> Result<Vec<DataPoint>>
where
    S: OccupancyService + ?Sized,
{
    let session = service.authenticate().await?;

    match service.poll(&session).await? {
        PollOutcome::Success { records, .. } => Ok(transform(measurement, &records)),
        PollOutcome::Expired => anyhow::bail!("Session expired on first poll (status 419)"),
        PollOutcome::Failure { status_code } => {
            anyhow::bail!("Occupancy request failed with status {}", status_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::ServiceSettings;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_landing(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/ocupacion-aforo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<head><meta name="csrf-token" content="ABC123"/></head>"#,
            ))
            .mount(server)
            .await;
    }

    fn client_for(server: &MockServer) -> TermariaClient {
        TermariaClient::new(&ServiceSettings {
            landing_url: format!("{}/ocupacion-aforo", server.uri()),
            ajax_url: format!("{}/ajax", server.uri()),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_points() {
        let server = MockServer::start().await;
        mount_landing(&server).await;
        Mock::given(method("POST"))
            .and(path("/ajax"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"IdRecinto": 1, "Recinto": "circuito termal", "Ocupacion": 10, "Entradas": 5, "Salidas": 2, "Aforo": 50}]"#,
            ))
            .mount(&server)
            .await;

        let points = fetch_points(&client_for(&server), "aforo").await.unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(
            points[0].tags.get("nombre_recinto").map(String::as_str),
            Some("Circuito Termal")
        );
    }

    #[tokio::test]
    async fn test_fetch_points_reports_expired_session() {
        let server = MockServer::start().await;
        mount_landing(&server).await;
        Mock::given(method("POST"))
            .and(path("/ajax"))
            .respond_with(ResponseTemplate::new(419))
            .mount(&server)
            .await;

        let err = fetch_points(&client_for(&server), "aforo")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("419"));
    }
}
