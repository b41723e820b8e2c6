//! HTTP handover gateway adapter
//!
//! Talks to the summarization service's REST API: generate a report from
//! shift notes, fetch a stored report by session id, and probe health.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ReportError, ReportGateway};
use crate::domain::report::{Attachments, HandoverReport, StructuredSummary};

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    shift_notes: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    alarms_json: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trends_csv: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HandoverResponse {
    markdown: String,
    json: StructuredSummary,
    session_id: Option<String>,
}

impl From<HandoverResponse> for HandoverReport {
    fn from(response: HandoverResponse) -> Self {
        Self {
            markdown: response.markdown,
            summary: response.json,
            session_id: response.session_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Handover service gateway over HTTP
pub struct HttpReportGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpReportGateway {
    /// Create a gateway against the given service base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Pull the service's error detail out of a failed response
    async fn service_error(response: reqwest::Response) -> ReportError {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or_else(|| format!("HTTP {}", status));
        ReportError::ServiceError(detail)
    }
}

#[async_trait]
impl ReportGateway for HttpReportGateway {
    async fn generate(
        &self,
        shift_notes: &str,
        attachments: &Attachments,
    ) -> Result<HandoverReport, ReportError> {
        let url = format!("{}/api/handover/generate", self.base_url);
        let body = GenerateRequest {
            shift_notes,
            alarms_json: attachments.alarms.as_ref(),
            trends_csv: attachments.trends_csv.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        let response: HandoverResponse = response
            .json()
            .await
            .map_err(|e| ReportError::ParseError(e.to_string()))?;

        Ok(response.into())
    }

    async fn fetch(&self, session_id: &str) -> Result<HandoverReport, ReportError> {
        let url = format!("{}/api/handover/{}", self.base_url, session_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ReportError::RequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ReportError::NotFound(session_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        let response: HandoverResponse = response
            .json()
            .await
            .map_err(|e| ReportError::ParseError(e.to_string()))?;

        Ok(response.into())
    }

    async fn health(&self) -> Result<(), ReportError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ReportError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway = HttpReportGateway::new("http://localhost:8000/");
        assert_eq!(gateway.base_url, "http://localhost:8000");
    }

    #[test]
    fn generate_request_skips_missing_attachments() {
        let request = GenerateRequest {
            shift_notes: "notes",
            alarms_json: None,
            trends_csv: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"shiftNotes": "notes"}));
    }

    #[test]
    fn generate_request_uses_camel_case() {
        let alarms = serde_json::json!({"active": []});
        let request = GenerateRequest {
            shift_notes: "notes",
            alarms_json: Some(&alarms),
            trends_csv: Some("timestamp,tag,value"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("alarmsJson").is_some());
        assert!(json.get("trendsCsv").is_some());
    }

    #[test]
    fn response_maps_into_report() {
        let json = r##"{
            "markdown": "# Handover",
            "json": {"shiftSummary": ["ok"]},
            "sessionId": "abc-123"
        }"##;
        let response: HandoverResponse = serde_json::from_str(json).unwrap();
        let report: HandoverReport = response.into();

        assert_eq!(report.markdown, "# Handover");
        assert_eq!(report.summary.shift_summary, vec!["ok"]);
        assert_eq!(report.session_id.as_deref(), Some("abc-123"));
    }
}
