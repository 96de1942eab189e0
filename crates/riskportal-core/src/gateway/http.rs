//! reqwest-backed gateway.

use reqwest::{multipart, Body, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use super::wire::{
    CompleteReviewResponse, ErrorBody, PendingReview, QuestionnaireEnvelope, RaDashboard,
    ResponsesPayload, ScoresPayload, SubmissionDetail, UploadReceipt, UploadRequest,
    VendorDashboard,
};
use super::{ReviewGateway, SubmissionGateway};
use crate::auth::{Credentials, Role};
use crate::error::GatewayError;
use crate::progress::AssessmentStatus;
use crate::questionnaire::QuestionnaireKind;

const UPLOAD_PATH: &str = "api/v1/vendor/questionnaires/risk-assessment/upload/";
const VENDOR_DASHBOARD_PATH: &str = "api/v1/vendor/dashboard/";
const RA_DASHBOARD_PATH: &str = "api/v1/ra-team/dashboard/";

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Talks to the portal backend with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    chunk_size: usize,
}

impl HttpGateway {
    /// # Errors
    ///
    /// [`GatewayError::InvalidUrl`] for an unparseable base URL, or
    /// [`GatewayError::Network`] when the client cannot be built.
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        // `Url::join` drops the last segment unless the base ends with '/'
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("riskportal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            credentials,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Bytes per streamed upload chunk; one progress event per chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .bearer_auth(self.credentials.token())
            .send()
            .await?;
        decode(check(resp).await?).await
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, GatewayError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "POST");
        let resp = self
            .client
            .post(url)
            .bearer_auth(self.credentials.token())
            .json(body)
            .send()
            .await?;
        check(resp).await
    }
}

/// Map non-2xx responses to [`GatewayError::Status`], taking the message
/// from the body's `error` or `detail` field.
async fn check(resp: Response) -> Result<Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body
        .error
        .or(body.detail)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    tracing::warn!(status = status.as_u16(), %message, "request rejected");
    Err(GatewayError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, GatewayError> {
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

impl SubmissionGateway for HttpGateway {
    async fn fetch(&self, kind: QuestionnaireKind) -> Result<QuestionnaireEnvelope, GatewayError> {
        self.credentials.require(kind.required_role())?;
        let path = kind.path();
        let envelope = match kind {
            QuestionnaireKind::Corporate => QuestionnaireEnvelope::Corporate(self.get_json(&path).await?),
            QuestionnaireKind::Contextual => QuestionnaireEnvelope::Contextual(self.get_json(&path).await?),
            QuestionnaireKind::RiskAssessment => {
                QuestionnaireEnvelope::RiskAssessment(self.get_json(&path).await?)
            }
        };
        tracing::info!(%kind, "questionnaire fetched");
        Ok(envelope)
    }

    async fn save(&self, kind: QuestionnaireKind, payload: &ResponsesPayload) -> Result<(), GatewayError> {
        self.credentials.require(kind.required_role())?;
        self.post_json(&kind.save_path(), payload).await?;
        Ok(())
    }

    async fn submit(&self, kind: QuestionnaireKind, payload: &ResponsesPayload) -> Result<(), GatewayError> {
        self.credentials.require(kind.required_role())?;
        self.post_json(&kind.submit_path(), payload).await?;
        Ok(())
    }

    async fn upload<F>(&self, request: UploadRequest, on_progress: F) -> Result<UploadReceipt, GatewayError>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.credentials.require(Role::Vendor)?;
        let url = self.endpoint(UPLOAD_PATH)?;

        let total = request.bytes.len();
        let chunks: Vec<Vec<u8>> = request
            .bytes
            .chunks(self.chunk_size)
            .map(<[u8]>::to_vec)
            .collect();
        let mut sent = 0usize;
        // progress is reported as hyper pulls each chunk off the stream
        let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len();
            on_progress(percent_of(sent, total));
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), total as u64)
            .file_name(request.file_name.clone());
        let form = multipart::Form::new()
            .text("question_id", request.question_id.to_string())
            .text("questionnaire_id", request.questionnaire_id.clone())
            .part("file", part);

        tracing::debug!(%url, question_id = %request.question_id, bytes = total, "POST multipart");
        let resp = self
            .client
            .post(url)
            .bearer_auth(self.credentials.token())
            .multipart(form)
            .send()
            .await?;
        decode(check(resp).await?).await
    }

    async fn vendor_status(&self) -> Result<AssessmentStatus, GatewayError> {
        self.credentials.require(Role::Vendor)?;
        let dashboard: VendorDashboard = self.get_json(VENDOR_DASHBOARD_PATH).await?;
        Ok(dashboard.assessment_status)
    }
}

impl ReviewGateway for HttpGateway {
    async fn pending_reviews(&self) -> Result<Vec<PendingReview>, GatewayError> {
        self.credentials.require(Role::RaTeam)?;
        let dashboard: RaDashboard = self.get_json(RA_DASHBOARD_PATH).await?;
        Ok(dashboard.pending_reviews)
    }

    async fn fetch_submission(&self, submission_id: i64) -> Result<SubmissionDetail, GatewayError> {
        self.credentials.require(Role::RaTeam)?;
        self.get_json(&format!("api/v1/ra-team/submissions/{submission_id}/"))
            .await
    }

    async fn save_scores(&self, submission_id: i64, payload: &ScoresPayload) -> Result<(), GatewayError> {
        self.credentials.require(Role::RaTeam)?;
        self.post_json(&format!("api/v1/ra-team/submissions/{submission_id}/score/"), payload)
            .await?;
        Ok(())
    }

    async fn complete_review(&self, submission_id: i64) -> Result<CompleteReviewResponse, GatewayError> {
        self.credentials.require(Role::RaTeam)?;
        let resp = self
            .post_json(
                &format!("api/v1/ra-team/submissions/{submission_id}/complete/"),
                &serde_json::json!({}),
            )
            .await?;
        let bytes = resp.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(CompleteReviewResponse::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn percent_of(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) * 100) / total) as u8
}
