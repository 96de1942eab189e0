//! Backend collaborator.
//!
//! The wizard and the review sheet only depend on these traits; the
//! reqwest-backed [`HttpGateway`] is one implementation, in-memory fakes in
//! tests are another.

pub mod http;
pub mod wire;

use std::future::Future;

use crate::error::GatewayError;
use crate::progress::AssessmentStatus;
use crate::questionnaire::QuestionnaireKind;
use wire::{
    CompleteReviewResponse, PendingReview, QuestionnaireEnvelope, ResponsesPayload,
    ScoresPayload, SubmissionDetail, UploadReceipt, UploadRequest,
};

pub use http::HttpGateway;

/// Vendor-side endpoints.
pub trait SubmissionGateway: Send + Sync {
    fn fetch(
        &self,
        kind: QuestionnaireKind,
    ) -> impl Future<Output = Result<QuestionnaireEnvelope, GatewayError>> + Send;

    fn save(
        &self,
        kind: QuestionnaireKind,
        payload: &ResponsesPayload,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn submit(
        &self,
        kind: QuestionnaireKind,
        payload: &ResponsesPayload,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Upload one file. `on_progress` receives 0-100 as the body is sent.
    fn upload<F>(
        &self,
        request: UploadRequest,
        on_progress: F,
    ) -> impl Future<Output = Result<UploadReceipt, GatewayError>> + Send
    where
        F: Fn(u8) + Send + Sync + 'static;

    fn vendor_status(&self) -> impl Future<Output = Result<AssessmentStatus, GatewayError>> + Send;
}

/// RA-team endpoints.
pub trait ReviewGateway: Send + Sync {
    fn pending_reviews(&self) -> impl Future<Output = Result<Vec<PendingReview>, GatewayError>> + Send;

    fn fetch_submission(
        &self,
        submission_id: i64,
    ) -> impl Future<Output = Result<SubmissionDetail, GatewayError>> + Send;

    fn save_scores(
        &self,
        submission_id: i64,
        payload: &ScoresPayload,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn complete_review(
        &self,
        submission_id: i64,
    ) -> impl Future<Output = Result<CompleteReviewResponse, GatewayError>> + Send;
}
