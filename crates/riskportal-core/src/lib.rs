//! # Risk Portal Core Library
//!
//! Client-side core of the vendor risk portal: the multi-step questionnaire
//! wizard vendors use to answer the corporate, contextual and risk-assessment
//! questionnaires, plus the scoring sheet the RA team uses to review them.
//! Every operation is available through the standalone `riskportal` CLI.
//!
//! ## Architecture
//!
//! - **Questionnaire**: question normalization, section grouping, the form
//!   value store, section validation, file uploads and the wizard
//!   controller that ties them together
//! - **Gateway**: the backend contract and its reqwest implementation
//! - **Review / Progress**: RA-team scoring and the vendor unlock order
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`WizardController`]: navigation, save/submit lifecycle, uploads
//! - [`SubmissionGateway`]: what the wizard needs from the backend
//! - [`ScoreSheet`]: reviewer scores for one submission
//! - [`Config`]: application configuration management

pub mod auth;
pub mod error;
pub mod gateway;
pub mod progress;
pub mod questionnaire;
pub mod review;
pub mod storage;

pub use auth::{Credentials, Role};
pub use error::{
    AuthError, ConfigError, CoreError, GatewayError, QuestionError, Result, ReviewError,
    UploadError, WizardError,
};
pub use gateway::{HttpGateway, ReviewGateway, SubmissionGateway};
pub use progress::{AssessmentStatus, StageStatus};
pub use questionnaire::{
    Answer, FileRef, Question, QuestionId, QuestionType, QuestionnaireKind, WizardController,
    WizardPosition,
};
pub use review::ScoreSheet;
pub use storage::Config;
