//! Questionnaire model and the wizard that fills it in.

pub mod answer;
pub mod kind;
pub mod question;
pub mod section;
pub mod store;
pub mod upload;
pub mod validator;
pub mod wizard;

pub use answer::{Answer, FileRef};
pub use kind::{encode_responses, Questionnaire, QuestionnaireKind};
pub use question::{
    normalize, normalize_entry, Choice, ChoiceId, Question, QuestionEntry, QuestionId,
    QuestionType, RawQuestion, UnsupportedQuestion,
};
pub use section::{Layout, MainFactor, Section, SectionGrouper, WizardPosition};
pub use store::FormValueStore;
pub use upload::{UploadCoordinator, UploadPhase, UploadState, UploadTicket};
pub use validator::{FailureReason, SectionValidator, Validation, ValidationFailure};
pub use wizard::{
    InFlight, PendingSubmission, Prompter, ReturnOutcome, SaveTicket, SubmitOutcome,
    SubmitTicket, UnsavedChoice, WizardController, WizardState,
};
