pub mod course;
pub mod layout;
pub mod outcome;

pub use course::{Course, EvaluationStatus};
pub use layout::{EvaluationLayout, PortalLayout, ScopedField};
pub use outcome::{OutcomeRecord, Pass, SubmitErrorKind, EVALUATION_LOAD_TIMEOUT};
