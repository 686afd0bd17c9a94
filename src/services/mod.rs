pub mod auth;
pub mod evaluation_form;
pub mod mutator;
pub mod navigation;
pub mod poller;
pub mod quiescence;
pub mod results_writer;

pub use auth::Authenticator;
pub use evaluation_form::{is_placeholder, message_requests_grade, EvaluationForm};
pub use mutator::{MutationFailed, MutatorPolicy, VerifiedMutator};
pub use navigation::MenuNavigator;
pub use poller::{ConditionPoller, WaitTimeout};
pub use quiescence::QuiescenceDetector;
pub use results_writer::{JsonResultWriter, ResultSink};
