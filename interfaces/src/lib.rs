pub mod decision;
pub mod defs;
pub mod response;
pub mod state;

pub use decision::{DecisionEngine, DecisionError, DEFAULT_CONFIDENCE_THRESHOLD};
pub use defs::{Action, Classification, Headline, NoActionReason, SignalRule};
pub use response::parse_response;
pub use state::{SeenSet, SeenStore, StateError};
