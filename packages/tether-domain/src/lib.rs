pub mod citation;
pub mod message;
pub mod steps;
pub mod time_serde;
pub mod trim;

mod grounding;

pub use grounding::{AuthContext, GroundingResult, Reference, SearchConfig};
pub use message::{ChatMessage, Role};
pub use steps::{ProcessingStep, StepKind, StepTrace};
