pub mod app_core;
mod async_runtime;
pub mod domain;
pub mod gates;
pub mod history;
pub mod jobs;
pub mod kernel;
pub mod orchestrator;
pub mod ports;
pub mod viewmodel;

pub use app_core::*;
pub use domain::{AudioSettings, PhaseState, PublishState, SessionId, WizardState, WizardStep};
pub use gates::GateNotSatisfied;
pub use history::EditHistory;
pub use jobs::{Job, JobAttemptId, JobBoard, JobFailure, JobKind, JobOutput, JobRunEvent, JobState};
pub use kernel::WizardKernel;
pub use ports::*;
pub use viewmodel::*;
