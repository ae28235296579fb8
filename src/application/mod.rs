pub mod orchestrator;

pub use orchestrator::{CancelHandle, IterativeOrchestrator, RunOptions};
