//! Tool provider implementations.
//!
//! One networked Generator (chat-completions) plus offline Tester, Analyzer,
//! and Packager. Scripted variants replay fixed responses for tests and the
//! offline demo path.

pub mod container_packager;
pub mod heuristic_analyzer;
pub mod openai_generator;
pub mod scripted;
pub mod static_tester;

pub use container_packager::ContainerPackager;
pub use heuristic_analyzer::HeuristicAnalyzer;
pub use openai_generator::OpenAiGenerator;
pub use scripted::{ScriptedAnalyzer, ScriptedGenerator, ScriptedPackager, ScriptedTester};
pub use static_tester::StaticTester;
