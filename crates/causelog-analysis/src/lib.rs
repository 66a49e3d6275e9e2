// Causelog analysis - deterministic fallback classification plus the AI
// collaborator boundary. The fallback is the always-available path: pure
// rule tables, no I/O, never fails.

pub mod collaborator;
pub mod engine;
pub mod fallback;

pub use collaborator::{AnalysisCollaborator, AnalysisError, HttpCollaborator};
pub use engine::{AnalysisConfig, AnalysisEngine};
pub use fallback::FallbackClassifier;
