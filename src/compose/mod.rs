pub mod flatten;
pub mod orchestrator;
