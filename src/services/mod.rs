pub mod callback;
pub mod generation;
pub mod imaging;
pub mod orchestrator;
pub mod queue;
pub mod vision;
