mod processor;
mod orchestrator;
mod loader;
mod consumer;

pub use processor::ProcessorError;
pub use orchestrator::OrchestratorError;
pub use loader::LoaderError;
pub use consumer::ConsumerError;
