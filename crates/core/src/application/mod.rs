// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod job;
pub mod jobs;
mod panic_guard;
pub mod scheduler;
mod shutdown;

// Re-exports
pub use job::{JobDefinition, JobLogic};
pub use scheduler::Scheduler;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
