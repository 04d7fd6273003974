pub mod classify;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod progress;
pub mod render;
pub mod report;
pub mod runner;
pub mod script;

pub use config::AppConfig;
pub use engine::{Classification, GuardEngine, RunResult};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter, Stage};
