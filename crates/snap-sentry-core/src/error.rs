use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("snapraid {command} exited with status {status}")]
    ToolFailed { command: String, status: i32 },

    #[error("snapraid {command} was terminated by a signal")]
    ToolKilled { command: String },

    #[error("{0}")]
    Other(String),
}
