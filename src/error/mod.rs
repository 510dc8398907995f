mod app;
mod config;
mod connection;
mod corpus;
mod engine;
mod sink;
mod target;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use connection::ConnectionError;
pub use corpus::CorpusError;
pub use engine::{EngineError, MuxOp};
pub use sink::SinkError;
pub use target::TargetError;
pub use validation::ValidationError;
