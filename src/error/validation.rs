use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid target '{value}'. Expected 'host:port'.")]
    InvalidTargetFormat { value: String },
    #[error("Invalid target '{value}'. Host must not be empty.")]
    TargetHostEmpty { value: String },
    #[error("Invalid port in '{value}': {source}")]
    InvalidTargetPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Missing target (pass host:port or set `target` in config).")]
    MissingTarget,
    #[error("Extra header must be a single line without CR/LF: '{value}'")]
    HeaderContainsLineBreak { value: String },
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Prefix must not contain whitespace or CR/LF: '{value}'")]
    InvalidPrefix { value: String },
    #[error("Rate must be a finite number >= 0, got '{value}'.")]
    InvalidRate { value: String },
    #[error("Decay factor must be in (0, 1), got '{value}'.")]
    InvalidDecayFactor { value: String },
    #[error("Invalid wait mode '{value}'. Use poisson or regular.")]
    InvalidWaitMode { value: String },
    #[error("Invalid backend '{value}'. Use auto, poll, epoll, or kqueue.")]
    InvalidBackend { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid number '{value}': {source}")]
    InvalidFloat {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("Failed to build runtime: {source}")]
    RuntimeBuildFailed {
        #[source]
        source: std::io::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
