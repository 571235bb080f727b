use thiserror::Error;

/// Main error type for steptrace operations
#[derive(Error, Debug)]
pub enum StepTraceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported language level '{0}', expected one of JAVA_8 .. JAVA_17")]
    UnsupportedLanguageLevel(String),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, StepTraceError>;
