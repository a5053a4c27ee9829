use thiserror::Error;

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Amount specifier that is neither `all`, a `%` marked number, nor a number.
    #[error("malformed amount specifier: {raw:?}")]
    MalformedAmount { raw: String },

    /// Economic parameter outside its admissible range.
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("distribution error: {0}")]
    Distribution(#[from] rand_distr::BernoulliError),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
