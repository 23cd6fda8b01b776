//! Domain error types.

/// Top-level error type for simtrader.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimtraderError {
    #[error("index {index} out of range for size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("operation on series of unequal size: {left} vs {right}")]
    OperationOnUnequalSizeSeries { left: usize, right: usize },

    #[error("cannot modify synchronized series {id}")]
    DisallowedMutation { id: String },

    #[error("cannot synchronize against an empty bar collection")]
    EmptySecondary,

    #[error("no data for {code} on {exchange}")]
    NoData { code: String, exchange: String },

    #[error("invalid indicator {spec:?}: {reason}")]
    InvalidIndicator { spec: String, reason: String },

    #[error("failed to build {id}: {reason}")]
    Builder { id: String, reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SimtraderError {
    fn from(err: std::io::Error) -> Self {
        SimtraderError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SimtraderError>;

impl From<&SimtraderError> for std::process::ExitCode {
    fn from(err: &SimtraderError) -> Self {
        let code: u8 = match err {
            SimtraderError::Io(_) => 1,
            SimtraderError::ConfigParse { .. }
            | SimtraderError::ConfigMissing { .. }
            | SimtraderError::ConfigInvalid { .. } => 2,
            SimtraderError::Data { .. } => 3,
            SimtraderError::InvalidIndicator { .. } => 4,
            SimtraderError::NoData { .. } | SimtraderError::Builder { .. } => 5,
            SimtraderError::IndexOutOfRange { .. }
            | SimtraderError::OperationOnUnequalSizeSeries { .. }
            | SimtraderError::DisallowedMutation { .. }
            | SimtraderError::EmptySecondary => 6,
        };
        std::process::ExitCode::from(code)
    }
}
