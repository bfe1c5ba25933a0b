use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Arguments that are individually well formed but cannot be used together, or a value
    /// outside of what the API accepts.
    #[error("validation error: {0}")]
    Validation(String),

    /// A time expression that none of the supported formats recognise.
    #[error("unable to parse --{arg} value '{value}' as a date")]
    Parse { arg: &'static str, value: String },
}

impl QueryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        QueryError::Validation(msg.into())
    }

    pub fn parse(arg: &'static str, value: &str) -> Self {
        QueryError::Parse {
            arg,
            value: value.to_string(),
        }
    }
}
