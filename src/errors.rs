use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceHubError {
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Oracle error: {0}")]
    OracleError(String),

    #[error("Data error: {0}")]
    DataError(String),
}

impl PriceHubError {
    /// 请求本身不合法（对应 HTTP 400），其余都视为上游或内部故障
    pub fn is_validation(&self) -> bool {
        matches!(self, PriceHubError::ValidationError(_) | PriceHubError::DateError(_))
    }
}

pub type Result<T> = std::result::Result<T, PriceHubError>;
