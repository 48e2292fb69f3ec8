use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("无效的URL: {0}")]
    InvalidUrl(String),
    #[error("缺少 RapidAPI Key，请通过 --rapidapi-key 或 RAPIDAPI_KEY 提供")]
    MissingApiKey,
    #[error("网络错误: {0}")]
    NetworkError(String),
    #[error("API错误: HTTP {status}")]
    ApiError { status: u16 },
    #[error("提取器错误: {0}")]
    ExtractorError(String),
    #[error("未找到可下载的媒体")]
    NoMediaFound,
}

impl From<reqwest::Error> for ParseError {
    fn from(err: reqwest::Error) -> Self {
        ParseError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::ExtractorError(err.to_string())
    }
}
