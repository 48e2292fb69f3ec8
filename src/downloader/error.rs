use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DownloadError {
    #[error("已有下载任务正在进行")]
    AlreadyInProgress,

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP 请求失败，状态码: {status}")]
    HttpError { status: u16 },

    #[error("网络错误: {0}")]
    NetworkError(String),

    #[error("IO错误: {0}")]
    IoError(String),

    // 服务器声明的长度与实际收到的字节数不一致
    #[error("文件大小不匹配: 期望 {expected} 字节, 实际 {actual} 字节")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("下载已取消")]
    Cancelled,

    #[error("无效的状态: {0}")]
    InvalidState(String),
}

impl From<reqwest::Error> for DownloadError {
    fn from(error: reqwest::Error) -> Self {
        DownloadError::NetworkError(error.to_string())
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(error: std::io::Error) -> Self {
        DownloadError::IoError(error.to_string())
    }
}
