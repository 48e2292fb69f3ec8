use async_trait::async_trait;

use super::{errors::ParseError, models::MediaSource};

// 把一个页面链接解析成可直接下载的媒体地址
// 各平台的解析器实现这个trait
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<MediaSource, ParseError>;

    /// 封面获取失败不算错误
    async fn thumbnail(&self, url: &str) -> Option<String>;
}
