use async_trait::async_trait;

use super::errors::ParseError;
use super::models::{MediaSource, Platform};
use super::parser_trait::MediaResolver;

/// 链接本身就是媒体地址
pub struct DirectResolver;

#[async_trait]
impl MediaResolver for DirectResolver {
    async fn resolve(&self, url: &str) -> Result<MediaSource, ParseError> {
        let url = url.trim();
        if url::Url::parse(url).is_err() {
            return Err(ParseError::InvalidUrl(url.to_string()));
        }
        Ok(MediaSource {
            platform: Platform::Direct,
            page_url: url.to_string(),
            media_url: url.to_string(),
            thumbnail_url: None,
        })
    }

    async fn thumbnail(&self, _url: &str) -> Option<String> {
        None
    }
}
