use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::common::client::client::MediaClient;

use super::errors::ParseError;
use super::models::{MediaSource, Platform, ResolverConfig};
use super::parser_trait::MediaResolver;
use super::utils::probe_string;

const MEDIA_KEYS: [&str; 2] = ["video_url", "url"];
const THUMBNAIL_KEYS: [&str; 3] = ["thumbnail", "thumb", "thumbnail_url"];

/// 通过 RapidAPI 的下载接口解析 Instagram 链接
pub struct InstagramResolver {
    client: MediaClient,
    endpoint: String,
    api_key: Option<String>,
    api_host: String,
}

impl InstagramResolver {
    pub fn new(client: MediaClient, config: &ResolverConfig) -> Self {
        Self {
            client,
            endpoint: config.instagram_endpoint(),
            api_key: config.rapidapi_key.clone().filter(|k| !k.trim().is_empty()),
            api_host: config.rapidapi_host.clone(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Value, ParseError> {
        let api_key = self.api_key.as_ref().ok_or(ParseError::MissingApiKey)?;
        let request_url = format!("{}?url={}", self.endpoint, urlencoding::encode(url));
        debug!("请求 Instagram 解析接口: {}", self.endpoint);

        let headers = [
            ("x-rapidapi-key", api_key.clone()),
            ("x-rapidapi-host", self.api_host.clone()),
        ];
        let (status, json) = self.client.get_json(&request_url, &headers).await?;
        if !(200..300).contains(&status) {
            warn!("Instagram 接口返回: HTTP {}", status);
            return Err(ParseError::ApiError { status });
        }

        json.ok_or(ParseError::NoMediaFound)
    }
}

pub fn media_url_from_api_json(json: &Value) -> Option<String> {
    probe_string(json, &MEDIA_KEYS, "media", "url")
}

pub fn thumbnail_from_api_json(json: &Value) -> Option<String> {
    probe_string(json, &THUMBNAIL_KEYS, "media", "thumbnail")
}

#[async_trait]
impl MediaResolver for InstagramResolver {
    async fn resolve(&self, url: &str) -> Result<MediaSource, ParseError> {
        let json = self.fetch(url).await?;
        let media_url = media_url_from_api_json(&json).ok_or(ParseError::NoMediaFound)?;
        info!("Instagram 直链解析成功");

        Ok(MediaSource {
            platform: Platform::Instagram,
            page_url: url.to_string(),
            media_url,
            thumbnail_url: thumbnail_from_api_json(&json),
        })
    }

    async fn thumbnail(&self, url: &str) -> Option<String> {
        match self.fetch(url).await {
            Ok(json) => thumbnail_from_api_json(&json),
            Err(e) => {
                warn!("获取 Instagram 封面失败: {}", e);
                None
            }
        }
    }
}
