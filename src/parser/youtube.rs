use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::common::client::client::MediaClient;

use super::errors::ParseError;
use super::models::{MediaSource, Platform, ResolverConfig};
use super::parser_trait::MediaResolver;
use super::url_parser::{extract_youtube_id, youtube_thumbnail_candidates_from};
use super::utils::{first_item, non_empty_str};

/// 通过外部 yt-dlp 进程取得直链
pub struct YouTubeResolver {
    client: MediaClient,
    ytdlp_path: String,
    format: String,
    thumbnail_base: String,
}

impl YouTubeResolver {
    pub fn new(client: MediaClient, config: &ResolverConfig) -> Self {
        Self {
            client,
            ytdlp_path: config.ytdlp_path.clone(),
            format: config.youtube_format.clone(),
            thumbnail_base: config.youtube_thumbnail_base.clone(),
        }
    }

    async fn run_extractor(&self, url: &str) -> Result<Value, ParseError> {
        debug!("调用 {} 解析: {}", self.ytdlp_path, url);
        let output = Command::new(&self.ytdlp_path)
            .args(["-f", self.format.as_str(), "--dump-single-json", "--no-playlist", "--no-warnings", url])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ParseError::ExtractorError(format!("无法启动 {}: {}", self.ytdlp_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("yt-dlp 退出状态: {}, {}", output.status, stderr);
            return Err(ParseError::ExtractorError(stderr));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// 依次尝试 `url`、`requested_formats[0].url`、`formats[0].url`
pub fn media_url_from_extractor_json(json: &Value) -> Option<String> {
    non_empty_str(json, "url")
        .or_else(|| first_item(json, "requested_formats").and_then(|f| non_empty_str(f, "url")))
        .or_else(|| first_item(json, "formats").and_then(|f| non_empty_str(f, "url")))
        .map(str::to_string)
}

#[async_trait]
impl MediaResolver for YouTubeResolver {
    async fn resolve(&self, url: &str) -> Result<MediaSource, ParseError> {
        let json = self.run_extractor(url).await?;
        let media_url = media_url_from_extractor_json(&json).ok_or(ParseError::NoMediaFound)?;
        info!("YouTube 直链解析成功");

        let thumbnail_url = non_empty_str(&json, "thumbnail").map(str::to_string);
        Ok(MediaSource {
            platform: Platform::YouTube,
            page_url: url.to_string(),
            media_url,
            thumbnail_url,
        })
    }

    async fn thumbnail(&self, url: &str) -> Option<String> {
        let id = extract_youtube_id(url)?;
        for candidate in youtube_thumbnail_candidates_from(&self.thumbnail_base, &id) {
            if self.client.is_accessible(&candidate).await {
                return Some(candidate);
            }
        }
        warn!("未找到可用的封面: {}", id);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_media_url_probe_order() {
        let json = json!({
            "url": "https://a.example/v.mp4",
            "formats": [{ "url": "https://c.example/v.mp4" }]
        });
        assert_eq!(media_url_from_extractor_json(&json).as_deref(), Some("https://a.example/v.mp4"));

        // 合并格式时顶层没有 url
        let json = json!({
            "requested_formats": [{ "url": "https://b.example/video" }, { "url": "https://b.example/audio" }],
            "formats": [{ "url": "https://c.example/v.mp4" }]
        });
        assert_eq!(media_url_from_extractor_json(&json).as_deref(), Some("https://b.example/video"));

        let json = json!({ "url": "", "formats": [{ "url": "https://c.example/v.mp4" }] });
        assert_eq!(media_url_from_extractor_json(&json).as_deref(), Some("https://c.example/v.mp4"));

        assert_eq!(media_url_from_extractor_json(&json!({ "formats": [] })), None);
    }

    #[tokio::test]
    async fn test_missing_extractor_binary() {
        let config = ResolverConfig {
            ytdlp_path: "/nonexistent/yt-dlp-binary".to_string(),
            ..Default::default()
        };
        let resolver = YouTubeResolver::new(MediaClient::new().unwrap(), &config);
        let err = resolver
            .resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::ExtractorError(_)));
    }

    #[tokio::test]
    async fn test_thumbnail_without_id() {
        let resolver = YouTubeResolver::new(MediaClient::new().unwrap(), &ResolverConfig::default());
        assert_eq!(resolver.thumbnail("https://www.youtube.com/feed/trending").await, None);
    }
}
