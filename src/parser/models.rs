use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
pub const DEFAULT_YOUTUBE_FORMAT: &str = "best[height<=720]";
pub const DEFAULT_RAPIDAPI_HOST: &str = "instagram-downloader-download-instagram-videos-stories.p.rapidapi.com";
pub const YOUTUBE_THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    YouTube,
    Instagram,
    Direct, // 其他链接按直链处理
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::YouTube => write!(f, "YouTube"),
            Platform::Instagram => write!(f, "Instagram"),
            Platform::Direct => write!(f, "直链"),
        }
    }
}

/// 解析结果：可以直接交给下载器的地址
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    pub platform: Platform,
    pub page_url: String,
    pub media_url: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub ytdlp_path: String,
    pub youtube_format: String,
    pub youtube_thumbnail_base: String,
    pub rapidapi_key: Option<String>,
    pub rapidapi_host: String,
    /// 为空时使用 https://{rapidapi_host}
    pub instagram_api_base: Option<String>,
}

impl ResolverConfig {
    pub fn instagram_endpoint(&self) -> String {
        let base = self
            .instagram_api_base
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.rapidapi_host));
        format!("{}/index", base.trim_end_matches('/'))
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: DEFAULT_YTDLP_PATH.to_string(),
            youtube_format: DEFAULT_YOUTUBE_FORMAT.to_string(),
            youtube_thumbnail_base: YOUTUBE_THUMBNAIL_BASE.to_string(),
            rapidapi_key: None,
            rapidapi_host: DEFAULT_RAPIDAPI_HOST.to_string(),
            instagram_api_base: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instagram_endpoint() {
        let config = ResolverConfig::default();
        assert_eq!(
            config.instagram_endpoint(),
            format!("https://{}/index", DEFAULT_RAPIDAPI_HOST)
        );

        let config = ResolverConfig {
            instagram_api_base: Some("http://127.0.0.1:8080/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.instagram_endpoint(), "http://127.0.0.1:8080/index");
    }
}
