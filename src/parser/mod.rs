use tracing::debug;

use crate::common::client::client::MediaClient;

use direct::DirectResolver;
use errors::ParseError;
use instagram::InstagramResolver;
use models::{MediaSource, Platform, ResolverConfig};
use parser_trait::MediaResolver;
use youtube::YouTubeResolver;

pub mod detector;
pub mod direct;
pub mod errors;
pub mod instagram;
pub mod models;
pub mod parser_trait;
pub mod url_parser;
pub mod utils;
pub mod youtube;

/// 解析入口：按平台选择解析器
pub struct LinkParser {
    youtube: YouTubeResolver,
    instagram: InstagramResolver,
    direct: DirectResolver,
}

impl LinkParser {
    pub fn new(client: MediaClient, config: &ResolverConfig) -> Self {
        Self {
            youtube: YouTubeResolver::new(client.clone(), config),
            instagram: InstagramResolver::new(client, config),
            direct: DirectResolver,
        }
    }

    fn resolver_for(&self, platform: Platform) -> &dyn MediaResolver {
        match platform {
            Platform::YouTube => &self.youtube,
            Platform::Instagram => &self.instagram,
            Platform::Direct => &self.direct,
        }
    }

    pub fn detect(&self, url: &str) -> Result<Platform, ParseError> {
        detector::detect_platform(url)
    }

    pub async fn resolve(&self, url: &str) -> Result<MediaSource, ParseError> {
        let platform = self.detect(url)?;
        debug!("检测到平台：{}", platform);
        self.resolver_for(platform).resolve(url.trim()).await
    }

    pub async fn thumbnail(&self, url: &str) -> Result<Option<String>, ParseError> {
        let platform = self.detect(url)?;
        Ok(self.resolver_for(platform).thumbnail(url.trim()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_link_passes_through() {
        let parser = LinkParser::new(MediaClient::new().unwrap(), &ResolverConfig::default());
        let source = parser.resolve(" https://cdn.example.com/a.mp4 ").await.unwrap();
        assert_eq!(source.platform, Platform::Direct);
        assert_eq!(source.media_url, "https://cdn.example.com/a.mp4");
        assert_eq!(parser.thumbnail("https://cdn.example.com/a.mp4").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_link_rejected() {
        let parser = LinkParser::new(MediaClient::new().unwrap(), &ResolverConfig::default());
        assert!(matches!(
            parser.resolve("not a link").await,
            Err(ParseError::InvalidUrl(_))
        ));
    }
}
