use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::common::client::client::MediaClient;
use crate::common::utils::{guess_file_name, sanitize_file_name};
use crate::parser::LinkParser;
use crate::parser::models::{MediaSource, ResolverConfig};

pub use self::core::{Canceller, DownloadCore, DownloadHandle};
pub use error::DownloadError;
pub use models::{DownloadEvent, DownloaderConfig};
pub use progress::{ProgressEvent, ProgressRenderer};
pub use task::{DownloadTask, TaskStatus};

pub mod core;
pub mod error;
pub mod models;
pub mod progress;
pub mod task;

/// 先解析链接，再交给 DownloadCore 下载
pub struct MediaDownloader {
    parser: LinkParser,
    core: DownloadCore,
}

impl MediaDownloader {
    pub fn new(config: DownloaderConfig, resolver_config: &ResolverConfig) -> Result<Self, DownloadError> {
        let client = MediaClient::with_user_agent(&config.user_agent)?;
        Ok(Self {
            parser: LinkParser::new(client.clone(), resolver_config),
            core: DownloadCore::with_client(client, config),
        })
    }

    pub fn parser(&self) -> &LinkParser {
        &self.parser
    }

    pub async fn resolve_and_start(
        &self,
        link: &str,
        output_dir: &Path,
        file_name: Option<&str>,
    ) -> anyhow::Result<(MediaSource, DownloadHandle)> {
        if self.core.is_busy().await {
            return Err(DownloadError::AlreadyInProgress.into());
        }

        let source = self.parser.resolve(link).await.context("解析链接失败")?;
        info!("解析完成: {} -> {}", source.platform, source.media_url);

        let handle = self.start_source(&source, output_dir, file_name).await?;
        Ok((source, handle))
    }

    pub async fn start_source(
        &self,
        source: &MediaSource,
        output_dir: &Path,
        file_name: Option<&str>,
    ) -> anyhow::Result<DownloadHandle> {
        let file_name = file_name
            .map(sanitize_file_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| guess_file_name(&source.media_url));

        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", output_dir.display()))?;

        let output_path = output_dir.join(file_name);
        Ok(self.core.start(&source.media_url, output_path).await?)
    }
}
