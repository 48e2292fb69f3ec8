use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::DownloadError;
use super::progress::ProgressEvent;

pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub chunk_size: usize,
    pub progress_interval: Duration,
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// 推送给调用方的事件，同一任务内严格有序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DownloadEvent {
    Started {
        task_id: String,
        url: String,
        output_path: PathBuf,
    },
    Progress(ProgressEvent),
    Completed {
        task_id: String,
        total_bytes: u64,
    },
    Cancelled {
        task_id: String,
        bytes_transferred: u64,
    },
    Failed {
        task_id: String,
        bytes_transferred: u64,
        error: DownloadError,
    },
}

impl DownloadEvent {
    pub fn task_id(&self) -> &str {
        match self {
            DownloadEvent::Started { task_id, .. }
            | DownloadEvent::Completed { task_id, .. }
            | DownloadEvent::Cancelled { task_id, .. }
            | DownloadEvent::Failed { task_id, .. } => task_id,
            DownloadEvent::Progress(progress) => &progress.task_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadEvent::Completed { .. }
                | DownloadEvent::Cancelled { .. }
                | DownloadEvent::Failed { .. }
        )
    }

    /// 终态的一行描述
    pub fn summary(&self) -> Option<String> {
        match self {
            DownloadEvent::Completed { total_bytes, .. } => Some(format!(
                "下载完成，共 {}",
                crate::common::utils::FormatTool::format_size(*total_bytes)
            )),
            DownloadEvent::Cancelled { bytes_transferred, .. } => Some(format!(
                "下载已取消，已保存 {}",
                crate::common::utils::FormatTool::format_size(*bytes_transferred)
            )),
            DownloadEvent::Failed { error, .. } => Some(format!("下载失败: {}", error)),
            _ => None,
        }
    }
}
