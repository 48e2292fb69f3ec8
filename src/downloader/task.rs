use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DownloadError;

// 任务状态: Pending -> Running -> {Completed | Cancelled | Failed}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed(DownloadError),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Cancelled | TaskStatus::Failed(_)
        )
    }

    fn can_transition_to(&self, next: &TaskStatus) -> bool {
        match (self, next) {
            (TaskStatus::Pending, TaskStatus::Running) => true,
            (TaskStatus::Running, next) => next.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTask {
    pub task_id: String,
    pub url: String,
    pub output_path: PathBuf,
    /// 服务器声明的总大小，未声明时为 None
    pub total_size: Option<u64>,
    pub bytes_transferred: u64,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    total_resolved: bool,
}

impl DownloadTask {
    pub fn new(url: &str, output_path: PathBuf) -> Self {
        Self {
            task_id: uuid::Uuid::new_v4().to_string(),
            url: url.to_string(),
            output_path,
            total_size: None,
            bytes_transferred: 0,
            status: TaskStatus::Pending,
            started_at: None,
            total_resolved: false,
        }
    }

    pub fn transition(&mut self, next: TaskStatus) -> Result<(), DownloadError> {
        if !self.status.can_transition_to(&next) {
            return Err(DownloadError::InvalidState(format!(
                "{:?} -> {:?}",
                self.status, next
            )));
        }
        if next == TaskStatus::Running {
            self.started_at = Some(Utc::now());
        }
        self.status = next;
        Ok(())
    }

    // 总大小只在开始传输时确定一次
    pub fn set_total_size(&mut self, total: Option<u64>) -> Result<(), DownloadError> {
        if self.total_resolved {
            return Err(DownloadError::InvalidState("总大小已确定".to_string()));
        }
        self.total_size = total;
        self.total_resolved = true;
        Ok(())
    }

    pub fn advance_to(&mut self, bytes: u64) {
        // 已传输字节数只增不减
        self.bytes_transferred = self.bytes_transferred.max(bytes);
    }

    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task() -> DownloadTask {
        DownloadTask::new("https://example.com/a.mp4", PathBuf::from("/tmp/a.mp4"))
    }

    #[test]
    fn test_normal_lifecycle() {
        let mut task = new_task();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.started_at.is_none());

        task.transition(TaskStatus::Running).unwrap();
        assert!(task.is_running());
        assert!(task.started_at.is_some());

        task.transition(TaskStatus::Completed).unwrap();
        assert!(task.status.is_terminal());
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [
            TaskStatus::Completed,
            TaskStatus::Cancelled,
            TaskStatus::Failed(DownloadError::HttpError { status: 500 }),
        ] {
            let mut task = new_task();
            task.transition(TaskStatus::Running).unwrap();
            task.transition(terminal.clone()).unwrap();

            assert!(task.transition(TaskStatus::Running).is_err());
            assert!(task.transition(TaskStatus::Completed).is_err());
            assert_eq!(task.status, terminal);
        }
    }

    #[test]
    fn test_pending_cannot_finish_directly() {
        let mut task = new_task();
        let err = task.transition(TaskStatus::Completed).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidState(_)));
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_total_size_is_fixed_once_known() {
        let mut task = new_task();
        task.set_total_size(Some(1_000)).unwrap();
        assert!(task.set_total_size(Some(2_000)).is_err());
        assert_eq!(task.total_size, Some(1_000));

        let mut unknown = new_task();
        unknown.set_total_size(None).unwrap();
        assert!(unknown.set_total_size(Some(10)).is_err());
        assert_eq!(unknown.total_size, None);
    }

    #[test]
    fn test_bytes_never_decrease() {
        let mut task = new_task();
        task.advance_to(4096);
        task.advance_to(1024);
        assert_eq!(task.bytes_transferred, 4096);
        task.advance_to(8192);
        assert_eq!(task.bytes_transferred, 8192);
    }
}
