use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::TryStreamExt;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tokio_util::io::StreamReader;
use url::Url;

use crate::common::client::client::MediaClient;

use super::error::DownloadError;
use super::models::{DownloadEvent, DownloaderConfig};
use super::progress::ProgressTracker;
use super::task::{DownloadTask, TaskStatus};

use tracing::{debug, error, info, warn};

// 传输循环的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransferOutcome {
    Finished(u64),
    Cancelled(u64),
}

/// 单任务下载器：同一时间只允许一个任务在传输
#[derive(Clone)]
pub struct DownloadCore {
    client: MediaClient,
    config: DownloaderConfig,
    active: Arc<Mutex<Option<String>>>, // 正在进行的任务 id
}

impl DownloadCore {
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let client = MediaClient::with_user_agent(&config.user_agent)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: MediaClient, config: DownloaderConfig) -> Self {
        Self {
            client,
            config,
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn is_busy(&self) -> bool {
        self.active.lock().await.is_some()
    }

    // 启动下载任务，已有任务在进行时直接拒绝
    pub async fn start(
        &self,
        url: &str,
        output_path: impl AsRef<Path>,
    ) -> Result<DownloadHandle, DownloadError> {
        Self::validate_url(url)?;

        let mut active = self.active.lock().await;
        if let Some(running) = active.as_ref() {
            warn!("已有下载任务正在进行: {}", running);
            return Err(DownloadError::AlreadyInProgress);
        }

        let mut task = DownloadTask::new(url, output_path.as_ref().to_path_buf());
        let task_id = task.task_id.clone();
        debug!("创建下载任务: {}, 保存到: {}", task_id, task.output_path.display());

        task.transition(TaskStatus::Running)?;
        *active = Some(task_id.clone());
        drop(active);

        let task = Arc::new(Mutex::new(task));
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run(
            self.client.clone(),
            self.config.clone(),
            Arc::clone(&task),
            Arc::clone(&cancel_flag),
            tx,
            Arc::clone(&self.active),
        ));

        Ok(DownloadHandle {
            task_id,
            task,
            cancel_flag,
            events: rx,
        })
    }

    // 取消任务，非运行状态下什么也不做
    pub async fn cancel(&self, handle: &DownloadHandle) -> bool {
        handle.cancel().await
    }

    fn validate_url(url: &str) -> Result<(), DownloadError> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| DownloadError::InvalidUrl(format!("{}: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DownloadError::InvalidUrl(format!(
                "不支持的协议 {}: {}",
                scheme, url
            ))),
        }
    }

    async fn run(
        client: MediaClient,
        config: DownloaderConfig,
        task: Arc<Mutex<DownloadTask>>,
        cancel_flag: Arc<AtomicBool>,
        tx: mpsc::UnboundedSender<DownloadEvent>,
        active: Arc<Mutex<Option<String>>>,
    ) {
        let (task_id, url, output_path) = {
            let guard = task.lock().await;
            (guard.task_id.clone(), guard.url.clone(), guard.output_path.clone())
        };
        let start_time = Instant::now();

        info!("开始下载任务: {}", task_id);
        let _ = tx.send(DownloadEvent::Started {
            task_id: task_id.clone(),
            url: url.clone(),
            output_path: output_path.clone(),
        });

        let result = Self::download_to_file(
            &client,
            &config,
            &url,
            &output_path,
            &task,
            &cancel_flag,
            &tx,
            start_time,
        )
        .await;

        let (status, event) = match result {
            Ok(TransferOutcome::Finished(total_bytes)) => {
                info!("✅ 下载任务完成: {}, 共 {} 字节", task_id, total_bytes);
                (
                    TaskStatus::Completed,
                    DownloadEvent::Completed {
                        task_id: task_id.clone(),
                        total_bytes,
                    },
                )
            }
            Ok(TransferOutcome::Cancelled(bytes_transferred)) => {
                info!("⏹️ 下载任务已取消: {}, 已写入 {} 字节", task_id, bytes_transferred);
                (
                    TaskStatus::Cancelled,
                    DownloadEvent::Cancelled {
                        task_id: task_id.clone(),
                        bytes_transferred,
                    },
                )
            }
            Err(e) => {
                error!("❌ 下载任务失败: {}, 错误: {}", task_id, e);
                let bytes_transferred = task.lock().await.bytes_transferred;
                (
                    TaskStatus::Failed(e.clone()),
                    DownloadEvent::Failed {
                        task_id: task_id.clone(),
                        bytes_transferred,
                        error: e,
                    },
                )
            }
        };

        if let Err(e) = task.lock().await.transition(status) {
            error!("任务状态更新失败: {}, {}", task_id, e);
        }

        // 先释放槽位再发终态事件，调用方收到终态后可以立即开始新任务
        {
            let mut slot = active.lock().await;
            if slot.as_deref() == Some(task_id.as_str()) {
                *slot = None;
            }
        }

        let _ = tx.send(event);
    }

    #[allow(clippy::too_many_arguments)]
    async fn download_to_file(
        client: &MediaClient,
        config: &DownloaderConfig,
        url: &str,
        output_path: &Path,
        task: &Mutex<DownloadTask>,
        cancel_flag: &AtomicBool,
        tx: &mpsc::UnboundedSender<DownloadEvent>,
        start_time: Instant,
    ) -> Result<TransferOutcome, DownloadError> {
        let response = client.get_raw_response(url).await.map_err(|e| {
            warn!("请求失败: {}", e);
            DownloadError::NetworkError(e.to_string())
        })?;

        Self::check_response_status(&response, url)?;

        let total_size = response.content_length();
        debug!("Content-Length: {:?}", total_size);
        task.lock().await.set_total_size(total_size)?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = File::create(output_path).await?;
        let mut sink = BufWriter::with_capacity(config.chunk_size.max(1), file);

        let reader = StreamReader::new(response.bytes_stream().map_err(std::io::Error::other));
        let task_id = task.lock().await.task_id.clone();
        let mut tracker =
            ProgressTracker::new(&task_id, total_size, config.progress_interval, start_time);

        let result = transfer(
            reader,
            &mut sink,
            &mut tracker,
            config.chunk_size,
            cancel_flag,
            task,
            tx,
        )
        .await;

        // 无论结果如何都刷新并关闭文件，部分文件保留在磁盘上
        let closed = close_sink(&mut sink).await;
        let outcome = result?;
        closed?;

        debug!("文件已写入: {}", output_path.display());
        Ok(outcome)
    }

    // 检查响应状态
    fn check_response_status(response: &reqwest::Response, url: &str) -> Result<(), DownloadError> {
        let status = response.status();
        debug!("Response Status: {}", status);

        if status.is_success() {
            Ok(())
        } else {
            warn!("❌ 非成功状态码: {}, URL: {}", status, url);
            Err(DownloadError::HttpError {
                status: status.as_u16(),
            })
        }
    }
}

async fn close_sink<W: AsyncWrite + Unpin>(sink: &mut W) -> Result<(), DownloadError> {
    sink.flush().await?;
    sink.shutdown().await?;
    Ok(())
}

/// 按固定大小分块读取并写入目标，每个块之间检查取消标志
pub(crate) async fn transfer<R, W>(
    mut reader: R,
    sink: &mut W,
    tracker: &mut ProgressTracker,
    chunk_size: usize,
    cancel_flag: &AtomicBool,
    task: &Mutex<DownloadTask>,
    tx: &mpsc::UnboundedSender<DownloadEvent>,
) -> Result<TransferOutcome, DownloadError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let _ = tx.send(DownloadEvent::Progress(tracker.force()));

    let mut buffer = vec![0u8; chunk_size.max(1)];
    let result = loop {
        if cancel_flag.load(Ordering::SeqCst) {
            debug!("检测到取消请求，停止传输");
            break Ok(TransferOutcome::Cancelled(tracker.bytes_transferred()));
        }

        let n = match reader.read(&mut buffer).await {
            Ok(0) => break finish(tracker),
            Ok(n) => n,
            Err(e) => break Err(DownloadError::NetworkError(e.to_string())),
        };

        if let Err(e) = sink.write_all(&buffer[..n]).await {
            break Err(DownloadError::IoError(e.to_string()));
        }

        tracker.record(n as u64);
        task.lock().await.advance_to(tracker.bytes_transferred());

        if let Some(event) = tracker.poll() {
            let _ = tx.send(DownloadEvent::Progress(event));
        }
    };

    let _ = tx.send(DownloadEvent::Progress(tracker.force()));
    result
}

fn finish(tracker: &ProgressTracker) -> Result<TransferOutcome, DownloadError> {
    let actual = tracker.bytes_transferred();
    match tracker.total_size() {
        Some(expected) if expected != actual => {
            warn!("数据长度不一致: 期望 {} 字节, 实际 {} 字节", expected, actual);
            Err(DownloadError::SizeMismatch { expected, actual })
        }
        _ => Ok(TransferOutcome::Finished(actual)),
    }
}

/// 调用方持有的任务句柄：读取事件、查询状态、请求取消
#[derive(Debug)]
pub struct DownloadHandle {
    task_id: String,
    task: Arc<Mutex<DownloadTask>>,
    cancel_flag: Arc<AtomicBool>,
    events: mpsc::UnboundedReceiver<DownloadEvent>,
}

impl DownloadHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub async fn status(&self) -> TaskStatus {
        self.task.lock().await.status.clone()
    }

    pub async fn snapshot(&self) -> DownloadTask {
        self.task.lock().await.clone()
    }

    pub async fn output_path(&self) -> PathBuf {
        self.task.lock().await.output_path.clone()
    }

    pub async fn cancel(&self) -> bool {
        self.canceller().cancel().await
    }

    pub fn canceller(&self) -> Canceller {
        Canceller {
            task_id: self.task_id.clone(),
            task: Arc::clone(&self.task),
            cancel_flag: Arc::clone(&self.cancel_flag),
        }
    }

    pub async fn next_event(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }

    // 读取事件直到终态，返回全部事件
    pub async fn collect_events(&mut self) -> Vec<DownloadEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }

    pub async fn wait(&mut self) -> TaskStatus {
        self.collect_events().await;
        self.status().await
    }
}

/// 可以移交给其他任务（比如 Ctrl-C 监听）的取消入口
#[derive(Debug, Clone)]
pub struct Canceller {
    task_id: String,
    task: Arc<Mutex<DownloadTask>>,
    cancel_flag: Arc<AtomicBool>,
}

impl Canceller {
    // 幂等，只有运行中的任务才会真正设置取消标志
    pub async fn cancel(&self) -> bool {
        if self.task.lock().await.is_running() {
            debug!("请求取消任务: {}", self.task_id);
            self.cancel_flag.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }
}
