use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::common::utils::FormatTool;

/// 单次进度快照，生成后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub task_id: String,
    pub bytes_transferred: u64,
    pub total_size: Option<u64>,
    /// 仅在总大小已知时存在
    pub percent: Option<f64>,
    /// 字节/秒，从任务开始算起的累计平均值
    pub speed: f64,
    pub elapsed_ms: u64,
    pub display: String,
}

impl ProgressEvent {
    pub fn new(task_id: &str, bytes_transferred: u64, total_size: Option<u64>, elapsed: Duration) -> Self {
        let percent = compute_percent(bytes_transferred, total_size);
        let speed = compute_speed(bytes_transferred, elapsed);
        let display = render(bytes_transferred, total_size, percent, speed);

        Self {
            task_id: task_id.to_string(),
            bytes_transferred,
            total_size,
            percent,
            speed,
            elapsed_ms: elapsed.as_millis() as u64,
            display,
        }
    }

    pub fn speed_string(&self) -> String {
        FormatTool::format_speed(self.speed)
    }
}

pub fn compute_percent(bytes: u64, total: Option<u64>) -> Option<f64> {
    total.map(|total| {
        if total == 0 {
            100.0
        } else {
            (bytes as f64 / total as f64 * 100.0).min(100.0)
        }
    })
}

pub fn compute_speed(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { bytes as f64 / secs } else { 0.0 }
}

fn render(bytes: u64, total: Option<u64>, percent: Option<f64>, speed: f64) -> String {
    match (total, percent) {
        (Some(total), Some(percent)) => format!(
            "{} / {} ({:.1}%) - {}",
            FormatTool::format_size(bytes),
            FormatTool::format_size(total),
            percent,
            FormatTool::format_speed(speed)
        ),
        _ => format!(
            "{} - {}",
            FormatTool::format_size(bytes),
            FormatTool::format_speed(speed)
        ),
    }
}

/// 进度跟踪：累计字节、计算速度，并按固定间隔节流
#[derive(Debug)]
pub struct ProgressTracker {
    task_id: String,
    total_size: Option<u64>,
    bytes_transferred: u64,
    start_time: Instant,
    last_emit: Option<Instant>,
    interval: Duration,
}

impl ProgressTracker {
    pub fn new(task_id: &str, total_size: Option<u64>, interval: Duration, start_time: Instant) -> Self {
        Self {
            task_id: task_id.to_string(),
            total_size,
            bytes_transferred: 0,
            start_time,
            last_emit: None,
            interval,
        }
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    pub fn total_size(&self) -> Option<u64> {
        self.total_size
    }

    pub fn record(&mut self, n: u64) {
        self.bytes_transferred += n;
    }

    /// 距离上次发出事件超过间隔时返回新事件，否则返回 None
    pub fn poll(&mut self) -> Option<ProgressEvent> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> Option<ProgressEvent> {
        let due = match self.last_emit {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due { Some(self.force_at(now)) } else { None }
    }

    /// 不受节流限制，用于首个和最后一个事件
    pub fn force(&mut self) -> ProgressEvent {
        self.force_at(Instant::now())
    }

    pub fn force_at(&mut self, now: Instant) -> ProgressEvent {
        self.last_emit = Some(now);
        ProgressEvent::new(
            &self.task_id,
            self.bytes_transferred,
            self.total_size,
            now.saturating_duration_since(self.start_time),
        )
    }
}

// 进度条当前使用的样式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BarStyle {
    Initial,
    Spinner,
    Sized,
}

/// 终端进度条
pub struct ProgressRenderer {
    pb: ProgressBar,
    style: BarStyle,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(120));
        Self::with_bar(pb)
    }

    fn with_bar(pb: ProgressBar) -> Self {
        Self {
            pb,
            style: BarStyle::Initial,
        }
    }

    pub fn update(&mut self, event: &ProgressEvent) {
        match (event.total_size, self.style) {
            (Some(total), BarStyle::Initial | BarStyle::Spinner) => {
                self.pb.set_length(total);
                if let Ok(style) = ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
                ) {
                    self.pb.set_style(style.progress_chars("#>-"));
                }
                self.style = BarStyle::Sized;
            }
            (None, BarStyle::Initial) => {
                if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {bytes} {msg}") {
                    self.pb.set_style(style);
                }
                self.style = BarStyle::Spinner;
            }
            _ => {}
        }

        self.pb.set_position(event.bytes_transferred);
        self.pb.set_message(event.speed_string());
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.pb.finish_with_message(message.into());
    }

    pub fn abandon(&self, message: impl Into<String>) {
        self.pb.abandon_with_message(message.into());
    }
}

impl Default for ProgressRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_known_and_unknown() {
        assert_eq!(compute_percent(250_000, Some(1_000_000)), Some(25.0));
        assert_eq!(compute_percent(1_000_000, Some(1_000_000)), Some(100.0));
        assert_eq!(compute_percent(0, Some(0)), Some(100.0));
        // 超出声明大小时不超过 100
        assert_eq!(compute_percent(2_000, Some(1_000)), Some(100.0));
        assert_eq!(compute_percent(12_345, None), None);
    }

    #[test]
    fn test_speed_is_cumulative_average() {
        let speed = compute_speed(1_000_000, Duration::from_secs(2));
        assert_eq!(speed, 500_000.0);
        assert_eq!(compute_speed(1_000_000, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_display_without_total_has_no_percent() {
        let event = ProgressEvent::new("t", 2048, None, Duration::from_secs(1));
        assert_eq!(event.percent, None);
        assert!(!event.display.contains('%'));

        let event = ProgressEvent::new("t", 512, Some(1024), Duration::from_secs(1));
        assert!(event.display.contains("50.0%"));
    }

    #[test]
    fn test_tracker_throttles_between_intervals() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new("t", Some(100_000), Duration::from_millis(500), start);

        // 第一次总是发出
        assert!(tracker.poll_at(start).is_some());

        tracker.record(8192);
        assert!(tracker.poll_at(start + Duration::from_millis(100)).is_none());
        tracker.record(8192);
        assert!(tracker.poll_at(start + Duration::from_millis(499)).is_none());

        let event = tracker.poll_at(start + Duration::from_millis(500)).unwrap();
        assert_eq!(event.bytes_transferred, 16384);
        assert_eq!(event.elapsed_ms, 500);

        tracker.record(8192);
        assert!(tracker.poll_at(start + Duration::from_millis(600)).is_none());
        // 强制事件不受间隔限制
        let last = tracker.force_at(start + Duration::from_millis(650));
        assert_eq!(last.bytes_transferred, 24576);
    }

    #[test]
    fn test_tracker_zero_elapsed_speed() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new("t", None, Duration::from_millis(500), start);
        tracker.record(4096);
        let event = tracker.force_at(start);
        assert_eq!(event.speed, 0.0);
        assert_eq!(event.percent, None);
    }

    #[test]
    fn test_renderer_styles_once() {
        let mut renderer = ProgressRenderer::with_bar(ProgressBar::hidden());

        renderer.update(&ProgressEvent::new("t", 0, None, Duration::ZERO));
        assert_eq!(renderer.style, BarStyle::Spinner);
        renderer.update(&ProgressEvent::new("t", 4096, None, Duration::from_secs(1)));
        assert_eq!(renderer.style, BarStyle::Spinner);
        assert_eq!(renderer.pb.length(), None);
        assert_eq!(renderer.pb.position(), 4096);

        let mut sized = ProgressRenderer::with_bar(ProgressBar::hidden());
        sized.update(&ProgressEvent::new("t", 0, Some(10_000), Duration::ZERO));
        sized.update(&ProgressEvent::new("t", 5_000, Some(10_000), Duration::from_secs(1)));
        assert_eq!(sized.style, BarStyle::Sized);
        assert_eq!(sized.pb.length(), Some(10_000));
        assert_eq!(sized.pb.position(), 5_000);
    }
}
