use url::Url;

pub const DEFAULT_FILE_NAME: &str = "downloadfile.bin";

pub struct FormatTool;

impl FormatTool {
    // 格式化下载速度
    pub fn format_speed(speed: f64) -> String {
        let speed = if speed.is_finite() && speed > 0.0 { speed } else { 0.0 };
        if speed >= 1024.0 * 1024.0 * 1024.0 {
            format!("{:.1} GB/s", speed / 1024.0 / 1024.0 / 1024.0)
        } else if speed >= 1024.0 * 1024.0 {
            format!("{:.1} MB/s", speed / 1024.0 / 1024.0)
        } else if speed >= 1024.0 {
            format!("{:.1} KB/s", speed / 1024.0)
        } else {
            format!("{:.0} B/s", speed)
        }
    }

    // 格式化文件大小
    pub fn format_size(size: u64) -> String {
        if size >= 1024 * 1024 * 1024 {
            format!("{:.2} GB", size as f64 / 1024.0 / 1024.0 / 1024.0)
        } else if size >= 1024 * 1024 {
            format!("{:.1} MB", size as f64 / 1024.0 / 1024.0)
        } else if size >= 1024 {
            format!("{:.1} KB", size as f64 / 1024.0)
        } else {
            format!("{} B", size)
        }
    }
}

/// 根据直链猜测保存的文件名：取路径最后一段并解码，去掉非法字符
pub fn guess_file_name(url: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
    });

    let name = segment
        .map(|s| {
            urlencoding::decode(&s)
                .map(|decoded| decoded.into_owned())
                .unwrap_or(s)
        })
        .map(|s| sanitize_file_name(&s))
        .unwrap_or_default();

    if name.is_empty() || name.chars().all(|c| c == '.' || c == '_') {
        DEFAULT_FILE_NAME.to_string()
    } else {
        name
    }
}

pub fn sanitize_file_name(name: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
    name.chars()
        .map(|c| if invalid_chars.contains(&c) || c.is_control() { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}
