use clap::Parser;
use std::path::PathBuf;

/// 媒体下载器
#[derive(Parser, Debug)]
#[command(name = "bmdl")]
#[command(version)]
#[command(about = "粘贴 YouTube / Instagram / 直链，解析并带进度下载", long_about = None)]
pub struct Cli {
    /// 媒体链接 (YouTube、Instagram 或直链)
    #[arg(long, value_name = "URL")]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub url: String,

    /// 保存目录
    #[arg(long, value_name = "DIR")]
    #[arg(default_value = ".")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// 保存的文件名，默认根据直链猜测
    #[arg(long, value_name = "NAME")]
    pub file_name: Option<String>,

    #[arg(long)]
    #[arg(help = "只显示封面地址，不下载")]
    pub preview: bool,

    #[arg(long)]
    #[arg(help = "把链接当作直链下载，跳过解析")]
    pub direct: bool,

    /// yt-dlp 可执行文件
    #[arg(long, value_name = "PATH", default_value = "yt-dlp")]
    #[arg(value_hint = clap::ValueHint::ExecutablePath)]
    pub ytdlp: String,

    /// RapidAPI Key (解析 Instagram 时需要)
    #[arg(long, value_name = "KEY", env = "RAPIDAPI_KEY", hide_env_values = true)]
    pub rapidapi_key: Option<String>,

    /// 每次读取的块大小 (字节)
    #[arg(long, value_name = "BYTES", default_value_t = 8 * 1024)]
    #[arg(value_parser = clap::value_parser!(usize))]
    pub chunk_size: usize,

    /// 进度事件的最小间隔 (毫秒)
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub progress_interval_ms: u64,

    #[arg(long)]
    #[arg(help = "以 JSON 行输出所有事件，代替进度条")]
    pub json: bool,

    #[arg(long, short)]
    #[arg(help = "输出调试日志")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["bmdl", "--url", "https://example.com/a.mp4"]).unwrap();
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert_eq!(cli.chunk_size, 8192);
        assert_eq!(cli.progress_interval_ms, 500);
        assert_eq!(cli.ytdlp, "yt-dlp");
        assert!(!cli.preview && !cli.direct && !cli.json);
    }

    #[test]
    fn test_url_required() {
        assert!(Cli::try_parse_from(["bmdl"]).is_err());
    }
}
