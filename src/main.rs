use std::time::Duration;

use anyhow::{anyhow, bail};
use clap::Parser;
use colored::Colorize;
use tracing::{debug, info, warn};

use bluematrix_dl::common::logger::PrettyLogger;
use bluematrix_dl::downloader::{
    DownloadEvent, DownloadHandle, DownloaderConfig, MediaDownloader, ProgressRenderer,
};
use bluematrix_dl::parser::direct::DirectResolver;
use bluematrix_dl::parser::models::ResolverConfig;
use bluematrix_dl::parser::parser_trait::MediaResolver;
use bluematrix_dl::{log_step, log_success, log_warning};

mod cli;

/// 只显示封面
async fn preview(downloader: &MediaDownloader, url: &str) -> anyhow::Result<()> {
    log_step!("获取封面");
    match downloader.parser().thumbnail(url).await? {
        Some(thumbnail) => PrettyLogger::info(format!("封面: {}", thumbnail)),
        None => log_warning!("未能获取封面"),
    }
    Ok(())
}

/// 消费事件直到终态，返回终态事件
async fn watch_events(handle: &mut DownloadHandle, json: bool) -> anyhow::Result<DownloadEvent> {
    let mut renderer = (!json).then(ProgressRenderer::new);

    while let Some(event) = handle.next_event().await {
        if json {
            println!("{}", serde_json::to_string(&event)?);
        }

        match &event {
            DownloadEvent::Started { .. } => debug!("任务已开始: {}", event.task_id()),
            DownloadEvent::Progress(progress) => {
                if let Some(renderer) = renderer.as_mut() {
                    renderer.update(progress);
                }
            }
            DownloadEvent::Completed { .. } => {
                if let Some(renderer) = renderer.as_ref() {
                    renderer.finish("完成".green().to_string());
                }
                return Ok(event);
            }
            DownloadEvent::Cancelled { .. } | DownloadEvent::Failed { .. } => {
                if let Some(renderer) = renderer.as_ref() {
                    renderer.abandon("中止".yellow().to_string());
                }
                return Ok(event);
            }
        }
    }

    Err(anyhow!("事件通道意外关闭"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let args = cli::Cli::parse();

    // 初始化日志
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // 日志统一写到 stderr，stdout 只留给下载结果（--json 时是事件流）
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    info!("开始处理链接: {}", args.url);

    let config = DownloaderConfig {
        chunk_size: args.chunk_size.max(1),
        progress_interval: Duration::from_millis(args.progress_interval_ms),
        ..Default::default()
    };
    let resolver_config = ResolverConfig {
        ytdlp_path: args.ytdlp.clone(),
        rapidapi_key: args.rapidapi_key.clone(),
        ..Default::default()
    };
    let downloader = MediaDownloader::new(config, &resolver_config)?;

    if args.preview {
        return preview(&downloader, &args.url).await;
    }

    // --json 时 stdout 只输出事件
    let pretty = !args.json;

    if pretty {
        log_step!("解析链接");
    }
    let (source, mut handle) = if args.direct {
        let source = DirectResolver.resolve(&args.url).await?;
        let handle = downloader
            .start_source(&source, &args.output_dir, args.file_name.as_deref())
            .await?;
        (source, handle)
    } else {
        downloader
            .resolve_and_start(&args.url, &args.output_dir, args.file_name.as_deref())
            .await?
    };
    if let Some(thumbnail) = &source.thumbnail_url {
        debug!("封面: {}", thumbnail);
    }

    let output_path = handle.output_path().await;
    if pretty {
        PrettyLogger::media_info(source.platform.to_string(), &source.media_url);
        log_step!("开始下载");
        PrettyLogger::file_info("保存到", output_path.display().to_string());
    }

    // Ctrl-C 只请求取消，由下载任务自己收尾
    let canceller = handle.canceller();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到中断信号，正在取消下载...");
            canceller.cancel().await;
        }
    });

    let terminal = watch_events(&mut handle, args.json).await;
    ctrl_c.abort();
    let terminal = terminal?;

    let summary = terminal.summary().unwrap_or_default();
    match terminal {
        DownloadEvent::Completed { .. } => {
            if pretty {
                PrettyLogger::separator();
                log_success!("{}", summary);
                PrettyLogger::file_info("文件", output_path.display().to_string());
            }
            Ok(())
        }
        DownloadEvent::Cancelled { .. } => {
            if pretty {
                PrettyLogger::separator();
                log_warning!("{}", summary);
                PrettyLogger::file_info("部分文件", output_path.display().to_string());
            }
            Ok(())
        }
        DownloadEvent::Failed { .. } => {
            PrettyLogger::error(&summary);
            bail!(summary)
        }
        _ => Err(anyhow!("未知的终态事件")),
    }
}
