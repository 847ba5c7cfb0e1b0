//! livetranslate 命令行入口
//!
//! 读取 HTML 文档，用同步器把可见文本翻译为目标语言后输出。

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use livetranslate::env::{core::LogLevel, EnvVar};
use livetranslate::parsers::{html_to_dom, serialize_document};
use livetranslate::translation::{
    ConfigManager, HttpCompletionBackend, RequestOutcome, Synchronizer, TranslationConfig,
};

#[derive(Parser, Debug)]
#[command(name = "livetranslate", version, about = "Translate the visible text of an HTML document")]
struct Cli {
    /// Input HTML file, `-` reads stdin
    #[arg(required_unless_present = "init_config")]
    input: Option<PathBuf>,

    /// Target language code; the source language restores original text
    #[arg(short, long, required_unless_present = "init_config")]
    lang: Option<String>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Translation endpoint URL
    #[arg(long)]
    api_url: Option<String>,

    /// Maximum strings per request
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Pause between requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Document charset used for parsing and output
    #[arg(short, long, default_value = "utf-8")]
    encoding: String,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["input", "lang"])]
    init_config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(LogLevel::get_or_default("info".to_string())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Some(path) = &cli.init_config {
        ConfigManager::generate_example_config(path)?;
        eprintln!("已生成示例配置文件: {}", path.display());
        return Ok(());
    }

    let config = build_config(&cli)?;
    let lang = config.target_lang.clone();
    let input = cli.input.as_deref().ok_or("缺少输入文件")?;

    let data = if input.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        fs::read(input)?
    };
    let dom = html_to_dom(&data, &cli.encoding)?;

    let backend = HttpCompletionBackend::new(&config)?;
    let sync = Synchronizer::new(dom.document.clone(), backend, config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = LocalSet::new();
    let outcome = local.block_on(&runtime, sync.request_translation(&lang));

    match outcome {
        RequestOutcome::Completed { cycles } => {
            tracing::info!("完成 {} 轮同步: {}", cycles, sync.stats())
        }
        other => tracing::warn!("同步未执行: {:?}", other),
    }

    let result = serialize_document(&dom, &cli.encoding)?;
    match &cli.output {
        Some(path) => fs::write(path, result)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&result)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// 配置文件 → 环境变量 → 命令行参数，后者覆盖前者
fn build_config(cli: &Cli) -> Result<TranslationConfig, Box<dyn std::error::Error>> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };

    let lang = cli.lang.as_deref().unwrap_or_default();
    let mut config = manager.create_simple_config(lang, cli.api_url.as_deref());
    if let Some(size) = cli.chunk_size {
        config.chunk_size = size;
    }
    if let Some(delay) = cli.delay_ms {
        config.chunk_delay_ms = delay;
    }
    config.validate()?;

    Ok(config)
}
