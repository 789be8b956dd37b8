//! 无 UI 命令行入口：拉取（或读取本地）页面、解析、探测本机版本并输出表格。

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::base_system::context::Config;
use crate::base_system::snapshot;
use crate::base_system::version_probe::{InstalledVersion, probe_installed_version};
use crate::network_parser::accumulator::Accumulated;
use crate::network_parser::source::{open_file, open_http};
use crate::release_parser::pipeline;

mod table;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub from_file: Option<PathBuf>,
    pub save_page: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub probe: bool,
    pub use_color: bool,
}

fn download_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("正在下载页面…");
    pb
}

fn fetch_page(config: &Config, options: &RunOptions) -> Result<Accumulated> {
    let limits = config.limits();

    let page = if let Some(path) = options.from_file.as_deref() {
        info!(target: "fetch", "从本地文件读取页面: {}", path.display());
        let source = open_file(path)?;
        pipeline::fetch(source, &limits, |_| {})?
    } else {
        let source = open_http(&config.page_url, &config.http_options())?;
        let pb = download_spinner();
        let result = pipeline::fetch(source, &limits, |total| {
            pb.set_message(format!("已接收 {} KiB", total / 1024));
        });
        pb.finish_and_clear();
        result?
    };
    Ok(page)
}

pub fn run(config: &Config, options: &RunOptions) -> Result<()> {
    let page = fetch_page(config, options).context("无法获取 Python 发布列表")?;

    // 先落盘再解析：页面结构变化导致解析失败时仍可用 --from-file 复现
    if let Some(path) = options.save_page.as_deref() {
        snapshot::save_page(path, &page.body)?;
    }

    let parsed = pipeline::parse_page(&page.body, &config.limits(), config.arch_suffix.as_bytes())
        .context("无法解析 Python 发布列表")?;
    if let Some(path) = options.export.as_deref() {
        snapshot::export_catalog(path, &parsed.catalog)?;
    }

    let catalog = &parsed.catalog;
    info!(
        target: "extract",
        records = catalog.len(),
        capacity = catalog.capacity(),
        "解析完成"
    );
    if catalog.is_empty() {
        warn!(
            target: "extract",
            "区段 [{}, {}) 中没有匹配 {} 的安装包",
            parsed.range.begin,
            parsed.range.end,
            config.arch_suffix
        );
    }

    let installed: Option<InstalledVersion> = if options.probe {
        probe_installed_version(&config.probe_options())
    } else {
        None
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    table::render_releases(&mut out, catalog, installed.as_ref(), options.use_color)?;
    table::render_summary(&mut out, catalog, installed.as_ref())?;
    out.flush()?;
    Ok(())
}
