//! py-releases：列出 python.org 上的 Windows 稳定版安装包，并高亮本机已安装的版本。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志/本机版本探测/快照导出等基础设施
//! - `network_parser`：响应字节源与定长缓冲累积
//! - `release_parser`：区段定位与记录提取（核心扫描逻辑）
//! - `ui`：命令行输出

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

mod base_system;
mod network_parser;
mod release_parser;
mod ui;

use base_system::config::{load_or_create, load_or_create_with_base};
use base_system::context::Config;
use base_system::logging::{LogOptions, LogSystem};
use tracing::info;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "py-releases")]
#[command(about = "List stable Python releases for Windows and highlight the installed one")]
struct Cli {
    /// 启用调试日志输出
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// 显示版本信息后退出
    #[arg(long, default_value_t = false)]
    version: bool,

    /// 数据目录路径（用于存放 py-releases.yml 和 logs）
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 指定配置文件路径（优先于 --data-dir）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 解析本地保存的页面，而不是发起网络请求
    #[arg(long)]
    from_file: Option<PathBuf>,

    /// 将接收到的页面原样保存到该路径
    #[arg(long)]
    save_page: Option<PathBuf>,

    /// 将解析结果导出为 JSON
    #[arg(long)]
    export: Option<PathBuf>,

    /// 跳过本机 Python 版本探测
    #[arg(long, default_value_t = false)]
    no_probe: bool,

    /// 禁用彩色输出
    #[arg(long, default_value_t = false)]
    no_color: bool,

    /// 退出时将本次日志打包归档到 logs/log_<时间>.zip
    #[arg(long, default_value_t = false)]
    archive_log: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("py-releases v{}", VERSION);
        return Ok(());
    }

    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let data_dir = cli.data_dir.as_deref();
    let _log = init_logging(cli.debug, use_color, cli.archive_log, data_dir)?;
    info!(target: "startup", "当前版本: v{}", VERSION);

    let config = if let Some(path) = cli.config.as_deref() {
        load_or_create::<Config>(Some(path)).map_err(|e| anyhow!(e.to_string()))?
    } else {
        load_or_create_with_base::<Config>(None, data_dir).map_err(|e| anyhow!(e.to_string()))?
    };

    let options = ui::noui::RunOptions {
        from_file: cli.from_file,
        save_page: cli.save_page,
        export: cli.export,
        probe: !cli.no_probe,
        use_color,
    };
    ui::noui::run(&config, &options)
}

fn init_logging(
    debug: bool,
    use_color: bool,
    archive_on_exit: bool,
    base_dir: Option<&std::path::Path>,
) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        use_color,
        archive_on_exit,
    };
    LogSystem::init_with_base(opts, base_dir).map_err(|e| anyhow!(e))
}
