//! 单次运行的不可变配置
//!
//! 启动时由命令行参数与配置文件合并生成一次，之后只读传递给各组件。

use crate::cli::Cli;
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::Config;
use crate::infrastructure::installer::utils::default_worker_count;
use crate::infrastructure::remote::{DownloadOptions, Platform};
use std::path::PathBuf;

/// 运行模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// 打印主版本与最新版本对照表
    List { json: bool },
    /// 下载并解压指定主版本的最新版本
    Install { major: String },
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: Mode,
    pub out_dir: PathBuf,
    pub index_url: String,
    pub url_template: String,
    pub platform: Platform,
    pub work_dir: PathBuf,
    pub max_workers: usize,
    pub timeout_secs: u64,
    pub download: DownloadOptions,
}

impl RunOptions {
    /// 合并命令行参数与配置文件，命令行优先
    pub fn from_cli(cli: &Cli, config: &Config) -> AppResult<Self> {
        let mode = resolve_mode(cli)?;

        let platform = match cli.platform.as_deref().or(config.source.platform.as_deref()) {
            Some(name) => name.parse::<Platform>()?,
            None => Platform::current(),
        };

        let mut download = DownloadOptions::from_config(&config.download);
        if let Some(retries) = cli.retries {
            download.retry_count = retries;
        }

        let max_workers = cli
            .jobs
            .or(config.extract.max_workers)
            .unwrap_or_else(default_worker_count);
        if max_workers == 0 {
            return Err(AppError::usage("并发任务数必须大于 0"));
        }

        Ok(Self {
            mode,
            out_dir: cli.out.clone(),
            index_url: cli
                .index_url
                .clone()
                .unwrap_or_else(|| config.source.index_url.clone()),
            url_template: config.source.url_template.clone(),
            platform,
            work_dir: config
                .download
                .work_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            max_workers,
            timeout_secs: config.download.timeout_secs,
            download,
        })
    }
}

fn resolve_mode(cli: &Cli) -> AppResult<Mode> {
    let major = cli
        .major
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    match (cli.list, major) {
        (true, None) => Ok(Mode::List { json: cli.json }),
        (true, Some(_)) => Err(AppError::usage("--list 不能与 --version 同时使用")),
        (false, Some(major)) => Ok(Mode::Install {
            major: major.to_string(),
        }),
        (false, None) => Err(AppError::usage("请通过 --version 指定主版本号，或使用 --list 查看可用版本")),
    }
}
