use crate::cli::output::{OutputFormat, FORMATTER};
use crate::core::options::{Mode, RunOptions};
use crate::error::{option_with_context, with_context, AppError, AppResult, ContextualResult};
use crate::infrastructure::installer::{ArchiveFetcher, ConcurrentExtractor, ExtractionReport};
use crate::infrastructure::remote::{HttpClient, VersionCatalog, VersionEntry};

/// 命令处理器
pub struct CommandHandler {
    options: RunOptions,
    client: HttpClient,
}

impl CommandHandler {
    /// 创建新的命令处理器
    pub fn new(options: RunOptions) -> AppResult<Self> {
        let client = HttpClient::with_options(options.timeout_secs, options.download.clone())?;
        Ok(Self { options, client })
    }

    /// 按运行模式执行
    pub async fn run(&self) -> ContextualResult<()> {
        match &self.options.mode {
            Mode::List { json } => {
                let format = if *json { OutputFormat::Json } else { OutputFormat::Text };
                let output = self.list(format).await?;
                print!("{}", output);
                Ok(())
            }
            Mode::Install { major } => {
                let (entry, report) = self.install(major).await?;
                print!(
                    "{}",
                    FORMATTER.format_install_result(&entry.version, &self.options.out_dir, &report)
                );
                Ok(())
            }
        }
    }

    /// 生成可指定版本列表
    pub async fn list(&self, format: OutputFormat) -> ContextualResult<String> {
        let catalog = self.load_catalog().await?;
        with_context(FORMATTER.format_catalog(&catalog, format), "格式化版本列表")
    }

    /// 解析主版本号，下载并解压最新版本
    pub async fn install(&self, major: &str) -> ContextualResult<(VersionEntry, ExtractionReport)> {
        let catalog = self.load_catalog().await?;
        let entry = option_with_context(
            catalog.lookup(major).cloned(),
            || AppError::version_not_found(major),
            "解析 ChromeDriver 版本",
        )?;
        log::info!("主版本 {} 的最新版本为 {}", major, entry.version);

        let fetcher = ArchiveFetcher::new(
            self.client.clone(),
            &self.options.url_template,
            self.options.platform,
            &self.options.work_dir,
        );
        let handle = with_context(fetcher.fetch(&entry).await, "下载 ChromeDriver 压缩包")?;

        println!("📂 解压到 {}...", self.options.out_dir.display());
        let extractor = ConcurrentExtractor::new(self.options.max_workers);
        let result = extractor.extract(handle.path(), &self.options.out_dir).await;

        // 无论解压成功与否都清理临时目录
        if let Err(e) = handle.release() {
            log::warn!("清理临时目录失败: {}", e);
        }

        let report = with_context(result, "解压 ChromeDriver 压缩包")?;
        Ok((entry, report))
    }

    async fn load_catalog(&self) -> ContextualResult<VersionCatalog> {
        with_context(
            VersionCatalog::fetch(&self.client, &self.options.index_url, None).await,
            "获取 ChromeDriver 版本列表",
        )
    }
}
