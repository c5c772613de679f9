use crate::error::{AppError, AppResult};
use crate::infrastructure::installer::ExtractionReport;
use crate::infrastructure::remote::VersionCatalog;
use serde::Serialize;
use std::path::Path;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct CatalogRow<'a> {
    major: &'a str,
    latest: &'a str,
}

/// 输出格式化器
pub struct OutputFormatter;

impl OutputFormatter {
    /// 格式化主版本与最新版本对照表
    pub fn format_catalog(&self, catalog: &VersionCatalog, format: OutputFormat) -> AppResult<String> {
        let rows: Vec<CatalogRow<'_>> = catalog
            .latest_table()
            .into_iter()
            .map(|(major, latest)| CatalogRow {
                major: major.as_str(),
                latest: latest.version.as_str(),
            })
            .collect();

        match format {
            OutputFormat::Text => {
                let mut output = String::from("Specifiable chrome driver versions.\n");
                output.push_str("Major\tLatest\n");
                for row in rows {
                    output.push_str(&format!("{}\t{}\n", row.major, row.latest));
                }
                Ok(output)
            }
            OutputFormat::Json => serde_json::to_string_pretty(&rows)
                .map(|json| json + "\n")
                .map_err(|e| AppError::config(format!("序列化版本列表失败: {}", e))),
        }
    }

    /// 格式化安装结果
    pub fn format_install_result(&self, version: &str, out_dir: &Path, report: &ExtractionReport) -> String {
        format!(
            "✅ ChromeDriver {} 已解压到 {} ({} 个文件, {} 个目录)\n",
            version,
            out_dir.display(),
            report.files,
            report.directories
        )
    }
}

/// 默认输出格式化器实例
pub static FORMATTER: OutputFormatter = OutputFormatter;
