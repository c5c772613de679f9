use super::utils::create_progress_bar;
use crate::core::constants::download as consts;
use crate::error::{AppError, AppResult};
use crate::infrastructure::remote::{HttpClient, Platform, VersionEntry};
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 已下载到临时目录的压缩包
///
/// 持有整个临时目录；`release` 或 drop 时递归删除，因此任何退出路径都不会遗留临时文件。
#[derive(Debug)]
pub struct ArchiveHandle {
    path: PathBuf,
    temp_dir: Option<TempDir>,
}

impl ArchiveHandle {
    /// 压缩包路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 删除临时目录及其中的压缩包
    pub fn release(mut self) -> io::Result<()> {
        match self.temp_dir.take() {
            Some(dir) => {
                log::debug!("删除临时目录: {}", dir.path().display());
                dir.close()
            }
            None => Ok(()),
        }
    }
}

/// 压缩包下载器
pub struct ArchiveFetcher {
    client: HttpClient,
    url_template: String,
    platform: Platform,
    work_dir: PathBuf,
}

impl ArchiveFetcher {
    pub fn new(client: HttpClient, url_template: &str, platform: Platform, work_dir: &Path) -> Self {
        Self {
            client,
            url_template: url_template.to_string(),
            platform,
            work_dir: work_dir.to_path_buf(),
        }
    }

    /// 按模板生成下载地址
    pub fn download_url(&self, entry: &VersionEntry) -> String {
        self.url_template
            .replace("{version}", &entry.version)
            .replace("{archive}", &self.platform.archive_name())
    }

    /// 下载指定版本的压缩包并保存到新的临时目录
    pub async fn fetch(&self, entry: &VersionEntry) -> AppResult<ArchiveHandle> {
        let url = self.download_url(entry);
        let file_name = archive_file_name(&url)?;

        println!("⬇️  下载 ChromeDriver {} ({})...", entry.version, self.platform);
        log::info!("下载地址: {}", url);

        let pb = create_progress_bar();
        let body = self
            .client
            .download(&url, |downloaded, total| {
                if total > 0 {
                    pb.set_length(total);
                }
                pb.set_position(downloaded);
            })
            .await;
        pb.finish_and_clear();
        let body = body?;

        log::info!("下载完成，大小: {} 字节", body.len());
        persist_archive(&self.work_dir, &file_name, &body)
    }
}

/// 取 URL 路径的最后一段作为文件名
pub fn archive_file_name(url: &str) -> AppResult<String> {
    let parsed = url::Url::parse(url)
        .map_err(|e| AppError::config(format!("无效的下载地址 {}: {}", url, e)))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::config(format!("下载地址缺少文件名: {}", url)))
}

/// 在 `work_dir` 下创建以时间戳命名的临时目录，并写入压缩包
///
/// 目录创建之后的任何失败都会随 `TempDir` 一起清理掉目录。
pub fn persist_archive(work_dir: &Path, file_name: &str, bytes: &[u8]) -> AppResult<ArchiveHandle> {
    let prefix = Local::now().format(consts::TEMP_DIR_TIMESTAMP_FORMAT).to_string();
    let temp_dir = tempfile::Builder::new()
        .prefix(&prefix)
        .tempdir_in(work_dir)
        .map_err(|e| AppError::persistence(work_dir, format!("创建临时目录失败: {}", e)))?;
    log::debug!("创建临时目录: {}", temp_dir.path().display());

    let path = temp_dir.path().join(file_name);
    fs::write(&path, bytes)
        .map_err(|e| AppError::persistence(&path, format!("写入文件失败: {}", e)))?;

    Ok(ArchiveHandle {
        path,
        temp_dir: Some(temp_dir),
    })
}
