//! 并发解压
//!
//! 每个压缩包条目对应一个解压任务，任务在阻塞线程池中执行，并由信号量限制同时
//! 运行的数量。所有任务结束后才返回；任一条目失败（包括任务 panic）不会中断
//! 其他条目，但失败会汇总后作为整体错误返回。已写入的条目不会回滚。
//!
//! 目录权限在全部任务结束后按路径深度从深到浅统一设置，只读目录不会挡住
//! 其子条目的写入。

use super::utils::default_worker_count;
use crate::core::constants::{download::MAX_PREALLOC_BYTES, fs as fs_consts};
use crate::error::{AppError, AppResult, EntryFailure};
use std::fs;
use std::any::Any;
use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use zip::ZipArchive;

type SharedArchive = ZipArchive<Cursor<Arc<[u8]>>>;

/// 单个条目的解压任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTask {
    pub index: usize,
    pub name: String,
    /// 相对目标目录的路径；条目名会越出目标目录时为 `None`
    pub relative_path: Option<PathBuf>,
    pub is_dir: bool,
    pub mode: u32,
    /// 条目头声明的解压后大小
    pub size: u64,
    pub compressed_size: u64,
}

/// 等待所有任务结束后再设置的目录权限
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingDirMode {
    name: String,
    path: PathBuf,
    mode: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TaskOutcome {
    Directory(PendingDirMode),
    File(u64),
}

/// 解压结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub directories: usize,
    pub files: usize,
    pub bytes: u64,
}

impl ExtractionReport {
    fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Directory(_) => self.directories += 1,
            TaskOutcome::File(bytes) => {
                self.files += 1;
                self.bytes += bytes;
            }
        }
    }
}

/// 并发解压器
#[derive(Debug, Clone)]
pub struct ConcurrentExtractor {
    max_workers: usize,
}

impl Default for ConcurrentExtractor {
    fn default() -> Self {
        Self::new(default_worker_count())
    }
}

impl ConcurrentExtractor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// 将 `archive_path` 中的全部条目解压到 `dest_dir`
    pub async fn extract(&self, archive_path: &Path, dest_dir: &Path) -> AppResult<ExtractionReport> {
        let bytes = tokio::fs::read(archive_path)
            .await
            .map_err(|e| AppError::archive_unreadable(archive_path, e))?;
        let archive = ZipArchive::new(Cursor::new(Arc::<[u8]>::from(bytes)))
            .map_err(|e| AppError::archive_unreadable(archive_path, e))?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| AppError::persistence(dest_dir, format!("创建目标目录失败: {}", e)))?;

        let (tasks, mut failures) = plan_tasks(&mut archive.clone());
        log::info!(
            "解压 {} 个条目到 {} (并发上限 {})",
            tasks.len() + failures.len(),
            dest_dir.display(),
            self.max_workers
        );

        let dest_dir: Arc<Path> = Arc::from(dest_dir);
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut set = JoinSet::new();

        for task in tasks {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    failures.push(EntryFailure::new(&task.name, format!("工作池已关闭: {}", e)));
                    continue;
                }
            };
            let archive = archive.clone();
            let dest_dir = Arc::clone(&dest_dir);
            set.spawn_blocking(move || {
                let _permit = permit;
                run_guarded(&task.name, || extract_entry(archive, &dest_dir, &task))
            });
        }

        let mut report = ExtractionReport::default();
        let mut dir_modes = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(outcome)) => {
                    report.record(&outcome);
                    if let TaskOutcome::Directory(pending) = outcome {
                        dir_modes.push(pending);
                    }
                }
                Ok(Err(failure)) => {
                    log::warn!("解压条目失败: {}", failure);
                    failures.push(failure);
                }
                Err(e) => failures.push(EntryFailure::new("<task>", format!("解压任务被取消: {}", e))),
            }
        }

        failures.extend(apply_dir_modes(dir_modes));

        if failures.is_empty() {
            log::info!(
                "解压完成: {} 个目录, {} 个文件, {} 字节",
                report.directories,
                report.files,
                report.bytes
            );
            Ok(report)
        } else {
            failures.sort_by(|a, b| a.entry.cmp(&b.entry));
            Err(AppError::Extraction { failures })
        }
    }
}

/// 读取条目元数据，生成解压任务；元数据读取失败的条目直接记为失败
fn plan_tasks(archive: &mut SharedArchive) -> (Vec<ExtractionTask>, Vec<EntryFailure>) {
    let mut tasks = Vec::with_capacity(archive.len());
    let mut failures = Vec::new();

    for index in 0..archive.len() {
        match archive.by_index_raw(index) {
            Ok(entry) => {
                let is_dir = entry.is_dir();
                let default_mode = if is_dir {
                    fs_consts::DEFAULT_DIR_PERMISSION
                } else {
                    fs_consts::DEFAULT_FILE_PERMISSION
                };
                tasks.push(ExtractionTask {
                    index,
                    name: entry.name().to_string(),
                    relative_path: entry.enclosed_name().map(Path::to_path_buf),
                    is_dir,
                    mode: entry.unix_mode().map(|m| m & 0o777).unwrap_or(default_mode),
                    size: entry.size(),
                    compressed_size: entry.compressed_size(),
                });
            }
            Err(e) => failures.push(EntryFailure::new(
                format!("#{}", index),
                format!("读取条目信息失败: {}", e),
            )),
        }
    }

    (tasks, failures)
}

fn extract_entry(
    mut archive: SharedArchive,
    dest_dir: &Path,
    task: &ExtractionTask,
) -> Result<TaskOutcome, EntryFailure> {
    let fail = |reason: String| EntryFailure::new(&task.name, reason);

    let relative = task
        .relative_path
        .as_ref()
        .ok_or_else(|| fail("条目路径越出目标目录".to_string()))?;
    let out_path = dest_dir.join(relative);

    let mut entry = archive
        .by_index(task.index)
        .map_err(|e| fail(format!("打开条目失败: {}", e)))?;

    if task.is_dir {
        fs::create_dir_all(&out_path).map_err(|e| fail(format!("创建目录失败: {}", e)))?;
        log::debug!("目录: {}", out_path.display());
        return Ok(TaskOutcome::Directory(PendingDirMode {
            name: task.name.clone(),
            path: out_path,
            mode: task.mode,
        }));
    }

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).map_err(|e| fail(format!("创建父目录失败: {}", e)))?;
    }

    // 声明的大小不可信，预分配不超过压缩后大小与上限
    let reserve = task.size.min(task.compressed_size).min(MAX_PREALLOC_BYTES);
    let mut buf = Vec::with_capacity(reserve as usize);
    entry
        .by_ref()
        .take(task.size.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|e| fail(format!("读取条目内容失败: {}", e)))?;
    if buf.len() as u64 != task.size {
        return Err(fail(format!(
            "条目内容不完整: 期望 {} 字节, 实际 {} 字节",
            task.size,
            buf.len()
        )));
    }

    fs::write(&out_path, &buf).map_err(|e| fail(format!("写入文件失败: {}", e)))?;
    set_mode(&out_path, task.mode).map_err(|e| fail(format!("设置权限失败: {}", e)))?;
    log::debug!("文件: {} ({} 字节)", out_path.display(), buf.len());

    Ok(TaskOutcome::File(buf.len() as u64))
}

/// 执行单个任务，panic 也记为该条目的失败
fn run_guarded<F>(name: &str, task: F) -> Result<TaskOutcome, EntryFailure>
where
    F: FnOnce() -> Result<TaskOutcome, EntryFailure>,
{
    panic::catch_unwind(AssertUnwindSafe(task)).unwrap_or_else(|payload| {
        Err(EntryFailure::new(
            name,
            format!("解压任务异常终止: {}", panic_message(payload.as_ref())),
        ))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "未知 panic".to_string()
    }
}

/// 从最深的目录开始设置权限
fn apply_dir_modes(mut pending: Vec<PendingDirMode>) -> Vec<EntryFailure> {
    pending.sort_by_key(|dir| std::cmp::Reverse(dir.path.components().count()));
    pending
        .into_iter()
        .filter_map(|dir| {
            set_mode(&dir.path, dir.mode)
                .err()
                .map(|e| EntryFailure::new(dir.name, format!("设置权限失败: {}", e)))
        })
        .collect()
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
