use crate::core::constants::download as consts;
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::DownloadConfig;
use futures_util::StreamExt;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

/// 错误类型：用于区分临时错误和永久错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// 临时错误（网络问题、超时、5xx，可以重试）
    Transient,
    /// 永久错误（404、403 等，不应重试）
    Permanent,
}

/// 下载选项
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub exponential_backoff: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            retry_count: consts::DEFAULT_RETRY_COUNT,
            retry_delay_ms: consts::DEFAULT_RETRY_DELAY_MS,
            exponential_backoff: true,
        }
    }
}

impl DownloadOptions {
    /// 从配置创建下载选项
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self {
            retry_count: config.retry_count,
            retry_delay_ms: config.retry_delay_ms,
            exponential_backoff: config.exponential_backoff,
        }
    }

    /// 计算重试延迟（支持指数退避）
    pub fn calculate_retry_delay(&self, attempt: u32) -> u64 {
        if self.exponential_backoff {
            // delay * 2^(attempt-1)，最大不超过 60 秒
            let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
            self.retry_delay_ms
                .saturating_mul(factor)
                .min(consts::MAX_RETRY_DELAY_MS)
        } else {
            self.retry_delay_ms
        }
    }
}

/// 判断错误类型
pub fn classify_error(error: &AppError) -> ErrorType {
    match error {
        AppError::Http { status, .. } if (500..=599).contains(status) => ErrorType::Transient,
        AppError::Http { .. } => ErrorType::Permanent,
        AppError::Network { .. } => ErrorType::Transient,
        _ => ErrorType::Permanent,
    }
}

/// 按选项执行网络操作，临时错误按退避策略重试，永久错误立即返回。
pub async fn with_retry<T, F, Fut>(options: &DownloadOptions, url: &str, mut operation: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if classify_error(&e) == ErrorType::Permanent || attempts > options.retry_count {
                    return Err(e);
                }

                let delay = options.calculate_retry_delay(attempts);
                log::warn!(
                    "请求出错 (尝试 {}/{}): {}。{}ms 后重试... (URL: {})",
                    attempts,
                    options.retry_count + 1,
                    e,
                    delay,
                    url
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}

/// 流式下载到内存并回调进度，支持重试。
pub async fn download_to_bytes_with_options(
    client: &Client,
    url: &str,
    progress: impl Fn(u64, u64),
    options: &DownloadOptions,
) -> AppResult<Vec<u8>> {
    let progress = &progress;
    with_retry(options, url, || download_to_bytes_internal(client, url, progress)).await
}

async fn download_to_bytes_internal(
    client: &Client,
    url: &str,
    progress: &impl Fn(u64, u64),
) -> AppResult<Vec<u8>> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded = 0u64;
    let mut data = Vec::with_capacity(initial_capacity(total_size));
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AppError::network(format!("读取数据失败: {}", e)))?;
        downloaded += chunk.len() as u64;
        progress(downloaded, total_size);
        data.extend_from_slice(&chunk);
    }

    Ok(data)
}

/// Content-Length 只作为提示，预分配不超过上限
fn initial_capacity(content_length: u64) -> usize {
    content_length.min(consts::MAX_PREALLOC_BYTES) as usize
}
