use super::download::{download_to_bytes_with_options, with_retry, DownloadOptions};
use crate::core::constants::download as consts;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use std::time::Duration;

/// HTTP 客户端包装器
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    options: DownloadOptions,
}

impl HttpClient {
    /// 创建新的 HTTP 客户端
    pub fn new() -> AppResult<Self> {
        Self::with_options(consts::DEFAULT_TIMEOUT_SECS, DownloadOptions::default())
    }

    /// 创建带自定义超时与重试策略的 HTTP 客户端
    pub fn with_options(timeout_secs: u64, options: DownloadOptions) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(consts::USER_AGENT)
            .build()
            .map_err(|e| AppError::network(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self { client, options })
    }

    /// GET 请求并返回文本，非 2xx 状态视为错误
    pub async fn get_text(&self, url: &str) -> AppResult<String> {
        with_retry(&self.options, url, || async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(AppError::Http {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Ok(response.text().await?)
        })
        .await
    }

    /// 下载完整响应体到内存
    pub async fn download(&self, url: &str, progress: impl Fn(u64, u64)) -> AppResult<Vec<u8>> {
        download_to_bytes_with_options(&self.client, url, progress, &self.options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_get_text_returns_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/downloads")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html></html>")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let body = client
            .get_text(&format!("{}/downloads", server.url()))
            .await
            .unwrap();

        assert_eq!(body, "<html></html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_text_rejects_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/downloads")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .get_text(&format!("{}/downloads", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Http { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_download_reports_progress() {
        let mut server = Server::new_async().await;
        let payload = vec![7u8; 4096];
        let _mock = server
            .mock("GET", "/101.0.4951.41/chromedriver_linux64.zip")
            .with_status(200)
            .with_body(payload.clone())
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let last = std::cell::Cell::new(0u64);
        let data = client
            .download(
                &format!("{}/101.0.4951.41/chromedriver_linux64.zip", server.url()),
                |downloaded, _total| last.set(downloaded),
            )
            .await
            .unwrap();

        assert_eq!(data, payload);
        assert_eq!(last.get(), 4096);
    }
}
