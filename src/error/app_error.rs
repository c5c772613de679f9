use std::fmt;
use std::io;
use thiserror::Error;

/// 单个解压条目的失败信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub entry: String,
    pub reason: String,
}

impl EntryFailure {
    pub fn new(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entry, self.reason)
    }
}

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),

    #[error("网络错误: {message}")]
    Network { message: String },

    #[error("服务器返回状态码 {status} (URL: {url})")]
    Http { status: u16, url: String },

    #[error("版本解析错误: {version}")]
    VersionParse { version: String },

    #[error("can't specify version: {major}")]
    VersionNotFound { major: String },

    #[error("保存文件失败: {path} - {reason}")]
    Persistence { path: String, reason: String },

    #[error("解压失败: {}", describe_failures(.failures))]
    Extraction { failures: Vec<EntryFailure> },

    #[error("配置错误: {message}")]
    Config { message: String },

    #[error("参数错误: {message}")]
    Usage { message: String },
}

fn describe_failures(failures: &[EntryFailure]) -> String {
    match failures {
        [] => "未知错误".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (另有 {} 个条目失败)", first, rest.len()),
    }
}

/// 用于提供错误上下文和用户友好建议
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub operation: String,
    pub suggestions: Vec<String>,
}

impl AppError {
    /// 为错误添加上下文信息
    pub fn with_context(self, operation: &str) -> ContextualError {
        let suggestions = self.default_suggestions();
        ContextualError {
            error: self,
            context: ErrorContext {
                operation: operation.to_string(),
                suggestions,
            },
        }
    }

    fn default_suggestions(&self) -> Vec<String> {
        match self {
            AppError::VersionNotFound { .. } => {
                vec!["使用 --list 查看可指定的主版本号".to_string()]
            }
            AppError::Network { .. } | AppError::Http { .. } => {
                vec!["检查网络连接，或使用 --retries 启用重试".to_string()]
            }
            AppError::Usage { .. } => vec!["使用 --help 查看用法".to_string()],
            _ => Vec::new(),
        }
    }

    /// 解压失败时返回所有失败条目
    pub fn failed_entries(&self) -> &[EntryFailure] {
        match self {
            AppError::Extraction { failures } => failures,
            _ => &[],
        }
    }
}

/// 带有上下文的错误
#[derive(Error, Debug)]
pub struct ContextualError {
    #[source]
    pub error: AppError,
    pub context: ErrorContext,
}

impl fmt::Display for ContextualError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "操作失败: {}\n错误: {}", self.context.operation, self.error)
    }
}

impl ContextualError {
    /// 获取用户友好的错误消息
    pub fn user_message(&self) -> String {
        let mut msg = format!("❌ {}\n", self.context.operation);
        msg.push_str(&format!("原因: {}\n", self.error));

        if self.error.failed_entries().len() > 1 {
            msg.push_str("失败条目:\n");
            for failure in self.error.failed_entries() {
                msg.push_str(&format!("  • {}\n", failure));
            }
        }

        if !self.context.suggestions.is_empty() {
            msg.push_str("💡 建议:\n");
            for suggestion in &self.context.suggestions {
                msg.push_str(&format!("  • {}\n", suggestion));
            }
        }

        msg
    }
}

/// 应用程序 Result 类型
pub type AppResult<T> = Result<T, AppError>;
pub type ContextualResult<T> = Result<T, ContextualError>;

/// 便捷的错误创建函数
impl AppError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn version_parse_failed(version: &str) -> Self {
        Self::VersionParse {
            version: version.to_string(),
        }
    }

    pub fn version_not_found(major: &str) -> Self {
        Self::VersionNotFound {
            major: major.to_string(),
        }
    }

    pub fn persistence(path: &std::path::Path, reason: impl fmt::Display) -> Self {
        Self::Persistence {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn archive_unreadable(archive: &std::path::Path, reason: impl fmt::Display) -> Self {
        Self::Extraction {
            failures: vec![EntryFailure::new(
                archive.display().to_string(),
                reason.to_string(),
            )],
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        let error_msg = error.to_string();
        if error.is_timeout() {
            Self::network(format!("连接超时: {}", error_msg))
        } else if let Some(status) = error.status() {
            Self::Http {
                status: status.as_u16(),
                url: error.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            Self::network(format!("网络请求失败: {}", error_msg))
        }
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Extraction {
            failures: vec![EntryFailure::new("<archive>", error.to_string())],
        }
    }
}

impl From<AppError> for ContextualError {
    fn from(error: AppError) -> Self {
        error.with_context("未知操作")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_message_names_first_failure() {
        let err = AppError::Extraction {
            failures: vec![
                EntryFailure::new("chromedriver", "Invalid checksum"),
                EntryFailure::new("LICENSE", "Permission denied"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("chromedriver: Invalid checksum"));
        assert!(msg.contains("另有 1 个条目失败"));
        assert_eq!(err.failed_entries().len(), 2);
    }

    #[test]
    fn test_user_message_includes_suggestions() {
        let err = AppError::version_not_found("42").with_context("解析 ChromeDriver 版本");
        let msg = err.user_message();
        assert!(msg.contains("解析 ChromeDriver 版本"));
        assert!(msg.contains("can't specify version: 42"));
        assert!(msg.contains("--list"));
    }

    #[test]
    fn test_single_failure_has_no_suffix() {
        let err = AppError::Extraction {
            failures: vec![EntryFailure::new("a.txt", "boom")],
        };
        assert_eq!(err.to_string(), "解压失败: a.txt: boom");
    }
}
