use crate::core::constants::{catalog, config as config_consts, download};
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// 配置文件结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

/// 版本索引与下载地址配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_index_url")]
    pub index_url: String,
    #[serde(default = "default_url_template")]
    pub url_template: String,
    /// 覆盖自动检测的平台（win32 / linux64 / mac64 / mac_arm64）
    #[serde(default)]
    pub platform: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            url_template: default_url_template(),
            platform: None,
        }
    }
}

fn default_index_url() -> String {
    catalog::DEFAULT_INDEX_URL.to_string()
}

fn default_url_template() -> String {
    download::DEFAULT_URL_TEMPLATE.to_string()
}

/// 下载配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_true")]
    pub exponential_backoff: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 临时目录的父目录，默认当前目录
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            retry_count: download::DEFAULT_RETRY_COUNT,
            retry_delay_ms: default_retry_delay_ms(),
            exponential_backoff: true,
            timeout_secs: default_timeout_secs(),
            work_dir: None,
        }
    }
}

fn default_retry_delay_ms() -> u64 {
    download::DEFAULT_RETRY_DELAY_MS
}

fn default_timeout_secs() -> u64 {
    download::DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

/// 解压配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// 并发解压任务上限，未设置时使用 CPU 数
    #[serde(default)]
    pub max_workers: Option<usize>,
}

impl Config {
    /// 从默认位置加载配置，文件不存在时返回默认配置
    pub fn load() -> AppResult<Self> {
        match get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                log::debug!("配置文件不存在，使用默认配置: {}", path.display());
                Ok(Self::default())
            }
            None => {
                log::debug!("无法确定配置文件位置，使用默认配置");
                Ok(Self::default())
            }
        }
    }

    /// 从指定文件加载配置
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        let mut config = Self::parse(&content)
            .map_err(|e| AppError::config(format!("解析配置文件 {} 失败: {}", path.display(), e)))?;
        config.source.index_url = resolve_env_var(&config.source.index_url);
        config.source.url_template = resolve_env_var(&config.source.url_template);
        log::debug!("已加载配置文件: {}", path.display());
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// 解析环境变量引用（如 ${VAR_NAME}）
pub fn resolve_env_var(value: &str) -> String {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        env::var(var_name).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}

/// 获取配置文件路径，环境变量优先
pub fn get_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(config_consts::CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    get_config_dir().map(|dir| dir.join(config_consts::CONFIG_FILE_NAME))
}

/// 获取配置目录
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(config_consts::CONFIG_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_env_var() {
        env::set_var("CHROMEDRIVER_FETCH_TEST_MIRROR", "https://mirror.example");

        let resolved = resolve_env_var("${CHROMEDRIVER_FETCH_TEST_MIRROR}");
        assert_eq!(resolved, "https://mirror.example");

        let not_resolved = resolve_env_var("normal_value");
        assert_eq!(not_resolved, "normal_value");

        env::remove_var("CHROMEDRIVER_FETCH_TEST_MIRROR");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.source.index_url, catalog::DEFAULT_INDEX_URL);
        assert_eq!(config.download.retry_count, 0);
        assert!(config.extract.max_workers.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[source]
url_template = "https://mirror.example/{version}/{archive}"
platform = "linux64"

[download]
retry_count = 2
exponential_backoff = false

[extract]
max_workers = 4
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.source.index_url, catalog::DEFAULT_INDEX_URL);
        assert_eq!(
            config.source.url_template,
            "https://mirror.example/{version}/{archive}"
        );
        assert_eq!(config.source.platform.as_deref(), Some("linux64"));
        assert_eq!(config.download.retry_count, 2);
        assert!(!config.download.exponential_backoff);
        assert_eq!(config.download.timeout_secs, download::DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.extract.max_workers, Some(4));
    }

    #[test]
    fn test_load_from_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[download]\nretry_count = \"many\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }
}
