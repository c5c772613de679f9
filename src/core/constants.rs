//! 应用程序常量定义
//!
//! 本模块包含全局使用的常量，避免魔数并提供统一的配置值。

/// 版本目录相关常量
pub mod catalog {
    /// ChromeDriver 下载页（HTML 版本索引）
    pub const DEFAULT_INDEX_URL: &str = "https://chromedriver.chromium.org/downloads";
    /// 版本链接所在元素的 CSS class
    pub const RELEASE_LINK_CLASS: &str = "XqQF9c";
    /// 版本链接 href 必须包含的前缀
    pub const RELEASE_LINK_PATTERN: &str = "https://chromedriver.storage.googleapis.com/index.html?";
    /// 只取最新条目时扫描的元素数量
    pub const LATEST_SCAN_LIMIT: usize = 3;
}

/// 下载相关常量
pub mod download {
    /// 下载地址模板，`{version}` 与 `{archive}` 会被替换
    pub const DEFAULT_URL_TEMPLATE: &str =
        "https://chromedriver.storage.googleapis.com/{version}/{archive}";
    /// User-Agent
    pub const USER_AGENT: &str = concat!("chromedriver-fetch/", env!("CARGO_PKG_VERSION"));
    /// 默认请求超时时间（秒）
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
    /// 默认重试次数（0 表示失败立即返回）
    pub const DEFAULT_RETRY_COUNT: u32 = 0;
    /// 默认重试间隔（毫秒）
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
    /// 指数退避的最大间隔（毫秒）
    pub const MAX_RETRY_DELAY_MS: u64 = 60000;
    /// 按响应头或条目头声明的大小预分配内存的上限
    pub const MAX_PREALLOC_BYTES: u64 = 64 * 1024 * 1024;
    /// 临时目录名的时间戳格式
    pub const TEMP_DIR_TIMESTAMP_FORMAT: &str = ".%Y%m%d%H%M%S";
}

/// 文件系统相关常量
pub mod fs {
    /// 默认文件权限（Unix系统）
    pub const DEFAULT_FILE_PERMISSION: u32 = 0o644;
    /// 默认目录权限（Unix系统）
    pub const DEFAULT_DIR_PERMISSION: u32 = 0o755;
}

/// 配置相关常量
pub mod config {
    /// 配置目录名（位于用户主目录下）
    pub const CONFIG_DIR_NAME: &str = ".chromedriver-fetch";
    /// 配置文件名
    pub const CONFIG_FILE_NAME: &str = "config.toml";
    /// 指定配置文件路径的环境变量
    pub const CONFIG_PATH_ENV: &str = "CHROMEDRIVER_FETCH_CONFIG";
}

/// 日志相关常量
pub mod log {
    /// 默认日志级别
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
    /// --verbose 时的日志级别
    pub const VERBOSE_LOG_LEVEL: &str = "debug";
}
