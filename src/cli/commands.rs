use clap::Parser;
use std::path::PathBuf;

/// chromedriver-fetch CLI 应用程序
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "chromedriver-fetch")]
#[command(about = "按主版本号下载并解压 ChromeDriver", long_about = None)]
pub struct Cli {
    /// 主版本号，例如 Chrome 版本为 '101.xxx...' 时指定 '--version=101'
    #[arg(short = 'v', long = "version", value_name = "MAJOR")]
    pub major: Option<String>,

    /// 解压目录
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// 列出可指定的 ChromeDriver 版本
    #[arg(short, long)]
    pub list: bool,

    /// 以 JSON 格式输出版本列表
    #[arg(long, requires = "list")]
    pub json: bool,

    /// 目标平台（win32 / linux64 / mac64 / mac_arm64），默认自动检测
    #[arg(short, long)]
    pub platform: Option<String>,

    /// 并发解压任务上限
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// 网络请求失败时的重试次数
    #[arg(long)]
    pub retries: Option<u32>,

    /// 版本索引页地址
    #[arg(long, value_name = "URL")]
    pub index_url: Option<String>,

    /// 输出调试日志
    #[arg(long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::parse_from(["chromedriver-fetch", "-v", "101", "-o", "drivers"]);
        assert_eq!(cli.major.as_deref(), Some("101"));
        assert_eq!(cli.out, PathBuf::from("drivers"));
        assert!(!cli.list);
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::parse_from(["chromedriver-fetch", "--list"]);
        assert!(cli.list);
        assert!(cli.major.is_none());
        assert_eq!(cli.out, PathBuf::from("."));
    }

    #[test]
    fn test_json_requires_list() {
        assert!(Cli::try_parse_from(["chromedriver-fetch", "--json", "-v", "101"]).is_err());
    }
}
