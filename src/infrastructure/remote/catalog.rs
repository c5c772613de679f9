//! ChromeDriver 版本目录
//!
//! 从下载页 HTML 中抓取发布链接，按主版本号分组，并将每组内的完整版本号
//! 按降序排列。每组第一个元素即该主版本的"最新"版本。

use super::http_client::HttpClient;
use crate::core::constants::catalog as consts;
use crate::error::{AppError, AppResult};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// 主版本号，保留原始字符串形式
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MajorVersion(String);

impl MajorVersion {
    /// 从完整版本号中提取开头的 1~3 位数字
    pub fn from_version(version: &str) -> AppResult<Self> {
        major_regex()
            .find(version)
            .map(|m| MajorVersion(m.as_str().to_string()))
            .ok_or_else(|| AppError::version_parse_failed(version))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 主版本号的数值，用于排序
    pub fn numeric(&self) -> AppResult<u32> {
        self.0
            .parse::<u32>()
            .map_err(|_| AppError::version_parse_failed(&self.0))
    }
}

impl fmt::Display for MajorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 一个完整的发布版本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub version: String,
    pub major: MajorVersion,
}

impl VersionEntry {
    pub fn parse(version: &str) -> AppResult<Self> {
        Ok(Self {
            major: MajorVersion::from_version(version)?,
            version: version.to_string(),
        })
    }
}

impl fmt::Display for VersionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.version)
    }
}

/// 主版本号到发布版本列表（降序）的映射
#[derive(Debug, Clone, Default)]
pub struct VersionCatalog {
    majors: Vec<MajorVersion>,
    versions: HashMap<MajorVersion, Vec<VersionEntry>>,
}

impl VersionCatalog {
    /// 下载版本索引页并构建目录
    pub async fn fetch(client: &HttpClient, index_url: &str, limit: Option<usize>) -> AppResult<Self> {
        log::info!("获取 ChromeDriver 版本索引: {}", index_url);
        let html = client.get_text(index_url).await?;
        Self::build(&html, limit)
    }

    /// 从 HTML 文档构建目录
    ///
    /// `limit` 限制扫描的发布链接元素数量，用于只关心最新几个版本的场景。
    pub fn build(html: &str, limit: Option<usize>) -> AppResult<Self> {
        let links = parse_release_links(html, limit);
        log::debug!("发现 {} 个发布链接", links.len());
        Self::from_versions(links)
    }

    /// 从无序的完整版本号列表构建目录
    pub fn from_versions<I, S>(versions: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut grouped: HashMap<MajorVersion, Vec<VersionEntry>> = HashMap::new();
        for version in versions {
            let entry = VersionEntry::parse(version.as_ref())?;
            grouped.entry(entry.major.clone()).or_default().push(entry);
        }

        // 组内按完整字符串降序，与各段位数相同时的数值顺序一致
        for entries in grouped.values_mut() {
            entries.sort_by(|a, b| b.version.cmp(&a.version));
            entries.dedup_by(|a, b| a.version == b.version);
        }

        let mut keyed = grouped
            .keys()
            .map(|major| Ok((major.numeric()?, major.clone())))
            .collect::<AppResult<Vec<_>>>()?;
        keyed.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(Self {
            majors: keyed.into_iter().map(|(_, major)| major).collect(),
            versions: grouped,
        })
    }

    /// 按数值降序排列的主版本号
    pub fn majors(&self) -> &[MajorVersion] {
        &self.majors
    }

    /// 指定主版本的全部发布版本（降序）
    pub fn versions(&self, major: &str) -> Option<&[VersionEntry]> {
        self.versions
            .get(&MajorVersion(major.to_string()))
            .map(Vec::as_slice)
    }

    /// 查找主版本的最新发布版本
    pub fn lookup(&self, major: &str) -> Option<&VersionEntry> {
        self.versions(major).and_then(|entries| entries.first())
    }

    /// (主版本, 最新版本) 列表，按主版本降序
    pub fn latest_table(&self) -> Vec<(&MajorVersion, &VersionEntry)> {
        self.majors
            .iter()
            .filter_map(|major| self.lookup(major.as_str()).map(|latest| (major, latest)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.majors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.majors.is_empty()
    }
}

fn major_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3}").expect("主版本正则表达式无效"))
}

fn start_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<[a-zA-Z][a-zA-Z0-9]*\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
            .expect("标签正则表达式无效")
    })
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("属性正则表达式无效")
    })
}

/// 解析开始标签中的属性
fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    attribute_regex()
        .captures_iter(raw)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_string();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            Some((key, decode_entities(value)))
        })
        .collect()
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// 从 HTML 中提取发布链接里的完整版本号
///
/// 只看带有发布链接 class 的元素；`href` 需包含存储索引地址，并且按 `=`
/// 切分后恰好两段，第二段去掉 `/` 后即版本号。
pub fn parse_release_links(html: &str, limit: Option<usize>) -> Vec<String> {
    let elements = start_tag_regex()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|raw| parse_attributes(raw.as_str()))
        .filter(|attrs| {
            attrs.iter().any(|(key, value)| {
                key.eq_ignore_ascii_case("class")
                    && value
                        .split_whitespace()
                        .any(|class| class == consts::RELEASE_LINK_CLASS)
            })
        })
        .take(limit.unwrap_or(usize::MAX));

    let mut versions = Vec::new();
    for attrs in elements {
        for (key, value) in &attrs {
            if !key.eq_ignore_ascii_case("href") || !value.contains(consts::RELEASE_LINK_PATTERN) {
                continue;
            }
            let parts: Vec<&str> = value.split('=').collect();
            if parts.len() == 2 {
                versions.push(parts[1].replace('/', ""));
            }
        }
    }
    versions
}
