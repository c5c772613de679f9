use crate::error::{AppError, AppResult};
use std::fmt;
use std::str::FromStr;

/// ChromeDriver 发布包对应的平台，统一 OS / Arch 到压缩包名的映射。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Win32,
    Linux64,
    Mac64,
    MacArm64,
}

impl Platform {
    /// 检测当前运行平台。
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Win32
        } else if cfg!(target_os = "macos") {
            if cfg!(target_arch = "aarch64") {
                Platform::MacArm64
            } else {
                Platform::Mac64
            }
        } else {
            Platform::Linux64
        }
    }

    /// 发布页使用的平台标识
    pub fn key(&self) -> &'static str {
        match self {
            Platform::Win32 => "win32",
            Platform::Linux64 => "linux64",
            Platform::Mac64 => "mac64",
            Platform::MacArm64 => "mac_arm64",
        }
    }

    /// 压缩包文件名
    pub fn archive_name(&self) -> String {
        format!("chromedriver_{}.zip", self.key())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "win32" | "win" | "windows" => Ok(Platform::Win32),
            "linux64" | "linux" => Ok(Platform::Linux64),
            "mac64" | "mac" | "macos" => Ok(Platform::Mac64),
            "mac_arm64" | "mac-arm64" | "mac64_m1" => Ok(Platform::MacArm64),
            other => Err(AppError::usage(format!(
                "不支持的平台: {}. 支持的平台: win32, linux64, mac64, mac_arm64",
                other
            ))),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
