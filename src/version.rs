//! 守护进程版本检查
//!
//! 守护进程在每个响应的 `Lokal-Server-Version` 头部中声明自身版本，
//! 低于 [`MIN_SERVER_VERSION`] 的响应在读取正文前即被拒绝。

use crate::error::{LokalError, Result};
use semver::Version;
use tracing::warn;

/// 携带守护进程版本的响应头（按小写比较）
pub const SERVER_VERSION_HEADER: &str = "lokal-server-version";

/// 客户端支持的最低守护进程版本
pub const MIN_SERVER_VERSION: &str = "v0.6.0";

/// 解析版本字符串，如 `v0.6.0`、`0.6`、`V1.2.3-beta.1`
///
/// 去掉一个前导 `v`/`V`，缺失的 minor/patch 以 0 补齐
pub fn parse_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('v')
        .or_else(|| raw.strip_prefix('V'))
        .unwrap_or(raw);

    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }

    // 补齐缺失的 minor/patch
    let (core, rest) = match raw.find(['-', '+']) {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    };
    let parts = core.split('.').count();
    if parts == 0 || parts >= 3 {
        return None;
    }
    let padded = format!("{}{}{}", core, ".0".repeat(3 - parts), rest);
    Version::parse(&padded).ok()
}

/// 版本是否满足 [`MIN_SERVER_VERSION`]，无法解析的版本视为不满足
pub fn is_supported(server_version: &str) -> bool {
    match (parse_version(server_version), parse_version(MIN_SERVER_VERSION)) {
        (Some(v), Some(min)) => v >= min,
        _ => false,
    }
}

/// 检查单个响应头
///
/// 非版本头部直接忽略
pub fn check_header(key: &str, value: &str) -> Result<()> {
    if key.trim().to_ascii_lowercase() != SERVER_VERSION_HEADER {
        return Ok(());
    }

    let value = value.trim();
    if !is_supported(value) {
        warn!(
            "Lokal daemon version {} is older than required {}",
            value, MIN_SERVER_VERSION
        );
        return Err(LokalError::outdated(value, MIN_SERVER_VERSION));
    }

    Ok(())
}
