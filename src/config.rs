// 配置管理：守护进程连接参数 + 隧道定义文件

use crate::client::Lokal;
use crate::options::Options;
use crate::tunnel::{Tunnel, TunnelType};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "LOKAL_";

/// 守护进程默认地址
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:6174";

/// 默认请求超时（秒）- 可通过环境变量 LOKAL_TIMEOUT_SECS 覆盖
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 发送给守护进程的 User-Agent
pub const USER_AGENT: &str = "Lokal Rust - github.com/lokal-so/lokal-rs";

/// 隧道模板
pub const TUNNEL_TEMPLATE: &str = include_str!("../templates/tunnel.toml");

/// 守护进程连接配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LokalConfig {
    /// 守护进程 API 地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 请求超时
    #[serde(default = "default_timeout", with = "duration_secs", rename = "timeout_secs")]
    pub timeout: Duration,
    /// User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

/// Duration 以秒为单位序列化
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for LokalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl LokalConfig {
    /// 默认配置并应用环境变量覆盖（LOKAL_BASE_URL, LOKAL_TIMEOUT_SECS）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 在当前配置上应用环境变量覆盖
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(format!("{}BASE_URL", ENV_PREFIX)) {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if let Some(secs) = std::env::var(format!("{}TIMEOUT_SECS", ENV_PREFIX))
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// 文件中的隧道定义
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelSpec {
    pub name: String,
    pub tunnel_type: Option<TunnelType>,
    pub local_address: String,
    pub lan_address: String,
    pub public_address: String,
    pub inspect: bool,
    pub description: String,
    pub ignore_duplicate: bool,
    pub startup_banner: bool,
    pub options: Options,
}

/// 隧道定义文件（TOML）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TunnelFile {
    #[serde(default)]
    pub daemon: LokalConfig,
    pub tunnel: TunnelSpec,
}

impl Default for TunnelSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            tunnel_type: Some(TunnelType::Http),
            local_address: String::new(),
            lan_address: String::new(),
            public_address: String::new(),
            inspect: false,
            description: String::new(),
            ignore_duplicate: false,
            startup_banner: false,
            options: Options::default(),
        }
    }
}

impl TunnelSpec {
    /// 基于给定客户端构建隧道
    pub fn build<'a>(&self, lokal: &'a Lokal) -> Tunnel<'a> {
        let mut tunnel = lokal
            .new_tunnel()
            .name(self.name.as_str())
            .local_address(self.local_address.as_str())
            .lan_address(&self.lan_address)
            .public_address(self.public_address.as_str())
            .inspect(self.inspect)
            .description(self.description.as_str())
            .ignore_duplicate(self.ignore_duplicate)
            .show_startup_banner(self.startup_banner)
            .options(self.options.clone());
        if let Some(tunnel_type) = &self.tunnel_type {
            tunnel = tunnel.tunnel_type(tunnel_type.clone());
        }
        tunnel
    }
}

impl TunnelFile {
    /// 从文件加载隧道定义（支持 `~` 展开，并应用环境变量覆盖）
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let path = expand_path(path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read tunnel file: {}", path.display()))?;
        let mut file: TunnelFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse tunnel file: {}", path.display()))?;
        file.daemon = file.daemon.with_env_overrides();
        Ok(file)
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
