use crate::banner::write_startup_banner;
use crate::client::Lokal;
use crate::error::{LokalError, Result};
use crate::options::Options;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io::{self, Write};
use tracing::{info, warn};

/// 创建隧道的 API 路径
pub const START_TUNNEL_PATH: &str = "/api/tunnel/start";

/// LAN (mDNS) 地址后缀
pub const LAN_SUFFIX: &str = ".local";

/// 守护进程报告重复地址时的消息片段（小写比较）
const DUPLICATE_ADDRESS_MESSAGE: &str = "address is already being used";

/// 隧道协议类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TunnelType {
    /// HTTP 隧道
    Http,
    /// 守护进程支持的其他协议，按原样传递
    Other(String),
}

impl TunnelType {
    pub fn as_str(&self) -> &str {
        match self {
            TunnelType::Http => "HTTP",
            TunnelType::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for TunnelType {
    fn from(value: String) -> Self {
        if value == "HTTP" {
            TunnelType::Http
        } else {
            TunnelType::Other(value)
        }
    }
}

impl From<&str> for TunnelType {
    fn from(value: &str) -> Self {
        TunnelType::from(value.to_string())
    }
}

impl From<TunnelType> for String {
    fn from(value: TunnelType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TunnelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 隧道配置（Builder）
///
/// 通过 [`Lokal::new_tunnel`] 创建，setter 不做校验，[`Tunnel::create`] 时统一校验。
#[derive(Debug, Clone)]
pub struct Tunnel<'a> {
    lokal: &'a Lokal,
    name: String,
    tunnel_type: Option<TunnelType>,
    local_address: String,
    server_id: String,
    address_tunnel: String,
    address_tunnel_port: u16,
    address_public: String,
    address_mdns: String,
    inspect: bool,
    options: Options,
    description: String,
    ignore_duplicate: bool,
    startup_banner: bool,
}

/// `POST /api/tunnel/start` 的请求体
///
/// `address_mdns` 为去掉 `.local` 后缀的原始值。
#[derive(Debug, Clone, Serialize)]
pub struct TunnelRequest<'t> {
    pub name: &'t str,
    pub tunnel_type: &'t str,
    pub local_address: &'t str,
    pub server_id: &'t str,
    pub address_tunnel: &'t str,
    pub address_tunnel_port: u16,
    pub address_public: &'t str,
    pub address_mdns: &'t str,
    pub inspect: bool,
    pub options: &'t Options,
    pub description: &'t str,
}

/// 守护进程分配的隧道信息
///
/// 已知字段类型不符时保留在 `extra` 中，不视为错误。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TunnelInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_tunnel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_tunnel_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_public: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_mdns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// 其余未识别字段
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 创建隧道的响应
#[derive(Debug, Clone, PartialEq)]
pub enum TunnelResponse {
    /// `success` 为 true 或缺省
    Success(TunnelInfo),
    /// `success` 为 false
    Failure { message: String },
}

impl TunnelResponse {
    /// 从守护进程返回的 JSON 对象解码
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let success = map.remove("success");
        if let Some(Value::Bool(false)) = success {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return TunnelResponse::Failure { message };
        }

        TunnelResponse::Success(TunnelInfo {
            server_id: take_string(&mut map, "server_id"),
            address_tunnel: take_string(&mut map, "address_tunnel"),
            address_tunnel_port: take_port(&mut map, "address_tunnel_port"),
            address_public: take_string(&mut map, "address_public"),
            address_mdns: take_string(&mut map, "address_mdns"),
            message: take_string(&mut map, "message"),
            extra: map,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TunnelResponse::Success(_))
    }

    pub fn info(&self) -> Option<&TunnelInfo> {
        match self {
            TunnelResponse::Success(info) => Some(info),
            TunnelResponse::Failure { .. } => None,
        }
    }
}

/// 取出字符串字段；类型不符时留在 map 中
fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(value)) => Some(value),
        Some(Value::Null) | None => None,
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
    }
}

/// 取出端口字段；非整数或超出 u16 范围时留在 map 中
fn take_port(map: &mut Map<String, Value>, key: &str) -> Option<u16> {
    match map.remove(key) {
        Some(Value::Null) | None => None,
        Some(value) => match value.as_u64().and_then(|port| u16::try_from(port).ok()) {
            Some(port) => Some(port),
            None => {
                map.insert(key.to_string(), value);
                None
            }
        },
    }
}

fn is_duplicate_address(message: &str) -> bool {
    message.to_lowercase().contains(DUPLICATE_ADDRESS_MESSAGE)
}

impl<'a> Tunnel<'a> {
    pub(crate) fn new(lokal: &'a Lokal) -> Self {
        Self {
            lokal,
            name: String::new(),
            tunnel_type: None,
            local_address: String::new(),
            server_id: String::new(),
            address_tunnel: String::new(),
            address_tunnel_port: 0,
            address_public: String::new(),
            address_mdns: String::new(),
            inspect: false,
            options: Options::default(),
            description: String::new(),
            ignore_duplicate: false,
            startup_banner: false,
        }
    }

    /// 设置隧道名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 设置隧道类型
    pub fn tunnel_type(mut self, tunnel_type: impl Into<TunnelType>) -> Self {
        self.tunnel_type = Some(tunnel_type.into());
        self
    }

    /// 设置本地服务地址（host:port）
    pub fn local_address(mut self, address: impl Into<String>) -> Self {
        self.local_address = address.into();
        self
    }

    /// 替换整个 Options
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// 是否开启流量检查
    pub fn inspect(mut self, inspect: bool) -> Self {
        self.inspect = inspect;
        self
    }

    /// 设置 LAN 地址，末尾的 `.local` 会被去掉
    pub fn lan_address(mut self, address: &str) -> Self {
        self.address_mdns = address
            .strip_suffix(LAN_SUFFIX)
            .unwrap_or(address)
            .to_string();
        self
    }

    /// 设置公网地址
    pub fn public_address(mut self, address: impl Into<String>) -> Self {
        self.address_public = address.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// 将守护进程的"地址已被使用"错误视为成功
    pub fn ignore_duplicate(mut self, ignore: bool) -> Self {
        self.ignore_duplicate = ignore;
        self
    }

    /// 创建成功后输出启动横幅
    pub fn show_startup_banner(mut self, show: bool) -> Self {
        self.startup_banner = show;
        self
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn options_ref(&self) -> &Options {
        &self.options
    }

    /// LAN 地址（总是带 `.local` 后缀）；未设置时为空
    pub fn lan_hostname(&self) -> String {
        if self.address_mdns.is_empty() || self.address_mdns.ends_with(LAN_SUFFIX) {
            self.address_mdns.clone()
        } else {
            format!("{}{}", self.address_mdns, LAN_SUFFIX)
        }
    }

    // TODO: fall back to address_tunnel:address_tunnel_port once the daemon response is written back
    pub fn public_hostname(&self) -> &str {
        &self.address_public
    }

    pub fn ignores_duplicate(&self) -> bool {
        self.ignore_duplicate
    }

    pub fn startup_banner_enabled(&self) -> bool {
        self.startup_banner
    }

    /// 校验配置：LAN 和公网地址至少设置一个
    pub fn validate(&self) -> Result<()> {
        if self.address_mdns.is_empty() && self.address_public.is_empty() {
            return Err(LokalError::invalid_config(
                "Either LAN or Public address must be set",
            ));
        }
        Ok(())
    }

    /// 构造请求体
    pub fn request(&self) -> TunnelRequest<'_> {
        TunnelRequest {
            name: &self.name,
            tunnel_type: self.tunnel_type.as_ref().map_or("", TunnelType::as_str),
            local_address: &self.local_address,
            server_id: &self.server_id,
            address_tunnel: &self.address_tunnel,
            address_tunnel_port: self.address_tunnel_port,
            address_public: &self.address_public,
            address_mdns: &self.address_mdns,
            inspect: self.inspect,
            options: &self.options,
            description: &self.description,
        }
    }

    /// 创建隧道，横幅输出到 stdout
    pub async fn create(&self) -> Result<TunnelResponse> {
        let mut stdout = io::stdout();
        self.create_with_writer(&mut stdout).await
    }

    /// 创建隧道，横幅输出到指定 writer
    pub async fn create_with_writer<W: Write>(&self, out: &mut W) -> Result<TunnelResponse> {
        self.validate()?;

        let body = self
            .lokal
            .post_json(START_TUNNEL_PATH, &self.request())
            .await?;
        let response = TunnelResponse::from_map(body);

        match &response {
            TunnelResponse::Failure { message }
                if self.ignore_duplicate && is_duplicate_address(message) =>
            {
                warn!("Tunnel '{}' already exists, reusing it: {}", self.name, message);
            }
            TunnelResponse::Failure { message } => {
                warn!("Lokal daemon rejected tunnel '{}': {}", self.name, message);
                return Err(LokalError::rejected(message.as_str()));
            }
            TunnelResponse::Success(tunnel) => {
                info!(
                    "Tunnel '{}' created (server_id: {}, tunnel: {}:{})",
                    self.name,
                    tunnel.server_id.as_deref().unwrap_or("-"),
                    tunnel.address_tunnel.as_deref().unwrap_or("-"),
                    tunnel.address_tunnel_port.unwrap_or(0)
                );
            }
        }

        if self.startup_banner {
            write_startup_banner(out, self.public_hostname(), &self.lan_hostname())?;
        }

        Ok(response)
    }
}
