/// 自定义错误类型
///
/// 使用 thiserror 定义精确的错误类型，调用者可以区分本地配置错误、
/// 传输错误以及守护进程返回的错误
use std::io;
use thiserror::Error;

/// 安装提示（连接被拒绝时附加到错误消息）
pub const INSTALL_HINT: &str = "You may need to install Lokal Client at Lokal.so/download";

/// Lokal 客户端的主要错误类型
#[derive(Error, Debug)]
pub enum LokalError {
    /// 隧道配置无效（在发起任何网络请求前检测）
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// 传输层错误（连接失败、超时等）
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// 守护进程返回的不是合法的 JSON 对象
    #[error("Failed to decode JSON response: {body}")]
    MalformedResponse { body: String },

    /// 守护进程版本过旧
    #[error(
        "Outdated software version, server version: {server_version}, server version required (minimal): {required}"
    )]
    OutdatedDaemon {
        server_version: String,
        required: String,
    },

    /// 守护进程拒绝了请求（success = false）
    #[error("Daemon rejected request: {0}")]
    DaemonRejected(String),

    /// 请求体序列化失败
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// I/O 错误
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, LokalError>;

impl LokalError {
    /// 创建配置错误
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// 创建传输错误
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
        }
    }

    /// 创建连接失败错误（附加安装提示）
    pub fn connection_refused(msg: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: format!("{} - {}", msg, INSTALL_HINT),
        }
    }

    /// 创建响应解析错误
    pub fn malformed(body: impl Into<String>) -> Self {
        Self::MalformedResponse { body: body.into() }
    }

    /// 创建版本过旧错误
    pub fn outdated(server_version: impl Into<String>, required: impl Into<String>) -> Self {
        Self::OutdatedDaemon {
            server_version: server_version.into(),
            required: required.into(),
        }
    }

    /// 创建守护进程拒绝错误
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::DaemonRejected(msg.into())
    }

    /// 检查是否为配置错误
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }

    /// 检查是否为传输错误
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// 检查是否为版本过旧
    pub fn is_outdated(&self) -> bool {
        matches!(self, Self::OutdatedDaemon { .. })
    }

    /// 检查是否为守护进程拒绝
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::DaemonRejected(_))
    }
}
