//! Lokal 客户端库入口
//!
//! 通过本地 Lokal Client 守护进程的 HTTP API 创建 LAN / 公网隧道
pub mod banner;
pub mod client;
pub mod config;
pub mod error;
pub mod options;
pub mod tunnel;
pub mod version;

// 重新导出常用类型
pub use client::Lokal;
pub use config::{LokalConfig, TunnelFile, TunnelSpec};
pub use error::{LokalError, Result};
pub use options::Options;
pub use tunnel::{Tunnel, TunnelInfo, TunnelRequest, TunnelResponse, TunnelType};
pub use version::MIN_SERVER_VERSION;
