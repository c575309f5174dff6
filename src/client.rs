use crate::config::LokalConfig;
use crate::error::{LokalError, Result};
use crate::tunnel::Tunnel;
use crate::version;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error as StdError;
use tracing::{debug, warn};
use url::Url;

/// Lokal 守护进程客户端
///
/// 只持有构造后不变的基础地址和 HTTP 连接池，可在多个隧道之间共享。
#[derive(Debug, Clone)]
pub struct Lokal {
    base_url: String,
    config: LokalConfig,
    http: reqwest::Client,
}

impl Lokal {
    /// 使用默认配置创建客户端（`http://127.0.0.1:6174`）
    pub fn new() -> Result<Self> {
        Self::with_config(LokalConfig::default())
    }

    /// 使用默认配置并应用 `LOKAL_*` 环境变量
    pub fn from_env() -> Result<Self> {
        Self::with_config(LokalConfig::from_env())
    }

    /// 使用指定配置创建客户端
    pub fn with_config(config: LokalConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| LokalError::invalid_config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            config,
            http,
        })
    }

    /// 修改守护进程地址
    pub fn set_base_url(&mut self, base_url: &str) -> Result<&mut Self> {
        self.base_url = normalize_base_url(base_url)?;
        self.config.base_url = base_url.to_string();
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &LokalConfig {
        &self.config
    }

    /// 创建绑定到当前客户端的新隧道
    pub fn new_tunnel(&self) -> Tunnel<'_> {
        Tunnel::new(self)
    }

    /// POST JSON 请求并解码响应对象
    pub async fn post_json<T>(&self, path: &str, body: &T) -> Result<Map<String, Value>>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body).map_err(LokalError::Encode)?;
        let text = self.request(Method::POST, path, Some(body)).await?;
        decode_object(text)
    }

    /// GET 请求并解码响应对象
    pub async fn get_json(&self, path: &str) -> Result<Map<String, Value>> {
        let text = self.request(Method::GET, path, None).await?;
        decode_object(text)
    }

    /// 发送原始请求
    ///
    /// 每个响应的头部都会经过版本检查，检查失败时不读取响应体。
    pub async fn request(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Lokal request: {} {}", method, url);

        let mut builder = self.http.request(method, &url);
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(transport_error)?;

        for (key, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes());
            version::check_header(key.as_str(), &value)?;
        }

        debug!("Lokal response: {} from {}", response.status(), url);
        response.text().await.map_err(transport_error)
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|e| LokalError::invalid_config(format!("invalid base url '{}': {}", base_url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        scheme => Err(LokalError::invalid_config(format!(
            "unsupported base url scheme '{}'",
            scheme
        ))),
    }
}

fn decode_object(text: String) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(LokalError::malformed(text)),
    }
}

/// 展开完整错误链（包含底层 os error 代码）
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn transport_error(err: reqwest::Error) -> LokalError {
    let message = describe(&err);
    if err.is_connect() || message.contains("Connection refused") {
        warn!("Lokal daemon is not reachable: {}", message);
        LokalError::connection_refused(message)
    } else if err.is_timeout() {
        LokalError::transport(format!("request timed out: {}", message))
    } else {
        LokalError::transport(message)
    }
}
