use serde::{Deserialize, Serialize};

/// 隧道请求级别的策略（认证、访问控制、头部改写）
///
/// 每个列表保持插入顺序且不包含重复项，重复插入是空操作。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    basic_auth: Vec<String>,
    cidr_allow: Vec<String>,
    cidr_deny: Vec<String>,
    request_header_add: Vec<String>,
    request_header_remove: Vec<String>,
    response_header_add: Vec<String>,
    response_header_remove: Vec<String>,
    header_key: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, entry: String) {
    if !list.contains(&entry) {
        list.push(entry);
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加 Basic 认证凭据（存储为 `user:pass`）
    pub fn set_basic_auth(&mut self, username: &str, password: &str) -> &mut Self {
        push_unique(&mut self.basic_auth, format!("{}:{}", username, password));
        self
    }

    /// 添加允许访问的 CIDR
    pub fn set_cidr_allow(&mut self, cidr: impl Into<String>) -> &mut Self {
        push_unique(&mut self.cidr_allow, cidr.into());
        self
    }

    /// 添加拒绝访问的 CIDR
    pub fn set_cidr_deny(&mut self, cidr: impl Into<String>) -> &mut Self {
        push_unique(&mut self.cidr_deny, cidr.into());
        self
    }

    /// 转发前向请求添加头部
    pub fn add_request_header(&mut self, key: &str, value: &str) -> &mut Self {
        push_unique(&mut self.request_header_add, format!("{}:{}", key, value));
        self
    }

    /// 转发前从请求中移除头部
    pub fn remove_request_header(&mut self, header: impl Into<String>) -> &mut Self {
        push_unique(&mut self.request_header_remove, header.into());
        self
    }

    /// 向响应添加头部
    pub fn add_response_header(&mut self, key: &str, value: &str) -> &mut Self {
        push_unique(&mut self.response_header_add, format!("{}:{}", key, value));
        self
    }

    /// 从响应中移除头部
    pub fn remove_response_header(&mut self, header: impl Into<String>) -> &mut Self {
        push_unique(&mut self.response_header_remove, header.into());
        self
    }

    /// 设置访问隧道所需的头部密钥
    pub fn set_header_key(&mut self, key: &str, value: &str) -> &mut Self {
        push_unique(&mut self.header_key, format!("{}:{}", key, value));
        self
    }

    pub fn basic_auth(&self) -> &[String] {
        &self.basic_auth
    }

    pub fn cidr_allow(&self) -> &[String] {
        &self.cidr_allow
    }

    pub fn cidr_deny(&self) -> &[String] {
        &self.cidr_deny
    }

    pub fn request_header_add(&self) -> &[String] {
        &self.request_header_add
    }

    pub fn request_header_remove(&self) -> &[String] {
        &self.request_header_remove
    }

    pub fn response_header_add(&self) -> &[String] {
        &self.response_header_add
    }

    pub fn response_header_remove(&self) -> &[String] {
        &self.response_header_remove
    }

    pub fn header_key(&self) -> &[String] {
        &self.header_key
    }
}
