//! 健康实例地址定义

use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use serde::{Deserialize, Serialize};

/// 健康实例地址集合（完整快照，不是增量）
pub type AddressSet = HashSet<Address>;

/// 健康实例地址
///
/// 相等性与哈希按 (host, port) 值比较。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    host: String,
    port: u16,
}

impl Address {
    /// 创建新的地址
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// 转换为 SocketAddr
    ///
    /// 只有 host 是 IP 字面量时才能转换，主机名返回 None
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        self.host
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
