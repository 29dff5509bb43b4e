//! `/v1/health/service/:service` 响应体结构
//!
//! 只声明监听需要的字段，其他字段在反序列化时忽略。

use serde::Deserialize;

use crate::discovery::address::{Address, AddressSet};
use crate::error::Result;

/// 健康查询结果中的一项
#[derive(Debug, Clone, Deserialize)]
pub struct HealthEntry {
    #[serde(rename = "Service")]
    pub service: HealthService,
}

/// 服务注册信息
#[derive(Debug, Clone, Deserialize)]
pub struct HealthService {
    #[serde(rename = "Address")]
    pub address: String,

    #[serde(rename = "Port")]
    pub port: u16,
}

impl From<HealthEntry> for Address {
    fn from(entry: HealthEntry) -> Self {
        Address::new(entry.service.address, entry.service.port)
    }
}

/// 将响应体解码为地址集合
///
/// 每个数组元素对应一个地址，重复的 (host, port) 合并。
/// 结构不匹配时返回 [`WatchError::Decode`](crate::error::WatchError::Decode)。
pub fn decode_addresses(body: &str) -> Result<AddressSet> {
    let entries: Vec<HealthEntry> = serde_json::from_str(body)?;
    Ok(entries.into_iter().map(Address::from).collect())
}
