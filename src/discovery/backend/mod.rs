//! 健康查询传输层抽象和实现

pub mod consul;

use async_trait::async_trait;

use crate::error::Result;

pub use consul::{ConsulHttpTransport, health_url};

/// 一次 HTTP 查询的响应
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthResponse {
    /// HTTP 状态码
    pub status: u16,

    /// 按接收顺序排列的 (名称, 值) 响应头
    pub headers: Vec<(String, String)>,

    /// 响应体
    pub body: String,
}

impl HealthResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// 状态码是否为 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 健康查询传输 trait
///
/// 监听循环通过这个 trait 发起阻塞查询，测试中可以替换为内存实现
/// 注意：由于需要动态分发（dyn），使用 async-trait
#[async_trait]
pub trait HealthTransport: Send + Sync {
    /// 发起 GET 请求
    ///
    /// 长轮询请求可能阻塞到 `wait` 参数指定的时间才返回。
    /// 非 2xx 响应也以 `Ok` 返回，由调用方判断。
    async fn get(&self, url: &str) -> Result<HealthResponse>;
}
