//! 健康监听错误处理模块
//!
//! 监听循环内部的所有错误都会被记录并触发固定延迟重试，不会传递给调用方或订阅者。

use thiserror::Error;

/// 健康监听错误类型
#[derive(Error, Debug)]
pub enum WatchError {
    /// 网络或 IO 错误
    #[error("传输错误: {0}")]
    Transport(String),

    /// 请求超过客户端超时时间
    #[error("请求超时")]
    Timeout,

    /// Consul 返回非 2xx 状态码
    #[error("Consul 返回异常状态码 {status}: {body}")]
    Status { status: u16, body: String },

    /// 响应体与健康查询的 JSON 结构不匹配
    #[error("响应解码失败: {0}")]
    Decode(#[from] serde_json::Error),

    /// 配置错误（仅在加载配置时出现）
    #[error("配置错误: {0}")]
    Config(String),
}

impl WatchError {
    /// 创建传输错误
    pub fn transport(msg: impl Into<String>) -> Self {
        WatchError::Transport(msg.into())
    }

    /// 创建配置错误
    pub fn config(msg: impl Into<String>) -> Self {
        WatchError::Config(msg.into())
    }

    /// 是否属于监听循环可以重试的错误
    pub fn is_retryable(&self) -> bool {
        !matches!(self, WatchError::Config(_))
    }
}

impl From<reqwest::Error> for WatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WatchError::Timeout
        } else {
            WatchError::Transport(err.to_string())
        }
    }
}

/// 健康监听结果类型
pub type Result<T> = std::result::Result<T, WatchError>;
