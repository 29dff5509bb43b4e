use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WatchError};

/// 请求超时相对长轮询等待时间的余量（毫秒）
const REQUEST_TIMEOUT_GRACE_MS: u64 = 15_000;

/// 健康监听配置
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Consul HTTP 地址
    #[serde(default = "default_consul_url")]
    pub consul_url: String,

    /// 长轮询等待时间（毫秒），必须大于 0
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,

    /// 查询失败后的重试延迟（毫秒），必须大于 0
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// HTTP 请求超时（毫秒），未设置时为 wait + 15s
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// ACL token
    #[serde(default)]
    pub token: Option<String>,

    /// 数据中心
    #[serde(default)]
    pub datacenter: Option<String>,
}

fn default_consul_url() -> String {
    "http://localhost:8500".to_string()
}

fn default_wait_ms() -> u64 {
    60_000
}

fn default_retry_delay_ms() -> u64 {
    5_000
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            consul_url: default_consul_url(),
            wait_ms: default_wait_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_ms: None,
            token: None,
            datacenter: None,
        }
    }
}

impl WatcherConfig {
    /// 从 TOML 文件加载
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WatchError::config(format!("failed to read {}: {}", path, e)))?;
        let config: WatcherConfig = toml::from_str(&content)
            .map_err(|e| WatchError::config(format!("failed to parse {}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    ///
    /// 等待时间和重试延迟为 0 会让监听循环不间断地请求 Consul
    pub fn validate(&self) -> Result<()> {
        if self.wait_ms == 0 {
            return Err(WatchError::config("wait must be greater than zero"));
        }
        if self.retry_delay_ms == 0 {
            return Err(WatchError::config("retry delay must be greater than zero"));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(WatchError::config("request timeout must be greater than zero"));
        }
        Ok(())
    }

    /// 从环境变量加载
    ///
    /// 支持 `CONSUL_HTTP_ADDR`、`CONSUL_HTTP_TOKEN`、`CONSUL_DATACENTER`，其余使用默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 使用自定义的变量查询函数加载（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(addr) = lookup("CONSUL_HTTP_ADDR").filter(|v| !v.is_empty()) {
            // CONSUL_HTTP_ADDR 允许省略协议
            config.consul_url = if addr.contains("://") {
                addr
            } else {
                format!("http://{}", addr)
            };
        }
        config.token = lookup("CONSUL_HTTP_TOKEN").filter(|v| !v.is_empty());
        config.datacenter = lookup("CONSUL_DATACENTER").filter(|v| !v.is_empty());
        config
    }

    pub fn with_consul_url(mut self, url: impl Into<String>) -> Self {
        self.consul_url = url.into();
        self
    }

    pub fn with_wait(mut self, wait: Duration) -> Result<Self> {
        self.wait_ms = duration_to_ms(wait);
        self.validate()?;
        Ok(self)
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Result<Self> {
        self.retry_delay_ms = duration_to_ms(delay);
        self.validate()?;
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.request_timeout_ms = Some(duration_to_ms(timeout));
        self.validate()?;
        Ok(self)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_datacenter(mut self, dc: impl Into<String>) -> Self {
        self.datacenter = Some(dc.into());
        self
    }

    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_ms
                .unwrap_or(self.wait_ms.saturating_add(REQUEST_TIMEOUT_GRACE_MS)),
        )
    }
}

/// 亚毫秒部分向上取整，非零时长不会变成 0
fn duration_to_ms(d: Duration) -> u64 {
    let ms = d.as_millis();
    let ms = if d.subsec_nanos() % 1_000_000 != 0 { ms + 1 } else { ms };
    u64::try_from(ms).unwrap_or(u64::MAX)
}
