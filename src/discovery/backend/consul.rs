//! Consul HTTP 传输实现

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Url};
use tracing::trace;

use crate::config::WatcherConfig;
use crate::discovery::backend::{HealthResponse, HealthTransport};
use crate::discovery::index::ChangeIndex;
use crate::error::{Result, WatchError};

/// Consul ACL token 请求头
const CONSUL_TOKEN_HEADER: &str = "X-Consul-Token";

/// 基于 reqwest 的 Consul 传输
#[derive(Clone)]
pub struct ConsulHttpTransport {
    http_client: HttpClient,
    token: Option<String>,
}

impl ConsulHttpTransport {
    /// 根据配置创建传输
    ///
    /// 请求超时必须大于长轮询等待时间，否则每次无变化的查询都会以超时结束
    pub fn new(config: &WatcherConfig) -> Result<Self> {
        config.validate()?;
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| WatchError::config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            http_client,
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl HealthTransport for ConsulHttpTransport {
    async fn get(&self, url: &str) -> Result<HealthResponse> {
        let mut request = self.http_client.get(url);
        if let Some(token) = &self.token {
            request = request.header(CONSUL_TOKEN_HEADER, token);
        }

        let resp = request.send().await?;
        let status = resp.status().as_u16();

        // http 库会把响应头名统一为小写，这里还原成 Consul 发送时的形式
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (canonical_header_name(name.as_str()), v.to_string()))
            })
            .collect();

        let body = resp.text().await?;
        trace!(url = %url, status, "Consul health query returned");

        Ok(HealthResponse {
            status,
            headers,
            body,
        })
    }
}

/// 构建健康查询 URL
///
/// `{base}/v1/health/service/{service}?passing=true&index={index}&wait={wait}`
///
/// 服务名作为单个路径段编码，查询参数经过 URL 编码，服务名中的 `?`、`/` 等字符不会改变查询结构。
pub fn health_url(
    base: &str,
    service: &str,
    index: ChangeIndex,
    wait: Duration,
    datacenter: Option<&str>,
) -> Result<String> {
    let mut url = Url::parse(base)
        .map_err(|e| WatchError::config(format!("invalid consul url {}: {}", base, e)))?;

    url.path_segments_mut()
        .map_err(|_| WatchError::config(format!("consul url {} cannot be a base", base)))?
        .pop_if_empty()
        .extend(["v1", "health", "service", service]);

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("passing", "true")
            .append_pair("index", &index.to_string())
            .append_pair("wait", &format_wait(wait));
        if let Some(dc) = datacenter {
            query.append_pair("dc", dc);
        }
    }

    Ok(url.into())
}

/// 将等待时间格式化为 Consul 的 duration 字符串（`1m`、`30s`、`500ms`）
pub fn format_wait(wait: Duration) -> String {
    let ms = wait.as_millis().max(1);
    if ms % 60_000 == 0 {
        format!("{}m", ms / 60_000)
    } else if ms % 1_000 == 0 {
        format!("{}s", ms / 1_000)
    } else {
        format!("{}ms", ms)
    }
}

/// `x-consul-index` -> `X-Consul-Index`
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
