//! 测试用的内存 Consul 后端
//!
//! 每次查询都会交给测试代码，由测试决定何时、以什么结果应答。

#![allow(dead_code)]

use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use flare_health_watch::{Address, AddressSet, HealthResponse, HealthTransport, Result, WatchError};

pub const BODY_ONE: &str = r#"[{"Service":{"Address":"10.0.0.1","Port":8080}}]"#;
pub const BODY_TWO: &str = r#"[
    {"Node":{"Node":"n1"},"Service":{"ID":"web-1","Address":"10.0.0.1","Port":8080}},
    {"Node":{"Node":"n2"},"Service":{"ID":"web-2","Address":"10.0.0.2","Port":8080}}
]"#;

/// 一次等待应答的查询
pub struct PendingRequest {
    pub url: String,
    pub at: Instant,
    reply: oneshot::Sender<Result<HealthResponse>>,
}

impl PendingRequest {
    /// 请求中的 index 参数
    pub fn index(&self) -> u64 {
        query_param(&self.url, "index")
            .expect("index parameter missing")
            .parse()
            .expect("index parameter is not a number")
    }

    pub fn respond(self, result: Result<HealthResponse>) {
        let _ = self.reply.send(result);
    }
}

pub struct MockConsul {
    requests: mpsc::UnboundedSender<PendingRequest>,
}

#[async_trait]
impl HealthTransport for MockConsul {
    async fn get(&self, url: &str) -> Result<HealthResponse> {
        let (reply, rx) = oneshot::channel();
        let pending = PendingRequest {
            url: url.to_string(),
            at: Instant::now(),
            reply,
        };
        if self.requests.send(pending).is_err() {
            return Err(WatchError::transport("mock consul closed"));
        }
        rx.await
            .unwrap_or_else(|_| Err(WatchError::transport("request dropped by test")))
    }
}

/// 测试侧句柄
pub struct Harness {
    requests: mpsc::UnboundedReceiver<PendingRequest>,
}

impl Harness {
    /// 等待监听器发出下一次查询
    pub async fn next(&mut self) -> PendingRequest {
        self.requests.recv().await.expect("watch loop stopped")
    }

    /// 当前是否有已发出的查询
    pub fn try_next(&mut self) -> Option<PendingRequest> {
        self.requests.try_recv().ok()
    }

    /// 等待后台任务释放传输（即循环已退出）
    pub async fn closed(&mut self) -> bool {
        self.requests.recv().await.is_none()
    }
}

pub fn mock_consul() -> (Arc<MockConsul>, Harness) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(MockConsul { requests: tx }), Harness { requests: rx })
}

/// 带 X-Consul-Index 的 200 响应
pub fn ok(index: u64, body: &str) -> Result<HealthResponse> {
    Ok(HealthResponse::new(
        200,
        vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("X-Consul-Index".to_string(), index.to_string()),
        ],
        body,
    ))
}

/// 不带索引头的 200 响应
pub fn ok_without_index(body: &str) -> Result<HealthResponse> {
    Ok(HealthResponse::new(200, vec![], body))
}

/// 订阅者收到的地址集合
pub fn subscriber_channel() -> (
    impl Fn(&AddressSet) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<AddressSet>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscriber = move |addresses: &AddressSet| {
        let _ = tx.send(addresses.clone());
    };
    (subscriber, rx)
}

pub fn set_of(addresses: &[(&str, u16)]) -> AddressSet {
    addresses
        .iter()
        .map(|(host, port)| Address::new(*host, *port))
        .collect()
}

pub fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}
