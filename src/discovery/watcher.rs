//! Consul 健康实例长轮询监听
//!
//! 每个 [`HealthWatcher`] 对应一个服务名和一个后台任务。后台任务依次发起阻塞查询：
//!
//! - 响应索引大于本次请求索引时，解码响应体并把完整地址集合推送给订阅者
//! - 索引未前进时不解码、不通知，直接以新索引继续查询
//! - 任何失败（传输、超时、非 2xx、解码）都会记录日志，等待固定延迟后从基线索引 0 重新开始
//!
//! 订阅者随时可以替换。替换时如果已有缓存结果，新订阅者会在 `set_subscriber` 返回前
//! 同步收到一次缓存结果。

use std::sync::Arc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::WatcherConfig;
use crate::discovery::address::AddressSet;
use crate::discovery::backend::{HealthTransport, health_url};
use crate::discovery::index::{BASELINE_INDEX, ChangeIndex, next_index_from};
use crate::discovery::wire::decode_addresses;
use crate::error::{Result, WatchError};
use crate::retry::{BackoffPolicy, FixedBackoff};

/// 地址集合订阅者
///
/// 调用约定：
/// - `on_update` 在持有监听器内部锁时被调用，应尽快返回，否则会推迟下一次查询
/// - 不要在 `on_update` 中调用同一个监听器的 `set_subscriber` / `clear_subscriber`，会死锁
pub trait Subscriber: Send + Sync {
    fn on_update(&self, addresses: &AddressSet);
}

impl<F> Subscriber for F
where
    F: Fn(&AddressSet) + Send + Sync,
{
    fn on_update(&self, addresses: &AddressSet) {
        self(addresses)
    }
}

/// 监听状态：最近一次推送的地址集合和当前订阅者
#[derive(Default)]
struct WatchState {
    latest: Option<Arc<AddressSet>>,
    subscriber: Option<Box<dyn Subscriber>>,
}

struct Shared {
    service_name: String,
    state: Mutex<WatchState>,
}

impl Shared {
    /// 缓存并推送新的地址集合
    ///
    /// 推送在锁内完成，保证推送之间不会重叠
    fn publish(&self, addresses: AddressSet) {
        let addresses = Arc::new(addresses);
        let mut state = self.state.lock();
        state.latest = Some(addresses.clone());
        if let Some(subscriber) = &state.subscriber {
            subscriber.on_update(&addresses);
        }
    }
}

/// Consul 健康实例监听器
///
/// 创建即启动；丢弃监听器会停止后台任务。
pub struct HealthWatcher {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl HealthWatcher {
    /// 启动对 `service_name` 的监听
    ///
    /// 立即返回，查询在后台任务中进行。必须在 tokio 运行时内调用。
    pub fn start(
        transport: Arc<dyn HealthTransport>,
        config: &WatcherConfig,
        service_name: impl Into<String>,
    ) -> Self {
        let backoff = Arc::new(FixedBackoff::new(config.retry_delay()));
        Self::start_with_backoff(transport, config, service_name, backoff)
    }

    /// 使用自定义退避策略启动监听
    pub fn start_with_backoff(
        transport: Arc<dyn HealthTransport>,
        config: &WatcherConfig,
        service_name: impl Into<String>,
        backoff: Arc<dyn BackoffPolicy>,
    ) -> Self {
        let shared = Arc::new(Shared {
            service_name: service_name.into(),
            state: Mutex::new(WatchState::default()),
        });
        let cancel = CancellationToken::new();

        let poll_loop = PollLoop {
            transport,
            shared: shared.clone(),
            backoff,
            cancel: cancel.clone(),
            config: config.clone(),
        };
        let handle = tokio::spawn(poll_loop.run());

        Self {
            shared,
            cancel,
            handle: Some(handle),
        }
    }

    /// 监听的服务名
    pub fn service_name(&self) -> &str {
        &self.shared.service_name
    }

    /// 替换订阅者
    ///
    /// 已有缓存结果时，新订阅者会在本方法返回前同步收到一次缓存结果。
    /// 正在进行的推送会先完成，之后才替换。
    pub fn set_subscriber<S>(&self, subscriber: S)
    where
        S: Subscriber + 'static,
    {
        let mut state = self.shared.state.lock();
        if let Some(latest) = state.latest.clone() {
            subscriber.on_update(&latest);
        }
        state.subscriber = Some(Box::new(subscriber));
    }

    /// 移除订阅者
    pub fn clear_subscriber(&self) {
        self.shared.state.lock().subscriber = None;
    }

    /// 最近一次推送的地址集合，首次成功查询前为 None
    pub fn latest(&self) -> Option<Arc<AddressSet>> {
        self.shared.state.lock().latest.clone()
    }

    /// 停止后台任务（幂等）
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 停止并等待后台任务退出
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(service = %self.shared.service_name, error = %e, "Health watch task ended abnormally");
            }
        }
    }
}

impl Drop for HealthWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// 后台长轮询循环
struct PollLoop {
    transport: Arc<dyn HealthTransport>,
    shared: Arc<Shared>,
    backoff: Arc<dyn BackoffPolicy>,
    cancel: CancellationToken,
    config: WatcherConfig,
}

impl PollLoop {
    async fn run(self) {
        let service = self.shared.service_name.clone();
        info!(service = %service, consul = %self.config.consul_url, "Starting Consul health watch");

        let mut index = BASELINE_INDEX;
        let mut failures = 0usize;
        loop {
            let polled = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                polled = self.poll_once(index) => polled,
            };

            match polled {
                Ok(next) => {
                    failures = 0;
                    index = next;
                }
                Err(e) => {
                    failures += 1;
                    let delay = self.backoff.backoff_duration(failures);
                    if e.is_retryable() {
                        warn!(
                            service = %service,
                            index,
                            attempt = failures,
                            error = %e,
                            "Got an error while long polling Consul, retrying in {:?} from baseline index",
                            delay
                        );
                    } else {
                        // 配置错误不会自行恢复，仍然按固定延迟重试，但以 error 级别提示
                        error!(
                            service = %service,
                            attempt = failures,
                            error = %e,
                            "Consul health watch is misconfigured, retrying in {:?}",
                            delay
                        );
                    }

                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    index = BASELINE_INDEX;
                }
            }
        }

        info!(service = %service, "Consul health watch stopped");
    }

    /// 执行一次阻塞查询，返回下一次查询使用的索引
    async fn poll_once(&self, index: ChangeIndex) -> Result<ChangeIndex> {
        let url = health_url(
            &self.config.consul_url,
            &self.shared.service_name,
            index,
            self.config.wait(),
            self.config.datacenter.as_deref(),
        )?;

        let resp = self.transport.get(&url).await?;
        if !resp.is_success() {
            return Err(WatchError::Status {
                status: resp.status,
                body: resp.body,
            });
        }

        let next = next_index_from(&resp.headers);
        if next > index {
            let addresses = decode_addresses(&resp.body)?;
            info!(
                service = %self.shared.service_name,
                index = next,
                count = addresses.len(),
                "Healthy addresses changed"
            );
            self.shared.publish(addresses);
        } else {
            debug!(service = %self.shared.service_name, index, next, "No change in Consul health");
        }

        Ok(next)
    }
}
