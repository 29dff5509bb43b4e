//! Consul 健康实例发现模块
//!
//! 通过长轮询 `/v1/health/service/:service` 监听服务的健康实例集合，
//! 并把变化推送给订阅者。

pub mod address;
pub mod backend;
pub mod index;
pub mod watcher;
pub mod wire;

pub use address::{Address, AddressSet};
pub use backend::{ConsulHttpTransport, HealthResponse, HealthTransport};
pub use index::{BASELINE_INDEX, CONSUL_INDEX_HEADER, ChangeIndex, next_index_from};
pub use watcher::{HealthWatcher, Subscriber};
pub use wire::{HealthEntry, HealthService, decode_addresses};
