//! Flare Health Watch
//!
//! 通过 Consul 阻塞查询监听服务的健康实例，并把完整的地址集合推送给订阅者。

pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod retry;

// Re-exports
pub use config::WatcherConfig;
pub use discovery::{
    Address, AddressSet, ChangeIndex, ConsulHttpTransport, HealthResponse, HealthTransport,
    HealthWatcher, Subscriber,
};
pub use error::{Result, WatchError};
pub use retry::{BackoffPolicy, FixedBackoff};
