//! Consul 变更索引提取

use tracing::debug;

/// Consul 返回的变更索引，仅作为下一次阻塞查询的游标使用
pub type ChangeIndex = u64;

/// 基线索引：首次查询以及任何失败之后都从这里重新开始
pub const BASELINE_INDEX: ChangeIndex = 0;

/// 携带变更索引的响应头（大小写敏感）
pub const CONSUL_INDEX_HEADER: &str = "X-Consul-Index";

/// 从响应头中提取下一次查询使用的索引
///
/// 响应头缺失或无法解析时返回 [`BASELINE_INDEX`]，不视为请求失败。
pub fn next_index_from(headers: &[(String, String)]) -> ChangeIndex {
    let Some((_, value)) = headers.iter().find(|(name, _)| name == CONSUL_INDEX_HEADER) else {
        debug!("Consul response carries no {} header", CONSUL_INDEX_HEADER);
        return BASELINE_INDEX;
    };

    match value.trim().parse::<ChangeIndex>() {
        Ok(index) => index,
        Err(e) => {
            debug!(value = %value, error = %e, "Unparseable {} header", CONSUL_INDEX_HEADER);
            BASELINE_INDEX
        }
    }
}
