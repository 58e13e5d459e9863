use chrono::{DateTime, Local, Utc};

/// 当前时间（秒），与磁盘上的 32 位时间戳字段对齐
pub fn current_timestamp() -> u32 {
    Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32
}

/// 把磁盘时间戳格式化成本地时间
pub fn format_timestamp(ts: u32) -> String {
    DateTime::from_timestamp(ts as i64, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
