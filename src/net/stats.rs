//! 统计信息
//!
//! 定义网络仿真统计数据结构。

/// 网络统计信息
#[derive(Debug, Default)]
pub struct Stats {
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub packets_dropped: u64,
}
