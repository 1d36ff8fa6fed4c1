//! 标识符类型
//!
//! 定义节点、链路和端口的唯一标识符。节点与链路共用注册表的单调计数器；
//! 计数器空间顶部保留给单例基础设施节点（云）。

use serde::{Deserialize, Serialize};

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// 共享“云”节点的保留 ID（不由计数器分配）。
    pub const CLOUD: NodeId = NodeId(u64::MAX);
}

/// 链路标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub u64);

/// 端口引用：节点 ID + 节点内端口序号。
/// 端口/接口不持有拥有指针，统一通过注册表按引用解析。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub node: NodeId,
    pub port: usize,
}
