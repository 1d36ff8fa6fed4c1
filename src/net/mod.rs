//! 网络拓扑模块
//!
//! 此模块包含拓扑注册表、节点变体、端口/链路传输与快照持久化。

// 子模块声明
mod cloud;
mod deliver_frame;
mod error;
mod host;
mod iface;
mod id;
mod link;
mod net_world;
mod network;
mod node;
mod port;
mod router;
mod snapshot;
mod stack;
mod stats;
mod style;
mod switch;

// 重新导出公共接口
pub use cloud::{CLOUD_PORTS, Cloud};
pub use deliver_frame::DeliverFrame;
pub use error::NetError;
pub use host::Host;
pub use iface::{Interface, IfaceConfig, IfaceReport};
pub use id::{LinkId, NodeId, PortRef};
pub use link::Link;
pub use net_world::NetWorld;
pub use network::{LinkEndpoint, Network};
pub use node::{Addressable, Node, NodeKind, Switching};
pub use port::Port;
pub use router::{LAN, Router, WAN};
pub use snapshot::{IfaceSnapshot, LinkSnapshot, NodeSnapshot, PoolSnapshot, TopologySnapshot};
pub use stack::NetStack;
pub use stats::Stats;
pub use style::NodeStyle;
pub use switch::{MacTable, Switch};
