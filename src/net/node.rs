//! 节点类型
//!
//! 节点是带标签的变体（主机/交换机/路由器/云），配合能力 trait
//! （可寻址、可交换）做多态分发，替代深层继承。

use super::cloud::Cloud;
use super::host::Host;
use super::id::{LinkId, NodeId};
use super::network::Network;
use super::router::Router;
use super::stack::NetStack;
use super::style::NodeStyle;
use super::switch::Switch;
use crate::proto::Frame;
use crate::sim::Simulator;
use std::fmt;

/// 节点种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Host,
    Switch,
    Router,
    Cloud,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeKind::Host => "host",
            NodeKind::Switch => "switch",
            NodeKind::Router => "router",
            NodeKind::Cloud => "cloud",
        };
        f.write_str(label)
    }
}

/// 可寻址节点能力：拥有接口、ARP 解析器与服务表。
pub trait Addressable {
    fn stack(&self) -> &NetStack;
    fn stack_mut(&mut self) -> &mut NetStack;
}

impl Addressable for Host {
    fn stack(&self) -> &NetStack {
        &self.stack
    }
    fn stack_mut(&mut self) -> &mut NetStack {
        &mut self.stack
    }
}

impl Addressable for Router {
    fn stack(&self) -> &NetStack {
        &self.stack
    }
    fn stack_mut(&mut self) -> &mut NetStack {
        &mut self.stack
    }
}

/// 可交换节点能力：拥有端口阵列与 MAC 学习表。
pub trait Switching {
    fn fabric(&self) -> &Switch;
    fn fabric_mut(&mut self) -> &mut Switch;
}

impl Switching for Switch {
    fn fabric(&self) -> &Switch {
        self
    }
    fn fabric_mut(&mut self) -> &mut Switch {
        self
    }
}

impl Switching for Cloud {
    fn fabric(&self) -> &Switch {
        &self.sw
    }
    fn fabric_mut(&mut self) -> &mut Switch {
        &mut self.sw
    }
}

/// 网络节点变体。
pub enum Node {
    Host(Host),
    Switch(Switch),
    Router(Router),
    Cloud(Cloud),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Host(h) => h.stack().id(),
            Node::Switch(s) => s.id(),
            Node::Router(r) => r.stack().id(),
            Node::Cloud(c) => c.id(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Host(_) => NodeKind::Host,
            Node::Switch(_) => NodeKind::Switch,
            Node::Router(_) => NodeKind::Router,
            Node::Cloud(_) => NodeKind::Cloud,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Host(h) => h.stack().name(),
            Node::Switch(s) => s.name(),
            Node::Router(r) => r.stack().name(),
            Node::Cloud(c) => c.sw.name(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        match self {
            Node::Host(h) => h.stack_mut().set_name(name),
            Node::Switch(s) => s.set_name(name),
            Node::Router(r) => r.stack_mut().set_name(name),
            Node::Cloud(c) => c.sw.set_name(name),
        }
    }

    pub fn is_addressable(&self) -> bool {
        matches!(self, Node::Host(_) | Node::Router(_))
    }

    pub fn style(&self) -> &NodeStyle {
        match self {
            Node::Host(h) => &h.style,
            Node::Switch(s) => &s.style,
            Node::Router(r) => &r.style,
            Node::Cloud(c) => &c.sw.style,
        }
    }

    /// 可寻址能力访问（主机/路由器）。
    pub fn stack(&self) -> Option<&NetStack> {
        match self {
            Node::Host(h) => Some(h.stack()),
            Node::Router(r) => Some(r.stack()),
            _ => None,
        }
    }

    pub fn stack_mut(&mut self) -> Option<&mut NetStack> {
        match self {
            Node::Host(h) => Some(h.stack_mut()),
            Node::Router(r) => Some(r.stack_mut()),
            _ => None,
        }
    }

    pub fn as_host(&self) -> Option<&Host> {
        match self {
            Node::Host(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_host_mut(&mut self) -> Option<&mut Host> {
        match self {
            Node::Host(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_router(&self) -> Option<&Router> {
        match self {
            Node::Router(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_router_mut(&mut self) -> Option<&mut Router> {
        match self {
            Node::Router(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_switch(&self) -> Option<&Switch> {
        match self {
            Node::Switch(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_cloud(&self) -> Option<&Cloud> {
        match self {
            Node::Cloud(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_cloud_mut(&mut self) -> Option<&mut Cloud> {
        match self {
            Node::Cloud(c) => Some(c),
            _ => None,
        }
    }

    /* ---------- ports ---------- */

    pub fn port_count(&self) -> usize {
        match self {
            Node::Host(h) => h.stack().ifaces().len(),
            Node::Switch(s) => s.port_count(),
            Node::Router(r) => r.stack().ifaces().len(),
            Node::Cloud(c) => c.sw.port_count(),
        }
    }

    pub fn port(&self, idx: usize) -> Option<&super::port::Port> {
        match self {
            Node::Host(h) => h.stack().iface(idx).map(|i| &i.port),
            Node::Switch(s) => s.ports.get(idx),
            Node::Router(r) => r.stack().iface(idx).map(|i| &i.port),
            Node::Cloud(c) => c.sw.ports.get(idx),
        }
    }

    pub(crate) fn port_mut(&mut self, idx: usize) -> Option<&mut super::port::Port> {
        match self {
            Node::Host(h) => h.stack_mut().iface_mut(idx).map(|i| &mut i.port),
            Node::Switch(s) => s.ports.get_mut(idx),
            Node::Router(r) => r.stack_mut().iface_mut(idx).map(|i| &mut i.port),
            Node::Cloud(c) => c.sw.ports.get_mut(idx),
        }
    }

    pub fn has_free_port(&self) -> bool {
        self.next_free_port().is_some()
    }

    /// 第一个未连接端口的序号。
    pub fn next_free_port(&self) -> Option<usize> {
        (0..self.port_count()).find(|&idx| {
            self.port(idx)
                .map(|port| !port.is_connected())
                .unwrap_or(false)
        })
    }

    /// 当前挂接的所有链路。
    pub fn connected_links(&self) -> Vec<LinkId> {
        (0..self.port_count())
            .filter_map(|idx| self.port(idx).and_then(|port| port.link()))
            .collect()
    }

    /// MAC 入口：把到达端口的帧交给变体各自的接收逻辑。
    pub fn receive(&mut self, port: usize, frame: Frame, sim: &mut Simulator, net: &mut Network) {
        match self {
            Node::Host(h) => h.receive(port, frame, sim, net),
            Node::Switch(s) => s.receive(port, frame, sim, net),
            Node::Router(r) => r.receive(port, frame, sim, net),
            Node::Cloud(c) => c.receive(port, frame, sim, net),
        }
    }
}
