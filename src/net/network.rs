//! 网络拓扑注册表
//!
//! 注册表独占持有所有节点与链路，负责 ID 分配、拓扑变更、帧的链路
//! 传输与交付，以及面向终端协作方的命令入口。

use std::collections::BTreeMap;

use super::cloud::Cloud;
use super::error::NetError;
use super::host::Host;
use super::id::{LinkId, NodeId, PortRef};
use super::iface::IfaceReport;
use super::link::Link;
use super::node::{Node, NodeKind};
use super::router::Router;
use super::stats::Stats;
use super::switch::Switch;
use crate::proto::{Frame, Ipv4Addr, MacAddr};
use crate::sim::Simulator;
use crate::svc::{PingOutcome, ReceivedMessage, ServiceId, ServiceRequest};
use tracing::{debug, info};

/// `add_link` 的端点：给节点则自动取下一个空闲端口，给端口则原样使用。
#[derive(Debug, Clone, Copy)]
pub enum LinkEndpoint {
    Node(NodeId),
    Port(PortRef),
}

impl From<NodeId> for LinkEndpoint {
    fn from(id: NodeId) -> Self {
        LinkEndpoint::Node(id)
    }
}

impl From<PortRef> for LinkEndpoint {
    fn from(port: PortRef) -> Self {
        LinkEndpoint::Port(port)
    }
}

/// 网络拓扑注册表
pub struct Network {
    nodes: BTreeMap<NodeId, Node>,
    links: BTreeMap<LinkId, Link>,
    last_used_id: u64,
    next_mac: u32,
    pub stats: Stats,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            last_used_id: 0,
            next_mac: 1,
            stats: Stats::default(),
        }
    }
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// 节点与链路共用的单调 ID 计数器。
    fn alloc_id(&mut self) -> u64 {
        self.last_used_id += 1;
        self.last_used_id
    }

    pub fn last_used_id(&self) -> u64 {
        self.last_used_id
    }

    /// 快照加载时恢复持久化的计数器值。
    pub(crate) fn set_last_used_id(&mut self, id: u64) {
        self.last_used_id = id;
    }

    /// 分配一个本地管理的唯一 MAC 地址。
    pub(crate) fn alloc_mac(&mut self) -> MacAddr {
        let n = self.next_mac;
        self.next_mac = self.next_mac.wrapping_add(1);
        let b = n.to_be_bytes();
        MacAddr([0x02, 0x00, b[0], b[1], b[2], b[3]])
    }

    /// 快照加载后重新校准 MAC 计数器，越过已占用的编号。
    pub(crate) fn reseed_macs(&mut self) {
        let mut max = 0u32;
        for node in self.nodes.values() {
            if let Some(stack) = node.stack() {
                for iface in stack.ifaces() {
                    let o = iface.mac.0;
                    if o[0] == 0x02 && o[1] == 0x00 {
                        max = max.max(u32::from_be_bytes([o[2], o[3], o[4], o[5]]));
                    }
                }
            }
        }
        self.next_mac = max.saturating_add(1);
    }

    /* ---------- 拓扑变更 ---------- */

    pub fn add_host(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.alloc_id());
        let mac = self.alloc_mac();
        self.nodes.insert(id, Node::Host(Host::new(id, name, mac)));
        info!(node = ?id, "添加主机");
        id
    }

    pub fn add_switch(&mut self, ports: usize) -> NodeId {
        let id = NodeId(self.alloc_id());
        self.nodes.insert(id, Node::Switch(Switch::new(id, ports)));
        info!(node = ?id, ports, "添加交换机");
        id
    }

    pub fn add_router(&mut self) -> NodeId {
        let id = NodeId(self.alloc_id());
        let lan_mac = self.alloc_mac();
        let wan_mac = self.alloc_mac();
        self.nodes
            .insert(id, Node::Router(Router::new(id, lan_mac, wan_mac)));
        info!(node = ?id, "添加路由器");
        id
    }

    /// 幂等地创建共享云节点；已存在时直接返回既有实例的 ID。
    pub fn add_cloud(&mut self) -> NodeId {
        if !self.nodes.contains_key(&NodeId::CLOUD) {
            self.nodes
                .insert(NodeId::CLOUD, Node::Cloud(Cloud::new(NodeId::CLOUD)));
            info!("添加云节点");
        }
        NodeId::CLOUD
    }

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id(), node);
    }

    /// 在两个端点之间建立链路。端点缺失或已占用时报错，拓扑不变。
    pub fn add_link(
        &mut self,
        a: impl Into<LinkEndpoint>,
        b: impl Into<LinkEndpoint>,
    ) -> Result<LinkId, NetError> {
        let a = self.resolve_endpoint(a.into())?;
        let b = self.resolve_endpoint(b.into())?;
        if a.node == b.node {
            return Err(NetError::LinkUnavailable("both endpoints on the same node"));
        }

        let id = LinkId(self.alloc_id());
        self.nodes
            .get_mut(&a.node)
            .expect("endpoint resolved")
            .port_mut(a.port)
            .expect("endpoint resolved")
            .attach(id);
        self.nodes
            .get_mut(&b.node)
            .expect("endpoint resolved")
            .port_mut(b.port)
            .expect("endpoint resolved")
            .attach(id);
        self.links.insert(id, Link::new(id, a, b));
        info!(link = ?id, a = ?a, b = ?b, "建立链路");
        Ok(id)
    }

    fn resolve_endpoint(&self, ep: LinkEndpoint) -> Result<PortRef, NetError> {
        match ep {
            LinkEndpoint::Node(id) => {
                let node = self
                    .nodes
                    .get(&id)
                    .ok_or(NetError::LinkUnavailable("unknown node"))?;
                let port = node
                    .next_free_port()
                    .ok_or(NetError::LinkUnavailable("no free port on node"))?;
                Ok(PortRef { node: id, port })
            }
            LinkEndpoint::Port(port_ref) => {
                let node = self
                    .nodes
                    .get(&port_ref.node)
                    .ok_or(NetError::LinkUnavailable("unknown node"))?;
                let port = node
                    .port(port_ref.port)
                    .ok_or(NetError::LinkUnavailable("unknown port"))?;
                if port.is_connected() {
                    return Err(NetError::LinkUnavailable("port already connected"));
                }
                Ok(port_ref)
            }
        }
    }

    /// 拆除链路并释放两端端口；重复拆除是 no-op。
    pub fn remove_link(&mut self, id: LinkId) {
        let Some(link) = self.links.remove(&id) else {
            return;
        };
        let (a, b) = link.endpoints();
        for end in [a, b] {
            if let Some(port) = self
                .nodes
                .get_mut(&end.node)
                .and_then(|node| node.port_mut(end.port))
            {
                if port.link() == Some(id) {
                    port.detach();
                }
            }
        }
        info!(link = ?id, "移除链路");
    }

    /// 移除节点：先拆掉所有触及它的链路，再从注册表摘除。
    pub fn remove_node(&mut self, id: NodeId) {
        let touching: Vec<LinkId> = self
            .links
            .values()
            .filter(|link| link.touches(id))
            .map(|link| link.id)
            .collect();
        for link in touching {
            self.remove_link(link);
        }
        if self.nodes.remove(&id).is_some() {
            info!(node = ?id, "移除节点");
        }
    }

    /// 清空拓扑，计数器归零。
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.last_used_id = 0;
        self.next_mac = 1;
    }

    /* ---------- 查询 ---------- */

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.kind() == kind)
            .map(|node| node.id())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn host(&self, id: NodeId) -> Result<&Host, NetError> {
        self.nodes
            .get(&id)
            .ok_or(NetError::UnknownNode(id))?
            .as_host()
            .ok_or(NetError::NotAHost(id))
    }

    pub fn host_mut(&mut self, id: NodeId) -> Result<&mut Host, NetError> {
        self.nodes
            .get_mut(&id)
            .ok_or(NetError::UnknownNode(id))?
            .as_host_mut()
            .ok_or(NetError::NotAHost(id))
    }

    pub fn router(&self, id: NodeId) -> Option<&Router> {
        self.nodes.get(&id).and_then(Node::as_router)
    }

    pub fn router_mut(&mut self, id: NodeId) -> Option<&mut Router> {
        self.nodes.get_mut(&id).and_then(Node::as_router_mut)
    }

    /* ---------- 帧传输 ---------- */

    /// 临时取出节点执行 `f`，避免节点与注册表的重叠可变借用。
    pub(crate) fn with_node<R>(
        &mut self,
        id: NodeId,
        sim: &mut Simulator,
        f: impl FnOnce(&mut Node, &mut Simulator, &mut Network) -> R,
    ) -> Option<R> {
        let mut node = self.nodes.remove(&id)?;
        let result = f(&mut node, sim, self);
        self.nodes.insert(id, node);
        Some(result)
    }

    /// 严格发送：端口缺失或未连接时向调用方报错（物理层使用错误）。
    pub fn transmit(
        &mut self,
        origin: PortRef,
        frame: Frame,
        sim: &mut Simulator,
    ) -> Result<(), NetError> {
        let node = self
            .nodes
            .get(&origin.node)
            .ok_or(NetError::UnknownNode(origin.node))?;
        let link = node
            .port(origin.port)
            .ok_or(NetError::PortDisconnected)?
            .link()
            .ok_or(NetError::PortDisconnected)?;
        self.link_transfer(link, origin, frame, sim);
        Ok(())
    }

    /// 把帧交给链路传输（一个 tick 后在远端交付）。
    pub(crate) fn link_transfer(
        &mut self,
        link: LinkId,
        origin: PortRef,
        frame: Frame,
        sim: &mut Simulator,
    ) {
        match self.links.get_mut(&link) {
            Some(l) => l.transfer(origin, frame, sim),
            None => {
                debug!(link = ?link, "链路已不存在，帧丢失");
                self.stats.frames_dropped += 1;
            }
        }
    }

    /// 交付事件回调：清除链路活跃标记并把帧送入目的节点。
    pub(crate) fn deliver(
        &mut self,
        link: LinkId,
        to: PortRef,
        frame: Frame,
        sim: &mut Simulator,
    ) {
        match self.links.get_mut(&link) {
            Some(l) => l.active = false,
            None => {
                // 链路在传输途中被拆除，帧随介质一起消失。
                debug!(link = ?link, "链路已拆除，在途帧丢失");
                self.stats.frames_dropped += 1;
                return;
            }
        }
        self.stats.frames_delivered += 1;
        self.receive_frame(to, frame, sim);
    }

    pub(crate) fn receive_frame(&mut self, to: PortRef, frame: Frame, sim: &mut Simulator) {
        let handled = self
            .with_node(to.node, sim, |node, sim, net| {
                node.receive(to.port, frame, sim, net)
            })
            .is_some();
        if !handled {
            debug!(node = ?to.node, "目的节点已不存在，帧丢失");
            self.stats.frames_dropped += 1;
        }
    }

    /* ---------- 命令入口（终端协作方） ---------- */

    /// 向节点上的服务发起一次客户端操作。
    pub fn service_request(
        &mut self,
        node: NodeId,
        req: ServiceRequest,
        sim: &mut Simulator,
    ) -> Result<(), NetError> {
        let service = match &req {
            ServiceRequest::Ping(_) => ServiceId::Icmp,
            ServiceRequest::DhcpDiscover => ServiceId::DhcpClient,
            ServiceRequest::Message { .. } => ServiceId::Message,
        };
        self.with_node(node, sim, move |n, sim, net| {
            let Some(stack) = n.stack_mut() else {
                return Err(NetError::NotAddressable(node));
            };
            stack
                .with_service(
                    service,
                    move |svc, stack, sim, net| svc.send_request(req, stack, sim, net),
                    sim,
                    net,
                )
                .ok_or(NetError::ServiceMissing {
                    node,
                    service: service.to_string(),
                })?;
            Ok(())
        })
        .ok_or(NetError::UnknownNode(node))?
    }

    pub fn ping(
        &mut self,
        host: NodeId,
        dst: Ipv4Addr,
        sim: &mut Simulator,
    ) -> Result<(), NetError> {
        self.service_request(host, ServiceRequest::Ping(dst), sim)
    }

    pub fn ping_outcome(&mut self, host: NodeId) -> Result<Option<PingOutcome>, NetError> {
        Ok(self.host_mut(host)?.ping_outcome())
    }

    pub fn ipconfig(&self, node: NodeId) -> Result<Vec<IfaceReport>, NetError> {
        let n = self.nodes.get(&node).ok_or(NetError::UnknownNode(node))?;
        let stack = n.stack().ok_or(NetError::NotAddressable(node))?;
        Ok(stack.ipconfig())
    }

    pub fn request_lease(&mut self, host: NodeId, sim: &mut Simulator) -> Result<(), NetError> {
        self.service_request(host, ServiceRequest::DhcpDiscover, sim)
    }

    pub fn send_message(
        &mut self,
        host: NodeId,
        dst: Ipv4Addr,
        text: impl Into<String>,
        sim: &mut Simulator,
    ) -> Result<(), NetError> {
        self.service_request(
            host,
            ServiceRequest::Message {
                dst,
                text: text.into(),
            },
            sim,
        )
    }

    pub fn inbox(&mut self, host: NodeId) -> Result<Vec<ReceivedMessage>, NetError> {
        Ok(self.host_mut(host)?.inbox())
    }
}
