//! Topology snapshot: the persisted form consumed and produced by the
//! storage collaborator.
//!
//! Links are stored as owning-node pairs and re-resolved through each
//! node's next free port on load, so port objects never appear in the
//! persisted form.

use serde::{Deserialize, Serialize};

use super::cloud::Cloud;
use super::error::NetError;
use super::host::Host;
use super::iface::Interface;
use super::id::NodeId;
use super::network::Network;
use super::node::Node;
use super::router::Router;
use super::style::NodeStyle;
use super::switch::Switch;
use crate::proto::{Ipv4Addr, MacAddr};
use crate::svc::{DhcpPool, DhcpServer, PoolConfig, ServiceId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub last_used_id: u64,
    pub nodes: Vec<NodeSnapshot>,
    pub links: Vec<LinkSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeSnapshot {
    Host {
        id: NodeId,
        name: String,
        ifaces: Vec<IfaceSnapshot>,
        style: NodeStyle,
    },
    Switch {
        id: NodeId,
        name: String,
        ports: usize,
        style: NodeStyle,
    },
    Router {
        id: NodeId,
        name: String,
        ifaces: Vec<IfaceSnapshot>,
        dhcp: PoolSnapshot,
        style: NodeStyle,
    },
    Cloud {
        id: NodeId,
        name: String,
        dhcp: PoolSnapshot,
        style: NodeStyle,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfaceSnapshot {
    pub name: String,
    pub mac: MacAddr,
    pub addr: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub gw: Option<Ipv4Addr>,
    pub dns: Option<Ipv4Addr>,
}

impl IfaceSnapshot {
    fn capture(iface: &Interface) -> Self {
        Self {
            name: iface.name.clone(),
            mac: iface.mac,
            addr: iface.config.addr,
            mask: iface.config.mask,
            gw: iface.config.gw,
            dns: iface.config.dns,
        }
    }

    fn restore(&self) -> Interface {
        let mut iface = Interface::new(self.name.clone(), self.mac);
        iface.config.addr = self.addr;
        iface.config.mask = self.mask;
        iface.config.gw = self.gw;
        iface.config.dns = self.dns;
        iface
    }
}

/// Pool configuration plus the leases currently in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub conf: Option<PoolConfig>,
    pub in_use: Vec<Ipv4Addr>,
}

impl PoolSnapshot {
    fn capture(pool: &DhcpPool) -> Self {
        Self {
            conf: pool.config().copied(),
            in_use: pool.in_use().collect(),
        }
    }

    fn restore(&self, pool: &mut DhcpPool) {
        if let Some(conf) = self.conf {
            pool.configure(conf);
        }
        for addr in &self.in_use {
            pool.mark_in_use(*addr);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    pub a: NodeId,
    pub b: NodeId,
}

impl Network {
    /// Capture the full topology in serializable form.
    pub fn save(&self) -> TopologySnapshot {
        let nodes = self.nodes().map(snapshot_node).collect();
        let links = self
            .links()
            .map(|link| {
                let (a, b) = link.endpoints();
                LinkSnapshot {
                    a: a.node,
                    b: b.node,
                }
            })
            .collect();
        TopologySnapshot {
            last_used_id: self.last_used_id(),
            nodes,
            links,
        }
    }

    /// Rebuild the topology from a snapshot, replacing the current one.
    pub fn load(&mut self, snapshot: &TopologySnapshot) -> Result<(), NetError> {
        self.reset();

        for node in &snapshot.nodes {
            self.insert_node(restore_node(node));
        }
        for link in &snapshot.links {
            self.add_link(link.a, link.b)?;
        }
        // Re-linking consumed fresh ids; the persisted counter wins.
        self.set_last_used_id(snapshot.last_used_id);
        self.reseed_macs();
        Ok(())
    }
}

fn snapshot_node(node: &Node) -> NodeSnapshot {
    match node {
        Node::Host(host) => NodeSnapshot::Host {
            id: host.stack().id(),
            name: host.stack().name().to_string(),
            ifaces: host.stack().ifaces().iter().map(IfaceSnapshot::capture).collect(),
            style: host.style.clone(),
        },
        Node::Switch(sw) => NodeSnapshot::Switch {
            id: sw.id(),
            name: sw.name().to_string(),
            ports: sw.port_count(),
            style: sw.style.clone(),
        },
        Node::Router(router) => {
            let pool = router
                .stack()
                .service_as::<DhcpServer>(ServiceId::DhcpServer)
                .map(|server| PoolSnapshot::capture(server.pool()))
                .unwrap_or(PoolSnapshot {
                    conf: None,
                    in_use: Vec::new(),
                });
            NodeSnapshot::Router {
                id: router.stack().id(),
                name: router.stack().name().to_string(),
                ifaces: router
                    .stack()
                    .ifaces()
                    .iter()
                    .map(IfaceSnapshot::capture)
                    .collect(),
                dhcp: pool,
                style: router.style.clone(),
            }
        }
        Node::Cloud(cloud) => NodeSnapshot::Cloud {
            id: cloud.id(),
            name: cloud.sw.name().to_string(),
            dhcp: PoolSnapshot::capture(cloud.pool()),
            style: cloud.sw.style.clone(),
        },
    }
}

fn restore_node(snapshot: &NodeSnapshot) -> Node {
    match snapshot {
        NodeSnapshot::Host {
            id,
            name,
            ifaces,
            style,
        } => {
            let first_mac = ifaces.first().map(|i| i.mac).unwrap_or(MacAddr::ZERO);
            let mut host = Host::new(*id, name.clone(), first_mac);
            host.stack_mut()
                .restore_ifaces(ifaces.iter().map(IfaceSnapshot::restore).collect());
            host.style = style.clone();
            Node::Host(host)
        }
        NodeSnapshot::Switch {
            id,
            name,
            ports,
            style,
        } => {
            let mut sw = Switch::new(*id, *ports);
            sw.set_name(name.clone());
            sw.style = style.clone();
            Node::Switch(sw)
        }
        NodeSnapshot::Router {
            id,
            name,
            ifaces,
            dhcp,
            style,
        } => {
            let lan_mac = ifaces.first().map(|i| i.mac).unwrap_or(MacAddr::ZERO);
            let wan_mac = ifaces.get(1).map(|i| i.mac).unwrap_or(MacAddr::ZERO);
            let mut router = Router::new(*id, lan_mac, wan_mac);
            router.stack_mut().set_name(name.clone());
            router
                .stack_mut()
                .restore_ifaces(ifaces.iter().map(IfaceSnapshot::restore).collect());
            if let Some(server) = router
                .stack_mut()
                .service_as_mut::<DhcpServer>(ServiceId::DhcpServer)
            {
                dhcp.restore(server.pool_mut());
            }
            router.style = style.clone();
            Node::Router(router)
        }
        NodeSnapshot::Cloud {
            id,
            name,
            dhcp,
            style,
        } => {
            let mut cloud = Cloud::new(*id);
            cloud.sw.set_name(name.clone());
            cloud.sw.style = style.clone();
            // The persisted pool replaces the built-in default range.
            let mut pool = DhcpPool::new();
            dhcp.restore(&mut pool);
            *cloud.pool_mut() = pool;
            Node::Cloud(cloud)
        }
    }
}
