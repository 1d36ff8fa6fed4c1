//! MAC-learning switch: unaddressed ports plus a forwarding table built by
//! observing traffic.

use super::id::{NodeId, PortRef};
use super::network::Network;
use super::port::Port;
use super::style::NodeStyle;
use crate::proto::{Frame, MacAddr};
use crate::sim::Simulator;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};

/// Per-port learned MAC sets. Learning moves a MAC to its last-seen port;
/// within a port the entries behave as a set.
#[derive(Debug, Default)]
pub struct MacTable {
    by_port: HashMap<usize, BTreeSet<MacAddr>>,
}

impl MacTable {
    pub fn learn(&mut self, port: usize, mac: MacAddr) {
        for (p, macs) in self.by_port.iter_mut() {
            if *p != port {
                macs.remove(&mac);
            }
        }
        self.by_port.entry(port).or_default().insert(mac);
    }

    pub fn lookup(&self, mac: MacAddr) -> Option<usize> {
        self.by_port
            .iter()
            .find(|(_, macs)| macs.contains(&mac))
            .map(|(port, _)| *port)
    }

    pub fn macs_on(&self, port: usize) -> Vec<MacAddr> {
        self.by_port
            .get(&port)
            .map(|macs| macs.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.by_port.clear();
    }
}

/// 交换机节点：N 个无地址端口 + MAC 学习表，无 IP 层。
pub struct Switch {
    id: NodeId,
    name: String,
    pub(crate) ports: Vec<Port>,
    table: MacTable,
    pub style: NodeStyle,
}

impl Switch {
    pub fn new(id: NodeId, port_count: usize) -> Self {
        Self {
            id,
            name: format!("Switch-{port_count}"),
            ports: (0..port_count).map(|_| Port::new()).collect(),
            table: MacTable::default(),
            style: NodeStyle::switch(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn table(&self) -> &MacTable {
        &self.table
    }

    /// Frame receipt at `ingress`: learn the source, then forward out the
    /// learned port or flood on a miss.
    pub fn receive(
        &mut self,
        ingress: usize,
        frame: Frame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        trace!(switch = %self.name, ingress, frame = %frame, "switch received frame");
        if !frame.src.is_broadcast() {
            self.table.learn(ingress, frame.src);
        }

        match self.table.lookup(frame.dst) {
            Some(egress) if egress == ingress => {
                // Destination learned behind the ingress port: forwarding
                // back out the same port would loop, drop instead.
                debug!(switch = %self.name, port = egress, "destination on ingress port, dropped");
            }
            Some(egress) => self.tx(egress, frame, sim, net),
            None => {
                debug!(switch = %self.name, dst = %frame.dst, "unknown destination, flooding");
                let targets: Vec<usize> = self
                    .ports
                    .iter()
                    .enumerate()
                    .filter(|(idx, port)| *idx != ingress && port.is_connected())
                    .map(|(idx, _)| idx)
                    .collect();
                for idx in targets {
                    self.tx(idx, frame.clone(), sim, net);
                }
            }
        }
    }

    fn tx(&mut self, port: usize, frame: Frame, sim: &mut Simulator, net: &mut Network) {
        let origin = PortRef {
            node: self.id,
            port,
        };
        if let Some(link) = self.ports[port].link() {
            net.link_transfer(link, origin, frame, sim);
        }
    }
}
