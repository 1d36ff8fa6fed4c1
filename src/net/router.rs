//! Router node: named LAN/WAN interfaces, NAT translation between them,
//! and a DHCP server commonly bound to the LAN side.

use super::id::NodeId;
use super::network::Network;
use super::stack::NetStack;
use super::style::NodeStyle;
use crate::proto::{Frame, FramePayload, Ipv4Packet, MacAddr, NatTable};
use crate::sim::Simulator;
use crate::svc::{DhcpServer, IcmpService, PoolConfig, Service, ServiceId};
use tracing::debug;

/// Interface index of the LAN side (also the default interface).
pub const LAN: usize = 0;
/// Interface index of the WAN side.
pub const WAN: usize = 1;

pub struct Router {
    pub(crate) stack: NetStack,
    nat: NatTable,
    pub style: NodeStyle,
}

impl Router {
    /// A fresh router: `LAN` preconfigured as 192.168.30.1, `WAN` left at
    /// defaults, NAT table empty, ICMP responder and an unconfigured DHCP
    /// server registered.
    pub fn new(id: NodeId, lan_mac: MacAddr, wan_mac: MacAddr) -> Self {
        let mut stack = NetStack::new(id, "Router");
        let lan = stack.add_iface("LAN", lan_mac);
        stack
            .iface_mut(lan)
            .expect("lan iface just added")
            .set_addr("192.168.30.1")
            .expect("default lan address is valid");
        stack.add_iface("WAN", wan_mac);
        stack.register_service(Box::new(IcmpService::new()));
        stack.register_service(Box::new(DhcpServer::new()));
        Self {
            stack,
            nat: NatTable::new(),
            style: NodeStyle::router(),
        }
    }

    pub fn stack(&self) -> &NetStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut NetStack {
        &mut self.stack
    }

    pub fn nat(&self) -> &NatTable {
        &self.nat
    }

    /// Configure the DHCP server pool served on the LAN side.
    pub fn configure_dhcp(&mut self, conf: PoolConfig) {
        if let Some(server) = self.stack.service_as_mut::<DhcpServer>(ServiceId::DhcpServer) {
            server.pool_mut().configure(conf);
        }
    }

    pub fn register_service(&mut self, service: Box<dyn Service>) {
        self.stack.register_service(service);
    }

    pub(crate) fn receive(
        &mut self,
        port: usize,
        frame: Frame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        if !self.stack.accepts(frame.dst) {
            debug!(router = %self.stack.name(), dst = %frame.dst, "frame not for us, dropped");
            net.stats.frames_dropped += 1;
            return;
        }
        match frame.payload {
            FramePayload::Arp(pkt) => self.stack.handle_arp(pkt, sim, net),
            FramePayload::Ipv4(pkt) => self.route_packet(port, pkt, sim, net),
        }
    }

    /// The router's IPv4 decision: local delivery, NAT out over WAN, or
    /// reverse NAT back onto the LAN.
    fn route_packet(
        &mut self,
        ingress: usize,
        pkt: Ipv4Packet,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let lan_ip = self.stack.ifaces[LAN].config.addr;
        let wan_ip = self.stack.ifaces[WAN].config.addr;

        if ingress == LAN {
            if pkt.dst == lan_ip || pkt.dst.is_broadcast() {
                self.stack.receive_packet(pkt, sim, net);
            } else {
                let translated = self.nat.translate_outgoing(pkt, wan_ip);
                self.stack.send_packet_via(WAN, translated, sim, net);
            }
        } else if pkt.dst == wan_ip {
            // A reply to a translated flow goes back inside; anything the
            // NAT table does not know is for the router itself.
            if self.nat.has_mapping(pkt.src) {
                if let Some(translated) = self.nat.translate_incoming(pkt, lan_ip) {
                    self.stack.send_packet_via(LAN, translated, sim, net);
                }
            } else {
                self.stack.receive_packet(pkt, sim, net);
            }
        } else if pkt.dst.is_broadcast() {
            self.stack.receive_packet(pkt, sim, net);
        } else {
            debug!(router = %self.stack.name(), dst = %pkt.dst, "wan packet not for us, dropped");
            net.stats.packets_dropped += 1;
        }
    }
}
