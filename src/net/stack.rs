//! Shared state of addressable nodes (hosts, routers): interfaces, the ARP
//! resolver and the per-node service table. Composed into the node
//! variants instead of inherited.

use super::iface::{Interface, IfaceReport};
use super::id::{NodeId, PortRef};
use super::network::Network;
use crate::proto::{ArpResolver, Frame, FramePayload, Ipv4Addr, MacAddr};
use crate::sim::Simulator;
use crate::svc::{Service, ServiceId};
use std::collections::HashMap;
use tracing::{debug, warn};

pub struct NetStack {
    id: NodeId,
    name: String,
    pub(crate) ifaces: Vec<Interface>,
    pub(crate) arp: ArpResolver,
    services: HashMap<ServiceId, Box<dyn Service>>,
}

impl NetStack {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ifaces: Vec::new(),
            arp: ArpResolver::new(),
            services: HashMap::new(),
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

    pub fn arp(&self) -> &ArpResolver {
        &self.arp
    }

    /* ---------- interfaces ---------- */

    pub fn add_iface(&mut self, name: impl Into<String>, mac: MacAddr) -> usize {
        self.ifaces.push(Interface::new(name, mac));
        self.ifaces.len() - 1
    }

    pub fn ifaces(&self) -> &[Interface] {
        &self.ifaces
    }

    pub fn iface(&self, idx: usize) -> Option<&Interface> {
        self.ifaces.get(idx)
    }

    pub fn iface_mut(&mut self, idx: usize) -> Option<&mut Interface> {
        self.ifaces.get_mut(idx)
    }

    /// The default interface is the first one.
    pub fn default_iface(&self) -> &Interface {
        &self.ifaces[0]
    }

    pub fn iface_by_name(&self, name: &str) -> Option<usize> {
        self.ifaces.iter().position(|i| i.name == name)
    }

    /// MACs are unique; with duplicates only the first match is returned.
    pub fn iface_by_mac(&self, mac: MacAddr) -> Option<usize> {
        self.ifaces.iter().position(|i| i.mac == mac)
    }

    /// With duplicate addresses only the first match is returned.
    pub fn iface_by_ip(&self, ip: Ipv4Addr) -> Option<usize> {
        self.ifaces.iter().position(|i| i.config.addr == ip)
    }

    /// Replace the interface list wholesale (snapshot load).
    pub(crate) fn restore_ifaces(&mut self, ifaces: Vec<Interface>) {
        self.ifaces = ifaces;
    }

    pub fn ipconfig(&self) -> Vec<IfaceReport> {
        self.ifaces.iter().map(Interface::report).collect()
    }

    /* ---------- services ---------- */

    /// Re-registering an existing id overwrites the instance with a warning.
    pub fn register_service(&mut self, service: Box<dyn Service>) {
        let id = service.id();
        if self.services.insert(id, service).is_some() {
            warn!(node = %self.name, service = %id, "overwriting already registered service");
        }
    }

    pub fn has_service(&self, id: ServiceId) -> bool {
        self.services.contains_key(&id)
    }

    pub fn service(&self, id: ServiceId) -> Option<&dyn Service> {
        self.services.get(&id).map(|b| b.as_ref())
    }

    /// Typed read access to a concrete service implementation.
    pub fn service_as<T: 'static>(&self, id: ServiceId) -> Option<&T> {
        self.services.get(&id)?.as_any().downcast_ref::<T>()
    }

    pub fn service_mut(&mut self, id: ServiceId) -> Option<&mut (dyn Service + 'static)> {
        self.services.get_mut(&id).map(move |b| b.as_mut())
    }

    /// Typed access to a concrete service implementation.
    pub fn service_as_mut<T: 'static>(&mut self, id: ServiceId) -> Option<&mut T> {
        self.services.get_mut(&id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Run `f` with the service taken out of the table, so it can borrow
    /// the rest of the stack mutably.
    pub fn with_service<R>(
        &mut self,
        id: ServiceId,
        f: impl FnOnce(&mut dyn Service, &mut NetStack, &mut Simulator, &mut Network) -> R,
        sim: &mut Simulator,
        net: &mut Network,
    ) -> Option<R> {
        let mut svc = self.services.remove(&id)?;
        let r = f(svc.as_mut(), self, sim, net);
        self.services.insert(id, svc);
        Some(r)
    }

    /* ---------- layer 2 ---------- */

    /// Hardware filter: a frame is only accepted when it targets one of
    /// this node's MACs or the broadcast address.
    pub fn accepts(&self, dst: MacAddr) -> bool {
        dst.is_broadcast() || self.ifaces.iter().any(|i| i.mac == dst)
    }

    /// MAC-layer receive entry: filter, then demultiplex by frame type.
    pub fn receive_frame(
        &mut self,
        _port: usize,
        frame: Frame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        if !self.accepts(frame.dst) {
            debug!(node = %self.name, dst = %frame.dst, "frame not for us, dropped");
            net.stats.frames_dropped += 1;
            return;
        }
        match frame.payload {
            FramePayload::Arp(pkt) => self.handle_arp(pkt, sim, net),
            FramePayload::Ipv4(pkt) => self.receive_packet(pkt, sim, net),
        }
    }

    /// Push a frame out the interface owning its source MAC.
    pub fn transmit_frame(&mut self, frame: Frame, sim: &mut Simulator, net: &mut Network) {
        match self.iface_by_mac(frame.src) {
            Some(iface) => self.transmit_on(iface, frame, sim, net),
            None => {
                warn!(node = %self.name, src = %frame.src, "no interface owns this mac, frame dropped");
                net.stats.frames_dropped += 1;
            }
        }
    }

    /// Push a frame out a specific interface's port. A disconnected port
    /// drops the frame with a log; `Network::transmit` is the strict
    /// variant for direct callers.
    pub fn transmit_on(
        &mut self,
        iface: usize,
        frame: Frame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let origin = PortRef {
            node: self.id,
            port: iface,
        };
        match self.ifaces.get(iface).and_then(|i| i.port.link()) {
            Some(link) => net.link_transfer(link, origin, frame, sim),
            None => {
                warn!(node = %self.name, iface, "transmit on disconnected port, frame dropped");
                net.stats.frames_dropped += 1;
            }
        }
    }
}
