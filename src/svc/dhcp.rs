//! DHCP: lease pool, server and client.
//!
//! Simplified two-message handshake (DISCOVER → OFFER). The offer is
//! applied immediately by the client; leases never expire and stay in use
//! until an explicit pool reset.

use super::{Service, ServiceId, ServiceRequest, ServiceState};
use crate::net::{NetError, NetStack, Network};
use crate::proto::{Frame, FramePayload, Ipv4Addr, Ipv4Packet, MacAddr};
use crate::sim::Simulator;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// The address configuration handed out with a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseConfig {
    pub addr: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub gw: Option<Ipv4Addr>,
    pub dns: Option<Ipv4Addr>,
}

/// A contiguous address range plus the configuration offered with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub first: Ipv4Addr,
    pub last: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub gw: Option<Ipv4Addr>,
    pub dns: Option<Ipv4Addr>,
}

/// Lease pool state: configured range plus the set of addresses in use.
#[derive(Debug, Default, Clone)]
pub struct DhcpPool {
    conf: Option<PoolConfig>,
    in_use: BTreeSet<Ipv4Addr>,
}

impl DhcpPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&mut self, conf: PoolConfig) {
        self.conf = Some(conf);
    }

    pub fn config(&self) -> Option<&PoolConfig> {
        self.conf.as_ref()
    }

    pub fn in_use(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.in_use.iter().copied()
    }

    pub fn leased_count(&self) -> usize {
        self.in_use.len()
    }

    /// Restore a lease as in-use (snapshot load).
    pub fn mark_in_use(&mut self, addr: Ipv4Addr) {
        self.in_use.insert(addr);
    }

    /// Forget every issued lease.
    pub fn reset_leases(&mut self) {
        self.in_use.clear();
    }

    /// Allocate the next free address by linear scan from `first`.
    ///
    /// The scan fails when it reaches `last`; `last` itself is never
    /// handed out.
    pub fn allocate(&mut self) -> Result<LeaseConfig, NetError> {
        let conf = self.conf.ok_or(NetError::PoolUnconfigured)?;
        let limit = u32::from_be_bytes(conf.last.octets());
        let mut next = conf.first;
        while self.in_use.contains(&next) {
            next = next.successor();
            if u32::from_be_bytes(next.octets()) >= limit {
                return Err(NetError::PoolExhausted);
            }
        }
        self.in_use.insert(next);
        Ok(LeaseConfig {
            addr: next,
            mask: conf.mask,
            gw: conf.gw,
            dns: conf.dns,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DhcpKind {
    Discover,
    Offer,
}

/// DHCP message, carried JSON-encoded in the packet payload string.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DhcpPayload {
    kind: DhcpKind,
    mac: MacAddr,
    #[serde(default)]
    lease: Option<LeaseConfig>,
}

impl DhcpPayload {
    fn encode(&self) -> String {
        serde_json::to_string(self).expect("dhcp payload serializes")
    }

    fn decode(raw: &str) -> Option<DhcpPayload> {
        serde_json::from_str(raw).ok()
    }
}

/// Client side: broadcasts a DISCOVER and applies the matching OFFER.
pub struct DhcpClient {
    state: ServiceState,
}

impl DhcpClient {
    pub fn new() -> Self {
        Self {
            state: ServiceState::Idle,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Broadcast a DISCOVER from the unspecified address.
    pub fn discover(&mut self, stack: &mut NetStack, sim: &mut Simulator, net: &mut Network) {
        info!(node = %stack.name(), "send dhcp discover");
        let payload = DhcpPayload {
            kind: DhcpKind::Discover,
            mac: stack.default_iface().mac,
            lease: None,
        };
        let pkt = Ipv4Packet::new(
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::BROADCAST,
            ServiceId::DhcpServer,
            payload.encode(),
        );
        self.state = ServiceState::Pending;
        stack.send_packet(pkt, sim, net);
    }
}

impl Default for DhcpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for DhcpClient {
    fn id(&self) -> ServiceId {
        ServiceId::DhcpClient
    }

    fn send_request(
        &mut self,
        req: ServiceRequest,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        match req {
            ServiceRequest::DhcpDiscover => self.discover(stack, sim, net),
            other => warn!(node = %stack.name(), req = ?other, "dhcp client cannot handle this request"),
        }
    }

    fn handle_packet(
        &mut self,
        pkt: Ipv4Packet,
        stack: &mut NetStack,
        _sim: &mut Simulator,
        _net: &mut Network,
    ) {
        let Some(payload) = DhcpPayload::decode(&pkt.payload) else {
            warn!(node = %stack.name(), "malformed dhcp payload, dropped");
            return;
        };
        match payload.kind {
            DhcpKind::Offer => {
                // Only accept offers addressed to one of our interfaces.
                let Some(iface) = stack.iface_by_mac(payload.mac) else {
                    debug!(node = %stack.name(), mac = %payload.mac, "offer for another mac, ignored");
                    return;
                };
                let Some(lease) = payload.lease else {
                    warn!(node = %stack.name(), "offer without lease, dropped");
                    return;
                };
                info!(node = %stack.name(), addr = %lease.addr, "received dhcp offer, applying");
                let ifc = stack.iface_mut(iface).expect("iface index from lookup");
                ifc.config.addr = lease.addr;
                ifc.config.mask = lease.mask;
                ifc.config.gw = lease.gw;
                ifc.config.dns = lease.dns;
                self.state = ServiceState::Idle;
            }
            DhcpKind::Discover => {
                debug!(node = %stack.name(), "client ignores discover");
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Server side: answers DISCOVERs with an OFFER from its pool.
///
/// The offer frame goes straight to the discovering MAC, no ARP involved:
/// the client has no routable address yet.
pub struct DhcpServer {
    pool: DhcpPool,
}

impl DhcpServer {
    pub fn new() -> Self {
        Self {
            pool: DhcpPool::new(),
        }
    }

    pub fn with_pool(conf: PoolConfig) -> Self {
        let mut pool = DhcpPool::new();
        pool.configure(conf);
        Self { pool }
    }

    pub fn pool(&self) -> &DhcpPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut DhcpPool {
        &mut self.pool
    }

    fn send_offer(
        &mut self,
        to_mac: MacAddr,
        lease: LeaseConfig,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        info!(node = %stack.name(), to = %to_mac, addr = %lease.addr, "send dhcp offer");
        let payload = DhcpPayload {
            kind: DhcpKind::Offer,
            mac: to_mac,
            lease: Some(lease),
        };
        let iface = stack.default_iface();
        let pkt = Ipv4Packet::new(
            iface.config.addr,
            Ipv4Addr::BROADCAST,
            ServiceId::DhcpClient,
            payload.encode(),
        );
        let frame = Frame {
            src: iface.mac,
            dst: to_mac,
            payload: FramePayload::Ipv4(pkt),
        };
        stack.transmit_frame(frame, sim, net);
    }
}

impl Default for DhcpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for DhcpServer {
    fn id(&self) -> ServiceId {
        ServiceId::DhcpServer
    }

    fn send_request(
        &mut self,
        req: ServiceRequest,
        stack: &mut NetStack,
        _sim: &mut Simulator,
        _net: &mut Network,
    ) {
        // The server only ever reacts to discovers.
        warn!(node = %stack.name(), req = ?req, "dhcp server cannot handle this request");
    }

    fn handle_packet(
        &mut self,
        pkt: Ipv4Packet,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let Some(payload) = DhcpPayload::decode(&pkt.payload) else {
            warn!(node = %stack.name(), "malformed dhcp payload, dropped");
            return;
        };
        match payload.kind {
            DhcpKind::Discover => {
                info!(node = %stack.name(), from = %payload.mac, "received dhcp discover");
                match self.pool.allocate() {
                    Ok(lease) => self.send_offer(payload.mac, lease, stack, sim, net),
                    Err(err) => warn!(node = %stack.name(), %err, "cannot offer a lease"),
                }
            }
            DhcpKind::Offer => {
                debug!(node = %stack.name(), "server ignores offer");
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
