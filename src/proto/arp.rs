//! ARP: per-node IP→MAC cache and request/response state machine.
//!
//! Resolution is event-driven. A cache miss parks the packet on a wait
//! queue, broadcasts one request and arms a timeout timer; the matching
//! response (or the timeout) resumes the parked packets. A node never has
//! more than one request outstanding, later misses only park.

use super::ethernet::{Frame, FramePayload, MacAddr};
use super::ipv4::{Ipv4Addr, Ipv4Packet};
use crate::net::{NetStack, NetWorld, Network};
use crate::sim::{Simulator, TimerId};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, warn};

/// Ticks an unanswered ARP request stays pending before it gives up.
pub const ARP_TIMEOUT_TICKS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOp {
    Request,
    Response,
}

/// ARP message carried as a frame payload.
#[derive(Debug, Clone)]
pub struct ArpPacket {
    pub op: ArpOp,
    pub sender_ip: Ipv4Addr,
    pub target_ip: Ipv4Addr,
    pub sender_mac: MacAddr,
    pub target_mac: MacAddr,
}

struct Pending {
    target: Ipv4Addr,
    timer: TimerId,
}

struct Parked {
    iface: usize,
    next_hop: Ipv4Addr,
    pkt: Ipv4Packet,
}

/// Per-node resolver state.
pub struct ArpResolver {
    cache: HashMap<Ipv4Addr, MacAddr>,
    pending: Option<Pending>,
    waiting: VecDeque<Parked>,
    on_resolve: Option<Box<dyn FnMut(Ipv4Addr, MacAddr) + Send>>,
    requests_sent: u64,
}

impl ArpResolver {
    pub fn new() -> Self {
        let mut cache = HashMap::new();
        // Permanent entry: limited broadcast resolves to the broadcast MAC.
        cache.insert(Ipv4Addr::BROADCAST, MacAddr::BROADCAST);
        Self {
            cache,
            pending: None,
            waiting: VecDeque::new(),
            on_resolve: None,
            requests_sent: 0,
        }
    }

    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.cache.get(&ip).copied()
    }

    pub fn knows(&self, ip: Ipv4Addr) -> bool {
        self.cache.contains_key(&ip)
    }

    pub fn insert(&mut self, ip: Ipv4Addr, mac: MacAddr) {
        self.cache.insert(ip, mac);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Total requests this node has broadcast (test observability).
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    /// Register a callback invoked whenever a response fills the cache.
    pub fn set_on_resolve(&mut self, cb: Box<dyn FnMut(Ipv4Addr, MacAddr) + Send>) {
        self.on_resolve = Some(cb);
    }

    /// Drop all learned entries and re-seed the broadcast mapping.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.cache.insert(Ipv4Addr::BROADCAST, MacAddr::BROADCAST);
    }
}

impl Default for ArpResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NetStack {
    /// Park `pkt` until `next_hop` resolves, issuing a request if none is
    /// outstanding.
    pub(crate) fn arp_resolve_then_send(
        &mut self,
        iface: usize,
        next_hop: Ipv4Addr,
        pkt: Ipv4Packet,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        self.arp.waiting.push_back(Parked {
            iface,
            next_hop,
            pkt,
        });
        if self.arp.pending.is_none() {
            self.arp_start_request(iface, next_hop, sim, net);
        } else {
            debug!(node = %self.name(), target = %next_hop, "arp busy, waiting for previous resolution");
        }
    }

    fn arp_start_request(
        &mut self,
        iface: usize,
        target: Ipv4Addr,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let Some(ifc) = self.iface(iface) else {
            return;
        };
        let (src_mac, src_ip) = (ifc.mac, ifc.config.addr);
        info!(node = %self.name(), target = %target, "send arp request");

        let node_id = self.id();
        let timer = sim.set_timer(
            ARP_TIMEOUT_TICKS,
            Box::new(move |sim, world| {
                let w = world
                    .as_any_mut()
                    .downcast_mut::<NetWorld>()
                    .expect("world must be NetWorld");
                w.net.with_node(node_id, sim, |node, sim, net| {
                    if let Some(stack) = node.stack_mut() {
                        stack.arp_timeout(sim, net);
                    }
                });
            }),
        );
        self.arp.pending = Some(Pending { target, timer });
        self.arp.requests_sent += 1;

        let packet = ArpPacket {
            op: ArpOp::Request,
            sender_ip: src_ip,
            target_ip: target,
            sender_mac: src_mac,
            target_mac: MacAddr::ZERO,
        };
        let frame = Frame {
            src: src_mac,
            dst: MacAddr::BROADCAST,
            payload: FramePayload::Arp(packet),
        };
        self.transmit_on(iface, frame, sim, net);
    }

    /// Timeout path: the resolution failed, parked packets for the target
    /// are dropped (unless a gratuitous entry arrived meanwhile) and the
    /// next queued resolution starts. Not an error.
    pub(crate) fn arp_timeout(&mut self, sim: &mut Simulator, net: &mut Network) {
        let Some(pending) = self.arp.pending.take() else {
            return;
        };
        warn!(node = %self.name(), target = %pending.target, "arp request timed out");

        // A gratuitous cache fill may have satisfied some waiters already.
        self.arp_flush_resolved(sim, net);
        let target = pending.target;
        let before = self.arp.waiting.len();
        self.arp.waiting.retain(|parked| parked.next_hop != target);
        let dropped = before - self.arp.waiting.len();
        if dropped > 0 {
            warn!(node = %self.name(), target = %target, dropped, "unresolved next hop, packets dropped");
            net.stats.packets_dropped += dropped as u64;
        }
        self.arp_maybe_start_next(sim, net);
    }

    /// Entry point for received ARP payloads.
    pub(crate) fn handle_arp(&mut self, pkt: ArpPacket, sim: &mut Simulator, net: &mut Network) {
        // Requests are answered from the interface owning the target ip;
        // fall back to the default interface like the rest of the stack.
        let iface = self.iface_by_ip(pkt.target_ip).unwrap_or(0);
        match pkt.op {
            ArpOp::Request => self.handle_arp_request(pkt, iface, sim, net),
            ArpOp::Response => self.handle_arp_response(pkt, sim, net),
        }
    }

    fn handle_arp_request(
        &mut self,
        pkt: ArpPacket,
        iface: usize,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        // Opportunistically learn the sender before the target check.
        self.arp.insert(pkt.sender_ip, pkt.sender_mac);
        self.arp_flush_resolved(sim, net);

        let Some(ifc) = self.iface(iface) else {
            return;
        };
        let (own_mac, own_ip) = (ifc.mac, ifc.config.addr);
        if pkt.target_ip == own_ip {
            info!(node = %self.name(), requester = %pkt.sender_ip, "received arp request, replying");
            let response = ArpPacket {
                op: ArpOp::Response,
                sender_ip: own_ip,
                target_ip: pkt.sender_ip,
                sender_mac: own_mac,
                target_mac: pkt.sender_mac,
            };
            let frame = Frame {
                src: own_mac,
                dst: pkt.sender_mac,
                payload: FramePayload::Arp(response),
            };
            self.transmit_on(iface, frame, sim, net);
        } else {
            debug!(node = %self.name(), target = %pkt.target_ip, "arp request not for us, dropped");
        }
    }

    fn handle_arp_response(&mut self, pkt: ArpPacket, sim: &mut Simulator, net: &mut Network) {
        info!(node = %self.name(), sender = %pkt.sender_ip, mac = %pkt.sender_mac, "received arp response");
        self.arp.insert(pkt.sender_ip, pkt.sender_mac);
        if let Some(pending) = self.arp.pending.take() {
            sim.cancel_timer(pending.timer);
        }
        if let Some(cb) = self.arp.on_resolve.as_mut() {
            cb(pkt.sender_ip, pkt.sender_mac);
        }
        self.arp_flush_resolved(sim, net);
        self.arp_maybe_start_next(sim, net);
    }

    /// Re-send every parked packet whose next hop is now cached.
    fn arp_flush_resolved(&mut self, sim: &mut Simulator, net: &mut Network) {
        let mut ready = Vec::new();
        let mut still_waiting = VecDeque::new();
        for parked in self.arp.waiting.drain(..) {
            match self.arp.cache.get(&parked.next_hop) {
                Some(mac) => ready.push((parked, *mac)),
                None => still_waiting.push_back(parked),
            }
        }
        self.arp.waiting = still_waiting;

        for (parked, mac) in ready {
            let Some(ifc) = self.iface(parked.iface) else {
                continue;
            };
            let frame = Frame {
                src: ifc.mac,
                dst: mac,
                payload: FramePayload::Ipv4(parked.pkt),
            };
            self.transmit_on(parked.iface, frame, sim, net);
        }
    }

    /// Kick off the resolution for the oldest still-unresolved waiter.
    fn arp_maybe_start_next(&mut self, sim: &mut Simulator, net: &mut Network) {
        if self.arp.pending.is_some() {
            return;
        }
        if let Some(head) = self.arp.waiting.front() {
            let (iface, target) = (head.iface, head.next_hop);
            self.arp_start_request(iface, target, sim, net);
        }
    }
}
