//! IPv4 addressing and the network-layer send/receive path.
//!
//! Addresses are modelled as plain dotted-quad values, not wire bytes.
//! Routing is the minimal host model: same-subnet destinations resolve
//! directly, everything else goes through the interface gateway.

use super::ethernet::{Frame, FramePayload};
use crate::net::{NetError, NetStack, Network};
use crate::sim::Simulator;
use crate::svc::ServiceId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// IPv4 address (also used for subnet masks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Addr(pub [u8; 4]);

impl Ipv4Addr {
    /// The all-ones limited broadcast address.
    pub const BROADCAST: Ipv4Addr = Ipv4Addr([255, 255, 255, 255]);
    /// `0.0.0.0`, used by DHCP clients before they own an address.
    pub const UNSPECIFIED: Ipv4Addr = Ipv4Addr([0, 0, 0, 0]);

    pub fn octets(&self) -> [u8; 4] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn is_unspecified(&self) -> bool {
        *self == Self::UNSPECIFIED
    }

    /// Per-octet masked network part: `self & mask`.
    pub fn network(&self, mask: Ipv4Addr) -> Ipv4Addr {
        let a = self.0;
        let m = mask.0;
        Ipv4Addr([a[0] & m[0], a[1] & m[1], a[2] & m[2], a[3] & m[3]])
    }

    /// Numerically next address (wrapping), used by the DHCP pool scan.
    pub fn successor(&self) -> Ipv4Addr {
        let n = u32::from_be_bytes(self.0).wrapping_add(1);
        Ipv4Addr(n.to_be_bytes())
    }
}

impl fmt::Display for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(f, "{}.{}.{}.{}", o[0], o[1], o[2], o[3])
    }
}

impl FromStr for Ipv4Addr {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 4];
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 4 {
            return Err(NetError::InvalidAddr(s.to_string()));
        }
        for (octet, part) in octets.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(NetError::InvalidAddr(s.to_string()));
            }
            let num: u32 = part
                .parse()
                .map_err(|_| NetError::InvalidAddr(s.to_string()))?;
            if num > 255 {
                return Err(NetError::InvalidAddr(s.to_string()));
            }
            *octet = num as u8;
        }
        Ok(Ipv4Addr(octets))
    }
}

impl Serialize for Ipv4Addr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ipv4Addr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| D::Error::custom("invalid ipv4 address"))
    }
}

/// Checks whether `value` is exactly four dot-separated integers in [0,255].
pub fn is_valid_ip(value: &str) -> bool {
    Ipv4Addr::from_str(value).is_ok()
}

/// IPv4 packet: network-layer container dispatched by service id.
#[derive(Debug, Clone)]
pub struct Ipv4Packet {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub service: ServiceId,
    pub payload: String,
}

impl Ipv4Packet {
    pub fn new(src: Ipv4Addr, dst: Ipv4Addr, service: ServiceId, payload: impl Into<String>) -> Self {
        Self {
            src,
            dst,
            service,
            payload: payload.into(),
        }
    }
}

impl NetStack {
    /// Send a packet out the interface owning `packet.src` (default
    /// interface when no interface owns it).
    pub fn send_packet(&mut self, pkt: Ipv4Packet, sim: &mut Simulator, net: &mut Network) {
        let iface = self.iface_by_ip(pkt.src).unwrap_or(0);
        self.send_packet_via(iface, pkt, sim, net);
    }

    /// Send a packet out a specific interface.
    ///
    /// The limited broadcast address is always on-link; an off-subnet
    /// destination is replaced by the interface gateway as next hop. An
    /// unresolvable next hop drops the packet, it never fails the caller.
    pub fn send_packet_via(
        &mut self,
        iface: usize,
        pkt: Ipv4Packet,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let Some(ifc) = self.iface(iface) else {
            warn!(node = %self.name(), iface, "send on unknown interface, packet dropped");
            return;
        };
        let next_hop = if pkt.dst.is_broadcast() || self.is_same_network(iface, pkt.dst) {
            pkt.dst
        } else {
            debug!(node = %self.name(), dst = %pkt.dst, "destination not in the same network");
            match ifc.config.gw {
                Some(gw) => gw,
                None => {
                    warn!(node = %self.name(), dst = %pkt.dst, "no gateway configured, packet dropped");
                    return;
                }
            }
        };

        match self.arp.lookup(next_hop) {
            Some(mac) => {
                let frame = Frame {
                    src: self.iface(iface).expect("iface checked above").mac,
                    dst: mac,
                    payload: FramePayload::Ipv4(pkt),
                };
                self.transmit_on(iface, frame, sim, net);
            }
            // Cache miss: park the packet behind an ARP resolution.
            None => self.arp_resolve_then_send(iface, next_hop, pkt, sim, net),
        }
    }

    /// Per-octet masked comparison of `dst` against the interface subnet.
    pub fn is_same_network(&self, iface: usize, dst: Ipv4Addr) -> bool {
        match self.iface(iface) {
            Some(ifc) => {
                let mask = ifc.config.mask;
                ifc.config.addr.network(mask) == dst.network(mask)
            }
            None => false,
        }
    }

    /// Deliver a packet to the service registered for its service id.
    pub fn receive_packet(&mut self, pkt: Ipv4Packet, sim: &mut Simulator, net: &mut Network) {
        let service = pkt.service;
        let handled = self
            .with_service(service, |svc, stack, sim, net| {
                svc.handle_packet(pkt, stack, sim, net)
            }, sim, net)
            .is_some();
        if !handled {
            warn!(node = %self.name(), service = ?service, "unknown service id, packet dropped");
            net.stats.packets_dropped += 1;
        }
    }
}
