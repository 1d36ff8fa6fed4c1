//! NAT translation table for routers.
//!
//! Single mapping per external destination: a second outgoing flow to the
//! same destination overwrites the first before its reply arrives. Known
//! simplification, kept on purpose (no port multiplexing).

use super::ipv4::{Ipv4Addr, Ipv4Packet};
use std::collections::HashMap;
use tracing::info;

/// Maps the translated destination back to the original internal source.
#[derive(Default)]
pub struct NatTable {
    table: HashMap<Ipv4Addr, Ipv4Addr>,
}

impl NatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite an outgoing packet to originate from the WAN address and
    /// remember where the reply has to go.
    pub fn translate_outgoing(&mut self, mut pkt: Ipv4Packet, wan_ip: Ipv4Addr) -> Ipv4Packet {
        self.table.insert(pkt.dst, pkt.src);
        info!(dst = %pkt.dst, original_src = %pkt.src, wan = %wan_ip, "nat translate outgoing");
        pkt.src = wan_ip;
        pkt
    }

    /// Whether an incoming packet from `external_src` has a recorded flow.
    pub fn has_mapping(&self, external_src: Ipv4Addr) -> bool {
        self.table.contains_key(&external_src)
    }

    /// Reverse-translate a reply. Consumes the table entry; returns `None`
    /// when no outgoing flow recorded this external source.
    pub fn translate_incoming(&mut self, mut pkt: Ipv4Packet, lan_ip: Ipv4Addr) -> Option<Ipv4Packet> {
        let internal = self.table.remove(&pkt.src)?;
        info!(external = %pkt.src, internal = %internal, lan = %lan_ip, "nat translate incoming");
        pkt.dst = internal;
        pkt.src = lan_ip;
        Some(pkt)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
