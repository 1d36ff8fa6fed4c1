//! Ethernet framing: MAC addresses and the layer-2 frame container.

use super::arp::ArpPacket;
use super::ipv4::Ipv4Packet;
use crate::net::NetError;
use crate::svc::ServiceId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// MAC address, printed as `AA-BB-CC-DD-EE-FF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);
    pub const ZERO: MacAddr = MacAddr([0x00; 6]);

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02X}-{:02X}-{:02X}-{:02X}-{:02X}-{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.trim().split('-');
        for octet in &mut octets {
            let part = parts
                .next()
                .ok_or_else(|| NetError::InvalidAddr(s.to_string()))?;
            *octet =
                u8::from_str_radix(part, 16).map_err(|_| NetError::InvalidAddr(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(NetError::InvalidAddr(s.to_string()));
        }
        Ok(MacAddr(octets))
    }
}

// MACs travel inside JSON payloads and snapshots in their display form.
impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| D::Error::custom("invalid mac address"))
    }
}

/// Frame type tag, derived from the payload variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Ipv4,
    Arp,
}

/// Layer-2 payload. A frame carries either an ARP message or an IPv4
/// packet, never both.
#[derive(Debug, Clone)]
pub enum FramePayload {
    Arp(ArpPacket),
    Ipv4(Ipv4Packet),
}

/// Ethernet frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub src: MacAddr,
    pub dst: MacAddr,
    pub payload: FramePayload,
}

impl Frame {
    pub fn frame_type(&self) -> FrameType {
        match self.payload {
            FramePayload::Arp(_) => FrameType::Arp,
            FramePayload::Ipv4(_) => FrameType::Ipv4,
        }
    }

    /// Short label for UI/log purposes.
    pub fn type_label(&self) -> &'static str {
        match &self.payload {
            FramePayload::Arp(_) => "ARP",
            FramePayload::Ipv4(pkt) => match pkt.service {
                ServiceId::Icmp => "ICMP",
                ServiceId::DhcpClient | ServiceId::DhcpServer => "DHCP",
                ServiceId::Message => "MSG",
            },
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.type_label(), self.src, self.dst)
    }
}
