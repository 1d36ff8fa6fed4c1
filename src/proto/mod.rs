//! 协议栈模块
//!
//! 以太网成帧、ARP 解析、IPv4 收发与 NAT 翻译。

mod arp;
mod ethernet;
mod ipv4;
mod nat;

pub use arp::{ARP_TIMEOUT_TICKS, ArpOp, ArpPacket, ArpResolver};
pub use ethernet::{Frame, FramePayload, FrameType, MacAddr};
pub use ipv4::{Ipv4Addr, Ipv4Packet, is_valid_ip};
pub use nat::NatTable;
