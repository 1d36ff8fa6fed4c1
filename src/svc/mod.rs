//! Application services: per-node pluggable packet handlers keyed by a
//! closed set of service identifiers.

mod dhcp;
mod icmp;
mod message;

pub use dhcp::{DhcpClient, DhcpPool, DhcpServer, LeaseConfig, PoolConfig};
pub use icmp::{ICMP_TIMEOUT_TICKS, IcmpService, PingOutcome};
pub use message::{MessageService, ReceivedMessage};

use crate::net::{NetStack, Network};
use crate::proto::{Ipv4Addr, Ipv4Packet};
use crate::sim::Simulator;
use std::any::Any;
use std::fmt;

/// Closed set of service identifiers a packet can be addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    Icmp,
    DhcpClient,
    DhcpServer,
    Message,
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceId::Icmp => "icmp",
            ServiceId::DhcpClient => "dhcp-client",
            ServiceId::DhcpServer => "dhcp-server",
            ServiceId::Message => "message",
        };
        f.write_str(label)
    }
}

/// Typed request arguments for `Service::send_request`.
#[derive(Debug, Clone)]
pub enum ServiceRequest {
    Ping(Ipv4Addr),
    DhcpDiscover,
    Message { dst: Ipv4Addr, text: String },
}

/// Coarse service lifecycle state, exposed for the UI/terminal collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceState {
    #[default]
    Idle,
    Pending,
}

/// Uniform service contract. Instances live in a per-node map and are
/// invoked with the node's stack temporarily split off.
pub trait Service: Send {
    fn id(&self) -> ServiceId;

    /// Kick off a client-side operation (ping, discover, message).
    fn send_request(
        &mut self,
        req: ServiceRequest,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    );

    /// Consume an IPv4 packet addressed to this service.
    fn handle_packet(
        &mut self,
        pkt: Ipv4Packet,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    );

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
