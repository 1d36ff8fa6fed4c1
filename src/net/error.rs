//! Error type shared by the registry, config setters and services.

use super::id::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    /// Malformed IPv4/mask/MAC string. The offending input is carried verbatim.
    #[error("invalid address: {0:?}")]
    InvalidAddr(String),

    /// `add_link` could not resolve two free ports on two distinct nodes.
    #[error("link not established: {0}")]
    LinkUnavailable(&'static str),

    /// Transmit was attempted on a port with no link attached.
    #[error("port is not connected")]
    PortDisconnected,

    /// The DHCP pool has no free address left.
    #[error("no free ip addresses in pool")]
    PoolExhausted,

    /// The DHCP pool was used before being configured.
    #[error("dhcp pool is not configured")]
    PoolUnconfigured,

    /// Registry lookup failed.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// The operation needs an addressable node (host or router).
    #[error("node {0:?} is not addressable")]
    NotAddressable(NodeId),

    /// The targeted service is not registered on the node.
    #[error("service {service} not registered on node {node:?}")]
    ServiceMissing { node: NodeId, service: String },

    /// The operation is only valid on a host.
    #[error("node {0:?} is not a host")]
    NotAHost(NodeId),
}
