//! Network interface: a port plus MAC and IPv4 configuration.

use super::error::NetError;
use super::port::Port;
use crate::proto::{Ipv4Addr, MacAddr};

/// Mutable IPv4 configuration of an interface. Every field is settable on
/// its own; setters validate and leave state unchanged on bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfaceConfig {
    pub addr: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub gw: Option<Ipv4Addr>,
    pub dns: Option<Ipv4Addr>,
}

impl Default for IfaceConfig {
    fn default() -> Self {
        Self {
            addr: Ipv4Addr([192, 168, 30, 10]),
            mask: Ipv4Addr([255, 255, 255, 0]),
            gw: None,
            dns: None,
        }
    }
}

/// An addressable node's attachment point.
#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub mac: MacAddr,
    pub config: IfaceConfig,
    pub port: Port,
}

impl Interface {
    pub fn new(name: impl Into<String>, mac: MacAddr) -> Self {
        Self {
            name: name.into(),
            mac,
            config: IfaceConfig::default(),
            port: Port::new(),
        }
    }

    pub fn set_addr(&mut self, addr: &str) -> Result<(), NetError> {
        self.config.addr = addr.parse()?;
        Ok(())
    }

    pub fn set_mask(&mut self, mask: &str) -> Result<(), NetError> {
        self.config.mask = mask.parse()?;
        Ok(())
    }

    /// An empty string clears the gateway.
    pub fn set_gw(&mut self, gw: &str) -> Result<(), NetError> {
        self.config.gw = if gw.is_empty() {
            None
        } else {
            Some(gw.parse()?)
        };
        Ok(())
    }

    /// An empty string clears the DNS server.
    pub fn set_dns(&mut self, dns: &str) -> Result<(), NetError> {
        self.config.dns = if dns.is_empty() {
            None
        } else {
            Some(dns.parse()?)
        };
        Ok(())
    }

    /// Per-interface report for the terminal collaborator's `ipconfig`.
    pub fn report(&self) -> IfaceReport {
        IfaceReport {
            name: self.name.clone(),
            mac: self.mac,
            addr: self.config.addr,
            mask: self.config.mask,
            gw: self.config.gw,
            dns: self.config.dns,
        }
    }
}

/// Read-only view of an interface configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfaceReport {
    pub name: String,
    pub mac: MacAddr,
    pub addr: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub gw: Option<Ipv4Addr>,
    pub dns: Option<Ipv4Addr>,
}
