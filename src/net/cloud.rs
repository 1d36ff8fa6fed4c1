//! Cloud node: a very large switch standing in for an uplink network, with
//! an embedded DHCP pool handing out public-range addresses to anything
//! plugged into it.

use super::id::NodeId;
use super::network::Network;
use super::switch::Switch;
use super::style::NodeStyle;
use crate::net::NetError;
use crate::proto::{Frame, Ipv4Addr};
use crate::sim::Simulator;
use crate::svc::{DhcpPool, LeaseConfig, PoolConfig};

/// Port count of the cloud's switching fabric.
pub const CLOUD_PORTS: usize = 100;

pub struct Cloud {
    pub(crate) sw: Switch,
    pool: DhcpPool,
}

impl Cloud {
    pub fn new(id: NodeId) -> Self {
        let mut sw = Switch::new(id, CLOUD_PORTS);
        sw.set_name("Cloud");
        sw.style = NodeStyle::cloud();
        let mut pool = DhcpPool::new();
        pool.configure(PoolConfig {
            first: Ipv4Addr([80, 1, 1, 10]),
            last: Ipv4Addr([80, 255, 255, 254]),
            mask: Ipv4Addr([255, 0, 0, 0]),
            gw: Some(Ipv4Addr([80, 1, 1, 1])),
            dns: Some(Ipv4Addr([80, 1, 1, 2])),
        });
        Self { sw, pool }
    }

    pub fn id(&self) -> NodeId {
        self.sw.id()
    }

    pub fn pool(&self) -> &DhcpPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut DhcpPool {
        &mut self.pool
    }

    /// Hand out the next address of the cloud's public range.
    pub fn lease(&mut self) -> Result<LeaseConfig, NetError> {
        self.pool.allocate()
    }

    pub(crate) fn receive(
        &mut self,
        port: usize,
        frame: Frame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        self.sw.receive(port, frame, sim, net);
    }
}
