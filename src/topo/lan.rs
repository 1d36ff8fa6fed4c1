//! LAN 拓扑构建
//!
//! 拓扑结构：
//! - office：h0..hN <-> switch，静态地址同网段
//! - routed：host <-> switch <-> router(LAN/WAN) <-> cloud <-> wan host

use crate::net::{LAN, NetWorld, NodeId, PortRef, WAN};
use crate::svc::PoolConfig;
use tracing::info;

/// 单交换机办公网。
pub struct OfficeLan {
    pub switch: NodeId,
    pub hosts: Vec<NodeId>,
}

/// 构建办公网拓扑：N 台主机挂在一台交换机上，静态地址 192.168.30.10+i。
pub fn build_office_lan(world: &mut NetWorld, hosts: usize) -> OfficeLan {
    let switch = world.net.add_switch(hosts.max(2));
    let mut ids = Vec::with_capacity(hosts);
    for i in 0..hosts {
        let host = world.net.add_host(format!("h{i}"));
        {
            let stack = world
                .net
                .node_mut(host)
                .and_then(|n| n.stack_mut())
                .expect("host is addressable");
            let iface = stack.iface_mut(0).expect("host has eth0");
            iface
                .set_addr(&format!("192.168.30.{}", 10 + i))
                .expect("static address is valid");
            iface.set_gw("192.168.30.1").expect("gateway is valid");
        }
        world
            .net
            .add_link(host, switch)
            .expect("office lan ports are free");
        ids.push(host);
    }
    info!(hosts, "office lan built");
    OfficeLan {
        switch,
        hosts: ids,
    }
}

/// 经路由器接入云的站点。
pub struct RoutedSite {
    pub host: NodeId,
    pub switch: NodeId,
    pub router: NodeId,
    pub cloud: NodeId,
    pub wan_host: NodeId,
}

/// 构建带 NAT 路由器的站点。
///
/// LAN 侧主机使用静态地址；路由器 WAN 口与云侧主机从云的地址池取租约；
/// 路由器的 DHCP 服务配置了 LAN 网段的小地址池。
pub fn build_routed_site(world: &mut NetWorld) -> RoutedSite {
    let switch = world.net.add_switch(4);
    let host = world.net.add_host("lan-host");
    {
        let stack = world
            .net
            .node_mut(host)
            .and_then(|n| n.stack_mut())
            .expect("host is addressable");
        let iface = stack.iface_mut(0).expect("host has eth0");
        iface.set_addr("192.168.30.10").expect("static address is valid");
        iface.set_gw("192.168.30.1").expect("gateway is valid");
    }

    let router = world.net.add_router();
    let cloud = world.net.add_cloud();

    // WAN 口与云侧主机都从云的公网池取地址。
    let wan_lease = world
        .net
        .node_mut(cloud)
        .and_then(|n| n.as_cloud_mut())
        .expect("cloud exists")
        .lease()
        .expect("cloud pool has addresses");
    {
        let r = world.net.router_mut(router).expect("router exists");
        let wan = r.stack_mut().iface_mut(WAN).expect("router has wan");
        wan.config.addr = wan_lease.addr;
        wan.config.mask = wan_lease.mask;
        wan.config.gw = wan_lease.gw;
        wan.config.dns = wan_lease.dns;
        r.configure_dhcp(PoolConfig {
            first: "192.168.30.100".parse().expect("pool first is valid"),
            last: "192.168.30.200".parse().expect("pool last is valid"),
            mask: "255.255.255.0".parse().expect("pool mask is valid"),
            gw: Some("192.168.30.1".parse().expect("pool gw is valid")),
            dns: Some("192.168.30.1".parse().expect("pool dns is valid")),
        });
    }

    let wan_host = world.net.add_host("wan-host");
    let host_lease = world
        .net
        .node_mut(cloud)
        .and_then(|n| n.as_cloud_mut())
        .expect("cloud exists")
        .lease()
        .expect("cloud pool has addresses");
    {
        let stack = world
            .net
            .node_mut(wan_host)
            .and_then(|n| n.stack_mut())
            .expect("host is addressable");
        let iface = stack.iface_mut(0).expect("host has eth0");
        iface.config.addr = host_lease.addr;
        iface.config.mask = host_lease.mask;
        iface.config.gw = host_lease.gw;
        iface.config.dns = host_lease.dns;
    }

    world
        .net
        .add_link(host, switch)
        .expect("site ports are free");
    world
        .net
        .add_link(switch, PortRef { node: router, port: LAN })
        .expect("site ports are free");
    world
        .net
        .add_link(PortRef { node: router, port: WAN }, cloud)
        .expect("site ports are free");
    world
        .net
        .add_link(cloud, wan_host)
        .expect("site ports are free");

    info!("routed site built");
    RoutedSite {
        host,
        switch,
        router,
        cloud,
        wan_host,
    }
}
