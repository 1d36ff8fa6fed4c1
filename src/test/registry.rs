use crate::net::{LinkEndpoint, NetError, Network, NodeId, NodeKind, PortRef};

#[test]
fn ids_are_monotonic_and_shared_between_nodes_and_links() {
    let mut net = Network::new();
    let h0 = net.add_host("h0");
    let h1 = net.add_host("h1");
    assert_eq!(h0, NodeId(1));
    assert_eq!(h1, NodeId(2));

    let link = net.add_link(h0, h1).expect("both hosts have a free port");
    assert_eq!(link.0, 3);
    assert_eq!(net.last_used_id(), 3);
}

#[test]
fn removed_ids_are_never_reused() {
    let mut net = Network::new();
    let h0 = net.add_host("h0");
    net.remove_node(h0);
    let h1 = net.add_host("h1");
    assert_ne!(h0, h1);
}

#[test]
fn add_link_rejects_connected_port() {
    let mut net = Network::new();
    let h0 = net.add_host("h0");
    let h1 = net.add_host("h1");
    let h2 = net.add_host("h2");
    net.add_link(h0, h1).expect("first link");

    // h0's only port is taken now, as node endpoint and as explicit port.
    assert!(matches!(
        net.add_link(h0, h2),
        Err(NetError::LinkUnavailable(_))
    ));
    assert!(matches!(
        net.add_link(PortRef { node: h0, port: 0 }, h2),
        Err(NetError::LinkUnavailable(_))
    ));
    assert_eq!(net.link_count(), 1);
}

#[test]
fn add_link_rejects_missing_endpoints_and_self_links() {
    let mut net = Network::new();
    let h0 = net.add_host("h0");
    let r = net.add_router();

    assert!(matches!(
        net.add_link(h0, NodeId(99)),
        Err(NetError::LinkUnavailable(_))
    ));
    assert!(matches!(
        net.add_link(
            LinkEndpoint::Port(PortRef { node: r, port: 0 }),
            LinkEndpoint::Port(PortRef { node: r, port: 1 })
        ),
        Err(NetError::LinkUnavailable(_))
    ));
    assert_eq!(net.link_count(), 0);
}

#[test]
fn remove_node_cascades_to_all_touching_links() {
    let mut net = Network::new();
    let sw = net.add_switch(4);
    let hosts: Vec<NodeId> = (0..3).map(|i| net.add_host(format!("h{i}"))).collect();
    for h in &hosts {
        net.add_link(*h, sw).expect("switch has free ports");
    }
    let other = net.add_host("h3");
    let standalone = net.add_host("h4");
    let surviving = net.add_link(other, standalone).expect("free ports");

    assert_eq!(net.link_count(), 4);
    net.remove_node(sw);

    assert_eq!(net.link_count(), 1);
    assert!(net.link(surviving).is_some());
    assert!(net.node(sw).is_none());
    // The disconnected hosts survive with their ports free again.
    for h in &hosts {
        let node = net.node(*h).expect("host survives");
        assert_eq!(node.next_free_port(), Some(0));
    }
}

#[test]
fn remove_link_is_idempotent() {
    let mut net = Network::new();
    let h0 = net.add_host("h0");
    let h1 = net.add_host("h1");
    let link = net.add_link(h0, h1).expect("free ports");

    net.remove_link(link);
    net.remove_link(link);
    assert_eq!(net.link_count(), 0);
    assert!(net.node(h0).expect("host").has_free_port());
}

#[test]
fn cloud_is_a_reserved_idempotent_singleton() {
    let mut net = Network::new();
    let before = net.last_used_id();
    let c1 = net.add_cloud();
    let c2 = net.add_cloud();

    assert_eq!(c1, NodeId::CLOUD);
    assert_eq!(c1, c2);
    assert_eq!(net.nodes_of_kind(NodeKind::Cloud).len(), 1);
    // Reserved ids never touch the counter.
    assert_eq!(net.last_used_id(), before);
}

#[test]
fn nodes_of_kind_filters_by_variant() {
    let mut net = Network::new();
    net.add_host("h0");
    net.add_host("h1");
    net.add_switch(4);
    net.add_router();
    net.add_cloud();

    assert_eq!(net.nodes_of_kind(NodeKind::Host).len(), 2);
    assert_eq!(net.nodes_of_kind(NodeKind::Switch).len(), 1);
    assert_eq!(net.nodes_of_kind(NodeKind::Router).len(), 1);
    assert_eq!(net.nodes_of_kind(NodeKind::Cloud).len(), 1);
}

#[test]
fn interface_setters_validate_and_keep_state_on_error() {
    let mut net = Network::new();
    let h0 = net.add_host("h0");
    let stack = net
        .node_mut(h0)
        .and_then(|n| n.stack_mut())
        .expect("host is addressable");
    let iface = stack.iface_mut(0).expect("eth0");

    iface.set_addr("10.0.0.1").expect("valid address");
    assert!(iface.set_addr("10.0.0.256").is_err());
    assert_eq!(iface.config.addr.to_string(), "10.0.0.1");

    assert!(iface.set_mask("not-a-mask").is_err());
    assert_eq!(iface.config.mask.to_string(), "255.255.255.0");

    iface.set_gw("10.0.0.254").expect("valid gateway");
    assert!(iface.set_gw("10.0.0.999").is_err());
    assert_eq!(iface.config.gw.map(|a| a.to_string()).as_deref(), Some("10.0.0.254"));

    // The empty string clears optional fields.
    iface.set_gw("").expect("clearing is fine");
    assert_eq!(iface.config.gw, None);
}
