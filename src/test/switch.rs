use crate::net::{NetWorld, NodeId, PortRef};
use crate::proto::{Frame, FramePayload, Ipv4Addr, Ipv4Packet, MacAddr};
use crate::sim::Simulator;
use crate::svc::ServiceId;

fn lan_with_three_hosts() -> (NetWorld, NodeId, Vec<NodeId>) {
    let mut world = NetWorld::default();
    let sw = world.net.add_switch(4);
    let mut hosts = Vec::new();
    for i in 0..3 {
        let h = world.net.add_host(format!("h{i}"));
        world.net.add_link(h, sw).expect("switch has free ports");
        hosts.push(h);
    }
    (world, sw, hosts)
}

fn host_mac(world: &NetWorld, host: NodeId) -> MacAddr {
    world.net.ipconfig(host).expect("host")[0].mac
}

fn msg_frame(src: MacAddr, dst: MacAddr) -> Frame {
    Frame {
        src,
        dst,
        payload: FramePayload::Ipv4(Ipv4Packet::new(
            Ipv4Addr([192, 168, 30, 10]),
            Ipv4Addr([192, 168, 30, 11]),
            ServiceId::Message,
            "payload",
        )),
    }
}

/// Inject a frame into the switch as if it arrived on `ingress`.
fn inject(world: &mut NetWorld, sim: &mut Simulator, sw: NodeId, ingress: usize, frame: Frame) {
    world.net.receive_frame(
        PortRef {
            node: sw,
            port: ingress,
        },
        frame,
        sim,
    );
}

#[test]
fn switch_floods_unknown_destinations_to_all_other_connected_ports() {
    let (mut world, sw, hosts) = lan_with_three_hosts();
    let mut sim = Simulator::default();
    let mac0 = host_mac(&world, hosts[0]);
    let unknown = MacAddr([0x02, 0x00, 0xAA, 0xBB, 0xCC, 0xDD]);

    inject(&mut world, &mut sim, sw, 0, msg_frame(mac0, unknown));
    sim.run(&mut world);

    // Two egress ports (1 and 2); port 3 is unconnected, port 0 is ingress.
    assert_eq!(world.net.stats.frames_delivered, 2);
}

#[test]
fn switch_learns_source_port_and_forwards_unicast() {
    let (mut world, sw, hosts) = lan_with_three_hosts();
    let mut sim = Simulator::default();
    let mac0 = host_mac(&world, hosts[0]);
    let mac1 = host_mac(&world, hosts[1]);

    // h0's source address teaches the switch where h0 lives.
    inject(&mut world, &mut sim, sw, 0, msg_frame(mac0, MacAddr::BROADCAST));
    sim.run(&mut world);
    let table = world
        .net
        .node(sw)
        .and_then(|n| n.as_switch())
        .expect("switch")
        .table();
    assert_eq!(table.lookup(mac0), Some(0));

    // A frame for h0 now leaves exactly one port.
    let delivered_before = world.net.stats.frames_delivered;
    inject(&mut world, &mut sim, sw, 1, msg_frame(mac1, mac0));
    sim.run(&mut world);
    assert_eq!(world.net.stats.frames_delivered - delivered_before, 1);
}

#[test]
fn switch_drops_frames_whose_destination_sits_on_the_ingress_port() {
    let (mut world, sw, hosts) = lan_with_three_hosts();
    let mut sim = Simulator::default();
    let mac0 = host_mac(&world, hosts[0]);
    let mac1 = host_mac(&world, hosts[1]);

    inject(&mut world, &mut sim, sw, 0, msg_frame(mac0, MacAddr::BROADCAST));
    sim.run(&mut world);

    // Destination learned behind port 0, frame arriving on port 0: drop.
    let delivered_before = world.net.stats.frames_delivered;
    inject(&mut world, &mut sim, sw, 0, msg_frame(mac1, mac0));
    sim.run(&mut world);
    assert_eq!(world.net.stats.frames_delivered, delivered_before);
}

#[test]
fn switch_never_learns_the_broadcast_address() {
    let (mut world, sw, _hosts) = lan_with_three_hosts();
    let mut sim = Simulator::default();

    inject(
        &mut world,
        &mut sim,
        sw,
        0,
        msg_frame(MacAddr::BROADCAST, MacAddr::BROADCAST),
    );
    sim.run(&mut world);

    let table = world
        .net
        .node(sw)
        .and_then(|n| n.as_switch())
        .expect("switch")
        .table();
    assert_eq!(table.lookup(MacAddr::BROADCAST), None);
}

#[test]
fn learning_moves_a_mac_to_its_last_seen_port() {
    let (mut world, sw, hosts) = lan_with_three_hosts();
    let mut sim = Simulator::default();
    let mac0 = host_mac(&world, hosts[0]);

    inject(&mut world, &mut sim, sw, 0, msg_frame(mac0, MacAddr::BROADCAST));
    sim.run(&mut world);
    // The same station shows up behind another port (moved cable).
    inject(&mut world, &mut sim, sw, 2, msg_frame(mac0, MacAddr::BROADCAST));
    sim.run(&mut world);

    let table = world
        .net
        .node(sw)
        .and_then(|n| n.as_switch())
        .expect("switch")
        .table();
    assert_eq!(table.lookup(mac0), Some(2));
    assert!(table.macs_on(0).is_empty());
}

#[test]
fn repeated_learning_on_one_port_collapses_to_a_single_entry() {
    let (mut world, sw, hosts) = lan_with_three_hosts();
    let mut sim = Simulator::default();
    let mac0 = host_mac(&world, hosts[0]);

    for _ in 0..3 {
        inject(&mut world, &mut sim, sw, 0, msg_frame(mac0, MacAddr::BROADCAST));
        sim.run(&mut world);
    }

    let table = world
        .net
        .node(sw)
        .and_then(|n| n.as_switch())
        .expect("switch")
        .table();
    assert_eq!(table.macs_on(0), vec![mac0]);
}
