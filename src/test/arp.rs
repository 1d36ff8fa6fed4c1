use crate::net::{NetWorld, NodeId};
use crate::proto::{ARP_TIMEOUT_TICKS, Ipv4Addr};
use crate::sim::{Simulator, Tick};

fn linked_pair() -> (NetWorld, NodeId, NodeId) {
    let mut world = NetWorld::default();
    let h0 = world.net.add_host("h0");
    let h1 = world.net.add_host("h1");
    {
        let stack = world
            .net
            .node_mut(h1)
            .and_then(|n| n.stack_mut())
            .expect("host is addressable");
        stack
            .iface_mut(0)
            .expect("eth0")
            .set_addr("192.168.30.11")
            .expect("valid address");
    }
    world.net.add_link(h0, h1).expect("free ports");
    (world, h0, h1)
}

fn arp_stats(world: &NetWorld, node: NodeId) -> (bool, u64) {
    let arp = world
        .net
        .node(node)
        .and_then(|n| n.stack())
        .expect("addressable")
        .arp();
    (arp.is_pending(), arp.requests_sent())
}

#[test]
fn cache_is_seeded_with_the_broadcast_mapping() {
    let mut net = crate::net::Network::new();
    let h = net.add_host("h");
    let arp = net.node(h).and_then(|n| n.stack()).expect("host").arp();
    assert!(arp.knows(Ipv4Addr::BROADCAST));
}

#[test]
fn resolution_fills_the_cache_on_both_sides() {
    let (mut world, h0, h1) = linked_pair();
    let mut sim = Simulator::default();

    world
        .net
        .send_message(h0, "192.168.30.11".parse().expect("valid"), "hello", &mut sim)
        .expect("message command");
    sim.run(&mut world);

    let h0_arp = world.net.node(h0).and_then(|n| n.stack()).expect("host").arp();
    assert!(h0_arp.knows("192.168.30.11".parse().expect("valid")));
    // The request taught h1 the sender's mapping before the reply.
    let h1_arp = world.net.node(h1).and_then(|n| n.stack()).expect("host").arp();
    assert!(h1_arp.knows("192.168.30.10".parse().expect("valid")));
    assert!(!world.net.inbox(h1).expect("host").is_empty());
}

#[test]
fn at_most_one_arp_request_is_outstanding_per_node() {
    let (mut world, h0, _h1) = linked_pair();
    let mut sim = Simulator::default();

    // Two sends to two different unresolvable destinations.
    world
        .net
        .send_message(h0, "192.168.30.50".parse().expect("valid"), "a", &mut sim)
        .expect("message command");
    world
        .net
        .send_message(h0, "192.168.30.60".parse().expect("valid"), "b", &mut sim)
        .expect("message command");

    sim.run_until(Tick(ARP_TIMEOUT_TICKS - 1), &mut world);
    let (pending, requests) = arp_stats(&world, h0);
    assert!(pending);
    assert_eq!(requests, 1, "second resolution must wait its turn");

    // First timeout starts the queued resolution, still one at a time.
    sim.run_until(Tick(ARP_TIMEOUT_TICKS), &mut world);
    let (pending, requests) = arp_stats(&world, h0);
    assert!(pending);
    assert_eq!(requests, 2);

    sim.run(&mut world);
    let (pending, _) = arp_stats(&world, h0);
    assert!(!pending);
    assert_eq!(world.net.stats.packets_dropped, 2);
}

#[test]
fn timeout_drops_the_packet_and_is_not_fatal() {
    let (mut world, h0, h1) = linked_pair();
    let mut sim = Simulator::default();

    world
        .net
        .send_message(h0, "192.168.30.99".parse().expect("valid"), "void", &mut sim)
        .expect("message command");
    sim.run(&mut world);

    assert_eq!(world.net.stats.packets_dropped, 1);
    assert!(world.net.inbox(h1).expect("host").is_empty());

    // The node keeps working afterwards.
    world
        .net
        .send_message(h0, "192.168.30.11".parse().expect("valid"), "alive", &mut sim)
        .expect("message command");
    sim.run(&mut world);
    assert_eq!(world.net.inbox(h1).expect("host").len(), 1);
}

#[test]
fn queued_resolution_starts_after_the_current_one_finishes() {
    let (mut world, h0, h1) = linked_pair();
    let mut sim = Simulator::default();

    // First resolution can never complete, second one targets a real host.
    world
        .net
        .send_message(h0, "192.168.30.50".parse().expect("valid"), "lost", &mut sim)
        .expect("message command");
    world
        .net
        .send_message(h0, "192.168.30.11".parse().expect("valid"), "kept", &mut sim)
        .expect("message command");
    sim.run(&mut world);

    let inbox = world.net.inbox(h1).expect("host");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].text, "kept");
    assert_eq!(world.net.stats.packets_dropped, 1);
}

#[test]
fn resolve_completion_callback_fires_on_responses() {
    use std::sync::{Arc, Mutex};

    let (mut world, h0, _h1) = linked_pair();
    let mut sim = Simulator::default();

    let resolved: Arc<Mutex<Vec<(Ipv4Addr, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&resolved);
    world
        .net
        .node_mut(h0)
        .and_then(|n| n.stack_mut())
        .expect("host is addressable")
        .arp
        .set_on_resolve(Box::new(move |ip, mac| {
            sink.lock().expect("sink lock").push((ip, mac.to_string()));
        }));

    world
        .net
        .send_message(h0, "192.168.30.11".parse().expect("valid"), "hi", &mut sim)
        .expect("message command");
    sim.run(&mut world);

    let calls = resolved.lock().expect("sink lock");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "192.168.30.11".parse().expect("valid"));
}

#[test]
fn gratuitous_learning_from_requests_satisfies_parked_packets() {
    let (mut world, h0, h1) = linked_pair();
    let mut sim = Simulator::default();

    // h0 parks a packet for h1 and broadcasts a request; in parallel h1
    // resolves h0, whose request gratuitously teaches h0 the mapping.
    world
        .net
        .send_message(h0, "192.168.30.11".parse().expect("valid"), "ping-you", &mut sim)
        .expect("message command");
    world
        .net
        .send_message(h1, "192.168.30.10".parse().expect("valid"), "ping-me", &mut sim)
        .expect("message command");
    sim.run(&mut world);

    assert_eq!(world.net.inbox(h0).expect("host").len(), 1);
    assert_eq!(world.net.inbox(h1).expect("host").len(), 1);
    assert_eq!(world.net.stats.packets_dropped, 0);
}
