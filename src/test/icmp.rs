use crate::net::NetWorld;
use crate::sim::{Simulator, Tick};
use crate::svc::{ICMP_TIMEOUT_TICKS, PingOutcome};
use crate::topo::build_office_lan;

#[test]
fn ping_across_a_switch_succeeds() {
    let mut world = NetWorld::default();
    let mut sim = Simulator::default();
    let lan = build_office_lan(&mut world, 2);

    let dst = world.net.ipconfig(lan.hosts[1]).expect("host")[0].addr;
    world.net.ping(lan.hosts[0], dst, &mut sim).expect("ping command");

    sim.run_until(Tick(1), &mut world);
    assert_eq!(
        world.net.ping_outcome(lan.hosts[0]).expect("host"),
        Some(PingOutcome::Pending)
    );

    sim.run(&mut world);
    assert_eq!(
        world.net.ping_outcome(lan.hosts[0]).expect("host"),
        Some(PingOutcome::Success)
    );
}

#[test]
fn ping_to_a_missing_host_times_out_with_an_error() {
    let mut world = NetWorld::default();
    let mut sim = Simulator::default();
    let lan = build_office_lan(&mut world, 2);

    world
        .net
        .ping(
            lan.hosts[0],
            "192.168.30.77".parse().expect("valid"),
            &mut sim,
        )
        .expect("ping command");
    sim.run(&mut world);

    assert_eq!(
        world.net.ping_outcome(lan.hosts[0]).expect("host"),
        Some(PingOutcome::Error)
    );
    // The timeout is bounded; nothing runs past it.
    assert!(sim.now() <= Tick(ICMP_TIMEOUT_TICKS));
}

#[test]
fn responder_answers_every_request() {
    let mut world = NetWorld::default();
    let mut sim = Simulator::default();
    let lan = build_office_lan(&mut world, 3);
    let dst = world.net.ipconfig(lan.hosts[2]).expect("host")[0].addr;

    for _ in 0..2 {
        world.net.ping(lan.hosts[0], dst, &mut sim).expect("ping command");
        sim.run(&mut world);
        assert_eq!(
            world.net.ping_outcome(lan.hosts[0]).expect("host"),
            Some(PingOutcome::Success)
        );
    }
    world.net.ping(lan.hosts[1], dst, &mut sim).expect("ping command");
    sim.run(&mut world);
    assert_eq!(
        world.net.ping_outcome(lan.hosts[1]).expect("host"),
        Some(PingOutcome::Success)
    );
}

#[test]
fn a_new_ping_replaces_the_previous_outcome() {
    let mut world = NetWorld::default();
    let mut sim = Simulator::default();
    let lan = build_office_lan(&mut world, 2);

    world
        .net
        .ping(
            lan.hosts[0],
            "192.168.30.77".parse().expect("valid"),
            &mut sim,
        )
        .expect("ping command");
    sim.run(&mut world);
    assert_eq!(
        world.net.ping_outcome(lan.hosts[0]).expect("host"),
        Some(PingOutcome::Error)
    );

    let dst = world.net.ipconfig(lan.hosts[1]).expect("host")[0].addr;
    world.net.ping(lan.hosts[0], dst, &mut sim).expect("ping command");
    sim.run(&mut world);
    assert_eq!(
        world.net.ping_outcome(lan.hosts[0]).expect("host"),
        Some(PingOutcome::Success)
    );
}
