use clap::Parser;
use netlab_rs::net::{NetWorld, NodeKind};
use netlab_rs::sim::{Pacer, Simulator};
use netlab_rs::topo::build_office_lan;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "lan-ping",
    about = "Ping between hosts on a single-switch office LAN"
)]
struct Args {
    /// Number of hosts on the switch
    #[arg(long, default_value_t = 2)]
    hosts: usize,

    /// Ticks to run after issuing the ping
    #[arg(long, default_value_t = 60)]
    ticks: u64,

    /// Real-time interval between ticks in ms (0 = run unpaced)
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,

    /// Load the topology from a snapshot instead of building it
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write the topology snapshot to this file before exiting
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();

    let hosts = if let Some(path) = &args.load {
        let raw = fs::read_to_string(path).expect("read topology snapshot");
        let snapshot = serde_json::from_str(&raw).expect("parse topology snapshot");
        world.net.load(&snapshot).expect("load topology snapshot");
        world.net.nodes_of_kind(NodeKind::Host)
    } else {
        build_office_lan(&mut world, args.hosts).hosts
    };
    assert!(hosts.len() >= 2, "need at least two hosts to ping");

    let (src, dst) = (hosts[0], hosts[1]);
    let dst_ip = world.net.ipconfig(dst).expect("host has interfaces")[0].addr;
    world.net.ping(src, dst_ip, &mut sim).expect("ping command");

    let pacer = Pacer::new(args.interval_ms);
    pacer.run_for(&mut sim, &mut world, args.ticks);

    for report in world.net.ipconfig(src).expect("host has interfaces") {
        println!(
            "{}: mac {} addr {} mask {} gw {} dns {}",
            report.name,
            report.mac,
            report.addr,
            report.mask,
            report.gw.map(|a| a.to_string()).unwrap_or_default(),
            report.dns.map(|a| a.to_string()).unwrap_or_default(),
        );
    }
    let outcome = world.net.ping_outcome(src).expect("src is a host");
    println!("ping {dst_ip}: {outcome:?}");
    println!(
        "frames delivered={} dropped={}",
        world.net.stats.frames_delivered, world.net.stats.frames_dropped
    );

    if let Some(path) = &args.save {
        let snapshot = world.net.save();
        let json = serde_json::to_string_pretty(&snapshot).expect("serialize snapshot");
        fs::write(path, json).expect("write topology snapshot");
        eprintln!("wrote topology to {}", path.display());
    }
}
