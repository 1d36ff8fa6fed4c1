use clap::Parser;
use netlab_rs::net::NetWorld;
use netlab_rs::sim::{Pacer, Simulator};
use netlab_rs::topo::build_routed_site;

#[derive(Debug, Parser)]
#[command(
    name = "router-nat",
    about = "DHCP lease plus NAT'd ping through a router into the cloud"
)]
struct Args {
    /// Request a DHCP lease on the LAN host before pinging
    #[arg(long)]
    dhcp: bool,

    /// Ticks to run for each phase
    #[arg(long, default_value_t = 60)]
    ticks: u64,

    /// Real-time interval between ticks in ms (0 = run unpaced)
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,
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
    let pacer = Pacer::new(args.interval_ms);

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();
    let site = build_routed_site(&mut world);

    if args.dhcp {
        world
            .net
            .request_lease(site.host, &mut sim)
            .expect("lease command");
        pacer.run_for(&mut sim, &mut world, args.ticks);
    }

    let wan_ip = world.net.ipconfig(site.wan_host).expect("wan host has interfaces")[0].addr;
    world
        .net
        .ping(site.host, wan_ip, &mut sim)
        .expect("ping command");
    pacer.run_for(&mut sim, &mut world, args.ticks);

    for report in world.net.ipconfig(site.host).expect("host has interfaces") {
        println!(
            "{}: addr {} mask {} gw {}",
            report.name,
            report.addr,
            report.mask,
            report.gw.map(|a| a.to_string()).unwrap_or_default(),
        );
    }
    let outcome = world.net.ping_outcome(site.host).expect("lan host");
    println!("ping {wan_ip}: {outcome:?}");
    let router = world.net.router(site.router).expect("router exists");
    println!("nat entries after reply: {}", router.nat().len());
}
