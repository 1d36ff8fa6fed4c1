//! ICMP echo service: ping client state machine plus the responder side.

use super::{Service, ServiceId, ServiceRequest};
use crate::net::{NetStack, NetWorld, Network};
use crate::sim::{Simulator, TimerId};
use crate::proto::{Ipv4Addr, Ipv4Packet};
use std::any::Any;
use tracing::{info, warn};

/// Ticks before an unanswered echo request is reported as an error. Budget
/// for two ARP resolutions plus transit on a NAT'd path.
pub const ICMP_TIMEOUT_TICKS: u64 = 20;

const ECHO_REQUEST: &str = "icmp-echo-request";
const ECHO_REPLY: &str = "icmp-echo-reply";

/// Result of the most recent `ping` on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
    Pending,
    Success,
    Error,
}

/// Echo client + responder. The responder answers every request
/// unconditionally; the client tracks exactly one outstanding ping.
pub struct IcmpService {
    outcome: Option<PingOutcome>,
    timer: Option<TimerId>,
}

impl IcmpService {
    pub fn new() -> Self {
        Self {
            outcome: None,
            timer: None,
        }
    }

    pub fn outcome(&self) -> Option<PingOutcome> {
        self.outcome
    }

    /// Send an echo request and arm the timeout timer.
    pub fn ping(
        &mut self,
        dst: Ipv4Addr,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        if let Some(timer) = self.timer.take() {
            sim.cancel_timer(timer);
        }
        info!(node = %stack.name(), dst = %dst, "send ping request");
        self.outcome = Some(PingOutcome::Pending);

        let node_id = stack.id();
        self.timer = Some(sim.set_timer(
            ICMP_TIMEOUT_TICKS,
            Box::new(move |sim, world| {
                let w = world
                    .as_any_mut()
                    .downcast_mut::<NetWorld>()
                    .expect("world must be NetWorld");
                w.net.with_node(node_id, sim, |node, _sim, _net| {
                    let Some(stack) = node.stack_mut() else { return };
                    let Some(svc) = stack.service_as_mut::<IcmpService>(ServiceId::Icmp) else {
                        return;
                    };
                    if svc.outcome == Some(PingOutcome::Pending) {
                        warn!("ping timed out");
                        svc.outcome = Some(PingOutcome::Error);
                        svc.timer = None;
                    }
                });
            }),
        ));

        let src = stack.default_iface().config.addr;
        let pkt = Ipv4Packet::new(src, dst, ServiceId::Icmp, ECHO_REQUEST);
        stack.send_packet(pkt, sim, net);
    }

    /// Reply from the address the request was sent to, so multi-interface
    /// nodes answer out of the right side.
    fn send_reply(
        &self,
        to: Ipv4Addr,
        requested: Ipv4Addr,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        info!(node = %stack.name(), dst = %to, "send ping reply");
        let src = if stack.iface_by_ip(requested).is_some() {
            requested
        } else {
            stack.default_iface().config.addr
        };
        let pkt = Ipv4Packet::new(src, to, ServiceId::Icmp, ECHO_REPLY);
        stack.send_packet(pkt, sim, net);
    }
}

impl Default for IcmpService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for IcmpService {
    fn id(&self) -> ServiceId {
        ServiceId::Icmp
    }

    fn send_request(
        &mut self,
        req: ServiceRequest,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        match req {
            ServiceRequest::Ping(dst) => self.ping(dst, stack, sim, net),
            other => warn!(node = %stack.name(), req = ?other, "icmp cannot handle this request"),
        }
    }

    fn handle_packet(
        &mut self,
        pkt: Ipv4Packet,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        match pkt.payload.as_str() {
            ECHO_REQUEST => {
                info!(node = %stack.name(), from = %pkt.src, "received ping request");
                self.send_reply(pkt.src, pkt.dst, stack, sim, net);
            }
            ECHO_REPLY => {
                info!(node = %stack.name(), from = %pkt.src, "received ping reply");
                if self.outcome == Some(PingOutcome::Pending) {
                    self.outcome = Some(PingOutcome::Success);
                }
                if let Some(timer) = self.timer.take() {
                    sim.cancel_timer(timer);
                }
            }
            _ => warn!(node = %stack.name(), "not a valid icmp payload, dropped"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
