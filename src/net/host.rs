//! Host node: one or more interfaces, the standard service set and the
//! command surface used by the terminal collaborator.

use super::iface::IfaceReport;
use super::id::NodeId;
use super::network::Network;
use super::stack::NetStack;
use super::style::NodeStyle;
use crate::proto::{Frame, Ipv4Addr, MacAddr};
use crate::sim::Simulator;
use crate::svc::{
    DhcpClient, IcmpService, MessageService, PingOutcome, ReceivedMessage, Service, ServiceId,
    ServiceRequest,
};

pub struct Host {
    pub(crate) stack: NetStack,
    pub style: NodeStyle,
}

impl Host {
    /// A fresh host with one interface `eth0` and the standard services
    /// (ICMP responder, DHCP client, message) registered.
    pub fn new(id: NodeId, name: impl Into<String>, mac: MacAddr) -> Self {
        let mut stack = NetStack::new(id, name);
        stack.add_iface("eth0", mac);
        stack.register_service(Box::new(IcmpService::new()));
        stack.register_service(Box::new(DhcpClient::new()));
        stack.register_service(Box::new(MessageService::new()));
        Self {
            stack,
            style: NodeStyle::host(),
        }
    }

    pub fn stack(&self) -> &NetStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut NetStack {
        &mut self.stack
    }

    pub fn register_service(&mut self, service: Box<dyn Service>) {
        self.stack.register_service(service);
    }

    pub(crate) fn receive(
        &mut self,
        port: usize,
        frame: Frame,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        self.stack.receive_frame(port, frame, sim, net);
    }

    /* ---------- command surface ---------- */

    pub fn ping(&mut self, dst: Ipv4Addr, sim: &mut Simulator, net: &mut Network) {
        self.stack.with_service(
            ServiceId::Icmp,
            |svc, stack, sim, net| svc.send_request(ServiceRequest::Ping(dst), stack, sim, net),
            sim,
            net,
        );
    }

    /// Result of the most recent ping, `None` before the first one.
    pub fn ping_outcome(&mut self) -> Option<PingOutcome> {
        self.stack
            .service_as_mut::<IcmpService>(ServiceId::Icmp)
            .and_then(|svc| svc.outcome())
    }

    pub fn ipconfig(&self) -> Vec<IfaceReport> {
        self.stack.ipconfig()
    }

    /// Trigger a DHCP discover on the default interface.
    pub fn request_lease(&mut self, sim: &mut Simulator, net: &mut Network) {
        self.stack.with_service(
            ServiceId::DhcpClient,
            |svc, stack, sim, net| svc.send_request(ServiceRequest::DhcpDiscover, stack, sim, net),
            sim,
            net,
        );
    }

    pub fn send_message(
        &mut self,
        dst: Ipv4Addr,
        text: impl Into<String>,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let text = text.into();
        self.stack.with_service(
            ServiceId::Message,
            move |svc, stack, sim, net| {
                svc.send_request(ServiceRequest::Message { dst, text }, stack, sim, net)
            },
            sim,
            net,
        );
    }

    pub fn inbox(&mut self) -> Vec<ReceivedMessage> {
        self.stack
            .service_as_mut::<MessageService>(ServiceId::Message)
            .map(|svc| svc.inbox().to_vec())
            .unwrap_or_default()
    }
}
