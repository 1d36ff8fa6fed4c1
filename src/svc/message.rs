//! Plain text message service: the simplest possible application on top of
//! the IPv4 layer, mostly useful to watch traffic flow in the UI.

use super::{Service, ServiceId, ServiceRequest};
use crate::net::{NetStack, Network};
use crate::proto::{Ipv4Addr, Ipv4Packet};
use crate::sim::Simulator;
use std::any::Any;
use tracing::{info, warn};

/// A delivered message, kept in the receiving node's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub from: Ipv4Addr,
    pub text: String,
}

#[derive(Default)]
pub struct MessageService {
    inbox: Vec<ReceivedMessage>,
}

impl MessageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inbox(&self) -> &[ReceivedMessage] {
        &self.inbox
    }

    pub fn send(
        &mut self,
        dst: Ipv4Addr,
        text: String,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        info!(node = %stack.name(), dst = %dst, "send message");
        let src = stack.default_iface().config.addr;
        let pkt = Ipv4Packet::new(src, dst, ServiceId::Message, text);
        stack.send_packet(pkt, sim, net);
    }
}

impl Service for MessageService {
    fn id(&self) -> ServiceId {
        ServiceId::Message
    }

    fn send_request(
        &mut self,
        req: ServiceRequest,
        stack: &mut NetStack,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        match req {
            ServiceRequest::Message { dst, text } => self.send(dst, text, stack, sim, net),
            other => warn!(node = %stack.name(), req = ?other, "message service cannot handle this request"),
        }
    }

    fn handle_packet(
        &mut self,
        pkt: Ipv4Packet,
        stack: &mut NetStack,
        _sim: &mut Simulator,
        _net: &mut Network,
    ) {
        info!(node = %stack.name(), from = %pkt.src, text = %pkt.payload, "received message");
        self.inbox.push(ReceivedMessage {
            from: pkt.src,
            text: pkt.payload,
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
