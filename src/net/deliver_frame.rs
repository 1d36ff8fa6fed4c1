//! 帧交付事件
//!
//! 链路传输完成后，把帧交给远端端口所属的节点。

use super::id::{LinkId, PortRef};
use super::net_world::NetWorld;
use crate::proto::Frame;
use crate::sim::{Event, Simulator, World};
use tracing::debug;

/// 事件：链路上的帧到达远端端口。
#[derive(Debug)]
pub struct DeliverFrame {
    pub link: LinkId,
    pub to: PortRef,
    pub frame: Frame,
}

impl Event for DeliverFrame {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverFrame { link, to, frame } = *self;
        debug!(link = ?link, to = ?to, frame = %frame, "📨 帧到达事件执行");

        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.deliver(link, to, frame, sim);
    }
}
