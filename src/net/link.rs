//! 链路类型
//!
//! 链路连接两个不同节点的端口，无方向；传输时把内部端点顺序规范化为
//! “发送端在前”，并以一个 tick 模拟传播时延。

use super::deliver_frame::DeliverFrame;
use super::id::{LinkId, NodeId, PortRef};
use crate::proto::Frame;
use crate::sim::Simulator;
use tracing::{debug, warn};

/// 网络链路
#[derive(Debug)]
pub struct Link {
    pub id: LinkId,
    a: PortRef,
    b: PortRef,
    /// 有帧在途时为 true（UI/调试用）。
    pub active: bool,
    /// 最近一次传输的帧（UI/调试用）。
    pub last_frame: Option<Frame>,
}

impl Link {
    pub fn new(id: LinkId, a: PortRef, b: PortRef) -> Self {
        Self {
            id,
            a,
            b,
            active: false,
            last_frame: None,
        }
    }

    pub fn endpoints(&self) -> (PortRef, PortRef) {
        (self.a, self.b)
    }

    /// 链路是否触及指定节点。
    pub fn touches(&self, node: NodeId) -> bool {
        self.a.node == node || self.b.node == node
    }

    /// 给定一端，返回另一端。
    pub fn peer_of(&self, port: PortRef) -> Option<PortRef> {
        if port == self.a {
            Some(self.b)
        } else if port == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    /// 从 `origin` 端发送一帧：规范化端点顺序、标记活跃、记录帧，
    /// 并调度一个 tick 之后在远端交付。
    pub fn transfer(&mut self, origin: PortRef, frame: Frame, sim: &mut Simulator) {
        if origin == self.b {
            std::mem::swap(&mut self.a, &mut self.b);
        }
        if origin != self.a {
            warn!(link = ?self.id, origin = ?origin, "transfer from a port not on this link, frame dropped");
            return;
        }
        let dest = self.b;
        debug!(link = ?self.id, frame = %frame, dest = ?dest, "🔗 链路开始传输");
        self.active = true;
        self.last_frame = Some(frame.clone());
        sim.schedule(
            sim.now().after(1),
            DeliverFrame {
                link: self.id,
                to: dest,
                frame,
            },
        );
    }
}
