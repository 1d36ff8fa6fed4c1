//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前 tick、事件队列与可取消的定时器。

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::tick::Tick;
use super::world::World;
use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, info, trace};

/// 定时器标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// 定时器回调。触发时获得仿真器与世界的可变引用。
pub type TimerCallback = Box<dyn FnOnce(&mut Simulator, &mut dyn World) + Send>;

/// 事件驱动仿真器：维护当前时间、事件队列与定时器表。
#[derive(Default)]
pub struct Simulator {
    now: Tick,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    next_timer: u64,
    armed: HashMap<TimerId, TimerCallback>,
}

/// 事件：定时器到期。回调仍在 `armed` 表中才会执行，
/// 已取消/已触发的定时器弹出时为 no-op。
struct TimerFire {
    id: TimerId,
}

impl Event for TimerFire {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        if let Some(cb) = sim.armed.remove(&self.id) {
            trace!(timer = ?self.id, now = ?sim.now, "定时器触发");
            cb(sim, world);
        } else {
            trace!(timer = ?self.id, "定时器已取消，忽略");
        }
    }
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> Tick {
        self.now
    }

    /// 调度事件在指定时刻执行
    pub fn schedule<E: Event>(&mut self, at: Tick, ev: E) {
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, at = ?at, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });

        debug!(queue_size = self.q.len(), "事件已加入队列");
    }

    /// 注册定时器：`after` 个 tick 后触发回调，返回可用于取消的标识符。
    pub fn set_timer(&mut self, after: u64, cb: TimerCallback) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer = self.next_timer.wrapping_add(1);
        self.armed.insert(id, cb);
        let at = self.now.after(after);
        self.schedule(at, TimerFire { id });
        debug!(timer = ?id, at = ?at, "注册定时器");
        id
    }

    /// 取消定时器。已触发或未知的定时器取消为 no-op。
    pub fn cancel_timer(&mut self, id: TimerId) {
        if self.armed.remove(&id).is_some() {
            debug!(timer = ?id, "取消定时器");
        }
    }

    /// 当前仍未触发的定时器数量（测试用）。
    pub fn armed_timers(&self) -> usize {
        self.armed.len()
    }

    /// 运行直到事件队列为空或到达 `until`。
    pub fn run_until(&mut self, until: Tick, world: &mut dyn World) {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let item = self.q.pop().expect("peek then pop");
            self.now = item.at;
            item.ev.execute(self, world);
            world.on_tick(self);
        }
        self.now = self.now.max(until);
    }

    /// 运行所有事件直到队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let mut event_count = 0;
        while let Some(item) = self.q.pop() {
            event_count += 1;
            self.now = item.at;

            debug!(
                event_num = event_count,
                now = ?self.now,
                scheduled_at = ?item.at,
                seq = item.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );

            item.ev.execute(self, world);
            world.on_tick(self);
        }

        info!(
            total_events = event_count,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
    }
}
