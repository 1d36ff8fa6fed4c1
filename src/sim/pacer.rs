//! 实时节拍器
//!
//! 以可配置的真实时间间隔驱动仿真器逐 tick 前进，支持暂停/继续。
//! 间隔为 0 时不等待（测试、批处理场景）。

use super::simulator::Simulator;
use super::world::World;
use std::time::Duration;
use tracing::debug;

/// 按真实时间间隔驱动仿真时钟。
pub struct Pacer {
    interval: Duration,
    paused: bool,
}

impl Pacer {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            paused: false,
        }
    }

    pub fn set_interval_ms(&mut self, ms: u64) {
        self.interval = Duration::from_millis(ms);
    }

    pub fn pause(&mut self) {
        debug!("暂停仿真时钟");
        self.paused = true;
    }

    pub fn play(&mut self) {
        debug!("继续仿真时钟");
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// 无条件推进一个 tick（处理该时刻及之前的全部事件）。
    pub fn step(&self, sim: &mut Simulator, world: &mut dyn World) {
        sim.run_until(sim.now().after(1), world);
    }

    /// 推进 `ticks` 个 tick。暂停时不推进；每个 tick 之间等待配置的间隔。
    pub fn run_for(&self, sim: &mut Simulator, world: &mut dyn World, ticks: u64) {
        let mut remaining = ticks;
        while remaining > 0 {
            if !self.paused {
                self.step(sim, world);
                remaining -= 1;
            }
            if !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            } else if self.paused {
                // 间隔为 0 且暂停时直接返回，避免空转。
                return;
            }
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(0)
    }
}
