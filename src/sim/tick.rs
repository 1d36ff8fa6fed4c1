//! 仿真时间类型
//!
//! 定义离散仿真时钟。一个 tick 是仿真推进的最小时间单位。

/// 仿真时间（tick 数）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// 当前时刻之后 `n` 个 tick 的时刻。
    pub fn after(self, n: u64) -> Tick {
        Tick(self.0.saturating_add(n))
    }
}
