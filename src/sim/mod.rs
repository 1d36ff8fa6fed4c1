//! 仿真核心模块
//!
//! 此模块包含事件驱动仿真的核心组件，如仿真时钟（tick）、事件、定时器、世界和仿真器。

// 子模块声明
mod event;
mod pacer;
mod scheduled_event;
mod simulator;
mod tick;
mod world;

// 重新导出公共接口
pub use event::Event;
pub use pacer::Pacer;
pub use scheduled_event::ScheduledEvent;
pub use simulator::{Simulator, TimerCallback, TimerId};
pub use tick::Tick;
pub use world::World;
