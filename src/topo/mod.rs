//! 常用拓扑构建
//!
//! 提供测试与示例程序使用的小型拓扑。

mod lan;

pub use lan::{OfficeLan, RoutedSite, build_office_lan, build_routed_site};
