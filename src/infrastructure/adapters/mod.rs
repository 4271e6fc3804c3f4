//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod player;
pub mod resolver;

pub use player::*;
pub use resolver::*;
