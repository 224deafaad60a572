//! Watermark holds and the watermark manager interface.

mod holds;
mod manager;

pub use holds::{HoldChange, KeyedHolds};
pub use manager::{InMemoryWatermarkManager, WatermarkManager};

#[cfg(test)]
pub use manager::MockWatermarkManager;
