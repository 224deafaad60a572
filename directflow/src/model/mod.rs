//! Value types shared by the engine: time, windows, keys, elements,
//! transforms and bundles.

mod bundle;
mod element;
mod time;
mod transform;
mod window;

pub use bundle::{BundleFactory, CommittedBundle, UncommittedBundle};
pub use element::{Key, WindowedValue};
pub use time::{EventTime, ProcessingTime};
pub use transform::{AppliedTransform, TransformId};
pub use window::BoundedWindow;
