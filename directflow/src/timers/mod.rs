//! Per-key timer bookkeeping.

mod table;

pub use table::TimerTable;
