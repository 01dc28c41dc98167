pub mod item;
mod legacy;
pub mod store;

pub use item::{ConnectorRecord, Item, ItemKind, Period, Progress};
pub use store::{ChangeEvent, ChartMode, ItemStore};
