pub mod connector;
pub mod drag;
pub mod geometry;
pub mod layout;
pub mod pool;
pub mod scale;

pub use connector::{ConnectorKey, ConnectorType, Orientation, Route};
pub use drag::{Commit, DragEngine, DragOutcome, DragSession, GestureKind, RangeField};
pub use geometry::{Anchor, BarKind, BarOptions, ElementOptions, Position, Size};
pub use layout::{ConnectorShape, HitRegion, LayoutParams, TimelineLayout};
pub use pool::{Bar, BarPool};
pub use scale::TimeScale;
