//! Worker tasks that back the runtime orchestration.
//!
//! Each room runs in its own [`RoomWorker`]; the manager only holds handles.

mod room;

pub use room::{Command, RoomWorker};
