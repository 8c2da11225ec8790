//! Domain events and the realtime change feed.

pub mod bus;
pub mod change_feed;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use change_feed::{ChangeEvent, ChangeKind, Originated, is_self_originated};
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
