pub mod builder;
pub mod dispatch;
pub mod filter;
pub mod resolver;
pub mod router;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use builder::NotificationEventBuilder;
pub use dispatch::{NoopDispatcher, NotificationDispatcher, PublisherDispatcher};
pub use filter::ContentTypeFilter;
pub use resolver::ContentGraphResolver;
pub use router::{Delivery, SignalReport, SignalRouter};
