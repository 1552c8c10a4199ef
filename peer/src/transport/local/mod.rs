//! In-process transport: every endpoint lives in one [`LocalHub`] and
//! packets move between them through memory. Used by tests and demos.

mod conditioner;
mod hub;
mod local_transport;

pub use conditioner::LinkConditionerConfig;
pub use hub::LocalHub;
pub use local_transport::LocalTransport;
