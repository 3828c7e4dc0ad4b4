pub mod memory;
pub mod topics;

pub use memory::{InMemoryBus, PublishedMessage};
pub use topics::{Topics, ROBOT_INFORMATION};

use anyhow::Result;

use crate::types::OutboundMessage;

/// Outbound side of the messaging transport.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, message: &OutboundMessage) -> Result<()>;
}
