pub mod error;
pub mod notify;
pub mod types;

pub use error::{CoreError, Result};
pub use notify::{EmailNotification, QueueMessage};
pub use types::{EventId, EventStatus, TicketId, TicketTypeId, UserId};
