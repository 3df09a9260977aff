//! vStack notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub for [`Notification`]s,
//!   backed by `tokio::sync::broadcast`.
//! - [`NotificationInbox`]: background subscriber that keeps the recent
//!   notifications of each user so they can be fetched over HTTP.

pub mod bus;
pub mod inbox;

pub use bus::{EventBus, Notification};
pub use inbox::NotificationInbox;
