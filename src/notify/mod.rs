//! Notification feeds and the event-driven dispatcher.

pub mod dispatcher;
pub mod notification;

pub use dispatcher::NotificationDispatcher;
pub use notification::{FEED_CAP, Notification, NotificationFeed, NotificationKind};
