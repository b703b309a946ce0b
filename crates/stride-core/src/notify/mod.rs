//! Motivational notifications: when to send, which message, and delivery.

pub mod messages;
pub mod planner;
pub mod policy;
pub mod sink;

pub use messages::{MessageFamily, MessageKind, MotivationalMessage, DEFAULT_MESSAGE};
pub use planner::{BehaviorSource, Notification, NotificationPlanner, Plan, TickOutcome};
pub use policy::{NoSendReason, NotificationPolicy, PlannedSend};
pub use sink::{LogSink, NotificationSink};
