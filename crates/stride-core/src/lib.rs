//! # Stride Core Library
//!
//! Task tracking that keeps working when its backing store does not, plus the
//! analytics built on top of completed work: daily history, streaks,
//! behaviour patterns, team statistics and adaptive notifications.
//!
//! ## Features
//!
//! - **Offline tolerance**: every write goes to the remote document store
//!   first; the first failure switches the session to an in-memory mirror for
//!   the rest of its life, without losing the write
//! - **Completion history**: one counter per calendar day and owner, in the
//!   user's IANA time zone
//! - **Streaks and insights**: current/longest streaks and hour/weekday
//!   activity patterns
//! - **Team statistics**: recomputed snapshots after every team task change
//! - **Adaptive notifications**: send windows, message families and delivery
//!   through a pluggable sink
//!
//! ## Core Modules
//!
//! - [`session`]: Wiring of stores, mirrors, history and clock for one client
//! - [`store`]: Write-through task store with local fallback
//! - [`remote`]: Document store boundary plus SQLite and in-memory adapters
//! - [`history`] and [`streak`]: Daily completion counters and streaks
//! - [`behavior`]: Behaviour pattern analysis
//! - [`stats`] and [`team`]: Team statistics and the team workspace
//! - [`notify`]: Notification policy, planner and sinks
//! - [`error`] and [`diagnostics`]: Errors and non-fatal events
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use stride_core::{
//!     models::{NewTaskData, TaskPriority, TaskStatus},
//!     session::Session,
//!     settings::SessionSettings,
//!     store::TaskRepository,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), stride_core::error::CoreError> {
//!     let settings = SessionSettings {
//!         user_id: "ana".to_string(),
//!         ..Default::default()
//!     };
//!     let session = Session::open(settings, "stride.db").await?;
//!     let tasks = session.tasks();
//!     tasks.refresh().await?;
//!
//!     let task = tasks
//!         .add(NewTaskData {
//!             title: "Buy milk".to_string(),
//!             priority: Some(TaskPriority::Low),
//!             ..Default::default()
//!         })
//!         .await?;
//!     tasks.set_status(&task.id, TaskStatus::Completed).await?;
//!
//!     let history = tasks.history_window(14);
//!     let today = session.calendar().local_date(session.clock().now());
//!     println!("streak: {}", stride_core::streak::current_streak(&history, today));
//!     Ok(())
//! }
//! ```

pub mod behavior;
pub mod clock;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod history;
pub mod models;
pub mod notify;
pub mod remote;
pub mod session;
pub mod settings;
pub mod stats;
pub mod store;
pub mod streak;
pub mod team;

#[cfg(any(test, feature = "demo-data"))]
pub mod dev;
