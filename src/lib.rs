//! Gamification core for a habit/goal-tracking app: accounting periods,
//! points with streak multipliers, streak counters, badge evaluation, and the
//! completion ledger that ties them together behind an atomic store write.
//!
//! The crate is UI- and transport-free. The surrounding application supplies
//! a [`store::LedgerStore`] (Postgres adapter included, in-memory reference
//! for tests/embedding) and drives two calls per user action:
//!
//! ```no_run
//! # async fn demo() -> resolution_core::CoreResult<()> {
//! use resolution_core::catalog::BadgeCatalog;
//! use resolution_core::clock::SystemClock;
//! use resolution_core::services::{BadgeEvaluator, CompletionLedger};
//! use resolution_core::store::{MemoryStore, UserStatsStore};
//! # let (user_id, goal_id) = (uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
//!
//! let catalog = BadgeCatalog::builtin();
//! let ledger = CompletionLedger::new(MemoryStore::new(), SystemClock);
//!
//! let outcome = ledger.complete(user_id, goal_id).await?;
//! println!("+{} points, streak {}", outcome.points_earned, outcome.new_streak);
//!
//! // Badge evaluation runs against refreshed stats, outside the ledger write.
//! let stats = ledger.store().user_stats(user_id).await?;
//! let unlocked = BadgeEvaluator::new(&catalog)
//!     .award_new(ledger.store(), &stats, chrono::Utc::now())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod clock;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{CoreResult, Error};
