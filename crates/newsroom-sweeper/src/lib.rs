//! `newsroom-sweeper` — delayed-publication sweeper.
//!
//! A recurring background task that promotes Draft articles to Published
//! once their scheduled time has elapsed. Each sweep is one
//! query-then-bulk-update-then-emit pass:
//!
//! 1. ask the store for all drafts with `publish_at <= now`,
//! 2. transition the whole set in a single atomic bulk update,
//! 3. announce the batch over the event broadcaster.
//!
//! Sweeps are serialized — the loop awaits each sweep before taking the next
//! tick — and store failures are absorbed: the fixed cadence is the retry
//! mechanism, so a failed cycle simply publishes nothing and the next tick
//! tries again.

pub mod sweeper;

pub use sweeper::PublicationSweeper;
