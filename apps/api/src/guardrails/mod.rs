//! Automation guardrails for the job copilot's auto-apply feature.
//!
//! Every agent-style action — queueing a job, approving it — passes through
//! this module: domain allowlisting, the per-day approval quota, dry-run and
//! manual-approval flags, and an append-only activity log of every decision.

pub mod activity;
pub mod day_window;
pub mod domain;
pub mod handlers;
pub mod queue;
pub mod quota;
pub mod rules;
pub mod store;
