//! Daily approval quota decision.

/// True when `current_approvals` has exhausted the daily limit. The limit is
/// floored at 1, so a misconfigured limit of 0 or below still blocks after
/// the first approval instead of disabling the guard.
///
/// Pure decision function; the caller computes `current_approvals` by
/// counting approved items with `updated_at` inside today's day window.
pub fn approvals_limit_reached(current_approvals: i64, daily_limit: i32) -> bool {
    current_approvals >= i64::from(daily_limit.max(1))
}
