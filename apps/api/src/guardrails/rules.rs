//! Per-user guardrail rule: the policy gating automated apply actions.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::guardrails::domain::{normalize_domain, DEFAULT_ALLOWED_APPLY_DOMAINS};
use crate::models::guardrail::GuardrailRuleRow;

pub const DEFAULT_DAILY_APPROVAL_LIMIT: i32 = 15;
pub const MAX_DAILY_APPROVAL_LIMIT: i32 = 500;
pub const MAX_ALLOWED_DOMAINS: usize = 50;

/// Fully-populated guardrail policy for one account. Created lazily with
/// defaults on first read, mutated only by an explicit update, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailRule {
    /// No queue item reaches an execution state without passing `approved`.
    pub require_approval: bool,
    /// Approvals record intent only; no external apply attempt is triggered.
    pub dry_run: bool,
    /// Max approvals per UTC calendar day. The quota guard floors this at 1.
    pub daily_approval_limit: i32,
    /// Empty means "use the system default list".
    pub allowed_domains: Vec<String>,
}

impl Default for GuardrailRule {
    fn default() -> Self {
        Self {
            require_approval: true,
            dry_run: true,
            daily_approval_limit: DEFAULT_DAILY_APPROVAL_LIMIT,
            allowed_domains: Vec::new(),
        }
    }
}

impl GuardrailRule {
    /// Decodes a persisted row into a fully-populated rule, applying the
    /// default for every absent field. `None` (no row yet) yields the
    /// all-defaults rule. This is the single place default policy lives.
    pub fn from_row_opt(row: Option<GuardrailRuleRow>) -> Self {
        let defaults = Self::default();
        match row {
            None => defaults,
            Some(row) => Self {
                require_approval: row.require_approval.unwrap_or(defaults.require_approval),
                dry_run: row.dry_run.unwrap_or(defaults.dry_run),
                daily_approval_limit: row
                    .daily_approval_limit
                    .unwrap_or(defaults.daily_approval_limit),
                allowed_domains: row.allowed_domains.unwrap_or_default(),
            },
        }
    }

    /// The allowlist actually enforced: the user's configured domains, or the
    /// baked-in job-board defaults when none are configured.
    pub fn effective_allowlist(&self) -> Vec<String> {
        if self.allowed_domains.is_empty() {
            DEFAULT_ALLOWED_APPLY_DOMAINS
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            self.allowed_domains.clone()
        }
    }

    /// Validates a rule submitted over HTTP before it is persisted.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0..=MAX_DAILY_APPROVAL_LIMIT).contains(&self.daily_approval_limit) {
            return Err(AppError::Validation(format!(
                "dailyApprovalLimit must be between 0 and {MAX_DAILY_APPROVAL_LIMIT}"
            )));
        }
        if self.allowed_domains.len() > MAX_ALLOWED_DOMAINS {
            return Err(AppError::Validation(format!(
                "allowedDomains may list at most {MAX_ALLOWED_DOMAINS} entries"
            )));
        }
        for entry in &self.allowed_domains {
            if normalize_domain(entry).is_empty() {
                return Err(AppError::Validation(format!(
                    "allowedDomains entry '{entry}' is not a valid domain"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_missing_row_yields_defaults() {
        let rule = GuardrailRule::from_row_opt(None);
        assert!(rule.require_approval);
        assert!(rule.dry_run);
        assert_eq!(rule.daily_approval_limit, 15);
        assert!(rule.allowed_domains.is_empty());
    }

    #[test]
    fn test_partial_row_fills_gaps_with_defaults() {
        let row = GuardrailRuleRow {
            user_id: Uuid::new_v4(),
            require_approval: Some(false),
            dry_run: None,
            daily_approval_limit: Some(3),
            allowed_domains: None,
            updated_at: Utc::now(),
        };
        let rule = GuardrailRule::from_row_opt(Some(row));
        assert!(!rule.require_approval);
        assert!(rule.dry_run); // default kept
        assert_eq!(rule.daily_approval_limit, 3);
        assert!(rule.allowed_domains.is_empty());
    }

    #[test]
    fn test_empty_allowlist_falls_back_to_system_defaults() {
        let rule = GuardrailRule::default();
        let effective = rule.effective_allowlist();
        assert!(effective.contains(&"greenhouse.io".to_string()));
        assert_eq!(effective.len(), 6);
    }

    #[test]
    fn test_configured_allowlist_overrides_defaults() {
        let rule = GuardrailRule {
            allowed_domains: vec!["lever.co".to_string()],
            ..Default::default()
        };
        assert_eq!(rule.effective_allowlist(), vec!["lever.co".to_string()]);
    }

    #[test]
    fn test_validate_rejects_out_of_range_limit() {
        let rule = GuardrailRule {
            daily_approval_limit: 501,
            ..Default::default()
        };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_garbage_domain() {
        let rule = GuardrailRule {
            allowed_domains: vec!["???".to_string()],
            ..Default::default()
        };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(GuardrailRule::default().validate().is_ok());
    }
}
