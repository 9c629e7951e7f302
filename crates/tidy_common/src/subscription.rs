//! Plan-tier resolution against a billing provider.
//!
//! The provider is an external collaborator keyed by e-mail. This module only
//! owns the policy: bypass identities, price-id to tier mapping, and the
//! FREE fallback when no active subscription exists.

use crate::config::SubscriptionConfig;
use crate::error::{Result, TidyError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlanTier::Free => "FREE",
            PlanTier::Pro => "PRO",
            PlanTier::Enterprise => "ENTERPRISE",
        };
        f.write_str(s)
    }
}

/// What the provider knows about a paying customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSubscription {
    pub price_id: String,
    pub status: String,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionState {
    pub subscribed: bool,
    pub plan: PlanTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bypass: bool,
}

impl SubscriptionState {
    fn free() -> Self {
        Self {
            subscribed: false,
            plan: PlanTier::Free,
            status: None,
            current_period_end: None,
            bypass: false,
        }
    }
}

pub trait BillingProvider {
    /// `None` when there is no customer or no active subscription
    fn active_subscription(&self, email: &str) -> Result<Option<ActiveSubscription>>;
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionPolicy {
    bypass_emails: Vec<String>,
    pro_price_ids: Vec<String>,
    enterprise_price_ids: Vec<String>,
}

impl SubscriptionPolicy {
    pub fn from_config(config: &SubscriptionConfig) -> Self {
        Self {
            bypass_emails: config
                .bypass_emails
                .iter()
                .map(|e| e.trim().to_ascii_lowercase())
                .collect(),
            pro_price_ids: config.pro_price_ids.clone(),
            enterprise_price_ids: config.enterprise_price_ids.clone(),
        }
    }

    pub fn is_bypass(&self, email: &str) -> bool {
        let email = email.trim().to_ascii_lowercase();
        self.bypass_emails.iter().any(|e| *e == email)
    }

    pub fn tier_for_price(&self, price_id: &str) -> PlanTier {
        if self.enterprise_price_ids.iter().any(|p| p == price_id) {
            PlanTier::Enterprise
        } else if self.pro_price_ids.iter().any(|p| p == price_id) {
            PlanTier::Pro
        } else {
            PlanTier::Free
        }
    }

    pub fn check<P: BillingProvider + ?Sized>(
        &self,
        email: &str,
        provider: &P,
    ) -> Result<SubscriptionState> {
        if email.trim().is_empty() {
            return Err(TidyError::Billing("Missing e-mail".to_string()));
        }

        if self.is_bypass(email) {
            info!("Bypass identity {}: ENTERPRISE granted", email);
            return Ok(SubscriptionState {
                subscribed: true,
                plan: PlanTier::Enterprise,
                status: Some("active".to_string()),
                current_period_end: None,
                bypass: true,
            });
        }

        let Some(active) = provider.active_subscription(email)? else {
            debug!("No active subscription for {}", email);
            return Ok(SubscriptionState::free());
        };

        let plan = self.tier_for_price(&active.price_id);
        info!("Subscription for {}: {} ({})", email, plan, active.status);
        Ok(SubscriptionState {
            subscribed: true,
            plan,
            status: Some(active.status),
            current_period_end: active.current_period_end,
            bypass: false,
        })
    }
}

/// Offline provider backed by a JSON object of `email -> subscription`
#[derive(Debug, Clone, Default)]
pub struct StaticBilling {
    records: HashMap<String, ActiveSubscription>,
}

impl StaticBilling {
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: HashMap<String, ActiveSubscription> = serde_json::from_str(content)?;
        let records = raw
            .into_iter()
            .map(|(email, sub)| (email.trim().to_ascii_lowercase(), sub))
            .collect();
        Ok(Self { records })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl BillingProvider for StaticBilling {
    fn active_subscription(&self, email: &str) -> Result<Option<ActiveSubscription>> {
        let key = email.trim().to_ascii_lowercase();
        Ok(self
            .records
            .get(&key)
            .filter(|sub| sub.status == "active")
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingProvider {
        calls: Cell<usize>,
        answer: Option<ActiveSubscription>,
    }

    impl BillingProvider for CountingProvider {
        fn active_subscription(&self, _email: &str) -> Result<Option<ActiveSubscription>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.answer.clone())
        }
    }

    struct BrokenProvider;

    impl BillingProvider for BrokenProvider {
        fn active_subscription(&self, _email: &str) -> Result<Option<ActiveSubscription>> {
            Err(TidyError::Billing("provider unreachable".to_string()))
        }
    }

    fn policy() -> SubscriptionPolicy {
        SubscriptionPolicy::from_config(&SubscriptionConfig {
            bypass_emails: vec!["Owner@Example.com".to_string()],
            pro_price_ids: vec!["price_pro".to_string()],
            enterprise_price_ids: vec!["price_ent".to_string()],
        })
    }

    fn active(price: &str) -> ActiveSubscription {
        ActiveSubscription {
            price_id: price.to_string(),
            status: "active".to_string(),
            current_period_end: None,
        }
    }

    #[test]
    fn test_bypass_skips_provider() {
        let provider = CountingProvider { calls: Cell::new(0), answer: None };
        let state = policy().check(" owner@example.com", &provider).unwrap();
        assert_eq!(state.plan, PlanTier::Enterprise);
        assert!(state.subscribed);
        assert!(state.bypass);
        assert_eq!(state.status.as_deref(), Some("active"));
        assert_eq!(provider.calls.get(), 0);
    }

    #[test]
    fn test_no_subscription_is_free() {
        let provider = CountingProvider { calls: Cell::new(0), answer: None };
        let state = policy().check("user@example.com", &provider).unwrap();
        assert_eq!(state.plan, PlanTier::Free);
        assert!(!state.subscribed);
        assert_eq!(provider.calls.get(), 1);
    }

    #[test]
    fn test_price_mapping() {
        let p = policy();
        assert_eq!(p.tier_for_price("price_pro"), PlanTier::Pro);
        assert_eq!(p.tier_for_price("price_ent"), PlanTier::Enterprise);
        assert_eq!(p.tier_for_price("price_legacy"), PlanTier::Free);

        let provider = CountingProvider { calls: Cell::new(0), answer: Some(active("price_pro")) };
        let state = p.check("user@example.com", &provider).unwrap();
        assert_eq!(state.plan, PlanTier::Pro);
        assert!(state.subscribed);
    }

    #[test]
    fn test_provider_error_propagates() {
        let err = policy().check("user@example.com", &BrokenProvider).unwrap_err();
        assert!(matches!(err, TidyError::Billing(_)));
    }

    #[test]
    fn test_missing_email_rejected() {
        assert!(policy().check("  ", &BrokenProvider).is_err());
    }

    #[test]
    fn test_static_billing_file() {
        let billing = StaticBilling::from_json(
            r#"{
                "Pro@Example.com": {"price_id": "price_pro", "status": "active"},
                "lapsed@example.com": {"price_id": "price_ent", "status": "canceled"}
            }"#,
        )
        .unwrap();
        let p = policy();
        assert_eq!(p.check("pro@example.com", &billing).unwrap().plan, PlanTier::Pro);
        assert_eq!(p.check("lapsed@example.com", &billing).unwrap().plan, PlanTier::Free);
        assert_eq!(p.check("nobody@example.com", &billing).unwrap().plan, PlanTier::Free);
    }

    #[test]
    fn test_plan_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&PlanTier::Enterprise).unwrap(), "\"ENTERPRISE\"");
        assert_eq!(PlanTier::Pro.to_string(), "PRO");
    }
}
