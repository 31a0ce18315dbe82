//! Dashboard statistics derived from the policy collection

use crate::policy::{InsurancePolicy, PolicyType};
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::Serialize;

/// Look-ahead used for "upcoming renewal"
pub const RENEWAL_WINDOW_DAYS: i64 = 30;

/// Count and annualized premium for one policy type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeBreakdown {
    pub policy_type: PolicyType,
    pub count: usize,
    pub annual_premium: f64,
}

/// Summary statistics for a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioStats {
    pub total_policies: usize,
    /// Sum of every premium normalized to a yearly amount
    pub annual_premium: f64,
    /// Active policies expiring within the renewal window
    pub upcoming_renewals: usize,
    /// Per-type totals, in `PolicyType::ALL` order, types with no policies omitted
    pub by_type: Vec<TypeBreakdown>,
}

/// Total of all premiums normalized to a yearly amount
pub fn annual_premium_total(policies: &[InsurancePolicy]) -> f64 {
    policies.iter().map(InsurancePolicy::annual_premium).sum()
}

/// Midnight UTC at the start of the policy's end date
fn expiry_instant(policy: &InsurancePolicy) -> DateTime<Utc> {
    Utc.from_utc_datetime(&policy.end_date.and_time(NaiveTime::MIN))
}

/// Whether an active policy expires after `now` and no later than 30 days out
pub fn is_upcoming_renewal(policy: &InsurancePolicy, now: DateTime<Utc>) -> bool {
    let expiry = expiry_instant(policy);
    let horizon = now + Duration::days(RENEWAL_WINDOW_DAYS);
    policy.is_active() && expiry > now && expiry <= horizon
}

pub fn upcoming_renewals<'a>(
    policies: &'a [InsurancePolicy],
    now: DateTime<Utc>,
) -> impl Iterator<Item = &'a InsurancePolicy> + 'a {
    policies.iter().filter(move |p| is_upcoming_renewal(p, now))
}

/// Compute the dashboard statistics as of `now`
pub fn compute_stats(policies: &[InsurancePolicy], now: DateTime<Utc>) -> PortfolioStats {
    let by_type = PolicyType::ALL
        .iter()
        .filter_map(|&policy_type| {
            let matching: Vec<&InsurancePolicy> =
                policies.iter().filter(|p| p.policy_type == policy_type).collect();
            if matching.is_empty() {
                return None;
            }
            Some(TypeBreakdown {
                policy_type,
                count: matching.len(),
                annual_premium: matching.iter().map(|p| p.annual_premium()).sum(),
            })
        })
        .collect();

    PortfolioStats {
        total_policies: policies.len(),
        annual_premium: annual_premium_total(policies),
        upcoming_renewals: upcoming_renewals(policies, now).count(),
        by_type,
    }
}

/// Format an amount as US dollars with thousands separators, e.g. `$12,345.60`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, frac)
}
