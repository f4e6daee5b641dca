//! rent ledger calculations: which months a tenant owes, which months can
//! be paid in advance, and the money total for a selection.

use crate::decimal::Money;
use crate::errors::{Result, SettlementError};
use crate::types::{Fee, MonthToken, TenantFinancials};

/// `count` consecutive months a tenant may pay ahead of schedule.
///
/// Starts the month after the latest due month, or at `current_month`
/// when nothing is due. The result is strictly increasing and never
/// overlaps `due_months`.
pub fn compute_advance_months(
    due_months: &[MonthToken],
    count: usize,
    current_month: MonthToken,
) -> Vec<MonthToken> {
    let mut next = match due_months.iter().max() {
        Some(latest) => latest.succ(),
        None => current_month,
    };

    let mut months = Vec::with_capacity(count);
    for _ in 0..count {
        months.push(next);
        next = next.succ();
    }
    months
}

/// exact total for a month selection plus ad-hoc fees:
/// `selected.len() * standard_rent + sum(fees)`
pub fn compute_total(selected: &[MonthToken], standard_rent: Money, fees: &[Fee]) -> Result<Money> {
    if selected.is_empty() {
        return Err(SettlementError::EmptyMonthSelection);
    }
    if !standard_rent.is_positive() {
        return Err(SettlementError::InvalidConfiguration {
            message: format!("standard rent must be positive, got {standard_rent}"),
        });
    }
    for fee in fees {
        if fee.label.trim().is_empty() {
            return Err(SettlementError::InvalidFee {
                message: "fee label is empty".to_string(),
            });
        }
        if !fee.amount.is_positive() {
            return Err(SettlementError::InvalidFee {
                message: format!("fee '{}' has non-positive amount {}", fee.label, fee.amount),
            });
        }
    }

    let fee_total: Money = fees.iter().map(|f| f.amount).sum();
    Ok(standard_rent.times(selected.len() as u32) + fee_total)
}

/// per-tenant view of owed and payable months, derived fresh for each
/// payment flow and discarded with it
#[derive(Debug, Clone, PartialEq)]
pub struct RentLedger {
    tenant_id: String,
    standard_rent: Money,
    due_months: Vec<MonthToken>,
    advance_months: Vec<MonthToken>,
}

impl RentLedger {
    /// build a ledger from the lease collaborator's record
    ///
    /// Due months are sorted and deduplicated; advance months are derived
    /// so the disjointness invariant holds by construction.
    pub fn from_financials(
        financials: &TenantFinancials,
        current_month: MonthToken,
        advance_count: usize,
    ) -> Result<Self> {
        if !financials.standard_rent.is_positive() {
            return Err(SettlementError::InvalidConfiguration {
                message: format!(
                    "standard rent must be positive, got {}",
                    financials.standard_rent
                ),
            });
        }

        let mut due_months = financials.due_months.clone();
        due_months.sort();
        due_months.dedup();

        let advance_months = compute_advance_months(&due_months, advance_count, current_month);

        Ok(Self {
            tenant_id: financials.tenant_id.clone(),
            standard_rent: financials.standard_rent,
            due_months,
            advance_months,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn standard_rent(&self) -> Money {
        self.standard_rent
    }

    pub fn due_months(&self) -> &[MonthToken] {
        &self.due_months
    }

    pub fn advance_months(&self) -> &[MonthToken] {
        &self.advance_months
    }

    /// whether a month may be selected for payment
    pub fn contains(&self, month: MonthToken) -> bool {
        self.due_months.contains(&month) || self.advance_months.contains(&month)
    }

    /// validate a selection and total it with the tenant's standard rent
    pub fn total_for(&self, selected: &[MonthToken], fees: &[Fee]) -> Result<Money> {
        let mut seen: Vec<MonthToken> = Vec::with_capacity(selected.len());
        for month in selected {
            if !self.contains(*month) {
                return Err(SettlementError::UnknownMonth {
                    month: month.to_string(),
                });
            }
            if seen.contains(month) {
                return Err(SettlementError::DuplicateMonth {
                    month: month.to_string(),
                });
            }
            seen.push(*month);
        }
        compute_total(selected, self.standard_rent, fees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year: i32, m: u32) -> MonthToken {
        MonthToken::new(year, m).unwrap()
    }

    fn financials(due: Vec<MonthToken>) -> TenantFinancials {
        TenantFinancials {
            tenant_id: "T-001".to_string(),
            standard_rent: Money::from_major(2500),
            deposit_amount: Money::from_major(2500),
            current_balance: Money::ZERO,
            due_months: due,
        }
    }

    #[test]
    fn test_advance_months_follow_latest_due() {
        let due = vec![month(2024, 3), month(2024, 4)];
        let advance = compute_advance_months(&due, 3, month(2024, 8));
        assert_eq!(
            advance,
            vec![month(2024, 5), month(2024, 6), month(2024, 7)]
        );
    }

    #[test]
    fn test_advance_months_start_current_when_nothing_due() {
        let advance = compute_advance_months(&[], 2, month(2024, 11));
        assert_eq!(advance, vec![month(2024, 11), month(2024, 12)]);
    }

    #[test]
    fn test_advance_months_cross_year_boundary() {
        let due = vec![month(2024, 11), month(2024, 12)];
        let advance = compute_advance_months(&due, 3, month(2025, 1));
        assert_eq!(
            advance,
            vec![month(2025, 1), month(2025, 2), month(2025, 3)]
        );
    }

    #[test]
    fn test_advance_months_properties() {
        let due = vec![month(2024, 2), month(2024, 5)];
        let advance = compute_advance_months(&due, 6, month(2024, 1));
        assert_eq!(advance.len(), 6);
        for pair in advance.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for m in &advance {
            assert!(!due.contains(m));
        }
    }

    #[test]
    fn test_total_two_months_plus_late_fee() {
        let selected = vec![month(2024, 5), month(2024, 6)];
        let fees = vec![Fee::new("late fee", Money::from_major(150))];
        let total = compute_total(&selected, Money::from_major(2500), &fees).unwrap();
        assert_eq!(total, Money::from_major(5150));
    }

    #[test]
    fn test_total_with_fractional_fee() {
        use rust_decimal_macros::dec;

        let selected = vec![month(2024, 5)];
        let fees = vec![Fee::new("meter top-up", Money::from_decimal(dec!(75.25)))];
        let total = compute_total(&selected, Money::from_major(2500), &fees).unwrap();
        assert_eq!(total, Money::from_decimal(dec!(2575.25)));
    }

    #[test]
    fn test_total_rejects_empty_selection() {
        let result = compute_total(&[], Money::from_major(2500), &[]);
        assert_eq!(result, Err(SettlementError::EmptyMonthSelection));
    }

    #[test]
    fn test_total_rejects_bad_fees() {
        let selected = vec![month(2024, 5)];

        let unlabeled = vec![Fee::new("  ", Money::from_major(10))];
        assert!(matches!(
            compute_total(&selected, Money::from_major(2500), &unlabeled),
            Err(SettlementError::InvalidFee { .. })
        ));

        let worthless = vec![Fee::new("cleanup", Money::ZERO)];
        assert!(matches!(
            compute_total(&selected, Money::from_major(2500), &worthless),
            Err(SettlementError::InvalidFee { .. })
        ));
    }

    #[test]
    fn test_ledger_construction_sorts_and_dedups() {
        let fin = financials(vec![month(2024, 4), month(2024, 3), month(2024, 4)]);
        let ledger = RentLedger::from_financials(&fin, month(2024, 8), 3).unwrap();
        assert_eq!(ledger.due_months(), &[month(2024, 3), month(2024, 4)]);
        assert_eq!(
            ledger.advance_months(),
            &[month(2024, 5), month(2024, 6), month(2024, 7)]
        );
    }

    #[test]
    fn test_ledger_rejects_non_positive_rent() {
        let mut fin = financials(vec![]);
        fin.standard_rent = Money::ZERO;
        assert!(matches!(
            RentLedger::from_financials(&fin, month(2024, 8), 3),
            Err(SettlementError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_ledger_total_rejects_unknown_month() {
        let fin = financials(vec![month(2024, 3)]);
        let ledger = RentLedger::from_financials(&fin, month(2024, 8), 2).unwrap();
        let result = ledger.total_for(&[month(2030, 1)], &[]);
        assert!(matches!(result, Err(SettlementError::UnknownMonth { .. })));
    }

    #[test]
    fn test_ledger_total_rejects_duplicate_month() {
        let fin = financials(vec![month(2024, 3)]);
        let ledger = RentLedger::from_financials(&fin, month(2024, 8), 2).unwrap();
        let result = ledger.total_for(&[month(2024, 3), month(2024, 3)], &[]);
        assert!(matches!(result, Err(SettlementError::DuplicateMonth { .. })));
    }
}
