//! serializable views of sessions and cases for host snapshots

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::deposit::DepositCase;
use crate::session::PaymentSession;
use crate::types::{
    CaseId, CaseStatus, Deduction, Fee, MonthToken, PaymentMethod, RefundMethod, SessionId,
};

/// read-model of an in-flight payment session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub id: SessionId,
    pub tenant_id: String,
    pub state: String,
    pub selected_months: Vec<MonthToken>,
    pub additional_fees: Vec<Fee>,
    pub total: Money,
    pub method: Option<PaymentMethod>,
    pub failure_reason: Option<String>,
}

impl SessionView {
    pub fn from_session(session: &PaymentSession) -> Self {
        SessionView {
            id: session.id(),
            tenant_id: session.ledger().tenant_id().to_string(),
            state: session.state().name().to_string(),
            selected_months: session.selected_months().to_vec(),
            additional_fees: session.additional_fees().to_vec(),
            total: session.total(),
            method: session.method(),
            failure_reason: session.failure_reason().map(str::to_string),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// read-model of a deposit settlement case
#[derive(Debug, Serialize, Deserialize)]
pub struct CaseView {
    pub id: CaseId,
    pub tenant_id: String,
    pub status: CaseStatus,
    pub deposit_amount: Money,
    pub deductions: Vec<Deduction>,
    pub deducted: Money,
    pub remaining: Money,
    pub refund_method: Option<RefundMethod>,
}

impl CaseView {
    pub fn from_case(case: &DepositCase) -> Self {
        CaseView {
            id: case.id(),
            tenant_id: case.tenant_id().to_string(),
            status: case.status(),
            deposit_amount: case.deposit_amount(),
            deductions: case.deductions().to_vec(),
            deducted: case.deducted(),
            remaining: case.remaining(),
            refund_method: case.refund_method(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::ledger::RentLedger;
    use crate::types::{DeductionCategory, TenantFinancials};
    use chrono::Utc;
    use hourglass_rs::{SafeTimeProvider, TimeSource};

    #[test]
    fn test_session_view_round_trips() {
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let financials = TenantFinancials {
            tenant_id: "T-001".to_string(),
            standard_rent: Money::from_major(2500),
            deposit_amount: Money::from_major(2500),
            current_balance: Money::ZERO,
            due_months: vec![MonthToken::new(2024, 3).unwrap()],
        };
        let ledger =
            RentLedger::from_financials(&financials, MonthToken::new(2024, 8).unwrap(), 3).unwrap();
        let mut session = PaymentSession::open(ledger, SessionConfig::default(), &time);
        session
            .select_months(vec![MonthToken::new(2024, 3).unwrap()], vec![])
            .unwrap();

        let view = SessionView::from_session(&session);
        let json = view.to_json_pretty().unwrap();
        let back: SessionView = serde_json::from_str(&json).unwrap();
        assert_eq!(back.state, "MethodSelection");
        assert_eq!(back.total, Money::from_major(2500));
        assert_eq!(back.selected_months, view.selected_months);
    }

    #[test]
    fn test_case_view_reports_remaining() {
        let time = SafeTimeProvider::new(TimeSource::Test(Utc::now()));
        let mut case =
            DepositCase::open("T-001", Money::from_major(2500), "move-out", &time).unwrap();
        case.add_deduction(DeductionCategory::Damages, "wall repair", Money::from_major(300))
            .unwrap();

        let view = CaseView::from_case(&case);
        assert_eq!(view.deducted, Money::from_major(300));
        assert_eq!(view.remaining, Money::from_major(2200));

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"remaining\""));
    }
}
