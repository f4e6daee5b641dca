//! security-deposit settlement: ordered deductions against a fixed
//! deposit, a non-negative remainder invariant, and a draft/preview/
//! processed lifecycle ending in an immutable refund record.

use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{Result, SettlementError};
use crate::events::{Event, EventStore};
use crate::repository::{SettlementStore, TenantDirectory};
use crate::types::{
    CaseId, CaseStatus, Deduction, DeductionCategory, RecipientDetails, RefundMethod,
    SettlementRecord,
};

/// one deposit settlement action for a tenant, usually at move-out
pub struct DepositCase {
    id: CaseId,
    tenant_id: String,
    deposit_amount: Money,
    reason: String,
    deductions: Vec<Deduction>,
    refund_method: Option<RefundMethod>,
    recipient: Option<RecipientDetails>,
    status: CaseStatus,
    record: Option<SettlementRecord>,
    events: EventStore,
}

impl DepositCase {
    /// open a settlement case against a fixed, positive deposit
    pub fn open(
        tenant_id: impl Into<String>,
        deposit_amount: Money,
        reason: impl Into<String>,
        time: &SafeTimeProvider,
    ) -> Result<Self> {
        if !deposit_amount.is_positive() {
            return Err(SettlementError::InvalidConfiguration {
                message: format!("deposit must be positive, got {deposit_amount}"),
            });
        }

        let id = Uuid::new_v4();
        let tenant_id = tenant_id.into();
        let mut events = EventStore::new();
        events.emit(Event::CaseOpened {
            case_id: id,
            tenant_id: tenant_id.clone(),
            deposit: deposit_amount,
            timestamp: time.now(),
        });

        Ok(Self {
            id,
            tenant_id,
            deposit_amount,
            reason: reason.into(),
            deductions: Vec::new(),
            refund_method: None,
            recipient: None,
            status: CaseStatus::Draft,
            record: None,
            events,
        })
    }

    pub fn id(&self) -> CaseId {
        self.id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn deposit_amount(&self) -> Money {
        self.deposit_amount
    }

    pub fn status(&self) -> CaseStatus {
        self.status
    }

    pub fn deductions(&self) -> &[Deduction] {
        &self.deductions
    }

    pub fn refund_method(&self) -> Option<RefundMethod> {
        self.refund_method
    }

    /// the settlement record, present only once `Processed`
    pub fn record(&self) -> Option<&SettlementRecord> {
        self.record.as_ref()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// total deducted so far
    pub fn deducted(&self) -> Money {
        self.deductions.iter().map(|d| d.amount).sum()
    }

    /// refundable remainder; never negative for an accepted history
    pub fn remaining(&self) -> Money {
        self.deposit_amount - self.deducted()
    }

    fn expect_status(&self, expected: CaseStatus) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(SettlementError::InvalidState {
                current: format!("{:?}", self.status),
                expected: format!("{expected:?}"),
            })
        }
    }

    /// append a deduction; the case is unchanged on any rejection
    pub fn add_deduction(
        &mut self,
        category: DeductionCategory,
        description: impl Into<String>,
        amount: Money,
    ) -> Result<Money> {
        self.expect_status(CaseStatus::Draft)?;

        let description = description.into();
        if description.trim().is_empty() {
            return Err(SettlementError::InvalidDeduction {
                message: "description is empty".to_string(),
            });
        }
        if !amount.is_positive() {
            return Err(SettlementError::InvalidDeduction {
                message: format!("amount must be positive, got {amount}"),
            });
        }

        let deducted = self.deducted();
        if deducted + amount > self.deposit_amount {
            return Err(SettlementError::OverDeduction {
                deposit: self.deposit_amount,
                deducted,
                requested: amount,
            });
        }

        self.deductions.push(Deduction {
            category,
            description,
            amount,
        });
        let remaining = self.remaining();
        self.events.emit(Event::DeductionAdded {
            case_id: self.id,
            category,
            amount,
            remaining,
        });
        Ok(remaining)
    }

    /// remove a deduction by position; only ever raises the remainder
    pub fn remove_deduction(&mut self, index: usize) -> Result<Deduction> {
        self.expect_status(CaseStatus::Draft)?;
        if index >= self.deductions.len() {
            return Err(SettlementError::DeductionNotFound { index });
        }

        let removed = self.deductions.remove(index);
        self.events.emit(Event::DeductionRemoved {
            case_id: self.id,
            index,
            amount: removed.amount,
            remaining: self.remaining(),
        });
        Ok(removed)
    }

    /// choose how the remainder is refunded; editable until processed
    pub fn set_refund_method(
        &mut self,
        method: RefundMethod,
        recipient: Option<RecipientDetails>,
    ) -> Result<()> {
        if self.status == CaseStatus::Processed {
            return Err(SettlementError::InvalidState {
                current: "Processed".to_string(),
                expected: "Draft or Preview".to_string(),
            });
        }
        self.refund_method = Some(method);
        self.recipient = recipient;
        Ok(())
    }

    /// freeze deduction edits for review
    pub fn move_to_preview(&mut self, time: &SafeTimeProvider) -> Result<()> {
        self.expect_status(CaseStatus::Draft)?;
        self.set_status(CaseStatus::Preview, time);
        Ok(())
    }

    /// reopen for editing; entered deductions are preserved
    pub fn back_to_draft(&mut self, time: &SafeTimeProvider) -> Result<()> {
        self.expect_status(CaseStatus::Preview)?;
        self.set_status(CaseStatus::Draft, time);
        Ok(())
    }

    fn set_status(&mut self, new_status: CaseStatus, time: &SafeTimeProvider) {
        let old_status = self.status;
        self.status = new_status;
        self.events.emit(Event::CaseStatusChanged {
            case_id: self.id,
            old_status,
            new_status,
            timestamp: time.now(),
        });
    }

    /// finalize the settlement
    ///
    /// Preview-only; non-cash refunds need complete recipient details.
    /// On success the case is `Processed` and the record is handed to
    /// the store and the move-out marker, in that order, exactly once.
    pub fn process(
        &mut self,
        store: &mut dyn SettlementStore,
        directory: &mut dyn TenantDirectory,
        time: &SafeTimeProvider,
    ) -> Result<&SettlementRecord> {
        self.expect_status(CaseStatus::Preview)?;

        let method = self
            .refund_method
            .ok_or(SettlementError::MissingRefundMethod)?;
        if method.requires_recipient_details()
            && !self.recipient.as_ref().is_some_and(|r| r.is_complete())
        {
            return Err(SettlementError::MissingRecipientDetails { method });
        }

        let reference = format!("DS-{}", Uuid::new_v4().simple());
        let record = SettlementRecord {
            case_id: self.id,
            tenant_id: self.tenant_id.clone(),
            amount: self.remaining(),
            reason: self.reason.clone(),
            deductions: self.deductions.clone(),
            refund_method: method,
            recipient: self.recipient.clone(),
            reference: reference.clone(),
            processing_date: time.now(),
        };

        self.set_status(CaseStatus::Processed, time);
        self.events.emit(Event::CaseProcessed {
            case_id: self.id,
            refund_amount: record.amount,
            refund_method: method,
            reference,
            timestamp: record.processing_date,
        });

        store.record_settlement(&record);
        directory.mark_moved_out(&self.tenant_id);

        Ok(self.record.insert(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryPortal;
    use crate::types::{SettlementRecord, TenantFinancials, TransactionRecord};
    use chrono::Utc;
    use hourglass_rs::TimeSource;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc::now()))
    }

    fn open_case(deposit: i64) -> DepositCase {
        DepositCase::open("T-001", Money::from_major(deposit), "move-out", &test_time()).unwrap()
    }

    fn bank_recipient() -> RecipientDetails {
        RecipientDetails {
            name: "Ama Mensah".to_string(),
            phone: None,
            account_number: Some("0011223344".to_string()),
        }
    }

    #[test]
    fn test_deductions_reduce_remaining() {
        let mut case = open_case(2500);

        let remaining = case
            .add_deduction(
                DeductionCategory::UnpaidRent,
                "March shortfall",
                Money::from_major(500),
            )
            .unwrap();
        assert_eq!(remaining, Money::from_major(2000));

        let remaining = case
            .add_deduction(
                DeductionCategory::Damages,
                "wall repair",
                Money::from_major(300),
            )
            .unwrap();
        assert_eq!(remaining, Money::from_major(1700));
        assert_eq!(case.deductions().len(), 2);
    }

    #[test]
    fn test_over_deduction_rejected_without_mutation() {
        let mut case = open_case(2500);

        let result = case.add_deduction(
            DeductionCategory::Damages,
            "full renovation",
            Money::from_major(2600),
        );
        assert_eq!(
            result,
            Err(SettlementError::OverDeduction {
                deposit: Money::from_major(2500),
                deducted: Money::ZERO,
                requested: Money::from_major(2600),
            })
        );
        assert_eq!(case.remaining(), Money::from_major(2500));
        assert!(case.deductions().is_empty());
    }

    #[test]
    fn test_over_deduction_counts_existing() {
        let mut case = open_case(2500);
        case.add_deduction(DeductionCategory::UnpaidRent, "arrears", Money::from_major(2400))
            .unwrap();

        let result = case.add_deduction(
            DeductionCategory::Cleaning,
            "deep clean",
            Money::from_major(200),
        );
        assert!(matches!(result, Err(SettlementError::OverDeduction { .. })));
        assert_eq!(case.remaining(), Money::from_major(100));
        assert_eq!(case.deductions().len(), 1);

        // exactly exhausting the deposit is allowed
        case.add_deduction(DeductionCategory::Cleaning, "deep clean", Money::from_major(100))
            .unwrap();
        assert_eq!(case.remaining(), Money::ZERO);
    }

    #[test]
    fn test_invalid_deduction_rejected_without_mutation() {
        let mut case = open_case(2500);

        assert!(matches!(
            case.add_deduction(DeductionCategory::Other, "  ", Money::from_major(10)),
            Err(SettlementError::InvalidDeduction { .. })
        ));
        assert!(matches!(
            case.add_deduction(DeductionCategory::Other, "negative", Money::ZERO - Money::ONE),
            Err(SettlementError::InvalidDeduction { .. })
        ));
        assert!(case.deductions().is_empty());
    }

    #[test]
    fn test_remove_deduction_restores_remaining() {
        let mut case = open_case(2500);
        case.add_deduction(DeductionCategory::UnpaidRent, "arrears", Money::from_major(500))
            .unwrap();
        case.add_deduction(DeductionCategory::Damages, "door", Money::from_major(300))
            .unwrap();

        let removed = case.remove_deduction(0).unwrap();
        assert_eq!(removed.amount, Money::from_major(500));
        assert_eq!(case.remaining(), Money::from_major(2200));

        assert_eq!(
            case.remove_deduction(5),
            Err(SettlementError::DeductionNotFound { index: 5 })
        );
    }

    #[test]
    fn test_invariant_holds_across_history() {
        let mut case = open_case(1000);
        let steps: Vec<(i64, bool)> = vec![(400, true), (700, false), (600, true), (1, false)];

        for (amount, should_accept) in steps {
            let result = case.add_deduction(
                DeductionCategory::Other,
                "charge",
                Money::from_major(amount),
            );
            assert_eq!(result.is_ok(), should_accept);
            assert!(case.deducted() <= case.deposit_amount());
            assert!(!case.remaining().is_negative());
        }
    }

    #[test]
    fn test_preview_freezes_edits() {
        let time = test_time();
        let mut case = open_case(2500);
        case.add_deduction(DeductionCategory::Damages, "door", Money::from_major(300))
            .unwrap();
        case.move_to_preview(&time).unwrap();

        assert!(matches!(
            case.add_deduction(DeductionCategory::Other, "late", Money::from_major(10)),
            Err(SettlementError::InvalidState { .. })
        ));
        assert!(matches!(
            case.remove_deduction(0),
            Err(SettlementError::InvalidState { .. })
        ));

        // reopening preserves what was entered
        case.back_to_draft(&time).unwrap();
        assert_eq!(case.deductions().len(), 1);
        case.add_deduction(DeductionCategory::Other, "late fee", Money::from_major(10))
            .unwrap();
    }

    #[test]
    fn test_process_requires_preview() {
        let time = test_time();
        let mut case = open_case(2500);
        case.set_refund_method(RefundMethod::Cash, None).unwrap();

        let mut store = InMemoryPortal::new();
        let mut directory = InMemoryPortal::new();
        let result = case.process(&mut store, &mut directory, &time);
        assert!(matches!(result, Err(SettlementError::InvalidState { .. })));
        assert_eq!(case.status(), CaseStatus::Draft);
    }

    #[test]
    fn test_process_requires_recipient_for_bank_transfer() {
        let time = test_time();
        let mut case = open_case(2500);
        case.set_refund_method(
            RefundMethod::BankTransfer,
            Some(RecipientDetails {
                name: "Ama Mensah".to_string(),
                phone: None,
                account_number: None, // missing
            }),
        )
        .unwrap();
        case.move_to_preview(&time).unwrap();

        let mut store = InMemoryPortal::new();
        let mut directory = InMemoryPortal::new();
        let result = case.process(&mut store, &mut directory, &time);
        assert_eq!(
            result.unwrap_err(),
            SettlementError::MissingRecipientDetails {
                method: RefundMethod::BankTransfer
            }
        );
        assert_eq!(case.status(), CaseStatus::Preview);
        assert!(store.settlements().is_empty());
        assert!(directory.moved_out().is_empty());
    }

    #[test]
    fn test_cash_refund_needs_no_recipient() {
        let time = test_time();
        let mut case = open_case(2500);
        case.add_deduction(DeductionCategory::Damages, "door", Money::from_major(300))
            .unwrap();
        case.set_refund_method(RefundMethod::Cash, None).unwrap();
        case.move_to_preview(&time).unwrap();

        let mut store = InMemoryPortal::new();
        let mut directory = InMemoryPortal::new();
        let record = case.process(&mut store, &mut directory, &time).unwrap();
        assert_eq!(record.amount, Money::from_major(2200));
        assert_eq!(record.refund_method, RefundMethod::Cash);
        assert_eq!(case.status(), CaseStatus::Processed);
    }

    #[test]
    fn test_process_hands_off_in_order_exactly_once() {
        use std::cell::RefCell;
        use std::rc::Rc;

        // both collaborators append to one log, so the relative order
        // of the calls across the two traits is observable
        struct HandoffLog {
            calls: Rc<RefCell<Vec<&'static str>>>,
        }
        impl SettlementStore for HandoffLog {
            fn record_transaction(&mut self, _record: &TransactionRecord) {
                self.calls.borrow_mut().push("record_transaction");
            }
            fn record_settlement(&mut self, _record: &SettlementRecord) {
                self.calls.borrow_mut().push("record_settlement");
            }
        }
        impl TenantDirectory for HandoffLog {
            fn tenant_financials(&self, _tenant_id: &str) -> Option<TenantFinancials> {
                None
            }
            fn mark_moved_out(&mut self, _tenant_id: &str) {
                self.calls.borrow_mut().push("mark_moved_out");
            }
        }

        let time = test_time();
        let mut case = open_case(2500);
        case.set_refund_method(RefundMethod::MobileMoney, Some(bank_recipient()))
            .unwrap();
        case.move_to_preview(&time).unwrap();

        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut store = HandoffLog {
            calls: Rc::clone(&calls),
        };
        let mut directory = HandoffLog {
            calls: Rc::clone(&calls),
        };
        case.process(&mut store, &mut directory, &time).unwrap();

        assert_eq!(*calls.borrow(), ["record_settlement", "mark_moved_out"]);

        // processed is terminal; a second process is rejected
        let result = case.process(&mut store, &mut directory, &time);
        assert!(matches!(result, Err(SettlementError::InvalidState { .. })));
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_record_snapshot_is_complete() {
        let time = test_time();
        let mut case = open_case(2500);
        case.add_deduction(DeductionCategory::UnpaidRent, "March shortfall", Money::from_major(500))
            .unwrap();
        case.set_refund_method(RefundMethod::BankTransfer, Some(bank_recipient()))
            .unwrap();
        case.move_to_preview(&time).unwrap();

        let mut store = InMemoryPortal::new();
        let mut directory = InMemoryPortal::new();
        let record = case.process(&mut store, &mut directory, &time).unwrap().clone();

        assert_eq!(record.tenant_id, "T-001");
        assert_eq!(record.amount, Money::from_major(2000));
        assert_eq!(record.reason, "move-out");
        assert_eq!(record.deductions.len(), 1);
        assert!(record.reference.starts_with("DS-"));
        assert_eq!(record.processing_date, time.now());
        assert_eq!(store.settlements(), &[record]);
        assert_eq!(directory.moved_out(), &["T-001".to_string()]);
    }
}
