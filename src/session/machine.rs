use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::decimal::Money;
use crate::errors::{Result, SettlementError};
use crate::events::{Event, EventStore};
use crate::ledger::RentLedger;
use crate::repository::SettlementStore;
use crate::types::{Fee, MonthToken, PaymentMethod, SessionId, TransactionRecord};

use super::gateway::{ProviderGateway, PushOutcome, SettleOutcome};

/// payment session states, initial to terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// tenant picks months and fees
    AmountEntry,
    /// tenant picks mobile money or bank transfer
    MethodSelection,
    /// push sent (or sendable after a rejected attempt), awaiting the
    /// provider confirmation event
    MobileMoneyPushPending,
    /// provider confirmed, awaiting the auto-advance to verification
    MobileMoneyConfirmed,
    /// tenant enters the one-time code
    CodeVerification,
    /// tenant enters slip reference and proof of deposit
    BankDetailsEntry,
    /// total locked, settlement call in flight
    Settling,
    Success,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::AmountEntry => "AmountEntry",
            SessionState::MethodSelection => "MethodSelection",
            SessionState::MobileMoneyPushPending => "MobileMoneyPushPending",
            SessionState::MobileMoneyConfirmed => "MobileMoneyConfirmed",
            SessionState::CodeVerification => "CodeVerification",
            SessionState::BankDetailsEntry => "BankDetailsEntry",
            SessionState::Settling => "Settling",
            SessionState::Success => "Success",
            SessionState::Failed => "Failed",
            SessionState::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Success | SessionState::Failed | SessionState::Cancelled
        )
    }
}

/// handle for one outstanding provider wait
///
/// Issued when a push is accepted; back navigation, retry, and cancel
/// invalidate it, so a host timer firing late cannot touch a session
/// that has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushTicket {
    generation: u64,
}

/// one tenant-initiated payment attempt
///
/// Every user action is a method returning `Result`; on error the
/// session is left exactly as it was. The two provider waits are
/// delivered by the host as ticket-gated events.
pub struct PaymentSession {
    id: SessionId,
    ledger: RentLedger,
    config: SessionConfig,
    state: SessionState,

    selected_months: Vec<MonthToken>,
    additional_fees: Vec<Fee>,
    total: Money,

    method: Option<PaymentMethod>,
    phone: Option<String>,
    bank_reference: Option<String>,
    deposit_proof: Option<String>,

    expected_code: Option<String>,
    entered_code: Option<String>,
    code_attempts: u32,

    generation: u64,
    transaction: Option<TransactionRecord>,
    failure_reason: Option<String>,

    events: EventStore,
}

impl PaymentSession {
    /// open a session for one tenant ledger
    pub fn open(ledger: RentLedger, config: SessionConfig, time: &SafeTimeProvider) -> Self {
        let id = Uuid::new_v4();
        let mut events = EventStore::new();
        events.emit(Event::SessionOpened {
            session_id: id,
            tenant_id: ledger.tenant_id().to_string(),
            timestamp: time.now(),
        });

        Self {
            id,
            ledger,
            config,
            state: SessionState::AmountEntry,
            selected_months: Vec::new(),
            additional_fees: Vec::new(),
            total: Money::ZERO,
            method: None,
            phone: None,
            bank_reference: None,
            deposit_proof: None,
            expected_code: None,
            entered_code: None,
            code_attempts: 0,
            generation: 0,
            transaction: None,
            failure_reason: None,
            events,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ledger(&self) -> &RentLedger {
        &self.ledger
    }

    pub fn selected_months(&self) -> &[MonthToken] {
        &self.selected_months
    }

    pub fn additional_fees(&self) -> &[Fee] {
        &self.additional_fees
    }

    /// current total; recomputed on every mutation of the selection
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn bank_reference(&self) -> Option<&str> {
        self.bank_reference.as_deref()
    }

    pub fn deposit_proof(&self) -> Option<&str> {
        self.deposit_proof.as_deref()
    }

    /// the last code the tenant entered, if any
    pub fn entered_code(&self) -> Option<&str> {
        self.entered_code.as_deref()
    }

    /// the settled transaction, present only in `Success`
    pub fn transaction(&self) -> Option<&TransactionRecord> {
        self.transaction.as_ref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    fn expect_state(&self, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SettlementError::InvalidState {
                current: self.state.name().to_string(),
                expected: expected.name().to_string(),
            })
        }
    }

    fn current_ticket(&self) -> PushTicket {
        PushTicket {
            generation: self.generation,
        }
    }

    /// invalidate any outstanding provider wait
    fn invalidate_tickets(&mut self) {
        self.generation += 1;
    }

    /// select months and ad-hoc fees, fixing the payable total
    pub fn select_months(&mut self, months: Vec<MonthToken>, fees: Vec<Fee>) -> Result<()> {
        self.expect_state(SessionState::AmountEntry)?;

        let total = self.ledger.total_for(&months, &fees)?;
        if !total.is_positive() {
            return Err(SettlementError::InvalidAmount { amount: total });
        }

        let fee_total: Money = fees.iter().map(|f| f.amount).sum();
        self.selected_months = months;
        self.additional_fees = fees;
        self.total = total;
        self.state = SessionState::MethodSelection;

        self.events.emit(Event::MonthsSelected {
            session_id: self.id,
            months: self.selected_months.clone(),
            fee_total,
            total,
        });
        Ok(())
    }

    /// choose mobile money and attempt the authorization push
    ///
    /// The session enters `MobileMoneyPushPending` either way; a rejected
    /// push surfaces a retryable error and leaves it there.
    pub fn request_push(
        &mut self,
        phone: &str,
        gateway: &mut dyn ProviderGateway,
    ) -> Result<PushTicket> {
        self.expect_state(SessionState::MethodSelection)?;
        if !self.config.phone_is_valid(phone) {
            return Err(SettlementError::InvalidPhoneNumber {
                phone: phone.to_string(),
            });
        }

        self.method = Some(PaymentMethod::MobileMoney);
        self.phone = Some(phone.to_string());
        self.state = SessionState::MobileMoneyPushPending;
        self.events.emit(Event::MethodChosen {
            session_id: self.id,
            method: PaymentMethod::MobileMoney,
        });

        self.attempt_push(gateway)
    }

    /// retry a rejected push without re-entering the phone number
    pub fn retry_push(&mut self, gateway: &mut dyn ProviderGateway) -> Result<PushTicket> {
        self.expect_state(SessionState::MobileMoneyPushPending)?;
        self.attempt_push(gateway)
    }

    fn attempt_push(&mut self, gateway: &mut dyn ProviderGateway) -> Result<PushTicket> {
        let phone = self
            .phone
            .clone()
            .ok_or_else(|| SettlementError::InvalidState {
                current: self.state.name().to_string(),
                expected: "phone number captured".to_string(),
            })?;

        // a fresh attempt supersedes any earlier one
        self.invalidate_tickets();

        match gateway.request_push(&phone, self.total, &self.id.to_string()) {
            PushOutcome::Accepted { verification_code } => {
                self.expected_code = Some(verification_code);
                self.events.emit(Event::PushRequested {
                    session_id: self.id,
                    phone,
                    amount: self.total,
                });
                Ok(self.current_ticket())
            }
            PushOutcome::Rejected { reason } => {
                self.events.emit(Event::PushRejected {
                    session_id: self.id,
                    reason: reason.clone(),
                });
                Err(SettlementError::ProviderPushFailed { reason })
            }
        }
    }

    /// host-delivered provider confirmation event
    ///
    /// Returns `false` when the ticket is stale (the session navigated
    /// away before the event fired); the session is untouched.
    pub fn provider_confirmed(&mut self, ticket: PushTicket, time: &SafeTimeProvider) -> Result<bool> {
        if ticket != self.current_ticket() || self.state != SessionState::MobileMoneyPushPending {
            return Ok(false);
        }

        self.state = SessionState::MobileMoneyConfirmed;
        self.events.emit(Event::ProviderConfirmed {
            session_id: self.id,
            timestamp: time.now(),
        });
        Ok(true)
    }

    /// host-delivered auto-advance from confirmed to code entry
    pub fn advance_to_verification(&mut self, ticket: PushTicket) -> Result<bool> {
        if ticket != self.current_ticket() || self.state != SessionState::MobileMoneyConfirmed {
            return Ok(false);
        }

        self.state = SessionState::CodeVerification;
        Ok(true)
    }

    /// host-delivered expiry of the confirmation wait
    ///
    /// Only meaningful when the config bounds the wait; arming a timer
    /// without a configured timeout is a host bug.
    pub fn confirmation_timed_out(
        &mut self,
        ticket: PushTicket,
        time: &SafeTimeProvider,
    ) -> Result<bool> {
        if self.config.confirmation_timeout().is_none() {
            return Err(SettlementError::InvalidConfiguration {
                message: "confirmation timeout not configured".to_string(),
            });
        }
        if ticket != self.current_ticket() || self.state != SessionState::MobileMoneyPushPending {
            return Ok(false);
        }

        self.state = SessionState::Failed;
        self.failure_reason = Some("provider confirmation timed out".to_string());
        self.invalidate_tickets();
        self.events.emit(Event::ConfirmationTimedOut {
            session_id: self.id,
            timestamp: time.now(),
        });
        Ok(true)
    }

    /// verify the one-time code and settle on a match, handing the
    /// transaction record to the store
    pub fn submit_code(
        &mut self,
        code: &str,
        gateway: &mut dyn ProviderGateway,
        store: &mut dyn SettlementStore,
        time: &SafeTimeProvider,
    ) -> Result<&TransactionRecord> {
        self.expect_state(SessionState::CodeVerification)?;
        if !self.config.code_is_well_formed(code) {
            return Err(SettlementError::InvalidCodeFormat {
                expected_len: self.config.code_length,
            });
        }

        let expected = self
            .expected_code
            .clone()
            .ok_or_else(|| SettlementError::InvalidState {
                current: self.state.name().to_string(),
                expected: "verification code issued".to_string(),
            })?;

        self.entered_code = Some(code.to_string());
        if code != expected {
            self.code_attempts += 1;
            self.events.emit(Event::CodeRejected {
                session_id: self.id,
                attempts: self.code_attempts,
            });

            if let Some(max) = self.config.max_code_attempts {
                if self.code_attempts >= max {
                    self.state = SessionState::Failed;
                    self.failure_reason = Some("verification attempts exhausted".to_string());
                    self.invalidate_tickets();
                    return Err(SettlementError::CodeAttemptsExhausted {
                        attempts: self.code_attempts,
                    });
                }
            }
            return Err(SettlementError::CodeMismatch);
        }

        let reference = format!("MM-{}", self.id.simple());
        self.settle(reference, gateway, store, time)
    }

    /// choose bank transfer; details are collected in a dedicated state
    pub fn choose_bank_transfer(&mut self) -> Result<()> {
        self.expect_state(SessionState::MethodSelection)?;
        self.method = Some(PaymentMethod::BankTransfer);
        self.state = SessionState::BankDetailsEntry;
        self.events.emit(Event::MethodChosen {
            session_id: self.id,
            method: PaymentMethod::BankTransfer,
        });
        Ok(())
    }

    /// submit slip reference and proof of deposit, then settle directly
    pub fn submit_bank_details(
        &mut self,
        reference: &str,
        proof_of_deposit: Option<&str>,
        gateway: &mut dyn ProviderGateway,
        store: &mut dyn SettlementStore,
        time: &SafeTimeProvider,
    ) -> Result<&TransactionRecord> {
        self.expect_state(SessionState::BankDetailsEntry)?;
        if reference.trim().is_empty() {
            return Err(SettlementError::MissingBankReference);
        }
        let proof = match proof_of_deposit {
            Some(p) if !p.trim().is_empty() => p.to_string(),
            _ => return Err(SettlementError::MissingDepositProof),
        };

        self.bank_reference = Some(reference.to_string());
        self.deposit_proof = Some(proof);
        self.settle(reference.to_string(), gateway, store, time)
    }

    fn settle(
        &mut self,
        reference: String,
        gateway: &mut dyn ProviderGateway,
        store: &mut dyn SettlementStore,
        time: &SafeTimeProvider,
    ) -> Result<&TransactionRecord> {
        let method = self.method.ok_or_else(|| SettlementError::InvalidState {
            current: self.state.name().to_string(),
            expected: "payment method chosen".to_string(),
        })?;

        // lock the final total through the ledger before settling
        let total = self
            .ledger
            .total_for(&self.selected_months, &self.additional_fees)?;
        self.total = total;
        self.state = SessionState::Settling;

        match gateway.settle(method, total, &reference) {
            SettleOutcome::Completed => {
                let record = TransactionRecord {
                    transaction_id: Uuid::new_v4(),
                    tenant_id: self.ledger.tenant_id().to_string(),
                    method,
                    amount: total,
                    selected_months: self.selected_months.clone(),
                    reference,
                    timestamp: time.now(),
                };
                self.events.emit(Event::PaymentSettled {
                    session_id: self.id,
                    transaction_id: record.transaction_id,
                    method,
                    amount: total,
                    timestamp: record.timestamp,
                });
                self.state = SessionState::Success;
                self.invalidate_tickets();
                store.record_transaction(&record);
                Ok(self.transaction.insert(record))
            }
            SettleOutcome::Declined { reason } => {
                self.state = SessionState::Failed;
                self.failure_reason = Some(reason.clone());
                self.invalidate_tickets();
                self.events.emit(Event::SettlementFailed {
                    session_id: self.id,
                    reason: reason.clone(),
                    timestamp: time.now(),
                });
                Err(SettlementError::SettlementDeclined { reason })
            }
        }
    }

    /// step back to the preceding state, discarding only the data
    /// captured after it
    pub fn handle_back(&mut self) -> Result<()> {
        let from = self.state;
        let to = match self.state {
            SessionState::MethodSelection => {
                self.method = None;
                SessionState::AmountEntry
            }
            SessionState::MobileMoneyPushPending => {
                self.method = None;
                self.phone = None;
                self.expected_code = None;
                SessionState::MethodSelection
            }
            SessionState::MobileMoneyConfirmed => SessionState::MobileMoneyPushPending,
            SessionState::CodeVerification => {
                // code entry is discarded; phone and amount survive
                self.entered_code = None;
                self.code_attempts = 0;
                SessionState::MobileMoneyPushPending
            }
            SessionState::BankDetailsEntry => {
                self.method = None;
                self.bank_reference = None;
                self.deposit_proof = None;
                SessionState::MethodSelection
            }
            other => {
                return Err(SettlementError::InvalidState {
                    current: other.name().to_string(),
                    expected: "a state with a predecessor".to_string(),
                });
            }
        };

        self.invalidate_tickets();
        self.state = to;
        self.events.emit(Event::SteppedBack {
            session_id: self.id,
            from: from.name().to_string(),
            to: to.name().to_string(),
        });
        Ok(())
    }

    /// discard the session; allowed any time before `Success`
    pub fn cancel(&mut self, time: &SafeTimeProvider) -> Result<()> {
        if self.state == SessionState::Success || self.state == SessionState::Cancelled {
            return Err(SettlementError::InvalidState {
                current: self.state.name().to_string(),
                expected: "an open session".to_string(),
            });
        }

        self.state = SessionState::Cancelled;
        self.invalidate_tickets();
        self.events.emit(Event::SessionCancelled {
            session_id: self.id,
            timestamp: time.now(),
        });
        Ok(())
    }
}
