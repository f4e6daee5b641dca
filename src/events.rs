use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{
    CaseId, CaseStatus, DeductionCategory, MonthToken, PaymentMethod, RefundMethod, SessionId,
    TransactionId,
};

/// all events emitted by the payment and settlement core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // payment session events
    SessionOpened {
        session_id: SessionId,
        tenant_id: String,
        timestamp: DateTime<Utc>,
    },
    MonthsSelected {
        session_id: SessionId,
        months: Vec<MonthToken>,
        fee_total: Money,
        total: Money,
    },
    MethodChosen {
        session_id: SessionId,
        method: PaymentMethod,
    },
    PushRequested {
        session_id: SessionId,
        phone: String,
        amount: Money,
    },
    PushRejected {
        session_id: SessionId,
        reason: String,
    },
    ProviderConfirmed {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },
    ConfirmationTimedOut {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },
    CodeRejected {
        session_id: SessionId,
        attempts: u32,
    },
    PaymentSettled {
        session_id: SessionId,
        transaction_id: TransactionId,
        method: PaymentMethod,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    SettlementFailed {
        session_id: SessionId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    SteppedBack {
        session_id: SessionId,
        from: String,
        to: String,
    },
    SessionCancelled {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },

    // deposit settlement events
    CaseOpened {
        case_id: CaseId,
        tenant_id: String,
        deposit: Money,
        timestamp: DateTime<Utc>,
    },
    DeductionAdded {
        case_id: CaseId,
        category: DeductionCategory,
        amount: Money,
        remaining: Money,
    },
    DeductionRemoved {
        case_id: CaseId,
        index: usize,
        amount: Money,
        remaining: Money,
    },
    CaseStatusChanged {
        case_id: CaseId,
        old_status: CaseStatus,
        new_status: CaseStatus,
        timestamp: DateTime<Utc>,
    },
    CaseProcessed {
        case_id: CaseId,
        refund_amount: Money,
        refund_method: RefundMethod,
        reference: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
