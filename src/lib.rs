pub mod config;
pub mod decimal;
pub mod deposit;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod repository;
pub mod session;
pub mod types;
pub mod views;

// re-export key types
pub use config::SessionConfig;
pub use decimal::Money;
pub use deposit::DepositCase;
pub use errors::{Result, SettlementError};
pub use events::{Event, EventStore};
pub use ledger::{compute_advance_months, compute_total, RentLedger};
pub use repository::{InMemoryPortal, SettlementStore, TenantDirectory};
pub use session::{
    ApprovingGateway, PaymentSession, ProviderGateway, PushOutcome, PushTicket, RejectingGateway,
    ScriptedGateway, SessionState, SettleOutcome,
};
pub use types::{
    CaseId, CaseStatus, Deduction, DeductionCategory, Fee, MonthToken, PaymentMethod,
    RecipientDetails, RefundMethod, SessionId, SettlementRecord, TenantFinancials, TransactionId,
    TransactionRecord,
};
pub use views::{CaseView, SessionView};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
