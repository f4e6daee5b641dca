use std::collections::VecDeque;

use crate::decimal::Money;
use crate::types::PaymentMethod;

/// outcome of a mobile-money authorization push
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// the provider accepted the push and issued the one-time code it
    /// will text to the payer
    Accepted { verification_code: String },
    Rejected { reason: String },
}

/// outcome of the final settlement call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    Completed,
    Declined { reason: String },
}

/// payment provider capability
///
/// Stands in for the real network round-trips; implementations decide
/// whether a push or settlement succeeds, so tests can force either
/// outcome deterministically.
pub trait ProviderGateway {
    fn request_push(&mut self, phone: &str, amount: Money, reference: &str) -> PushOutcome;

    fn settle(&mut self, method: PaymentMethod, amount: Money, reference: &str) -> SettleOutcome;
}

/// gateway that approves everything, issuing a fixed verification code
#[derive(Debug, Clone)]
pub struct ApprovingGateway {
    code: String,
}

impl ApprovingGateway {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl Default for ApprovingGateway {
    fn default() -> Self {
        Self::new("123456")
    }
}

impl ProviderGateway for ApprovingGateway {
    fn request_push(&mut self, _phone: &str, _amount: Money, _reference: &str) -> PushOutcome {
        PushOutcome::Accepted {
            verification_code: self.code.clone(),
        }
    }

    fn settle(&mut self, _method: PaymentMethod, _amount: Money, _reference: &str) -> SettleOutcome {
        SettleOutcome::Completed
    }
}

/// gateway that rejects everything with a fixed reason
#[derive(Debug, Clone)]
pub struct RejectingGateway {
    reason: String,
}

impl RejectingGateway {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ProviderGateway for RejectingGateway {
    fn request_push(&mut self, _phone: &str, _amount: Money, _reference: &str) -> PushOutcome {
        PushOutcome::Rejected {
            reason: self.reason.clone(),
        }
    }

    fn settle(&mut self, _method: PaymentMethod, _amount: Money, _reference: &str) -> SettleOutcome {
        SettleOutcome::Declined {
            reason: self.reason.clone(),
        }
    }
}

/// gateway replaying scripted outcomes in order, approving once the
/// script runs out
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    pushes: VecDeque<PushOutcome>,
    settlements: VecDeque<SettleOutcome>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_outcome(mut self, outcome: PushOutcome) -> Self {
        self.pushes.push_back(outcome);
        self
    }

    pub fn settle_outcome(mut self, outcome: SettleOutcome) -> Self {
        self.settlements.push_back(outcome);
        self
    }
}

impl ProviderGateway for ScriptedGateway {
    fn request_push(&mut self, _phone: &str, _amount: Money, _reference: &str) -> PushOutcome {
        self.pushes.pop_front().unwrap_or(PushOutcome::Accepted {
            verification_code: "123456".to_string(),
        })
    }

    fn settle(&mut self, _method: PaymentMethod, _amount: Money, _reference: &str) -> SettleOutcome {
        self.settlements
            .pop_front()
            .unwrap_or(SettleOutcome::Completed)
    }
}
