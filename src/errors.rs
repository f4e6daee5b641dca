use thiserror::Error;

use crate::decimal::Money;
use crate::types::RefundMethod;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    #[error("invalid payment amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("no months selected for payment")]
    EmptyMonthSelection,

    #[error("month not on the tenant ledger: {month}")]
    UnknownMonth {
        month: String,
    },

    #[error("month selected twice: {month}")]
    DuplicateMonth {
        month: String,
    },

    #[error("invalid fee: {message}")]
    InvalidFee {
        message: String,
    },

    #[error("invalid month token: {text}")]
    InvalidMonthToken {
        text: String,
    },

    #[error("invalid phone number: {phone}")]
    InvalidPhoneNumber {
        phone: String,
    },

    #[error("bank transfer requires a slip reference")]
    MissingBankReference,

    #[error("bank transfer requires a proof-of-deposit attachment")]
    MissingDepositProof,

    #[error("provider push failed: {reason}")]
    ProviderPushFailed {
        reason: String,
    },

    #[error("settlement declined: {reason}")]
    SettlementDeclined {
        reason: String,
    },

    #[error("verification code must be {expected_len} digits")]
    InvalidCodeFormat {
        expected_len: usize,
    },

    #[error("verification code does not match")]
    CodeMismatch,

    #[error("verification attempts exhausted after {attempts} tries")]
    CodeAttemptsExhausted {
        attempts: u32,
    },

    #[error("invalid deduction: {message}")]
    InvalidDeduction {
        message: String,
    },

    #[error("deduction exceeds deposit: deposit {deposit}, already deducted {deducted}, requested {requested}")]
    OverDeduction {
        deposit: Money,
        deducted: Money,
        requested: Money,
    },

    #[error("no deduction at index {index}")]
    DeductionNotFound {
        index: usize,
    },

    #[error("refund method {method:?} requires recipient details")]
    MissingRecipientDetails {
        method: RefundMethod,
    },

    #[error("refund method not chosen")]
    MissingRefundMethod,

    #[error("invalid state: current {current}, expected {expected}")]
    InvalidState {
        current: String,
        expected: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, SettlementError>;
