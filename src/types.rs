use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::SettlementError;

/// unique identifier for a payment session
pub type SessionId = Uuid;

/// unique identifier for a deposit settlement case
pub type CaseId = Uuid;

/// unique identifier for a completed transaction
pub type TransactionId = Uuid;

/// a calendar month identifier, totally ordered by (year, month)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthToken {
    year: i32,
    month: u32,
}

impl MonthToken {
    /// create a token, validating the calendar year and month
    ///
    /// Years before 1 CE are rejected, which keeps `Display` and
    /// `FromStr` exact inverses of each other.
    pub fn new(year: i32, month: u32) -> Result<Self, SettlementError> {
        if year < 1 || !(1..=12).contains(&month) {
            return Err(SettlementError::InvalidMonthToken {
                text: format!("{year}-{month}"),
            });
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// the following calendar month, carrying into the next year
    pub fn succ(&self) -> MonthToken {
        if self.month == 12 {
            MonthToken {
                year: self.year + 1,
                month: 1,
            }
        } else {
            MonthToken {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for MonthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthToken {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SettlementError::InvalidMonthToken {
            text: s.to_string(),
        };
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthToken::new(year, month).map_err(|_| invalid())
    }
}

// serialized as "YYYY-MM" so views and parse round-trip exactly
impl Serialize for MonthToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// supported rent payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    MobileMoney,
    BankTransfer,
}

/// supported deposit refund methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundMethod {
    Cash,
    BankTransfer,
    MobileMoney,
    Cheque,
}

impl RefundMethod {
    /// cash refunds are handed over in person and need no recipient details
    pub fn requires_recipient_details(&self) -> bool {
        !matches!(self, RefundMethod::Cash)
    }
}

/// category of a deposit deduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeductionCategory {
    UnpaidRent,
    Damages,
    Cleaning,
    Utilities,
    Other,
}

/// an ad-hoc fee added to a rent payment (late fee, penalty, etc)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub label: String,
    pub amount: Money,
}

impl Fee {
    pub fn new(label: impl Into<String>, amount: Money) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// a single charge against a security deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub category: DeductionCategory,
    pub description: String,
    pub amount: Money,
}

/// who receives a non-cash deposit refund
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientDetails {
    pub name: String,
    pub phone: Option<String>,
    pub account_number: Option<String>,
}

impl RecipientDetails {
    /// name plus at least one reachable channel
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && (self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
                || self
                    .account_number
                    .as_deref()
                    .is_some_and(|a| !a.trim().is_empty()))
    }
}

/// deposit case lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    /// deductions editable
    Draft,
    /// read-only review before processing
    Preview,
    /// settled, terminal
    Processed,
}

/// tenant financials supplied by the lease/record collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantFinancials {
    pub tenant_id: String,
    pub standard_rent: Money,
    pub deposit_amount: Money,
    pub current_balance: Money,
    pub due_months: Vec<MonthToken>,
}

/// immutable record of a settled rent payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    pub tenant_id: String,
    pub method: PaymentMethod,
    pub amount: Money,
    pub selected_months: Vec<MonthToken>,
    pub reference: String,
    pub timestamp: DateTime<Utc>,
}

/// immutable record of a processed deposit settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub case_id: CaseId,
    pub tenant_id: String,
    pub amount: Money,
    pub reason: String,
    pub deductions: Vec<Deduction>,
    pub refund_method: RefundMethod,
    pub recipient: Option<RecipientDetails>,
    pub reference: String,
    pub processing_date: DateTime<Utc>,
}
