//! boundary traits toward the hosting portal: tenant records in, settled
//! payment and refund records out. The core never owns persistence.

use std::collections::HashMap;

use crate::types::{SettlementRecord, TenantFinancials, TransactionRecord};

/// tenant/lease record collaborator
pub trait TenantDirectory {
    fn tenant_financials(&self, tenant_id: &str) -> Option<TenantFinancials>;

    /// called once per deposit case, after it reaches `Processed`
    fn mark_moved_out(&mut self, tenant_id: &str);
}

/// receipt and refund record collaborator
pub trait SettlementStore {
    /// called once per settled payment session
    fn record_transaction(&mut self, record: &TransactionRecord);

    fn record_settlement(&mut self, record: &SettlementRecord);
}

/// in-memory implementation of both collaborators, for tests and demos
#[derive(Debug, Default)]
pub struct InMemoryPortal {
    tenants: HashMap<String, TenantFinancials>,
    moved_out: Vec<String>,
    transactions: Vec<TransactionRecord>,
    settlements: Vec<SettlementRecord>,
}

impl InMemoryPortal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_tenant(&mut self, financials: TenantFinancials) {
        self.tenants
            .insert(financials.tenant_id.clone(), financials);
    }

    pub fn moved_out(&self) -> &[String] {
        &self.moved_out
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    pub fn settlements(&self) -> &[SettlementRecord] {
        &self.settlements
    }
}

impl TenantDirectory for InMemoryPortal {
    fn tenant_financials(&self, tenant_id: &str) -> Option<TenantFinancials> {
        self.tenants.get(tenant_id).cloned()
    }

    fn mark_moved_out(&mut self, tenant_id: &str) {
        self.moved_out.push(tenant_id.to_string());
    }
}

impl SettlementStore for InMemoryPortal {
    fn record_transaction(&mut self, record: &TransactionRecord) {
        self.transactions.push(record.clone());
    }

    fn record_settlement(&mut self, record: &SettlementRecord) {
        self.settlements.push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;

    #[test]
    fn test_tenant_lookup() {
        let mut portal = InMemoryPortal::new();
        portal.upsert_tenant(TenantFinancials {
            tenant_id: "T-001".to_string(),
            standard_rent: Money::from_major(2500),
            deposit_amount: Money::from_major(2500),
            current_balance: Money::from_major(5000),
            due_months: vec![],
        });

        let found = portal.tenant_financials("T-001").unwrap();
        assert_eq!(found.standard_rent, Money::from_major(2500));
        assert!(portal.tenant_financials("T-404").is_none());
    }

    #[test]
    fn test_move_out_marking() {
        let mut portal = InMemoryPortal::new();
        portal.mark_moved_out("T-001");
        assert_eq!(portal.moved_out(), &["T-001".to_string()]);
    }
}
