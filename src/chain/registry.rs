//! Typed registry interface and the mock used in dev mode and tests

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::types::{IpsphereError, Result};

/// Confirmed transaction receipt
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    /// Whether the transaction succeeded on-chain
    pub success: bool,
}

/// Result of minting: the receipt plus the token id taken from the
/// Transfer event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintOutcome {
    pub receipt: TxReceipt,
    pub token_id: i64,
}

/// One typed method per HyDRAULIC contract operation
#[async_trait]
pub trait IpRegistry: Send + Sync {
    async fn set_ip_details(&self, ip_number: &str, ip_type: &str) -> Result<TxReceipt>;

    async fn tokenize_ip(&self, ip_number: &str) -> Result<TxReceipt>;

    async fn update_ip_valuation_details(
        &self,
        ip_number: &str,
        ip_value_wei: u128,
        credit_score: &str,
        max_loan_wei: u128,
    ) -> Result<TxReceipt>;

    async fn mint_ip(&self, ip_number: &str) -> Result<MintOutcome>;

    async fn burn_ip(&self, ip_number: &str) -> Result<TxReceipt>;

    async fn pause(&self) -> Result<TxReceipt>;

    async fn unpause(&self) -> Result<TxReceipt>;
}

/// In-memory registry for dev mode and tests
///
/// Hands out sequential token ids and never fails, except when paused:
/// state-changing calls against a paused registry error like the real
/// contract would.
#[derive(Debug, Default)]
pub struct MockRegistry {
    next_token: AtomicI64,
    next_block: AtomicU64,
    paused: std::sync::atomic::AtomicBool,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            next_token: AtomicI64::new(1),
            next_block: AtomicU64::new(1),
            paused: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn receipt(&self) -> TxReceipt {
        TxReceipt {
            transaction_hash: format!("0xmock{}", uuid::Uuid::new_v4().simple()),
            block_number: self.next_block.fetch_add(1, Ordering::SeqCst),
            gas_used: 21_000,
            success: true,
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.paused.load(Ordering::SeqCst) {
            return Err(IpsphereError::Chain("registry is paused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl IpRegistry for MockRegistry {
    async fn set_ip_details(&self, _ip_number: &str, _ip_type: &str) -> Result<TxReceipt> {
        self.ensure_active()?;
        Ok(self.receipt())
    }

    async fn tokenize_ip(&self, _ip_number: &str) -> Result<TxReceipt> {
        self.ensure_active()?;
        Ok(self.receipt())
    }

    async fn update_ip_valuation_details(
        &self,
        _ip_number: &str,
        _ip_value_wei: u128,
        _credit_score: &str,
        _max_loan_wei: u128,
    ) -> Result<TxReceipt> {
        self.ensure_active()?;
        Ok(self.receipt())
    }

    async fn mint_ip(&self, _ip_number: &str) -> Result<MintOutcome> {
        self.ensure_active()?;
        Ok(MintOutcome {
            receipt: self.receipt(),
            token_id: self.next_token.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn burn_ip(&self, _ip_number: &str) -> Result<TxReceipt> {
        self.ensure_active()?;
        Ok(self.receipt())
    }

    async fn pause(&self) -> Result<TxReceipt> {
        self.paused.store(true, Ordering::SeqCst);
        Ok(self.receipt())
    }

    async fn unpause(&self) -> Result<TxReceipt> {
        self.paused.store(false, Ordering::SeqCst);
        Ok(self.receipt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_mints_sequential_token_ids() {
        let registry = MockRegistry::new();
        let first = registry.mint_ip("IP-1").await.unwrap();
        let second = registry.mint_ip("IP-2").await.unwrap();
        assert_eq!(first.token_id, 1);
        assert_eq!(second.token_id, 2);
        assert!(first.receipt.success);
        assert_ne!(
            first.receipt.transaction_hash,
            second.receipt.transaction_hash
        );
    }

    #[tokio::test]
    async fn every_registry_method_confirms() {
        let registry = MockRegistry::new();
        assert!(registry.set_ip_details("IP-1", "Patent").await.unwrap().success);
        assert!(registry
            .update_ip_valuation_details("IP-1", 1_000_000, "AA", 500_000)
            .await
            .unwrap()
            .success);
        assert!(registry.tokenize_ip("IP-1").await.unwrap().success);
        assert!(registry.burn_ip("IP-1").await.unwrap().success);
    }

    #[tokio::test]
    async fn paused_mock_rejects_state_changes() {
        let registry = MockRegistry::new();
        registry.pause().await.unwrap();
        assert!(registry.tokenize_ip("IP-1").await.is_err());
        assert!(registry.mint_ip("IP-1").await.is_err());

        registry.unpause().await.unwrap();
        assert!(registry.tokenize_ip("IP-1").await.is_ok());
    }
}
