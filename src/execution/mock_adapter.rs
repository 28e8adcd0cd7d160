//! In-memory bridge adapter that records every submission.

use super::bridge_adapter::{BridgeAdapter, BridgeError};
use crate::utils::ChainId;
use alloy_primitives::{Address, TxHash, U256, keccak256};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransfer {
    pub chain_id: ChainId,
    pub l1_token: Address,
    pub l2_token: Address,
    pub amount: U256,
    pub tx_hash: TxHash,
}

#[derive(Debug, Default)]
pub struct MockAdapterManager {
    nonce: AtomicU64,
    sent: DashMap<u64, SentTransfer>,
    outstanding: DashMap<(ChainId, Address), U256>,
    failing_sends: DashSet<ChainId>,
    failing_queries: DashSet<ChainId>,
}

impl MockAdapterManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mocked_outstanding_cross_chain_transfers(&self, chain_id: ChainId, l1_token: Address, amount: U256) {
        self.outstanding.insert((chain_id, l1_token), amount);
    }

    /// Reject every submission toward `chain_id`.
    pub fn fail_sends_to(&self, chain_id: ChainId) {
        self.failing_sends.insert(chain_id);
    }

    /// Fail every outstanding transfer query on `chain_id`.
    pub fn fail_queries_on(&self, chain_id: ChainId) {
        self.failing_queries.insert(chain_id);
    }

    pub fn clear_failures(&self) {
        self.failing_sends.clear();
        self.failing_queries.clear();
    }

    /// Every accepted submission, oldest first.
    pub fn sent_transfers(&self) -> Vec<SentTransfer> {
        let mut sent: Vec<_> = self.sent.iter().map(|entry| (*entry.key(), entry.value().clone())).collect();
        sent.sort_by_key(|(nonce, _)| *nonce);
        sent.into_iter().map(|(_, transfer)| transfer).collect()
    }

    /// Most recent accepted submission toward (chain, L1 token).
    pub fn last_sent(&self, chain_id: ChainId, l1_token: Address) -> Option<SentTransfer> {
        self.sent_transfers().into_iter().rev().find(|sent| sent.chain_id == chain_id && sent.l1_token == l1_token)
    }
}

#[async_trait]
impl BridgeAdapter for MockAdapterManager {
    async fn send_token_cross_chain(
        &self,
        chain_id: ChainId,
        l1_token: Address,
        l2_token: Address,
        amount: U256,
    ) -> Result<TxHash, BridgeError> {
        if self.failing_sends.contains(&chain_id) {
            return Err(BridgeError::SubmissionRejected { chain_id, l1_token, amount, reason: "mocked rejection".to_string() });
        }

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let tx_hash = keccak256(format!("{nonce}:{chain_id}:{l1_token}:{amount}"));
        self.sent.insert(nonce, SentTransfer { chain_id, l1_token, l2_token, amount, tx_hash });
        Ok(tx_hash)
    }

    async fn outstanding_cross_chain_transfer_amount(
        &self,
        chain_id: ChainId,
        l1_token: Address,
    ) -> Result<U256, BridgeError> {
        if self.failing_queries.contains(&chain_id) {
            return Err(BridgeError::QueryFailed { chain_id, l1_token, reason: "mocked failure".to_string() });
        }
        Ok(self.outstanding.get(&(chain_id, l1_token)).map(|amount| *amount).unwrap_or_default())
    }
}
