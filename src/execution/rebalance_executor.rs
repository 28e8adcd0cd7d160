use super::bridge_adapter::{BridgeAdapter, BridgeError};
use crate::logic::types::RebalanceInstruction;
use alloy_primitives::TxHash;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Sent { instruction: RebalanceInstruction, tx_hash: TxHash },
    Failed { instruction: RebalanceInstruction, error: BridgeError },
}

impl TransferOutcome {
    pub fn instruction(&self) -> &RebalanceInstruction {
        match self {
            TransferOutcome::Sent { instruction, .. } | TransferOutcome::Failed { instruction, .. } => instruction,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, TransferOutcome::Sent { .. })
    }
}

/// Submits instructions to the bridge adapter one at a time, in the order they were decided.
///
/// A failed submission is reported and the remaining instructions are still attempted.
#[derive(Clone)]
pub struct RebalanceExecutor {
    adapter: Arc<dyn BridgeAdapter>,
}

impl RebalanceExecutor {
    pub fn new(adapter: Arc<dyn BridgeAdapter>) -> Self {
        Self { adapter }
    }

    pub async fn execute(&self, instructions: Vec<RebalanceInstruction>) -> Vec<TransferOutcome> {
        let mut outcomes = Vec::with_capacity(instructions.len());

        for instruction in instructions {
            let result = self
                .adapter
                .send_token_cross_chain(instruction.chain_id, instruction.l1_token, instruction.l2_token, instruction.amount)
                .await;

            match result {
                Ok(tx_hash) => {
                    info!(
                        chain_id = instruction.chain_id,
                        symbol = %instruction.symbol,
                        amount = %instruction.formatted_amount(),
                        %tx_hash,
                        "Bridge transfer submitted"
                    );
                    outcomes.push(TransferOutcome::Sent { instruction, tx_hash });
                }
                Err(error) => {
                    error!(
                        chain_id = instruction.chain_id,
                        l1_token = %instruction.l1_token,
                        symbol = %instruction.symbol,
                        amount = %instruction.formatted_amount(),
                        %error,
                        "Bridge transfer failed"
                    );
                    outcomes.push(TransferOutcome::Failed { instruction, error });
                }
            }
        }

        outcomes
    }
}
