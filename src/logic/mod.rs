/// Logic Layer - Rebalancing Engine
///
/// This layer is responsible for:
/// - Share arithmetic over a cycle's inventory snapshot
/// - Tracking funds in flight between the home chain and remote chains
/// - Deciding which remote chains need a top-up and by how much
/// - The cycle entry points used by the scheduler
pub mod allocation;
pub mod decision;
pub mod inventory_client;
pub mod ledger;
pub mod types;

#[cfg(test)]
mod tests;

pub use allocation::AllocationCalculator;
pub use decision::RebalancePlanner;
pub use inventory_client::{InventoryClient, InventoryClientBuilder};
pub use ledger::TransferLedger;
pub use types::{
    BudgetDeficiency, ChainDistribution, DistributionSummary, ExecutedRebalance, FailedRebalance, RebalanceInstruction,
    RebalancePlan, RebalanceReport,
};
