/// Execution Layer
///
/// This layer is responsible for:
/// - The bridge adapter contract used to move funds off the home chain
/// - Sequential submission of decided rebalance instructions
/// - An in-memory adapter for tests and demos
pub mod bridge_adapter;
pub mod mock_adapter;
pub mod rebalance_executor;

pub use bridge_adapter::{BridgeAdapter, BridgeError};
pub use mock_adapter::{MockAdapterManager, SentTransfer};
pub use rebalance_executor::{RebalanceExecutor, TransferOutcome};
