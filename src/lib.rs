// Three-Layer Architecture
pub mod data_sync; // Data Layer: inventory config, balance/shortfall snapshots
pub mod execution; // Execution Layer: bridge submission
pub mod logic; // Logic Layer: allocation math, rebalance decisions, transfer ledger

// Common utilities and types
pub mod utils;

// Re-export key components from each layer
pub use data_sync::{
    AllocationBand, BalanceProvider, InventoryConfig, InventoryConfigError, InventoryConfigSection, InventorySnapshot,
    MockTokenClient, MockTokenRegistry, ShortfallProvider, TokenRegistry,
};
pub use execution::{BridgeAdapter, BridgeError, MockAdapterManager, RebalanceExecutor};
pub use logic::{
    AllocationCalculator, InventoryClient, InventoryClientBuilder, RebalanceInstruction, RebalancePlanner,
    RebalanceReport, TransferLedger,
};
pub use utils::{ChainId, Token};
