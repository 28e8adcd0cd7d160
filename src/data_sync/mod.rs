/// Data Synchronization Layer
///
/// Everything the engine reads from the outside world once per cycle:
///
/// - the validated inventory configuration (allocation bands per token and chain)
/// - the registry, balance and shortfall collaborator contracts
/// - the cycle-scoped inventory snapshot and its refresh routine
/// - in-memory collaborators for tests and demos
pub mod config;
pub mod mock;
pub mod providers;
pub mod snapshot;

pub use config::{
    AllocationBand, INVENTORY_CONFIG_ENV, InvalidBandError, InventoryConfig, InventoryConfigError, InventoryConfigRoot,
    InventoryConfigSection, TokenAllocation,
};
pub use mock::{MockTokenClient, MockTokenRegistry};
pub use providers::{BalanceProvider, ProviderError, RegistryError, ShortfallProvider, TokenRegistry};
pub use snapshot::{InventorySnapshot, PairKey, SnapshotError};
