pub mod chain;
pub mod config_loader;
pub mod constants;
pub mod token;
pub mod units;

pub use chain::{ChainId, KnownChain, chain_name};
pub use config_loader::*;
pub use constants::*;
pub use token::Token;
pub use units::{apply_share, format_amount, format_pct, parse_pct, share_of};
