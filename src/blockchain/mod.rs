pub mod block;
pub mod model;

pub use block::{Block, validate_block, validate_genesis_block};
pub use model::Ledger;

/// Default Proof-of-Work difficulty: leading zero bits required of a block hash.
pub const DEFAULT_DIFFICULTY: u32 = 12;

/// Block subsidy paid out by every coinbase transaction.
pub const BLOCK_REWARD: u64 = 50;

/// Sentinel previous-hash carried by the genesis block.
pub const GENESIS_PREV_HASH: &str = "0";
