//! A single-node, in-memory UTXO ledger secured by a Proof-of-Work hash
//! puzzle. One authoritative node, no networking, no persistence: state
//! lives for the lifetime of the `Ledger` value.

pub mod blockchain;
pub mod crypto;
pub mod error;
pub mod transaction;
pub mod wallet;

pub use blockchain::{BLOCK_REWARD, Block, DEFAULT_DIFFICULTY, GENESIS_PREV_HASH, Ledger};
pub use error::LedgerError;
pub use transaction::{CoinbaseTx, OutPoint, Transaction, TxInput, TxOutput, UtxoSet};
pub use wallet::Wallet;
