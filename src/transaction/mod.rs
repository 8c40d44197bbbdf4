pub mod model;
pub mod utxo;

pub use model::{CoinbaseTx, Transaction, TxInput, TxOutput, validate_coinbase, validate_transaction};
pub use utxo::{OutPoint, UtxoSet};
