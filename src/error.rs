use thiserror::Error;

/// Why a submission was rejected. Every rejection is local: the chain and
/// the UTXO set are left exactly as they were before the submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("genesis block already exists")]
    GenesisAlreadyExists,

    #[error("ledger has no genesis block yet")]
    MissingGenesis,

    #[error("block rejected: {0}")]
    InvalidBlock(&'static str),

    #[error("coinbase transaction rejected: {0}")]
    InvalidCoinbase(&'static str),

    #[error("transaction rejected: {0}")]
    InvalidTransaction(&'static str),
}
