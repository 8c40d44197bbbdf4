use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::transaction::{CoinbaseTx, Transaction};

/// A single block: header fields (previous hash, merkle root, nonce) plus a
/// body holding the coinbase transaction and at most one ordinary
/// transaction. Only the genesis block goes without an ordinary transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Hex fingerprint of the previous block ("0" for the genesis block).
    pub prev_hash: String,
    /// Hash over the txids in the block (coinbase first).
    pub merkle_root: String,
    /// Proof-of-Work nonce, fixed by `mine()`.
    pub nonce: u64,
    pub coinbase: CoinbaseTx,
    pub transaction: Option<Transaction>,
}

impl Block {
    /// Create a non-mined block. All body content is fixed here; `mine()`
    /// only ever touches the nonce.
    pub fn new(prev_hash: String, coinbase: CoinbaseTx, transaction: Option<Transaction>) -> Self {
        let merkle_root = match &transaction {
            // txids are fixed-width hex, so plain concatenation is unambiguous
            Some(tx) => crypto::sha256_hex(format!("{}{}", coinbase.txid(), tx.txid()).as_bytes()),
            None => crypto::sha256_hex(coinbase.txid().as_bytes()),
        };
        Self {
            prev_hash,
            merkle_root,
            nonce: 0,
            coinbase,
            transaction,
        }
    }

    /// Hash preimage: header fields joined by ':' plus the ordinary
    /// transaction's txid when present. Every field draws from an alphabet
    /// that excludes the delimiter.
    fn hash_preimage(&self) -> String {
        match &self.transaction {
            Some(tx) => format!(
                "{}:{}:{}:{}",
                self.prev_hash,
                self.merkle_root,
                self.nonce,
                tx.txid()
            ),
            None => format!("{}:{}:{}", self.prev_hash, self.merkle_root, self.nonce),
        }
    }

    /// The block fingerprint as 64 lowercase hex chars.
    pub fn hash_hex(&self) -> String {
        crypto::sha256_hex(self.hash_preimage().as_bytes())
    }

    /// The block fingerprint as a 256-char string of '0'/'1', used to test
    /// the difficulty target.
    pub fn hash_bits(&self) -> String {
        crypto::to_binary(&crypto::sha256(self.hash_preimage().as_bytes()))
    }

    /// Perform Proof-of-Work: find the smallest nonce whose block hash
    /// starts with `difficulty` zero bits. Sequential search from zero, so
    /// the result is deterministic. A target that cannot be met within the
    /// nonce's numeric range is a misconfiguration, not a runtime failure.
    pub fn mine(&mut self, difficulty: u32) {
        let target_prefix = "0".repeat(difficulty as usize);
        self.nonce = 0;
        while !self.hash_bits().starts_with(&target_prefix) {
            self.nonce += 1;
        }
    }
}

/// Block validity for a non-genesis block: the ordinary transaction must be
/// present and the hash must meet the difficulty target. Internal
/// transaction validity is checked separately against the UTXO set.
pub fn validate_block(block: &Block, difficulty: u32) -> Result<(), &'static str> {
    if block.transaction.is_none() {
        return Err("block has no ordinary transaction");
    }
    if block.prev_hash.is_empty() {
        return Err("block has no previous block hash");
    }
    check_difficulty(block, difficulty)
}

/// Block validity for the genesis block: no ordinary transaction (there is
/// no prior chain to spend from), same difficulty requirement.
pub fn validate_genesis_block(block: &Block, difficulty: u32) -> Result<(), &'static str> {
    if block.transaction.is_some() {
        return Err("genesis block must not contain an ordinary transaction");
    }
    check_difficulty(block, difficulty)
}

fn check_difficulty(block: &Block, difficulty: u32) -> Result<(), &'static str> {
    let target_prefix = "0".repeat(difficulty as usize);
    if !block.hash_bits().starts_with(&target_prefix) {
        return Err("block hash does not meet difficulty target");
    }
    Ok(())
}
