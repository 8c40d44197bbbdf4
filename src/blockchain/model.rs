use chrono::Utc;
use log::{debug, info, warn};

use super::block::{Block, validate_block, validate_genesis_block};
use super::{GENESIS_PREV_HASH, BLOCK_REWARD};
use crate::error::LedgerError;
use crate::transaction::{
    CoinbaseTx, OutPoint, Transaction, TxOutput, UtxoSet, validate_coinbase, validate_transaction,
};

/// The ledger: an append-only chain of accepted blocks plus the UTXO set it
/// maintains as a projection of all outputs created minus all outputs
/// consumed. One instance per node; pass it around instead of sharing
/// global state.
///
/// Each submission runs build -> mine -> validate -> apply in order, and the
/// chain and UTXO set are only touched once every validation has passed.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    utxo: UtxoSet,
    difficulty: u32,
    reward: u64,
}

impl Ledger {
    /// Create an empty ledger. `difficulty` is the number of leading zero
    /// bits a block hash must show; a value above 256 can never be satisfied
    /// and is a fatal misconfiguration.
    pub fn new(difficulty: u32) -> Self {
        Self::with_reward(difficulty, BLOCK_REWARD)
    }

    pub fn with_reward(difficulty: u32, reward: u64) -> Self {
        assert!(
            difficulty <= 256,
            "difficulty of {difficulty} bits is unattainable for a 256-bit hash"
        );
        Self {
            chain: Vec::new(),
            utxo: UtxoSet::new(),
            difficulty,
            reward,
        }
    }

    pub fn height(&self) -> u64 {
        self.chain.len() as u64
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn reward(&self) -> u64 {
        self.reward
    }

    pub fn utxo_set(&self) -> &UtxoSet {
        &self.utxo
    }

    /// Hex fingerprint of the chain tip, or `None` before the genesis block.
    pub fn last_block_hash(&self) -> Option<String> {
        self.chain.last().map(Block::hash_hex)
    }

    /// All spendable outputs currently payable to `address`.
    pub fn utxos_for_address(&self, address: &str) -> Vec<(OutPoint, TxOutput)> {
        self.utxo.utxos_for_address(address)
    }

    /// Sum of the spendable amounts currently payable to `address`.
    pub fn balance(&self, address: &str) -> u128 {
        self.utxo.balance(address)
    }

    /// Build, mine, validate and append the genesis block, crediting the
    /// block reward to `miner_address`. Fails without mutating anything if
    /// a genesis block already exists or validation fails.
    pub fn append_genesis_block(&mut self, miner_address: &str) -> Result<&Block, LedgerError> {
        if !self.chain.is_empty() {
            return Err(LedgerError::GenesisAlreadyExists);
        }

        let coinbase = self.new_coinbase(0, miner_address);
        let mut block = Block::new(GENESIS_PREV_HASH.to_string(), coinbase, None);

        debug!("mining genesis block (difficulty={} bits)", self.difficulty);
        block.mine(self.difficulty);

        validate_genesis_block(&block, self.difficulty).map_err(|reason| {
            warn!("genesis block rejected: {reason}");
            LedgerError::InvalidBlock(reason)
        })?;
        validate_coinbase(&block.coinbase).map_err(|reason| {
            warn!("genesis coinbase rejected: {reason}");
            LedgerError::InvalidCoinbase(reason)
        })?;

        let cx_txid = block.coinbase.txid();
        let cx_output = block.coinbase.output.clone();
        info!(
            "genesis block accepted (hash={}, nonce={})",
            block.hash_hex(),
            block.nonce
        );

        self.chain.push(block);
        self.utxo.insert(
            OutPoint {
                txid: cx_txid,
                vout: 0,
            },
            cx_output,
        );

        Ok(self.chain.last().expect("chain is non-empty after push"))
    }

    /// Build a block holding `tx` and a fresh coinbase for `miner_address`,
    /// mine it, validate block and both transactions against the current
    /// UTXO set, and apply it. All-or-nothing: on any validation failure the
    /// chain and UTXO set are left untouched.
    pub fn append_block_containing(
        &mut self,
        tx: Transaction,
        miner_address: &str,
    ) -> Result<&Block, LedgerError> {
        let Some(prev_hash) = self.last_block_hash() else {
            return Err(LedgerError::MissingGenesis);
        };
        let height = self.height();

        let coinbase = self.new_coinbase(height, miner_address);
        let mut block = Block::new(prev_hash, coinbase, Some(tx));

        debug!(
            "mining block at height {height} (difficulty={} bits)",
            self.difficulty
        );
        block.mine(self.difficulty);

        validate_block(&block, self.difficulty).map_err(|reason| {
            warn!("block at height {height} rejected: {reason}");
            LedgerError::InvalidBlock(reason)
        })?;
        validate_coinbase(&block.coinbase).map_err(|reason| {
            warn!("coinbase at height {height} rejected: {reason}");
            LedgerError::InvalidCoinbase(reason)
        })?;
        let tx_ref = block
            .transaction
            .as_ref()
            .expect("ordinary transaction fixed at construction");
        validate_transaction(tx_ref, &self.utxo).map_err(|reason| {
            warn!("transaction at height {height} rejected: {reason}");
            LedgerError::InvalidTransaction(reason)
        })?;

        // All validations passed; apply the state transition.
        let spent: Vec<OutPoint> = tx_ref.inputs.iter().map(|i| i.outpoint.clone()).collect();
        let tx_txid = tx_ref.txid();
        let tx_outputs = tx_ref.outputs.clone();
        let cx_txid = block.coinbase.txid();
        let cx_output = block.coinbase.output.clone();

        for outpoint in &spent {
            self.utxo.spend(outpoint);
        }
        self.utxo.insert(
            OutPoint {
                txid: cx_txid,
                vout: 0,
            },
            cx_output,
        );
        self.utxo.add_outputs(&tx_txid, &tx_outputs);

        info!(
            "block {height} accepted (hash={}, nonce={}, spent {} inputs, utxo size={})",
            block.hash_hex(),
            block.nonce,
            spent.len(),
            self.utxo.len()
        );
        self.chain.push(block);

        Ok(self.chain.last().expect("chain is non-empty after push"))
    }

    /// Validate the whole chain: genesis shape, linkage and PoW of every
    /// block. The ledger only ever appends valid blocks, so this failing
    /// means the chain was tampered with from outside.
    pub fn is_valid_chain(&self) -> bool {
        let Some(genesis) = self.chain.first() else {
            return false;
        };
        if genesis.prev_hash != GENESIS_PREV_HASH
            || validate_genesis_block(genesis, self.difficulty).is_err()
        {
            return false;
        }

        for i in 1..self.chain.len() {
            let current = &self.chain[i];
            if current.prev_hash != self.chain[i - 1].hash_hex() {
                return false;
            }
            if validate_block(current, self.difficulty).is_err() {
                return false;
            }
        }

        true
    }

    fn new_coinbase(&self, height: u64, miner_address: &str) -> CoinbaseTx {
        let message = format!("{} by {miner_address}", Utc::now().timestamp());
        CoinbaseTx::new(height, message, miner_address, self.reward)
    }
}
