use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use super::model::TxOutput;

/// Identifies a specific transaction output by its txid and index.
#[derive(Debug, Clone, Serialize, Deserialize, Eq)]
pub struct OutPoint {
    pub txid: String,
    pub vout: u32,
}

impl PartialEq for OutPoint {
    fn eq(&self, other: &Self) -> bool {
        self.txid == other.txid && self.vout == other.vout
    }
}

impl Hash for OutPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.txid.hash(state);
        self.vout.hash(state);
    }
}

/// The set of unspent transaction outputs, keyed by (txid, vout).
/// Mutated only by the ledger's apply-block step.
#[derive(Debug, Default)]
pub struct UtxoSet {
    map: HashMap<OutPoint, TxOutput>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Insert a single output into the set. Outpoints created by an accepted
    /// block are fresh, so inserting over an existing key is a programming
    /// error, not a recoverable condition.
    pub fn insert(&mut self, outpoint: OutPoint, output: TxOutput) {
        debug_assert!(
            !self.map.contains_key(&outpoint),
            "outpoint inserted twice: {}:{}",
            outpoint.txid,
            outpoint.vout
        );
        self.map.insert(outpoint, output);
    }

    /// Spend (remove) a single outpoint. Returns the removed output if it
    /// existed; removing a missing key is a no-op.
    pub fn spend(&mut self, outpoint: &OutPoint) -> Option<TxOutput> {
        self.map.remove(outpoint)
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        self.map.get(outpoint)
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.map.contains_key(outpoint)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Read-only iterator over all entries; order unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &TxOutput)> {
        self.map.iter()
    }

    /// All entries whose output pays the given address.
    pub fn utxos_for_address(&self, address: &str) -> Vec<(OutPoint, TxOutput)> {
        self.map
            .iter()
            .filter(|(_, out)| out.address == address)
            .map(|(op, out)| (op.clone(), out.clone()))
            .collect()
    }

    /// Sum of the amounts payable to the given address.
    pub fn balance(&self, address: &str) -> u128 {
        self.map
            .values()
            .filter(|out| out.address == address)
            .map(|out| out.amount as u128)
            .sum()
    }

    /// Insert every output of a transaction under its positional index
    /// (used when applying a mined block).
    pub fn add_outputs(&mut self, txid: &str, outputs: &[TxOutput]) {
        for (i, out) in outputs.iter().enumerate() {
            let op = OutPoint {
                txid: txid.to_string(),
                vout: i as u32,
            };
            self.insert(op, out.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(address: &str, amount: u64) -> TxOutput {
        TxOutput {
            address: address.into(),
            amount,
        }
    }

    fn op(txid: &str, vout: u32) -> OutPoint {
        OutPoint {
            txid: txid.into(),
            vout,
        }
    }

    #[test]
    fn insert_get_spend() {
        let mut set = UtxoSet::new();
        set.insert(op("a", 0), out("alice", 10));
        assert!(set.contains(&op("a", 0)));
        assert_eq!(set.get(&op("a", 0)).unwrap().amount, 10);

        let spent = set.spend(&op("a", 0)).unwrap();
        assert_eq!(spent.address, "alice");
        assert!(set.is_empty());
    }

    #[test]
    fn spend_missing_is_noop() {
        let mut set = UtxoSet::new();
        set.insert(op("a", 0), out("alice", 10));
        assert!(set.spend(&op("b", 0)).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn filters_by_address() {
        let mut set = UtxoSet::new();
        set.insert(op("a", 0), out("alice", 10));
        set.insert(op("a", 1), out("bob", 20));
        set.insert(op("b", 0), out("alice", 5));

        let alices = set.utxos_for_address("alice");
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|(_, o)| o.address == "alice"));
        assert_eq!(set.balance("alice"), 15);
        assert_eq!(set.balance("bob"), 20);
        assert_eq!(set.balance("nobody"), 0);
    }

    #[test]
    fn add_outputs_uses_positional_indexes() {
        let mut set = UtxoSet::new();
        set.add_outputs("t", &[out("alice", 1), out("bob", 2)]);
        assert_eq!(set.get(&op("t", 0)).unwrap().amount, 1);
        assert_eq!(set.get(&op("t", 1)).unwrap().amount, 2);
    }

    #[test]
    fn outpoint_equality_by_field_pair() {
        assert_eq!(op("x", 3), op("x", 3));
        assert_ne!(op("x", 3), op("x", 4));
        assert_ne!(op("x", 3), op("y", 3));
    }
}
