use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::utxo::{OutPoint, UtxoSet};
use crate::crypto;
use crate::wallet::{pubkey_to_address_hex, sign_hash_hex, verify_signature_hex};

/// References a previous unspent output (UTXO).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    pub outpoint: OutPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: String,
    pub amount: u64,
}

/// An ordinary transaction: inputs spending UTXOs, outputs creating new ones.
///
/// Simplification: all inputs are assumed to belong to the same sender, so a
/// single public key and one signature over the canonical inputs+outputs
/// payload cover the whole transaction. Inputs and outputs are appended
/// during construction; after `sign_using` the transaction is treated as
/// immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Hex-encoded compressed secp256k1 public key of the sender.
    pub sender_pubkey: String,
    /// Hex-encoded DER ECDSA signature over `sighash()`. Empty until signed.
    pub signature: String,
}

impl Transaction {
    pub fn new(sender_pubkey: String) -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            sender_pubkey,
            signature: String::new(),
        }
    }

    pub fn add_input(&mut self, outpoint: OutPoint) {
        self.inputs.push(TxInput { outpoint });
    }

    pub fn add_output(&mut self, output: TxOutput) {
        self.outputs.push(output);
    }

    /// Canonical signing payload (JSON) covering outpoints and outputs but
    /// not the key or signature. Field order is fixed by the serializer, so
    /// distinct contents cannot collide.
    pub fn signing_payload(&self) -> Vec<u8> {
        let lite_inputs: Vec<_> = self
            .inputs
            .iter()
            .map(|i| serde_json::json!({ "txid": i.outpoint.txid, "vout": i.outpoint.vout }))
            .collect();
        let payload = serde_json::json!({
            "inputs": lite_inputs,
            "outputs": self.outputs,
        });
        serde_json::to_vec(&payload).expect("serialize signing payload")
    }

    /// SHA-256 of the signing payload.
    pub fn sighash(&self) -> [u8; 32] {
        crypto::sha256(&self.signing_payload())
    }

    /// Sign the canonical payload with the given secret key (hex) and store
    /// the signature on the transaction.
    pub fn sign_using(&mut self, secret_hex: &str) -> Result<(), &'static str> {
        self.signature = sign_hash_hex(secret_hex, self.sighash())?;
        Ok(())
    }

    /// Stable identifier: SHA-256 over the full canonical content, signature
    /// included, as 64 hex chars.
    pub fn txid(&self) -> String {
        let bytes = serde_json::to_vec(self).expect("serialize tx");
        crypto::sha256_hex(&bytes)
    }

    pub fn total_output_amount(&self) -> u128 {
        self.outputs.iter().map(|o| o.amount as u128).sum()
    }
}

/// A reward-only transaction created by the node itself, once per block.
/// The block height is hashed into the txid so that coinbase ids stay unique
/// even when message and reward repeat (BIP34-style salt).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinbaseTx {
    pub block_height: u64,
    pub message: String,
    pub output: TxOutput,
}

impl CoinbaseTx {
    pub fn new(block_height: u64, message: String, miner_address: &str, reward: u64) -> Self {
        Self {
            block_height,
            message,
            output: TxOutput {
                address: miner_address.to_string(),
                amount: reward,
            },
        }
    }

    /// Stable identifier: SHA-256 over height, message and output.
    pub fn txid(&self) -> String {
        let bytes = serde_json::to_vec(self).expect("serialize coinbase");
        crypto::sha256_hex(&bytes)
    }
}

/// Coinbase validity: the single output must carry a strictly positive value.
pub fn validate_coinbase(cx: &CoinbaseTx) -> Result<(), &'static str> {
    if cx.output.amount == 0 {
        return Err("coinbase output amount must be > 0");
    }
    Ok(())
}

/// Transaction validity against a UTXO set snapshot. Pure read-only check;
/// each failure is terminal and reported as a reason string.
pub fn validate_transaction(tx: &Transaction, utxo: &UtxoSet) -> Result<(), &'static str> {
    // Structure: nothing may be missing or empty
    if tx.inputs.is_empty() {
        return Err("transaction has no inputs");
    }
    if tx.outputs.is_empty() {
        return Err("transaction has no outputs");
    }
    if tx.sender_pubkey.is_empty() {
        return Err("missing sender public key");
    }
    if tx.signature.is_empty() {
        return Err("missing signature");
    }

    // No output may be zero (amounts are unsigned, so negative is impossible)
    if tx.outputs.iter().any(|o| o.amount == 0) {
        return Err("output amount must be > 0");
    }

    // No duplicate inputs, checked before any UTXO lookup
    let mut seen = HashSet::<(&str, u32)>::new();
    for input in &tx.inputs {
        let key = (input.outpoint.txid.as_str(), input.outpoint.vout);
        if !seen.insert(key) {
            return Err("duplicate input outpoint in transaction");
        }
    }

    // Every input must exist in the UTXO set and belong to the sender
    let sender_address = pubkey_to_address_hex(&tx.sender_pubkey)?;
    let mut input_sum: u128 = 0;
    for input in &tx.inputs {
        let prev_out = utxo
            .get(&input.outpoint)
            .ok_or("referenced UTXO not found")?;
        if prev_out.address != sender_address {
            return Err("sender does not own referenced UTXO (address mismatch)");
        }
        input_sum += prev_out.amount as u128;
    }

    // The signature must verify against the sender's key
    if !verify_signature_hex(&tx.sender_pubkey, &tx.signature, tx.sighash())? {
        return Err("invalid signature");
    }

    // Conservation: spent value must cover created value
    if input_sum < tx.total_output_amount() {
        return Err("inputs total is less than outputs total");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::generate_keypair_hex;

    fn signed_tx(
        secret: &str,
        pubkey: &str,
        inputs: Vec<OutPoint>,
        outputs: Vec<TxOutput>,
    ) -> Transaction {
        let mut tx = Transaction::new(pubkey.to_string());
        for op in inputs {
            tx.add_input(op);
        }
        for out in outputs {
            tx.add_output(out);
        }
        tx.sign_using(secret).expect("sign");
        tx
    }

    fn op(txid: &str, vout: u32) -> OutPoint {
        OutPoint {
            txid: txid.into(),
            vout,
        }
    }

    fn out(address: &str, amount: u64) -> TxOutput {
        TxOutput {
            address: address.into(),
            amount,
        }
    }

    #[test]
    fn txid_is_deterministic_and_content_sensitive() {
        let (sk, pk, addr) = generate_keypair_hex();
        let a = signed_tx(&sk, &pk, vec![op("t", 0)], vec![out(&addr, 5)]);
        let b = signed_tx(&sk, &pk, vec![op("t", 0)], vec![out(&addr, 6)]);
        assert_eq!(a.txid(), a.txid());
        assert_ne!(a.txid(), b.txid());
        assert_eq!(a.txid().len(), 64);
    }

    #[test]
    fn coinbase_txid_changes_with_height() {
        let a = CoinbaseTx::new(0, "m".into(), "addr", 50);
        let b = CoinbaseTx::new(1, "m".into(), "addr", 50);
        assert_ne!(a.txid(), b.txid());
    }

    #[test]
    fn coinbase_zero_reward_is_invalid() {
        let cx = CoinbaseTx::new(0, "m".into(), "addr", 0);
        assert!(validate_coinbase(&cx).is_err());
        let cx = CoinbaseTx::new(0, "m".into(), "addr", 50);
        assert!(validate_coinbase(&cx).is_ok());
    }

    #[test]
    fn rejects_structural_problems() {
        let (sk, pk, addr) = generate_keypair_hex();
        let utxo = UtxoSet::new();

        // no inputs
        let mut tx = Transaction::new(pk.clone());
        tx.add_output(out(&addr, 5));
        tx.sign_using(&sk).unwrap();
        assert_eq!(validate_transaction(&tx, &utxo), Err("transaction has no inputs"));

        // no outputs
        let mut tx = Transaction::new(pk.clone());
        tx.add_input(op("t", 0));
        tx.sign_using(&sk).unwrap();
        assert_eq!(validate_transaction(&tx, &utxo), Err("transaction has no outputs"));

        // unsigned
        let mut tx = Transaction::new(pk.clone());
        tx.add_input(op("t", 0));
        tx.add_output(out(&addr, 5));
        assert_eq!(validate_transaction(&tx, &utxo), Err("missing signature"));

        // no sender key
        let mut tx = Transaction::new(String::new());
        tx.add_input(op("t", 0));
        tx.add_output(out(&addr, 5));
        tx.signature = "00".into();
        assert_eq!(validate_transaction(&tx, &utxo), Err("missing sender public key"));
    }

    #[test]
    fn rejects_zero_output() {
        let (sk, pk, addr) = generate_keypair_hex();
        let mut utxo = UtxoSet::new();
        utxo.insert(op("t", 0), out(&addr, 10));

        let tx = signed_tx(&sk, &pk, vec![op("t", 0)], vec![out("bob", 0)]);
        assert_eq!(validate_transaction(&tx, &utxo), Err("output amount must be > 0"));
    }

    #[test]
    fn rejects_duplicate_inputs_before_utxo_lookup() {
        let (sk, pk, addr) = generate_keypair_hex();
        // empty UTXO set: the duplicate must be reported, not the missing UTXO
        let utxo = UtxoSet::new();
        let tx = signed_tx(
            &sk,
            &pk,
            vec![op("t", 0), op("t", 0)],
            vec![out(&addr, 1), out(&addr, 2)],
        );
        assert_eq!(
            validate_transaction(&tx, &utxo),
            Err("duplicate input outpoint in transaction")
        );
    }

    #[test]
    fn rejects_unknown_outpoint() {
        let (sk, pk, addr) = generate_keypair_hex();
        let utxo = UtxoSet::new();
        let tx = signed_tx(&sk, &pk, vec![op("t", 0)], vec![out(&addr, 1)]);
        assert_eq!(validate_transaction(&tx, &utxo), Err("referenced UTXO not found"));
    }

    #[test]
    fn rejects_foreign_utxo() {
        let (sk, pk, _) = generate_keypair_hex();
        let mut utxo = UtxoSet::new();
        utxo.insert(op("t", 0), out("someone-else", 10));
        let tx = signed_tx(&sk, &pk, vec![op("t", 0)], vec![out("bob", 5)]);
        assert_eq!(
            validate_transaction(&tx, &utxo),
            Err("sender does not own referenced UTXO (address mismatch)")
        );
    }

    #[test]
    fn rejects_bad_signature() {
        let (sk, pk, addr) = generate_keypair_hex();
        let (other_sk, _, _) = generate_keypair_hex();
        let mut utxo = UtxoSet::new();
        utxo.insert(op("t", 0), out(&addr, 10));

        let mut tx = Transaction::new(pk.clone());
        tx.add_input(op("t", 0));
        tx.add_output(out("bob", 5));
        tx.sign_using(&other_sk).unwrap();
        assert_eq!(validate_transaction(&tx, &utxo), Err("invalid signature"));

        // tampering after signing also breaks the signature
        let mut tx = Transaction::new(pk);
        tx.add_input(op("t", 0));
        tx.add_output(out("bob", 5));
        tx.sign_using(&sk).unwrap();
        tx.outputs[0].amount = 9;
        assert_eq!(validate_transaction(&tx, &utxo), Err("invalid signature"));
    }

    #[test]
    fn rejects_overspend() {
        let (sk, pk, addr) = generate_keypair_hex();
        let mut utxo = UtxoSet::new();
        utxo.insert(op("t", 0), out(&addr, 10));
        let tx = signed_tx(&sk, &pk, vec![op("t", 0)], vec![out("bob", 11)]);
        assert_eq!(
            validate_transaction(&tx, &utxo),
            Err("inputs total is less than outputs total")
        );
    }

    #[test]
    fn validation_is_idempotent() {
        let (sk, pk, addr) = generate_keypair_hex();
        let mut utxo = UtxoSet::new();
        utxo.insert(op("t", 0), out(&addr, 10));
        let tx = signed_tx(&sk, &pk, vec![op("t", 0)], vec![out("bob", 4), out(&addr, 6)]);

        let first = validate_transaction(&tx, &utxo);
        let second = validate_transaction(&tx, &utxo);
        assert!(first.is_ok());
        assert_eq!(first, second);
    }
}
