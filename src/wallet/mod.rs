use log::debug;
use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};

use crate::transaction::{Transaction, TxOutput, UtxoSet};

/// Generate a new secp256k1 keypair and return (priv_hex, pub_hex_compressed, address_hex).
/// Address is simply the hex of the compressed public key (didactic).
pub fn generate_keypair_hex() -> (String, String, String) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    let sk_hex = hex::encode(sk.secret_bytes());
    let pk_hex = hex::encode(pk.serialize()); // compressed (33 bytes)
    let address = pk_hex.clone();
    (sk_hex, pk_hex, address)
}

/// Derive address (hex of compressed pubkey) from a given hex pubkey.
/// Returns normalized hex (lowercase) if valid.
pub fn pubkey_to_address_hex(pubkey_hex: &str) -> Result<String, &'static str> {
    let bytes = hex::decode(pubkey_hex).map_err(|_| "invalid pubkey hex")?;
    let pk = PublicKey::from_slice(&bytes).map_err(|_| "invalid pubkey bytes")?;
    Ok(hex::encode(pk.serialize()))
}

/// Sign a 32-byte message hash with the given secret key (hex).
/// Returns the signature as hex DER.
pub fn sign_hash_hex(secret_hex: &str, msg32: [u8; 32]) -> Result<String, &'static str> {
    let secp = Secp256k1::new();
    let sk_bytes = hex::decode(secret_hex).map_err(|_| "invalid secret key hex")?;
    let sk = SecretKey::from_slice(&sk_bytes).map_err(|_| "invalid secret key bytes")?;
    let msg = Message::from_digest_slice(&msg32).map_err(|_| "invalid message length")?;
    let sig = secp.sign_ecdsa(&msg, &sk);
    Ok(hex::encode(sig.serialize_der()))
}

/// Verify a signature (hex DER) against the given pubkey (hex, compressed) and message hash (32 bytes).
pub fn verify_signature_hex(
    pubkey_hex: &str,
    sig_hex: &str,
    msg32: [u8; 32],
) -> Result<bool, &'static str> {
    let secp = Secp256k1::verification_only();

    let sig_bytes = hex::decode(sig_hex).map_err(|_| "invalid signature hex")?;
    let sig = Signature::from_der(&sig_bytes).map_err(|_| "invalid DER signature")?;

    let pk_bytes = hex::decode(pubkey_hex).map_err(|_| "invalid pubkey hex")?;
    let pk = PublicKey::from_slice(&pk_bytes).map_err(|_| "invalid pubkey bytes")?;

    let msg = Message::from_digest_slice(&msg32).map_err(|_| "invalid message length")?;
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

/// Keeps a keypair and builds signed transactions to hand to the ledger.
/// The id only exists to make wallets easier to tell apart.
#[derive(Debug)]
pub struct Wallet {
    pub id: String,
    secret_hex: String,
    public_hex: String,
}

impl Wallet {
    pub fn new(id: &str) -> Self {
        let (secret_hex, public_hex, _) = generate_keypair_hex();
        Self {
            id: id.to_string(),
            secret_hex,
            public_hex,
        }
    }

    pub fn address(&self) -> &str {
        &self.public_hex
    }

    /// Sum of this wallet's spendable outputs in the given UTXO set.
    pub fn balance(&self, utxo: &UtxoSet) -> u128 {
        utxo.balance(&self.public_hex)
    }

    /// Build and sign a transaction paying `value` to `recipient`.
    ///
    /// Spends ALL of the wallet's UTXOs (the complete balance), paying the
    /// change back to the wallet's own address. Returns `None` when the
    /// balance cannot cover `value`; insufficient funds is not a ledger
    /// failure, just the absence of a transaction.
    pub fn create_transaction(
        &self,
        utxo: &UtxoSet,
        value: u64,
        recipient: &str,
    ) -> Option<Transaction> {
        let own = utxo.utxos_for_address(&self.public_hex);
        let balance: u128 = own.iter().map(|(_, out)| out.amount as u128).sum();
        if balance < value as u128 {
            debug!(
                "wallet {}: insufficient funds ({} < {})",
                self.id, balance, value
            );
            return None;
        }

        let mut tx = Transaction::new(self.public_hex.clone());
        for (outpoint, _) in own {
            tx.add_input(outpoint);
        }
        tx.add_output(TxOutput {
            address: recipient.to_string(),
            amount: value,
        });
        let change = (balance - value as u128) as u64;
        if change > 0 {
            tx.add_output(TxOutput {
                address: self.public_hex.clone(),
                amount: change,
            });
        }

        tx.sign_using(&self.secret_hex).ok()?;
        Some(tx)
    }
}
