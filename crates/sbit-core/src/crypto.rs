//! Signing for SBit transactions.
//!
//! The transaction builder only knows the [`Signer`] trait: anything that can
//! expose a public key and sign a 32-byte digest. [`KeyPair`] is the bundled
//! secp256k1 implementation used by the CLI and the tests.
//!
//! # Signing scheme
//!
//! Inputs are signed with a legacy `SIGHASH_ALL` digest: the transaction is
//! serialized with every scriptSig blanked except the one being signed, which
//! is replaced by the spent output's locking script; the 4-byte sighash type
//! is appended and the result is double-SHA-256 hashed. The unlocking script
//! is `<DER signature || sighash type> <compressed public key>`.

use ripemd::Ripemd160;
use secp256k1::{ecdsa, Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

use crate::constants::{HASH160_LEN, SIGHASH_ALL};
use crate::error::CryptoError;
use crate::network::NetworkParams;
use crate::script::{push_data, Script, ScriptElement};
use crate::types::{Hash256, Transaction};

/// Signing capability used by the transaction builder.
pub trait Signer: Send + Sync {
    /// Serialized public key placed in the unlocking script.
    fn public_key(&self) -> Vec<u8>;

    /// Sign a 32-byte digest, returning the DER-encoded signature.
    fn sign_digest(&self, digest: &Hash256) -> Result<Vec<u8>, CryptoError>;
}

/// Key hash used in addresses and P2PKH scripts: `RIPEMD160(SHA256(data))`.
pub fn hash160(data: &[u8]) -> [u8; HASH160_LEN] {
    let digest = Ripemd160::digest(Sha256::digest(data));
    let mut out = [0u8; HASH160_LEN];
    out.copy_from_slice(&digest);
    out
}

/// secp256k1 keypair with a compressed public key.
#[derive(Clone)]
pub struct KeyPair {
    secp: Secp256k1<secp256k1::All>,
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a random keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        use rand::RngCore;

        let mut bytes = Zeroizing::new([0u8; 32]);
        loop {
            rand::rngs::OsRng.fill_bytes(bytes.as_mut());
            // Out-of-range scalars are astronomically rare; draw again.
            if let Ok(keypair) = Self::from_secret_bytes(*bytes) {
                return keypair;
            }
        }
    }

    /// Build a keypair from a 32-byte scalar. Zero and values at or above
    /// the curve order are rejected.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self {
            secp,
            secret_key,
            public_key,
        })
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret_key.secret_bytes()
    }

    /// 33-byte compressed public key.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.serialize()
    }

    /// Key hash of this keypair's public key.
    pub fn pubkey_hash(&self) -> [u8; HASH160_LEN] {
        hash160(&self.public_key_bytes())
    }

    /// Export the secret as WIF: `wif || secret || 0x01`, Base58Check.
    pub fn to_wif(&self, network: &NetworkParams) -> String {
        let mut payload = Zeroizing::new(Vec::with_capacity(34));
        payload.push(network.wif);
        payload.extend_from_slice(&self.secret_bytes());
        payload.push(0x01);
        bs58::encode(payload.as_slice()).with_check().into_string()
    }

    /// Import a WIF secret for `network`. The trailing compression flag is optional.
    pub fn from_wif(s: &str, network: &NetworkParams) -> Result<Self, CryptoError> {
        let payload = Zeroizing::new(
            bs58::decode(s)
                .with_check(None)
                .into_vec()
                .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?,
        );

        let secret = match payload.as_slice() {
            [version, ..] if *version != network.wif => {
                return Err(CryptoError::InvalidSecretKey(format!(
                    "version {version:#04x} is not a {} key",
                    network.name
                )));
            }
            [_, secret @ .., 0x01] if secret.len() == 32 => secret,
            [_, secret @ ..] if secret.len() == 32 => secret,
            _ => {
                return Err(CryptoError::InvalidSecretKey(format!(
                    "unexpected length {}",
                    payload.len()
                )));
            }
        };

        let mut bytes = Zeroizing::new([0u8; 32]);
        bytes.copy_from_slice(secret);
        Self::from_secret_bytes(*bytes)
    }
}

impl Signer for KeyPair {
    fn public_key(&self) -> Vec<u8> {
        self.public_key_bytes().to_vec()
    }

    fn sign_digest(&self, digest: &Hash256) -> Result<Vec<u8>, CryptoError> {
        let msg = Message::from_digest(digest.0);
        let sig = self.secp.sign_ecdsa(&msg, &self.secret_key);
        Ok(sig.serialize_der().to_vec())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

/// Compute the `SIGHASH_ALL` digest for one input.
///
/// `prev_script` is the locking script of the output being spent.
pub fn signing_hash(
    tx: &Transaction,
    input_index: usize,
    prev_script: &Script,
) -> Result<Hash256, CryptoError> {
    if input_index >= tx.inputs.len() {
        return Err(CryptoError::InputIndexOutOfBounds {
            index: input_index,
            len: tx.inputs.len(),
        });
    }

    let mut copy = tx.clone();
    for (i, input) in copy.inputs.iter_mut().enumerate() {
        input.script_sig = if i == input_index {
            prev_script.clone()
        } else {
            Script::new()
        };
    }

    let mut data = copy.to_bytes();
    data.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
    Ok(Hash256::double_sha256(&data))
}

/// Sign a P2PKH input in place.
///
/// The spent output is assumed to pay the signer's own key hash. Inputs can
/// be signed in any order since the digest blanks every other scriptSig.
pub fn sign_transaction_input(
    tx: &mut Transaction,
    input_index: usize,
    signer: &dyn Signer,
) -> Result<(), CryptoError> {
    let public_key = signer.public_key();
    let prev_script = Script::p2pkh(&hash160(&public_key));
    let sighash = signing_hash(tx, input_index, &prev_script)?;

    let mut signature = signer.sign_digest(&sighash)?;
    signature.push(SIGHASH_ALL as u8);

    let mut script_sig = Vec::with_capacity(signature.len() + public_key.len() + 2);
    push_data(&mut script_sig, &signature);
    push_data(&mut script_sig, &public_key);
    tx.inputs[input_index].script_sig = Script(script_sig);
    Ok(())
}

/// Verify an ECDSA-signed P2PKH input against the expected key hash.
pub fn verify_transaction_input(
    tx: &Transaction,
    input_index: usize,
    expected_pubkey_hash: &[u8; HASH160_LEN],
) -> Result<(), CryptoError> {
    let input = tx.inputs.get(input_index).ok_or(CryptoError::InputIndexOutOfBounds {
        index: input_index,
        len: tx.inputs.len(),
    })?;

    let elements = input
        .script_sig
        .elements()
        .ok_or(CryptoError::MalformedScriptSig)?;
    let [ScriptElement::Data(sig), ScriptElement::Data(pk)] = elements.as_slice() else {
        return Err(CryptoError::MalformedScriptSig);
    };

    let (sighash_type, der) = sig.split_last().ok_or(CryptoError::InvalidSignature)?;
    if *sighash_type as u32 != SIGHASH_ALL {
        return Err(CryptoError::InvalidSignature);
    }
    if hash160(pk) != *expected_pubkey_hash {
        return Err(CryptoError::PubkeyHashMismatch);
    }

    let public_key = PublicKey::from_slice(pk).map_err(|_| CryptoError::InvalidPublicKey)?;
    let signature = ecdsa::Signature::from_der(der).map_err(|_| CryptoError::InvalidSignature)?;
    let sighash = signing_hash(tx, input_index, &Script::p2pkh(expected_pubkey_hash))?;

    Secp256k1::verification_only()
        .verify_ecdsa(&Message::from_digest(sighash.0), &signature, &public_key)
        .map_err(|_| CryptoError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COIN;
    use crate::network::Network;
    use crate::types::{OutPoint, TxInput, TxOutput};

    /// Secret key 1; its public key is the curve generator.
    const ONE: [u8; 32] = {
        let mut b = [0u8; 32];
        b[31] = 1;
        b
    };
    const GENERATOR: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn keypair(seed: u8) -> KeyPair {
        KeyPair::from_secret_bytes([seed; 32]).unwrap()
    }

    fn sample_tx(n_inputs: u8) -> Transaction {
        Transaction {
            inputs: (0..n_inputs)
                .map(|i| {
                    TxInput::unsigned(OutPoint {
                        txid: Hash256([i + 1; 32]),
                        vout: i as u32,
                    })
                })
                .collect(),
            outputs: vec![TxOutput {
                value: 10 * COIN,
                script_pubkey: Script::p2pkh(&[0xBB; 20]),
            }],
            ..Transaction::default()
        }
    }

    // --- Key hash ---

    #[test]
    fn hash160_of_generator_pubkey() {
        let pubkey = hex::decode(GENERATOR).unwrap();
        assert_eq!(
            hex::encode(hash160(&pubkey)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn hash160_of_empty_input() {
        assert_eq!(
            hex::encode(hash160(b"")),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }

    // --- KeyPair ---

    #[test]
    fn secret_one_gives_generator() {
        let kp = KeyPair::from_secret_bytes(ONE).unwrap();
        assert_eq!(hex::encode(kp.public_key_bytes()), GENERATOR);
        assert_eq!(
            hex::encode(kp.pubkey_hash()),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn keypair_rejects_out_of_range_secret() {
        assert!(matches!(
            KeyPair::from_secret_bytes([0u8; 32]),
            Err(CryptoError::InvalidSecretKey(_))
        ));
        assert!(matches!(
            KeyPair::from_secret_bytes([0xffu8; 32]),
            Err(CryptoError::InvalidSecretKey(_))
        ));
    }

    #[test]
    fn keypair_generate_unique() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        assert_ne!(kp1.public_key_bytes(), kp2.public_key_bytes());
    }

    #[test]
    fn keypair_from_secret_deterministic() {
        let kp1 = keypair(42);
        let kp2 = keypair(42);
        assert_eq!(kp1.public_key_bytes(), kp2.public_key_bytes());
        assert_eq!(kp1.secret_bytes(), kp2.secret_bytes());
    }

    #[test]
    fn keypair_debug_hides_secret() {
        let kp = keypair(7);
        let debug = format!("{kp:?}");
        assert!(debug.contains("public_key"));
        assert!(!debug.contains(&hex::encode([7u8; 32])));
    }

    // --- WIF ---

    #[test]
    fn wif_known_vector() {
        // 0x80 is the mainnet WIF version, shared with Bitcoin.
        let params = Network::Mainnet.params();
        let wif = "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn";
        let kp = KeyPair::from_wif(wif, &params).unwrap();
        assert_eq!(kp.secret_bytes(), ONE);
        assert_eq!(kp.to_wif(&params), wif);
    }

    #[test]
    fn wif_round_trip() {
        let params = Network::Testnet.params();
        let kp = keypair(9);
        let wif = kp.to_wif(&params);
        let back = KeyPair::from_wif(&wif, &params).unwrap();
        assert_eq!(back.secret_bytes(), kp.secret_bytes());
    }

    #[test]
    fn wif_without_compression_flag() {
        let params = Network::Mainnet.params();
        let mut payload = vec![params.wif];
        payload.extend_from_slice(&[3u8; 32]);
        let wif = bs58::encode(payload).with_check().into_string();
        let kp = KeyPair::from_wif(&wif, &params).unwrap();
        assert_eq!(kp.secret_bytes(), [3u8; 32]);
    }

    #[test]
    fn wif_rejects_other_network() {
        let wif = keypair(9).to_wif(&Network::Testnet.params());
        let err = KeyPair::from_wif(&wif, &Network::Mainnet.params()).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSecretKey(_)));
    }

    #[test]
    fn wif_rejects_garbage() {
        let err = KeyPair::from_wif("not-base58!", &Network::Mainnet.params()).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSecretKey(_)));
    }

    // --- Signing ---

    #[test]
    fn sign_and_verify_every_input() {
        let kp = keypair(1);
        let mut tx = sample_tx(3);
        for i in 0..3 {
            sign_transaction_input(&mut tx, i, &kp).unwrap();
        }
        for i in 0..3 {
            verify_transaction_input(&tx, i, &kp.pubkey_hash()).unwrap();
        }
    }

    #[test]
    fn script_sig_layout() {
        let kp = keypair(1);
        let mut tx = sample_tx(1);
        sign_transaction_input(&mut tx, 0, &kp).unwrap();
        let s = tx.inputs[0].script_sig.as_bytes();

        let sig_len = s[0] as usize;
        assert!((9..=73).contains(&sig_len));
        // DER sequence tag, then the sighash byte closes the push.
        assert_eq!(s[1], 0x30);
        assert_eq!(s[2] as usize, sig_len - 3);
        assert_eq!(s[sig_len], SIGHASH_ALL as u8);
        assert_eq!(s[sig_len + 1], 33);
        assert_eq!(&s[sig_len + 2..], &kp.public_key_bytes());
    }

    #[test]
    fn signatures_are_deterministic() {
        let kp = keypair(5);
        let digest = Hash256([0x42; 32]);
        assert_eq!(kp.sign_digest(&digest).unwrap(), kp.sign_digest(&digest).unwrap());
    }

    #[test]
    fn signing_order_does_not_matter() {
        let kp = keypair(2);
        let mut forward = sample_tx(2);
        let mut backward = sample_tx(2);
        sign_transaction_input(&mut forward, 0, &kp).unwrap();
        sign_transaction_input(&mut forward, 1, &kp).unwrap();
        sign_transaction_input(&mut backward, 1, &kp).unwrap();
        sign_transaction_input(&mut backward, 0, &kp).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn sign_out_of_bounds() {
        let kp = keypair(1);
        let mut tx = sample_tx(1);
        let err = sign_transaction_input(&mut tx, 5, &kp).unwrap_err();
        assert_eq!(err, CryptoError::InputIndexOutOfBounds { index: 5, len: 1 });
    }

    #[test]
    fn verify_rejects_wrong_owner() {
        let kp = keypair(1);
        let mut tx = sample_tx(1);
        sign_transaction_input(&mut tx, 0, &kp).unwrap();
        let err = verify_transaction_input(&tx, 0, &[0u8; 20]).unwrap_err();
        assert_eq!(err, CryptoError::PubkeyHashMismatch);
    }

    #[test]
    fn verify_rejects_tampered_output() {
        let kp = keypair(1);
        let mut tx = sample_tx(1);
        sign_transaction_input(&mut tx, 0, &kp).unwrap();
        tx.outputs[0].value += 1;
        let err = verify_transaction_input(&tx, 0, &kp.pubkey_hash()).unwrap_err();
        assert_eq!(err, CryptoError::VerificationFailed);
    }

    #[test]
    fn verify_rejects_raw_signature_bytes() {
        let kp = keypair(1);
        let mut tx = sample_tx(1);
        let mut raw = vec![0x11; 64];
        raw.push(SIGHASH_ALL as u8);
        let mut script_sig = Vec::new();
        push_data(&mut script_sig, &raw);
        push_data(&mut script_sig, &kp.public_key_bytes());
        tx.inputs[0].script_sig = Script(script_sig);

        let err = verify_transaction_input(&tx, 0, &kp.pubkey_hash()).unwrap_err();
        assert_eq!(err, CryptoError::InvalidSignature);
    }

    #[test]
    fn verify_rejects_unsigned_input() {
        let tx = sample_tx(1);
        let err = verify_transaction_input(&tx, 0, &[0u8; 20]).unwrap_err();
        assert_eq!(err, CryptoError::MalformedScriptSig);
    }

    #[test]
    fn signing_hash_commits_to_index() {
        let tx = sample_tx(2);
        let script = Script::p2pkh(&[0x11; 20]);
        let h0 = signing_hash(&tx, 0, &script).unwrap();
        let h1 = signing_hash(&tx, 1, &script).unwrap();
        assert_ne!(h0, h1);
    }
}
