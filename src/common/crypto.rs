use anyhow::Result;
use ethereum_types::{Address, H256, U256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

/// A hashing/signature-recovery seam so the interpreter and EEI never call
/// `sha3`/`k256` directly. Lets callers swap in a mock for deterministic
/// tests without touching call sites.
pub trait Crypto {
    fn keccak256(&self, bytes: &[u8]) -> H256;
    fn recover_address(&self, msg_hash: H256, r: U256, s: U256, parity: u8) -> Result<Address>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Keccak;

impl Crypto for Keccak {
    fn keccak256(&self, bytes: &[u8]) -> H256 {
        keccak256(bytes)
    }

    fn recover_address(&self, msg_hash: H256, r: U256, s: U256, parity: u8) -> Result<Address> {
        recover_address_from_signature(msg_hash, r, s, parity)
    }
}

pub fn keccak256(bytes: &[u8]) -> H256 {
    H256::from_slice(&Keccak256::digest(bytes))
}

pub fn public_key_to_eth_address(pubkey: &VerifyingKey) -> Address {
    let pubkey_encoded = pubkey.to_encoded_point(false); // uncompressed, starts with 0x04
    let pubkey_bytes = &pubkey_encoded.as_bytes()[1..]; // drop the 0x04 prefix

    let hash = Keccak256::digest(pubkey_bytes);
    Address::from_slice(&hash[12..])
}

pub fn recover_address_from_signature(
    msg_hash: H256,
    r: U256,
    s: U256,
    parity: u8,
) -> Result<Address> {
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&r.to_big_endian());
    sig_bytes[32..].copy_from_slice(&s.to_big_endian());
    let signature = Signature::try_from(&sig_bytes[..])?;

    let recovery_id = RecoveryId::try_from(parity)?;

    let recovered_key = VerifyingKey::recover_from_digest(
        Keccak256::new_with_prefix(msg_hash),
        &signature,
        recovery_id,
    )?;

    Ok(public_key_to_eth_address(&recovered_key))
}

pub fn sign_message_hash(message_hash: H256, signing_key: &SigningKey) -> (H256, H256, u8) {
    let digest = Keccak256::new_with_prefix(message_hash);
    let (signature, recovery_id): (Signature, RecoveryId) =
        signing_key.sign_digest_recoverable(digest).unwrap();

    let sig_bytes = signature.to_bytes();
    let r = H256::from_slice(&sig_bytes[..32]);
    let s = H256::from_slice(&sig_bytes[32..]);
    let v = recovery_id.to_byte();

    (r, s, v)
}
