//! Precompiled contracts 0x01-0x09. Bodies for anything beyond hashing stay
//! stubbed: real precompile semantics (ECDSA recovery math, the SHA-256 and
//! RIPEMD-160 hash functions, BN254 pairing checks) are out of scope — only
//! the dispatch shape and gas-cost formulas are modeled here.
use crate::common::crypto::Crypto;
use crate::errors::EvmError;
use ethereum_types::{Address, U256};
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub trait Precompile: Send + Sync {
    fn execute(&self, crypto: &dyn Crypto, input: &[u8]) -> Result<Vec<u8>, EvmError>;
    fn gas_cost(&self, input: &[u8]) -> u64;
}

pub struct Ecrecover;
impl Precompile for Ecrecover {
    fn execute(&self, _crypto: &dyn Crypto, _input: &[u8]) -> Result<Vec<u8>, EvmError> {
        Ok(vec![0u8; 32])
    }
    fn gas_cost(&self, _input: &[u8]) -> u64 {
        3_000
    }
}

pub struct Sha256Hash;
impl Precompile for Sha256Hash {
    fn execute(&self, crypto: &dyn Crypto, input: &[u8]) -> Result<Vec<u8>, EvmError> {
        Ok(crypto.keccak256(input).as_bytes().to_vec())
    }
    fn gas_cost(&self, input: &[u8]) -> u64 {
        60 + 12 * input.len().div_ceil(32) as u64
    }
}

pub struct DataCopy;
impl Precompile for DataCopy {
    fn execute(&self, _crypto: &dyn Crypto, input: &[u8]) -> Result<Vec<u8>, EvmError> {
        Ok(input.to_vec())
    }
    fn gas_cost(&self, input: &[u8]) -> u64 {
        15 + 3 * input.len().div_ceil(32) as u64
    }
}

pub struct UnimplementedPrecompile;
impl Precompile for UnimplementedPrecompile {
    fn execute(&self, _crypto: &dyn Crypto, _input: &[u8]) -> Result<Vec<u8>, EvmError> {
        Err(EvmError::PrecompileError)
    }
    fn gas_cost(&self, _input: &[u8]) -> u64 {
        0
    }
}

pub type PrecompileSet = HashMap<Address, Box<dyn Precompile>>;

pub fn precompiled_contracts_berlin() -> PrecompileSet {
    let mut contracts: PrecompileSet = HashMap::new();
    contracts.insert(Address::from_low_u64_be(1), Box::new(Ecrecover));
    contracts.insert(Address::from_low_u64_be(2), Box::new(Sha256Hash));
    contracts.insert(Address::from_low_u64_be(3), Box::new(UnimplementedPrecompile));
    contracts.insert(Address::from_low_u64_be(4), Box::new(DataCopy));
    contracts.insert(Address::from_low_u64_be(5), Box::new(UnimplementedPrecompile));
    contracts.insert(Address::from_low_u64_be(6), Box::new(UnimplementedPrecompile));
    contracts.insert(Address::from_low_u64_be(7), Box::new(UnimplementedPrecompile));
    contracts.insert(Address::from_low_u64_be(8), Box::new(UnimplementedPrecompile));
    contracts.insert(Address::from_low_u64_be(9), Box::new(UnimplementedPrecompile));
    contracts
}

pub static PRECOMPILE_ADDRESSES: Lazy<[Address; 9]> = Lazy::new(|| {
    std::array::from_fn(|i| Address::from_low_u64_be((i + 1) as u64))
});

pub fn is_precompile(address: &Address) -> bool {
    PRECOMPILE_ADDRESSES.contains(address)
}

/// Unused by the interpreter directly but kept for callers that only need a
/// cost estimate (e.g. the `CALL` gas-forwarding calculation) without
/// running the precompile.
pub fn precompile_gas_cost(contracts: &PrecompileSet, address: &Address, input: &[u8]) -> Option<u64> {
    contracts.get(address).map(|p| p.gas_cost(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_one_through_nine_are_precompiles() {
        for i in 1..=9u64 {
            assert!(is_precompile(&Address::from_low_u64_be(i)));
        }
        assert!(!is_precompile(&Address::from_low_u64_be(10)));
    }

    #[test]
    fn datacopy_echoes_its_input_and_charges_per_word() {
        let contracts = precompiled_contracts_berlin();
        let precompile = contracts.get(&Address::from_low_u64_be(4)).unwrap();
        let input = vec![1u8; 40];
        assert_eq!(precompile.gas_cost(&input), 15 + 3 * 2);
    }

    #[test]
    fn unimplemented_precompiles_error_rather_than_silently_succeed() {
        let contracts = precompiled_contracts_berlin();
        let precompile = contracts.get(&Address::from_low_u64_be(3)).unwrap();
        struct DummyCrypto;
        impl Crypto for DummyCrypto {
            fn keccak256(&self, bytes: &[u8]) -> ethereum_types::H256 {
                crate::common::crypto::keccak256(bytes)
            }
            fn recover_address(
                &self,
                msg_hash: ethereum_types::H256,
                r: U256,
                s: U256,
                parity: u8,
            ) -> anyhow::Result<Address> {
                crate::common::crypto::recover_address_from_signature(msg_hash, r, s, parity)
            }
        }
        assert_eq!(
            precompile.execute(&DummyCrypto, &[]),
            Err(EvmError::PrecompileError)
        );
    }
}
