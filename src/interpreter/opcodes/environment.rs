//! ENV/BLOCK INFO opcodes: everything that reads the read-only `Environment`
//! or reaches out to the `Eei` for another account's state.
use crate::eei::Eei;
use crate::errors::EvmError;
use crate::hardfork::{COLD_ACCOUNT_ACCESS_COST, WARM_ACCESS_COST};
use crate::interpreter::state::{ControlFlow, RunState};
use ethereum_types::{Address, U256};

fn address_from_u256(value: U256) -> Address {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    Address::from_slice(&bytes[12..])
}

/// EIP-2929's cold/warm split for BALANCE/EXTCODESIZE/EXTCODEHASH/EXTCODECOPY.
/// Pre-Berlin these opcodes charge a flat 100 gas instead (the value the
/// dispatch table used for every hardfork before this split existed).
fn charge_address_access(s: &mut RunState, eei: &mut dyn Eei, address: &Address) -> Result<(), EvmError> {
    if s.gas_schedule.apply_access_list_gas {
        let warm = eei.mark_address_warm(address);
        s.gas.consume(if warm { WARM_ACCESS_COST } else { COLD_ACCOUNT_ACCESS_COST })
    } else {
        s.gas.consume(WARM_ACCESS_COST)
    }
}

fn push_address(s: &mut RunState, address: Address) -> Result<ControlFlow, EvmError> {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(address.as_bytes());
    s.stack.push(U256::from_big_endian(&bytes))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_address(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    push_address(s, s.env.address)
}

pub fn exec_balance(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let address = address_from_u256(s.stack.pop()?);
    charge_address_access(s, eei, &address)?;
    s.stack.push(eei.balance(&address))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_origin(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    push_address(s, s.env.origin)
}

pub fn exec_caller(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    push_address(s, s.env.caller)
}

pub fn exec_callvalue(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(s.env.call_value)?;
    Ok(ControlFlow::Continue)
}

pub fn exec_calldataload(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let offset = s.stack.pop()?.as_usize();
    let mut bytes = [0u8; 32];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = s.env.call_data.get(offset + i).copied().unwrap_or(0);
    }
    s.stack.push(U256::from_big_endian(&bytes))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_calldatasize(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from(s.env.call_data.len()))?;
    Ok(ControlFlow::Continue)
}

fn copy_zero_padded(src: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = src.get(offset + i).copied().unwrap_or(0);
    }
    out
}

fn charge_copy(s: &mut RunState, dest_offset: usize, len: usize) -> Result<(), EvmError> {
    if let Some(words) = crate::memory::Memory::required_size(dest_offset, len) {
        s.gas.charge_memory_expansion((words / 32) as u64)?;
    }
    let word_count = len.div_ceil(32) as u64;
    s.gas.consume(word_count * 3)
}

pub fn exec_calldatacopy(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let dest_offset = s.stack.pop()?.as_usize();
    let offset = s.stack.pop()?.as_usize();
    let len = s.stack.pop()?.as_usize();
    charge_copy(s, dest_offset, len)?;
    let data = copy_zero_padded(&s.env.call_data, offset, len);
    s.memory.write(dest_offset, &data);
    Ok(ControlFlow::Continue)
}

pub fn exec_codesize(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from(s.code.len()))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_codecopy(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let dest_offset = s.stack.pop()?.as_usize();
    let offset = s.stack.pop()?.as_usize();
    let len = s.stack.pop()?.as_usize();
    charge_copy(s, dest_offset, len)?;
    let data = copy_zero_padded(s.code.as_slice(), offset, len);
    s.memory.write(dest_offset, &data);
    Ok(ControlFlow::Continue)
}

pub fn exec_gasprice(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(s.env.gas_price)?;
    Ok(ControlFlow::Continue)
}

pub fn exec_extcodesize(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let address = address_from_u256(s.stack.pop()?);
    charge_address_access(s, eei, &address)?;
    s.stack.push(U256::from(eei.code_size(&address)))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_extcodecopy(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let address = address_from_u256(s.stack.pop()?);
    let dest_offset = s.stack.pop()?.as_usize();
    let offset = s.stack.pop()?.as_usize();
    let len = s.stack.pop()?.as_usize();
    charge_address_access(s, eei, &address)?;
    charge_copy(s, dest_offset, len)?;
    let code = eei.code(&address);
    let data = copy_zero_padded(&code, offset, len);
    s.memory.write(dest_offset, &data);
    Ok(ControlFlow::Continue)
}

pub fn exec_returndatasize(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from(s.return_data.len()))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_returndatacopy(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let dest_offset = s.stack.pop()?.as_usize();
    let offset = s.stack.pop()?.as_usize();
    let len = s.stack.pop()?.as_usize();
    charge_copy(s, dest_offset, len)?;
    let data = copy_zero_padded(&s.return_data, offset, len);
    s.memory.write(dest_offset, &data);
    Ok(ControlFlow::Continue)
}

pub fn exec_extcodehash(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let address = address_from_u256(s.stack.pop()?);
    charge_address_access(s, eei, &address)?;
    if !eei.account_exists(&address) {
        s.stack.push(U256::zero())?;
        return Ok(ControlFlow::Continue);
    }
    let hash = eei.code_hash(&address);
    s.stack.push(U256::from_big_endian(hash.as_bytes()))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_blockhash(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let number = s.stack.pop()?;
    let hash = eei.block_hash(number);
    s.stack.push(U256::from_big_endian(hash.as_bytes()))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_coinbase(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    push_address(s, s.env.block_coinbase)
}

pub fn exec_timestamp(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from(s.env.block_timestamp))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_number(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from(s.env.block_number))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_prevrandao(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from_big_endian(s.env.block_prev_randao.as_bytes()))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_gaslimit(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from(s.env.block_gas_limit))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_chainid(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from(s.env.chain_id))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_selfbalance(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(eei.balance(&s.env.address))?;
    Ok(ControlFlow::Continue)
}

pub fn exec_basefee(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(s.env.block_base_fee)?;
    Ok(ControlFlow::Continue)
}

pub fn exec_blobhash(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let index = s.stack.pop()?;
    let hash = if index < U256::from(s.env.blob_hashes.len()) {
        Some(s.env.blob_hashes[index.as_usize()])
    } else {
        None
    };
    match hash {
        Some(h) => s.stack.push(U256::from_big_endian(h.as_bytes()))?,
        None => s.stack.push(U256::zero())?,
    }
    Ok(ControlFlow::Continue)
}

pub fn exec_blobbasefee(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    s.stack.push(s.env.block_blob_base_fee)?;
    Ok(ControlFlow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardfork::Hardfork;
    use crate::interpreter::state::Environment;
    use crate::jumpdest::Code;
    use ethereum_types::H256;

    struct StubEei;
    impl Eei for StubEei {
        fn balance(&self, _address: &Address) -> U256 {
            U256::from(1000)
        }
        fn code(&self, _address: &Address) -> Vec<u8> {
            vec![0xAA, 0xBB]
        }
        fn code_hash(&self, _address: &Address) -> H256 {
            H256::from_low_u64_be(7)
        }
        fn code_size(&self, _address: &Address) -> usize {
            2
        }
        fn account_exists(&self, _address: &Address) -> bool {
            true
        }
        fn storage_load(&self, _address: &Address, _key: U256) -> U256 {
            U256::zero()
        }
        fn storage_store(&mut self, _address: &Address, _key: U256, _value: U256) -> Result<(), EvmError> {
            Ok(())
        }
        fn original_storage_load(&mut self, _address: &Address, _key: U256) -> U256 {
            U256::zero()
        }
        fn mark_address_warm(&mut self, _address: &Address) -> bool {
            false
        }
        fn mark_storage_warm(&mut self, _address: &Address, _key: U256) -> bool {
            false
        }
        fn block_hash(&self, _number: U256) -> H256 {
            H256::zero()
        }
        fn log(&mut self, _address: Address, _topics: Vec<H256>, _data: Vec<u8>) {}
        fn self_destruct(&mut self, _address: Address, _beneficiary: Address) {}
        fn call(&mut self, _params: crate::eei::CallParams) -> Result<crate::eei::CallOutcome, EvmError> {
            unreachable!()
        }
        fn create(&mut self, _params: crate::eei::CreateParams) -> Result<crate::eei::CreateOutcome, EvmError> {
            unreachable!()
        }
    }

    fn test_env() -> Environment {
        Environment {
            address: Address::from([1u8; 20]),
            caller: Address::from([2u8; 20]),
            origin: Address::from([3u8; 20]),
            call_value: U256::from(5),
            call_data: vec![0xde, 0xad, 0xbe, 0xef],
            gas_price: U256::from(7),
            block_number: 100,
            block_timestamp: 200,
            block_coinbase: Default::default(),
            block_gas_limit: 30_000_000,
            block_base_fee: U256::from(9),
            block_prev_randao: Default::default(),
            chain_id: 1,
            block_blob_base_fee: U256::from(11),
            blob_hashes: vec![H256::from_low_u64_be(0xaa), H256::from_low_u64_be(0xbb)],
        }
    }

    #[test]
    fn calldataload_zero_pads_past_the_end_of_calldata() {
        let code = Code::analyze(vec![]);
        let env = test_env();
        let mut s = RunState::new(&code, &env, 1_000_000, Hardfork::Cancun, 0, false);
        let mut eei = StubEei;
        s.stack.push(U256::zero()).unwrap();
        exec_calldataload(&mut s, &mut eei).unwrap();
        let value = s.stack.pop().unwrap();
        let mut expected = [0u8; 32];
        expected[0..4].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(value, U256::from_big_endian(&expected));
    }

    #[test]
    fn extcodesize_reads_through_the_eei() {
        let code = Code::analyze(vec![]);
        let env = test_env();
        let mut s = RunState::new(&code, &env, 1_000_000, Hardfork::Cancun, 0, false);
        let mut eei = StubEei;
        s.stack.push(U256::from(0x1234)).unwrap();
        exec_extcodesize(&mut s, &mut eei).unwrap();
        assert_eq!(s.stack.pop().unwrap(), U256::from(2));
    }

    #[test]
    fn balance_of_a_nonexistent_account_is_still_an_eei_call_not_a_panic() {
        let code = Code::analyze(vec![]);
        let env = test_env();
        let mut s = RunState::new(&code, &env, 1_000_000, Hardfork::Cancun, 0, false);
        let mut eei = StubEei;
        s.stack.push(U256::from(42)).unwrap();
        exec_balance(&mut s, &mut eei).unwrap();
        assert_eq!(s.stack.pop().unwrap(), U256::from(1000));
    }

    #[test]
    fn blobhash_out_of_range_index_yields_zero_not_a_panic() {
        let code = Code::analyze(vec![]);
        let env = test_env();
        let mut s = RunState::new(&code, &env, 1_000_000, Hardfork::Cancun, 0, false);
        let mut eei = StubEei;
        s.stack.push(U256::from(1)).unwrap();
        exec_blobhash(&mut s, &mut eei).unwrap();
        assert_eq!(s.stack.pop().unwrap(), U256::from(0xbb));

        s.stack.push(U256::from(5)).unwrap();
        exec_blobhash(&mut s, &mut eei).unwrap();
        assert_eq!(s.stack.pop().unwrap(), U256::zero());
    }
}
