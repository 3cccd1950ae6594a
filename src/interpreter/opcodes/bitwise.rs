use crate::errors::EvmError;
use crate::interpreter::state::{ControlFlow, RunState};
use crate::word::WordExt;
use ethereum_types::U256;

const SIGN_BIT: U256 = U256([0, 0, 0, 0x8000_0000_0000_0000]);

fn as_signed_order(a: U256, b: U256) -> std::cmp::Ordering {
    let a_neg = a & SIGN_BIT == SIGN_BIT;
    let b_neg = b & SIGN_BIT == SIGN_BIT;
    match (a_neg, b_neg) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.cmp(&b),
    }
}

fn push_bool(s: &mut RunState, value: bool) -> Result<ControlFlow, EvmError> {
    s.stack.push(if value { U256::one() } else { U256::zero() })?;
    Ok(ControlFlow::Continue)
}

pub fn op_lt(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    push_bool(s, a < b)
}

pub fn op_gt(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    push_bool(s, a > b)
}

pub fn op_slt(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    push_bool(s, as_signed_order(a, b) == std::cmp::Ordering::Less)
}

pub fn op_sgt(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    push_bool(s, as_signed_order(a, b) == std::cmp::Ordering::Greater)
}

pub fn op_eq(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    push_bool(s, a == b)
}

pub fn op_iszero(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let a = s.stack.pop()?;
    push_bool(s, a.is_zero())
}

pub fn op_and(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(a & b)?;
    Ok(ControlFlow::Continue)
}

pub fn op_or(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(a | b)?;
    Ok(ControlFlow::Continue)
}

pub fn op_xor(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(a ^ b)?;
    Ok(ControlFlow::Continue)
}

pub fn op_not(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let a = s.stack.pop()?;
    s.stack.push(!a)?;
    Ok(ControlFlow::Continue)
}

pub fn op_byte(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (index, value) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(value.byte_at(index))?;
    Ok(ControlFlow::Continue)
}

pub fn op_shl(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (shift, value) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(value.shl(shift))?;
    Ok(ControlFlow::Continue)
}

pub fn op_shr(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (shift, value) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(value.shr(shift))?;
    Ok(ControlFlow::Continue)
}

pub fn op_sar(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (shift, value) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(value.sar(shift))?;
    Ok(ControlFlow::Continue)
}

pub fn op_keccak256(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (offset, len) = (s.stack.pop()?, s.stack.pop()?);
    let offset = offset.as_usize();
    let len = len.as_usize();

    if let Some(words) = crate::memory::Memory::required_size(offset, len) {
        s.gas.charge_memory_expansion((words / 32) as u64)?;
    }
    // 6 gas per word of input, on top of the 30 constant already charged.
    let word_count = len.div_ceil(32) as u64;
    s.gas.consume(word_count * 6)?;

    let data = s.memory.read(offset, len);
    let hash = crate::common::crypto::keccak256(&data);
    s.stack.push(U256::from_big_endian(hash.as_bytes()))?;
    Ok(ControlFlow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardfork::Hardfork;
    use crate::interpreter::state::Environment;
    use crate::jumpdest::Code;

    fn test_env() -> Environment {
        Environment {
            address: Default::default(),
            caller: Default::default(),
            origin: Default::default(),
            call_value: U256::zero(),
            call_data: vec![],
            gas_price: U256::zero(),
            block_number: 1,
            block_timestamp: 1,
            block_coinbase: Default::default(),
            block_gas_limit: 30_000_000,
            block_base_fee: U256::one(),
            block_prev_randao: Default::default(),
            chain_id: 1,
            block_blob_base_fee: U256::one(),
            blob_hashes: vec![],
        }
    }

    #[test]
    fn slt_treats_high_bit_as_negative() {
        let code = Code::analyze(vec![]);
        let env = test_env();
        let mut s = RunState::new(&code, &env, 1_000_000, Hardfork::Cancun, 0, false);
        s.stack.push(U256::one()).unwrap(); // b = 1 (positive)
        s.stack.push(U256::MAX).unwrap(); // a = -1 (negative)
        op_slt(&mut s).unwrap();
        assert_eq!(s.stack.pop().unwrap(), U256::one()); // -1 < 1
    }

    #[test]
    fn keccak256_of_empty_range_is_the_well_known_empty_hash() {
        let code = Code::analyze(vec![]);
        let env = test_env();
        let mut s = RunState::new(&code, &env, 1_000_000, Hardfork::Cancun, 0, false);
        s.stack.push(U256::zero()).unwrap(); // len = 0
        s.stack.push(U256::zero()).unwrap(); // offset = 0
        op_keccak256(&mut s).unwrap();
        let result = s.stack.pop().unwrap();
        let expected = U256::from_big_endian(
            crate::common::crypto::keccak256(&[]).as_bytes(),
        );
        assert_eq!(result, expected);
    }
}
