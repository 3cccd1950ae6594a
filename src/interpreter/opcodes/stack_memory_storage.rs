use crate::errors::EvmError;
use crate::hardfork::{Hardfork, SstoreRules, COLD_SLOAD_COST, SSTORE_SENTRY_GAS, WARM_ACCESS_COST};
use crate::interpreter::state::{ControlFlow, RunState};
use ethereum_types::U256;

pub fn op_pop(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    s.stack.pop()?;
    Ok(ControlFlow::Continue)
}

fn charge_memory(s: &mut RunState, offset: usize, len: usize) -> Result<(), EvmError> {
    if let Some(size) = crate::memory::Memory::required_size(offset, len) {
        s.gas.charge_memory_expansion((size / 32) as u64)?;
    }
    Ok(())
}

pub fn op_mload(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let offset = s.stack.pop()?.as_usize();
    charge_memory(s, offset, 32)?;
    let value = s.memory.read_word(offset);
    s.stack.push(value)?;
    Ok(ControlFlow::Continue)
}

pub fn op_mstore(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let offset = s.stack.pop()?.as_usize();
    let value = s.stack.pop()?;
    charge_memory(s, offset, 32)?;
    s.memory.write_word(offset, value);
    Ok(ControlFlow::Continue)
}

pub fn op_mstore8(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let offset = s.stack.pop()?.as_usize();
    let value = s.stack.pop()?;
    charge_memory(s, offset, 1)?;
    s.memory.write_byte(offset, value.byte(0));
    Ok(ControlFlow::Continue)
}

/// EIP-5656 (Cancun): copies `len` bytes within memory itself, overlap-safe.
/// Charges memory expansion against whichever of the two ranges reaches
/// furthest, plus the usual 3-gas-per-word copy cost.
pub fn op_mcopy(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    if !s.hardfork.is_at_least(Hardfork::Cancun) {
        return Err(EvmError::InvalidOpcode);
    }
    let dest = s.stack.pop()?.as_usize();
    let src = s.stack.pop()?.as_usize();
    let len = s.stack.pop()?.as_usize();

    charge_memory(s, dest.max(src), len)?;
    s.gas.consume(len.div_ceil(32) as u64 * 3)?;
    s.memory.copy_within(dest, src, len);
    Ok(ControlFlow::Continue)
}

pub fn op_msize(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from(s.memory.len()))?;
    Ok(ControlFlow::Continue)
}

pub fn op_pc(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from(s.pc))?;
    Ok(ControlFlow::Continue)
}

pub fn op_gas(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::from(s.gas.remaining()))?;
    Ok(ControlFlow::Continue)
}

pub fn op_jumpdest(_s: &mut RunState) -> Result<ControlFlow, EvmError> {
    Ok(ControlFlow::Continue)
}

pub fn op_jump(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let dest = s.stack.pop()?.as_usize();
    if !s.code.is_valid_jump_dest(dest) {
        return Err(EvmError::InvalidJump);
    }
    Ok(ControlFlow::Jump(dest))
}

pub fn op_jumpi(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let dest = s.stack.pop()?.as_usize();
    let cond = s.stack.pop()?;
    if cond.is_zero() {
        return Ok(ControlFlow::Continue);
    }
    if !s.code.is_valid_jump_dest(dest) {
        return Err(EvmError::InvalidJump);
    }
    Ok(ControlFlow::Jump(dest))
}

pub fn make_push(n: usize) -> impl Fn(&mut RunState) -> Result<ControlFlow, EvmError> {
    move |s: &mut RunState| {
        let start = s.pc + 1;
        let mut bytes = [0u8; 32];
        for i in 0..n {
            bytes[32 - n + i] = s.code.opcode_at(start + i).unwrap_or(0);
        }
        s.stack.push(U256::from_big_endian(&bytes))?;
        Ok(ControlFlow::Jump(start + n))
    }
}

pub fn op_push0(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    s.stack.push(U256::zero())?;
    Ok(ControlFlow::Continue)
}

pub fn make_dup(n: usize) -> impl Fn(&mut RunState) -> Result<ControlFlow, EvmError> {
    move |s: &mut RunState| {
        s.stack.dup(n)?;
        Ok(ControlFlow::Continue)
    }
}

pub fn make_swap(n: usize) -> impl Fn(&mut RunState) -> Result<ControlFlow, EvmError> {
    move |s: &mut RunState| {
        s.stack.swap(n)?;
        Ok(ControlFlow::Continue)
    }
}

/// SSTORE gas/refund accounting, split out from the opcode body since it
/// depends on three distinct rule sets (see `SstoreRules`) and needs the
/// original/current/new triple of values.
fn sstore_gas_and_refund(
    rules: SstoreRules,
    sstore_set_gas: u64,
    sstore_reset_gas: u64,
    sstore_clear_refund: u64,
    original: U256,
    current: U256,
    new: U256,
) -> (u64, i64) {
    match rules {
        SstoreRules::Legacy => {
            let gas = if current.is_zero() && !new.is_zero() {
                sstore_set_gas
            } else if !current.is_zero() && new.is_zero() {
                sstore_reset_gas
            } else {
                sstore_reset_gas
            };
            let refund = if !current.is_zero() && new.is_zero() {
                sstore_clear_refund as i64
            } else {
                0
            };
            (gas, refund)
        }
        SstoreRules::Eip1283 | SstoreRules::Eip2200 => {
            if current == new {
                return (200, 0);
            }
            if original == current {
                if original.is_zero() {
                    return (sstore_set_gas, 0);
                }
                let refund = if new.is_zero() {
                    sstore_clear_refund as i64
                } else {
                    0
                };
                return (sstore_reset_gas, refund);
            }
            let mut refund = 0i64;
            if !original.is_zero() {
                if current.is_zero() {
                    refund -= sstore_clear_refund as i64;
                } else if new.is_zero() {
                    refund += sstore_clear_refund as i64;
                }
            }
            if original == new {
                refund += if original.is_zero() {
                    sstore_set_gas as i64 - 200
                } else {
                    sstore_reset_gas as i64 - 200
                };
            }
            (200, refund)
        }
    }
}

pub fn op_sload(s: &mut RunState, eei: &mut dyn crate::eei::Eei) -> Result<ControlFlow, EvmError> {
    let key = s.stack.pop()?;
    if s.gas_schedule.apply_access_list_gas {
        let warm = eei.mark_storage_warm(&s.env.address, key);
        s.gas.consume(if warm { WARM_ACCESS_COST } else { COLD_SLOAD_COST })?;
    } else {
        s.gas.consume(s.gas_schedule.sload_gas)?;
    }
    let value = eei.storage_load(&s.env.address, key);
    s.stack.push(value)?;
    Ok(ControlFlow::Continue)
}

pub fn op_sstore(
    s: &mut RunState,
    eei: &mut dyn crate::eei::Eei,
    original: U256,
) -> Result<ControlFlow, EvmError> {
    if s.is_static {
        return Err(EvmError::StaticCallViolation);
    }
    if matches!(s.gas_schedule.sstore_rules, SstoreRules::Eip2200)
        && s.gas.remaining() <= SSTORE_SENTRY_GAS
    {
        return Err(EvmError::OutOfGas);
    }

    let key = s.stack.pop()?;
    let new = s.stack.pop()?;
    let current = eei.storage_load(&s.env.address, key);

    let (gas, refund) = sstore_gas_and_refund(
        s.gas_schedule.sstore_rules,
        s.gas_schedule.sstore_set_gas,
        s.gas_schedule.sstore_reset_gas,
        s.gas_schedule.sstore_clear_refund,
        original,
        current,
        new,
    );
    s.gas.consume(gas)?;
    if refund >= 0 {
        s.gas.add_refund(refund as u64);
    } else {
        s.gas.sub_refund((-refund) as u64);
    }

    eei.storage_store(&s.env.address, key, new)?;
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
    fn mstore_then_mload_round_trips() {
        let code = Code::analyze(vec![]);
        let env = test_env();
        let mut s = RunState::new(&code, &env, 1_000_000, Hardfork::Cancun, 0, false);
        s.stack.push(U256::from(42)).unwrap(); // value
        s.stack.push(U256::zero()).unwrap(); // offset
        op_mstore(&mut s).unwrap();
        s.stack.push(U256::zero()).unwrap(); // offset
        op_mload(&mut s).unwrap();
        assert_eq!(s.stack.pop().unwrap(), U256::from(42));
    }

    #[test]
    fn jump_to_non_jumpdest_is_rejected() {
        let code = Code::analyze(vec![0x00, 0x00]);
        let env = test_env();
        let mut s = RunState::new(&code, &env, 1_000_000, Hardfork::Cancun, 0, false);
        s.stack.push(U256::from(1)).unwrap();
        assert_eq!(op_jump(&mut s), Err(EvmError::InvalidJump));
    }

    #[test]
    fn push2_reads_two_immediate_bytes_and_advances_pc() {
        let code = Code::analyze(vec![0x61, 0x01, 0x02, 0x00]);
        let env = test_env();
        let mut s = RunState::new(&code, &env, 1_000_000, Hardfork::Cancun, 0, false);
        s.pc = 0;
        let push2 = make_push(2);
        let flow = push2(&mut s).unwrap();
        assert_eq!(s.stack.pop().unwrap(), U256::from(0x0102));
        assert!(matches!(flow, ControlFlow::Jump(3)));
    }

    #[test]
    fn fresh_slot_write_costs_sstore_set_gas() {
        let (gas, refund) = sstore_gas_and_refund(
            SstoreRules::Eip2200,
            20_000,
            5_000,
            15_000,
            U256::zero(),
            U256::zero(),
            U256::from(1),
        );
        assert_eq!(gas, 20_000);
        assert_eq!(refund, 0);
    }

    #[test]
    fn clearing_a_dirty_slot_back_to_original_zero_refunds_the_eip1283_delta() {
        let (gas, refund) = sstore_gas_and_refund(
            SstoreRules::Eip2200,
            20_000,
            5_000,
            15_000,
            U256::zero(),
            U256::from(1), // dirty: was written to 1 earlier in the same tx
            U256::zero(),  // now writing back to the original value
        );
        assert_eq!(gas, 200);
        assert_eq!(refund, 20_000 - 200);
    }
}
