use crate::common::constants::{MAX_CODE_SIZE, MAX_INITCODE_SIZE};
use crate::common::crypto::keccak256;
use crate::eei::{CallKind, CallParams, CreateParams, Eei};
use crate::errors::EvmError;
use crate::gas::call_gas_allowed;
use crate::hardfork::{COLD_ACCOUNT_ACCESS_COST, WARM_ACCESS_COST};
use crate::interpreter::state::{ControlFlow, RunState};
use ethereum_types::{Address, U256};
use rlp::RlpStream;

fn read_input(s: &mut RunState, offset: usize, len: usize) -> Result<Vec<u8>, EvmError> {
    if let Some(words) = crate::memory::Memory::required_size(offset, len) {
        s.gas.charge_memory_expansion((words / 32) as u64)?;
    }
    Ok(s.memory.read(offset, len))
}

fn address_from_u256(value: U256) -> Address {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    Address::from_slice(&bytes[12..])
}

fn u256_from_address(address: Address) -> U256 {
    U256::from_big_endian(address.as_bytes())
}

pub fn create_address(sender: Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender.as_bytes());
    stream.append(&nonce);
    let hash = keccak256(&stream.out());
    Address::from_slice(&hash.as_bytes()[12..])
}

pub fn create2_address(sender: Address, salt: U256, init_code: &[u8]) -> Address {
    let init_code_hash = keccak256(init_code);
    let mut salt_bytes = [0u8; 32];
    salt.to_big_endian(&mut salt_bytes);

    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(sender.as_bytes());
    preimage.extend_from_slice(&salt_bytes);
    preimage.extend_from_slice(init_code_hash.as_bytes());
    let hash = keccak256(&preimage);
    Address::from_slice(&hash.as_bytes()[12..])
}

fn do_create(s: &mut RunState, eei: &mut dyn Eei, is_create2: bool) -> Result<ControlFlow, EvmError> {
    if s.is_static {
        return Err(EvmError::StaticCallViolation);
    }
    let value = s.stack.pop()?;
    let offset = s.stack.pop()?.as_usize();
    let len = s.stack.pop()?.as_usize();
    let salt = if is_create2 { Some(s.stack.pop()?) } else { None };

    if len > MAX_INITCODE_SIZE {
        return Err(EvmError::InitcodeSizeLimit);
    }
    let init_code = read_input(s, offset, len)?;

    if salt.is_some() {
        let word_count = len.div_ceil(32) as u64;
        s.gas.consume(word_count * 6)?; // CREATE2's extra hashing cost
    }

    if s.depth + 1 >= crate::common::constants::MAX_CALL_DEPTH {
        s.stack.push(U256::zero())?;
        return Ok(ControlFlow::Continue);
    }
    if value > eei.balance(&s.env.address) {
        s.stack.push(U256::zero())?;
        return Ok(ControlFlow::Continue);
    }

    let gas = call_gas_allowed(s.gas.remaining(), s.gas.remaining(), s.gas_schedule.apply_call_gas_cap);
    s.gas.consume(gas)?;

    let outcome = eei.create(CreateParams {
        caller: s.env.address,
        value,
        init_code,
        gas,
        salt,
    })?;

    match outcome.address {
        Some(addr) => s.stack.push(u256_from_address(addr))?,
        None => s.stack.push(U256::zero())?,
    }
    s.return_data = outcome.return_data;
    Ok(ControlFlow::Continue)
}

pub fn exec_create(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_create(s, eei, false)
}

pub fn exec_create2(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_create(s, eei, true)
}

fn do_call(s: &mut RunState, eei: &mut dyn Eei, kind: CallKind) -> Result<ControlFlow, EvmError> {
    let requested_gas = s.stack.pop()?;
    let code_address = address_from_u256(s.stack.pop()?);
    let value = if matches!(kind, CallKind::DelegateCall | CallKind::StaticCall) {
        U256::zero()
    } else {
        s.stack.pop()?
    };
    let in_offset = s.stack.pop()?.as_usize();
    let in_len = s.stack.pop()?.as_usize();
    let out_offset = s.stack.pop()?.as_usize();
    let out_len = s.stack.pop()?.as_usize();

    if s.is_static && !value.is_zero() && matches!(kind, CallKind::Call) {
        return Err(EvmError::StaticCallViolation);
    }

    if s.gas_schedule.apply_access_list_gas {
        let warm = eei.mark_address_warm(&code_address);
        s.gas
            .consume(if warm { WARM_ACCESS_COST } else { COLD_ACCOUNT_ACCESS_COST })?;
    } else {
        s.gas.consume(WARM_ACCESS_COST)?;
    }

    let input = read_input(s, in_offset, in_len)?;
    if let Some(words) = crate::memory::Memory::required_size(out_offset, out_len) {
        s.gas.charge_memory_expansion((words / 32) as u64)?;
    }

    if s.depth + 1 >= crate::common::constants::MAX_CALL_DEPTH {
        s.stack.push(U256::zero())?;
        return Ok(ControlFlow::Continue);
    }

    let gas_left_after_charges = s.gas.remaining();
    let gas = call_gas_allowed(
        gas_left_after_charges,
        requested_gas.low_u64(),
        s.gas_schedule.apply_call_gas_cap,
    );
    // The stipend is added on top of the forwarded gas for value-bearing
    // CALL/CALLCODE so the callee always has enough to at least run its
    // fallback, without being charged against the caller's own budget.
    let stipend = if !value.is_zero() && matches!(kind, CallKind::Call | CallKind::CallCode) {
        s.gas_schedule.call_stipend
    } else {
        0
    };
    s.gas.consume(gas)?;

    let (caller, address) = match kind {
        CallKind::Call | CallKind::StaticCall => (s.env.address, code_address),
        CallKind::CallCode | CallKind::DelegateCall => (s.env.address, s.env.address),
    };

    let outcome = eei.call(CallParams {
        kind,
        caller,
        address,
        code_address,
        value,
        input,
        gas: gas + stipend,
        is_static: s.is_static || matches!(kind, CallKind::StaticCall),
    })?;

    let copy_len = out_len.min(outcome.return_data.len());
    if copy_len > 0 {
        s.memory.write(out_offset, &outcome.return_data[..copy_len]);
    }
    // Gas the callee didn't use comes back to the caller's own meter.
    s.gas.give_back(outcome.gas_left);
    s.return_data = outcome.return_data;
    s.stack.push(if outcome.success { U256::one() } else { U256::zero() })?;
    Ok(ControlFlow::Continue)
}

pub fn exec_call(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_call(s, eei, CallKind::Call)
}

pub fn exec_callcode(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_call(s, eei, CallKind::CallCode)
}

pub fn exec_delegatecall(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_call(s, eei, CallKind::DelegateCall)
}

pub fn exec_staticcall(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    do_call(s, eei, CallKind::StaticCall)
}

pub fn exec_return(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let offset = s.stack.pop()?.as_usize();
    let len = s.stack.pop()?.as_usize();
    let data = read_input(s, offset, len)?;
    Ok(ControlFlow::Return(data))
}

pub fn exec_revert(s: &mut RunState, _eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    let offset = s.stack.pop()?.as_usize();
    let len = s.stack.pop()?.as_usize();
    let data = read_input(s, offset, len)?;
    Ok(ControlFlow::Revert(data))
}

pub fn exec_selfdestruct(s: &mut RunState, eei: &mut dyn Eei) -> Result<ControlFlow, EvmError> {
    if s.is_static {
        return Err(EvmError::StaticCallViolation);
    }
    let beneficiary = address_from_u256(s.stack.pop()?);
    eei.self_destruct(s.env.address, beneficiary);
    Ok(ControlFlow::Halt)
}

/// Guards a freshly deployed contract's returned code against EIP-170's size
/// cap and EIP-3541's ban on code starting with the EOF magic byte.
pub fn validate_deployed_code(code: &[u8]) -> Result<(), EvmError> {
    if code.first() == Some(&0xef) {
        return Err(EvmError::InvalidCodeStartingByte);
    }
    if code.len() > MAX_CODE_SIZE {
        return Err(EvmError::CodeSizeLimit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_address_matches_the_well_known_rlp_nonce_derivation() {
        // sender 0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0, nonce 0 is a
        // commonly cited fixture (e.g. go-ethereum's crypto_test.go).
        let sender = Address::from_slice(
            &hex::decode("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0").unwrap(),
        );
        let addr = create_address(sender, 0);
        assert_eq!(
            hex::encode(addr.as_bytes()),
            "cd234a471b72ba2f1ccf0a70fcaba648a5eecd8d"
        );
    }

    #[test]
    fn create2_address_is_deterministic_given_the_same_salt_and_initcode() {
        let sender = Address::from([1u8; 20]);
        let salt = U256::from(1);
        let init_code = vec![0x60, 0x00, 0x60, 0x00];
        let a = create2_address(sender, salt, &init_code);
        let b = create2_address(sender, salt, &init_code);
        assert_eq!(a, b);
    }

    #[test]
    fn deployed_code_starting_with_the_eof_magic_byte_is_rejected() {
        assert_eq!(
            validate_deployed_code(&[0xef, 0x00]),
            Err(EvmError::InvalidCodeStartingByte)
        );
    }

    #[test]
    fn deployed_code_over_the_size_cap_is_rejected() {
        let code = vec![0u8; MAX_CODE_SIZE + 1];
        assert_eq!(validate_deployed_code(&code), Err(EvmError::CodeSizeLimit));
    }
}
