use crate::errors::EvmError;
use crate::interpreter::state::{ControlFlow, RunState};
use crate::word::WordExt;
use ethereum_types::U256;

pub fn op_add(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(a.overflowing_add(b).0)?;
    Ok(ControlFlow::Continue)
}

pub fn op_mul(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(a.overflowing_mul(b).0)?;
    Ok(ControlFlow::Continue)
}

pub fn op_sub(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(a.overflowing_sub(b).0)?;
    Ok(ControlFlow::Continue)
}

pub fn op_div(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(if b.is_zero() { U256::zero() } else { a / b })?;
    Ok(ControlFlow::Continue)
}

pub fn op_sdiv(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(a.sdiv(b))?;
    Ok(ControlFlow::Continue)
}

pub fn op_mod(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(if b.is_zero() { U256::zero() } else { a % b })?;
    Ok(ControlFlow::Continue)
}

pub fn op_smod(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(a.smod(b))?;
    Ok(ControlFlow::Continue)
}

pub fn op_addmod(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b, n) = (s.stack.pop()?, s.stack.pop()?, s.stack.pop()?);
    let result = if n.is_zero() {
        U256::zero()
    } else {
        let a = ethnum_add_mod(a, b, n);
        a
    };
    s.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

pub fn op_mulmod(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (a, b, n) = (s.stack.pop()?, s.stack.pop()?, s.stack.pop()?);
    let result = if n.is_zero() {
        U256::zero()
    } else {
        ethnum_mul_mod(a, b, n)
    };
    s.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

/// (a + b) mod n computed with a 512-bit intermediate to avoid overflow,
/// since `a + b` alone can exceed `U256::MAX`.
fn ethnum_add_mod(a: U256, b: U256, n: U256) -> U256 {
    let (sum, overflowed) = a.overflowing_add(b);
    if !overflowed {
        return sum % n;
    }
    // sum wrapped past 2^256: true value is sum + 2^256. Reduce mod n in
    // two steps since U256 has no native wider type here.
    let carry_mod = (U256::MAX % n + U256::one()) % n; // 2^256 mod n
    (sum % n + carry_mod) % n
}

fn ethnum_mul_mod(a: U256, b: U256, n: U256) -> U256 {
    // Russian-peasant modular multiplication avoids needing a 512-bit type.
    let mut result = U256::zero();
    let mut a = a % n;
    let mut b = b;
    while !b.is_zero() {
        if b & U256::one() == U256::one() {
            result = ethnum_add_mod(result, a, n);
        }
        a = ethnum_add_mod(a, a, n);
        b >>= 1;
    }
    result
}

pub fn op_exp(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (base, exponent) = (s.stack.pop()?, s.stack.pop()?);
    let gas = crate::word::exp_gas_cost(exponent, s.gas_schedule.exp_byte_gas);
    s.gas.consume(gas)?;
    s.stack.push(checked_pow(base, exponent))?;
    Ok(ControlFlow::Continue)
}

fn checked_pow(mut base: U256, mut exponent: U256) -> U256 {
    let mut result = U256::one();
    while !exponent.is_zero() {
        if exponent & U256::one() == U256::one() {
            result = result.overflowing_mul(base).0;
        }
        base = base.overflowing_mul(base).0;
        exponent >>= 1;
    }
    result
}

pub fn op_signextend(s: &mut RunState) -> Result<ControlFlow, EvmError> {
    let (byte_num, value) = (s.stack.pop()?, s.stack.pop()?);
    s.stack.push(byte_num.signextend(value))?;
    Ok(ControlFlow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(f: fn(&mut RunState) -> Result<ControlFlow, EvmError>, inputs: &[U256]) -> U256 {
        let code = crate::jumpdest::Code::analyze(vec![]);
        let env = test_env();
        let mut s = RunState::new(&code, &env, 1_000_000, crate::hardfork::Hardfork::Cancun, 0, false);
        for i in inputs {
            s.stack.push(*i).unwrap();
        }
        f(&mut s).unwrap();
        s.stack.pop().unwrap()
    }

    fn test_env() -> crate::interpreter::state::Environment {
        crate::interpreter::state::Environment {
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
    fn add_wraps_on_overflow() {
        assert_eq!(run(op_add, &[U256::one(), U256::MAX]), U256::zero());
    }

    #[test]
    fn div_by_zero_is_zero_not_a_panic() {
        assert_eq!(run(op_div, &[U256::zero(), U256::from(5)]), U256::zero());
    }

    #[test]
    fn addmod_handles_intermediate_overflow() {
        // (MAX + 2) mod 3 == (2^256 - 1 + 2) mod 3 == 1 mod 3 (computed below by hand)
        let result = run(op_addmod, &[U256::from(3), U256::from(2), U256::MAX]);
        let expected = ethnum_add_mod(U256::MAX, U256::from(2), U256::from(3));
        assert_eq!(result, expected);
    }

    #[test]
    fn mulmod_matches_naive_small_case() {
        assert_eq!(
            run(op_mulmod, &[U256::from(7), U256::from(4), U256::from(5)]),
            U256::from((4 * 5) % 7)
        );
    }

    #[test]
    fn exp_of_zero_exponent_is_one() {
        assert_eq!(run(op_exp, &[U256::zero(), U256::from(123)]), U256::one());
    }
}
