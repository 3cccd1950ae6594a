//! Gas accounting: the running meter plus the handful of formulas that
//! depend only on sizes rather than on interpreter state (memory expansion,
//! the EIP-150 63/64 call-gas cap).
use crate::errors::EvmError;

pub const MEMORY_GAS: u64 = 3;
pub const MEMORY_QUADRATIC_DENOMINATOR: u64 = 512;

/// Quadratic memory expansion cost for a memory of `word_count` words, per
/// the yellow paper's `Cmem` function. Callers charge the *difference*
/// between this at the new size and at the previous highest size reached.
pub fn memory_expansion_cost(word_count: u64) -> u64 {
    MEMORY_GAS * word_count + (word_count * word_count) / MEMORY_QUADRATIC_DENOMINATOR
}

#[derive(Debug, Clone)]
pub struct GasMeter {
    remaining: u64,
    refund: i64,
    /// Highest word count memory has been billed to reach so far; only the
    /// positive delta against this is charged on further growth.
    highest_memory_words: u64,
}

impl GasMeter {
    pub fn new(gas_limit: u64) -> Self {
        Self {
            remaining: gas_limit,
            refund: 0,
            highest_memory_words: 0,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Refund never goes negative from the caller's point of view even
    /// though the accumulator is signed internally (EIP-1283's dirty-slot
    /// bookkeeping nets out sub_refund against a not-yet-added refund).
    pub fn refund(&self) -> u64 {
        self.refund.max(0) as u64
    }

    pub fn consume(&mut self, amount: u64) -> Result<(), EvmError> {
        match self.remaining.checked_sub(amount) {
            Some(left) => {
                self.remaining = left;
                Ok(())
            }
            None => {
                self.remaining = 0;
                Err(EvmError::OutOfGas)
            }
        }
    }

    /// Gas a nested call/create frame didn't spend, returned to this meter
    /// without disturbing the refund counter or memory high-water mark.
    pub fn give_back(&mut self, amount: u64) {
        self.remaining += amount;
    }

    pub fn add_refund(&mut self, amount: u64) {
        self.refund += amount as i64;
    }

    pub fn sub_refund(&mut self, amount: u64) {
        self.refund -= amount as i64;
    }

    /// Charge the delta needed to grow memory to `new_word_count`, if any.
    pub fn charge_memory_expansion(&mut self, new_word_count: u64) -> Result<(), EvmError> {
        if new_word_count <= self.highest_memory_words {
            return Ok(());
        }
        let delta = memory_expansion_cost(new_word_count)
            .saturating_sub(memory_expansion_cost(self.highest_memory_words));
        self.consume(delta)?;
        self.highest_memory_words = new_word_count;
        Ok(())
    }
}

/// EIP-150: at most 63/64 of the gas left in the caller's frame may be
/// forwarded into a CALL/CALLCODE/DELEGATECALL/STATICCALL/CREATE; the rest
/// stays with the caller to guarantee it can finish unwinding. Before
/// Tangerine Whistle there was no cap at all: the requested amount is
/// forwarded verbatim, and if it exceeds what the caller actually has, the
/// caller's own `gas.consume` traps `OUT_OF_GAS` on the underflow rather
/// than this function silently clamping it down to something affordable.
pub fn call_gas_allowed(gas_left: u64, requested: u64, apply_cap: bool) -> u64 {
    if !apply_cap {
        return requested;
    }
    let cap = gas_left - gas_left / 64;
    requested.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_errors_without_mutating_past_zero() {
        let mut meter = GasMeter::new(10);
        assert_eq!(meter.consume(11), Err(EvmError::OutOfGas));
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn memory_expansion_only_charges_the_delta() {
        let mut meter = GasMeter::new(1_000_000);
        meter.charge_memory_expansion(1).unwrap();
        let after_first = meter.remaining();
        meter.charge_memory_expansion(1).unwrap(); // no growth, no charge
        assert_eq!(meter.remaining(), after_first);
        meter.charge_memory_expansion(2).unwrap(); // grows by one word
        assert!(meter.remaining() < after_first);
    }

    #[test]
    fn call_gas_cap_floors_at_63_64ths() {
        assert_eq!(call_gas_allowed(64_000, 64_000, true), 64_000 - 1_000);
        assert_eq!(call_gas_allowed(64_000, 1_000, true), 1_000);
        assert_eq!(call_gas_allowed(64_000, 64_000, false), 64_000);
    }

    #[test]
    fn pre_tangerine_whistle_forwards_the_request_uncapped_even_past_what_is_left() {
        // No cap applies before EIP-150: the full request is forwarded, and
        // it's up to the caller's own `consume` to trap the underflow.
        assert_eq!(call_gas_allowed(1_000, 5_000, false), 5_000);
    }

    #[test]
    fn refund_never_reported_negative() {
        let mut meter = GasMeter::new(100);
        meter.sub_refund(5);
        assert_eq!(meter.refund(), 0);
    }
}
