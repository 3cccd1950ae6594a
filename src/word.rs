//! 256-bit arithmetic helpers the bare `U256` type doesn't provide:
//! sign-aware division/modulo, sign-extension, and the three shift opcodes
//! (SHL/SHR/SAR, Constantinople).
use ethereum_types::U256;

const SIGN_BIT: U256 = U256([0, 0, 0, 0x8000_0000_0000_0000]);

fn is_negative(value: U256) -> bool {
    value & SIGN_BIT == SIGN_BIT
}

fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

pub trait WordExt {
    fn sdiv(self, other: U256) -> U256;
    fn smod(self, other: U256) -> U256;
    fn signextend(self, byte_num: U256) -> U256;
    fn byte_at(self, index: U256) -> U256;
    fn shl(self, shift: U256) -> U256;
    fn shr(self, shift: U256) -> U256;
    fn sar(self, shift: U256) -> U256;
}

impl WordExt for U256 {
    fn sdiv(self, other: U256) -> U256 {
        if other.is_zero() {
            return U256::zero();
        }
        let (a_neg, a_abs) = if is_negative(self) { (true, negate(self)) } else { (false, self) };
        let (b_neg, b_abs) = if is_negative(other) { (true, negate(other)) } else { (false, other) };
        let quotient = a_abs / b_abs;
        if a_neg != b_neg {
            negate(quotient)
        } else {
            quotient
        }
    }

    fn smod(self, other: U256) -> U256 {
        if other.is_zero() {
            return U256::zero();
        }
        let (a_neg, a_abs) = if is_negative(self) { (true, negate(self)) } else { (false, self) };
        let (_, b_abs) = if is_negative(other) { (true, negate(other)) } else { (false, other) };
        let remainder = a_abs % b_abs;
        if a_neg && !remainder.is_zero() {
            negate(remainder)
        } else {
            remainder
        }
    }

    fn signextend(self, byte_num: U256) -> U256 {
        if self >= U256::from(32) {
            return byte_num;
        }
        let byte_index = self.as_u32() as usize;
        let bit_index = byte_index * 8 + 7;
        let bit = byte_num.bit(bit_index);
        let mask = (U256::one() << bit_index) - U256::one();
        if bit {
            byte_num | !mask
        } else {
            byte_num & mask
        }
    }

    fn byte_at(self, index: U256) -> U256 {
        if index >= U256::from(32) {
            return U256::zero();
        }
        let i = index.as_u32() as usize;
        let mut bytes = [0u8; 32];
        self.to_big_endian(&mut bytes);
        U256::from(bytes[i])
    }

    fn shl(self, shift: U256) -> U256 {
        if shift >= U256::from(256) {
            U256::zero()
        } else {
            self << shift.as_u32() as usize
        }
    }

    fn shr(self, shift: U256) -> U256 {
        if shift >= U256::from(256) {
            U256::zero()
        } else {
            self >> shift.as_u32() as usize
        }
    }

    fn sar(self, shift: U256) -> U256 {
        let negative = is_negative(self);
        if shift >= U256::from(256) {
            return if negative { U256::MAX } else { U256::zero() };
        }
        let shifted = self >> shift.as_u32() as usize;
        if !negative {
            return shifted;
        }
        // Fill the vacated high bits with ones.
        let fill = U256::MAX << (256 - shift.as_u32() as usize);
        shifted | fill
    }
}

pub fn exp_gas_cost(exponent: U256, byte_gas: u64) -> u64 {
    if exponent.is_zero() {
        return 0;
    }
    let bits = 256 - exponent.leading_zeros() as usize;
    let bytes = bits.div_ceil(8) as u64;
    bytes * byte_gas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdiv_of_minus_one_by_one_is_minus_one() {
        let minus_one = U256::MAX;
        assert_eq!(minus_one.sdiv(U256::one()), minus_one);
    }

    #[test]
    fn div_by_zero_returns_zero() {
        assert_eq!(U256::from(10).sdiv(U256::zero()), U256::zero());
        assert_eq!(U256::from(10).smod(U256::zero()), U256::zero());
    }

    #[test]
    fn signextend_of_positive_small_byte_is_identity() {
        assert_eq!(U256::zero().signextend(U256::from(0x7f)), U256::from(0x7f));
    }

    #[test]
    fn signextend_of_negative_byte_fills_with_ones() {
        let extended = U256::zero().signextend(U256::from(0xff));
        assert_eq!(extended, U256::MAX);
    }

    #[test]
    fn shl_shr_sar_saturate_past_255() {
        assert_eq!(U256::one().shl(U256::from(256)), U256::zero());
        assert_eq!(U256::one().shr(U256::from(256)), U256::zero());
        assert_eq!(U256::MAX.sar(U256::from(256)), U256::MAX);
    }

    #[test]
    fn sar_sign_extends_negative_values() {
        // -2 >> 1 == -1 in two's complement.
        let minus_two = negate(U256::from(2));
        assert_eq!(minus_two.sar(U256::one()), U256::MAX);
    }
}
