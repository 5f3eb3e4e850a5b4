//! Word arithmetic that `U256` does not provide directly
//!
//! Signed operations treat words as two's complement.

use volt_primitives::{U256, U512};

fn is_negative(v: &U256) -> bool {
    v.bit(255)
}

fn negate(v: U256) -> U256 {
    (!v).overflowing_add(U256::one()).0
}

fn abs(v: U256) -> U256 {
    if is_negative(&v) {
        negate(v)
    } else {
        v
    }
}

/// Signed division, zero on division by zero
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let quotient = abs(a) / abs(b);
    if is_negative(&a) != is_negative(&b) {
        negate(quotient)
    } else {
        quotient
    }
}

/// Signed modulo taking the sign of the dividend, zero on division by zero
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let rem = abs(a) % abs(b);
    if is_negative(&a) {
        negate(rem)
    } else {
        rem
    }
}

/// `(a + b) % n` without wrapping the intermediate sum
pub fn addmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    let sum = U512::from(a) + U512::from(b);
    narrow(sum % U512::from(n))
}

/// `(a * b) % n` without wrapping the intermediate product
pub fn mulmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    narrow(a.full_mul(b) % U512::from(n))
}

// Only called on values already reduced below a U256 modulus.
fn narrow(v: U512) -> U256 {
    U256::try_from(v).unwrap_or(U256::MAX)
}

/// `base ^ exponent` modulo 2^256
pub fn exp(base: U256, exponent: U256) -> U256 {
    base.overflowing_pow(exponent).0
}

/// Extend the sign bit of byte `b` (counted from the least significant end)
pub fn signextend(b: U256, x: U256) -> U256 {
    if b >= U256::from(31) {
        return x;
    }
    let bit = b.low_u32() as usize * 8 + 7;
    let mask = (U256::one() << bit) - U256::one();
    if x.bit(bit) {
        x | !mask
    } else {
        x & mask
    }
}

/// Byte `i` of `x`, where byte 0 is the most significant
pub fn byte(i: U256, x: U256) -> U256 {
    if i >= U256::from(32) {
        return U256::zero();
    }
    let shift = (31 - i.low_u32() as usize) * 8;
    (x >> shift) & U256::from(0xff)
}

/// Logical shift left
pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        return U256::zero();
    }
    value << shift.low_u32() as usize
}

/// Logical shift right
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        return U256::zero();
    }
    value >> shift.low_u32() as usize
}

/// Arithmetic shift right, filling with the sign bit
pub fn sar(shift: U256, value: U256) -> U256 {
    let negative = is_negative(&value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }
    let shift = shift.low_u32() as usize;
    if negative {
        !((!value) >> shift)
    } else {
        value >> shift
    }
}

/// Signed less-than
pub fn slt(a: U256, b: U256) -> bool {
    match (is_negative(&a), is_negative(&b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

/// Signed greater-than
pub fn sgt(a: U256, b: U256) -> bool {
    slt(b, a)
}

/// Bool as a word
pub fn from_bool(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neg(n: u64) -> U256 {
        negate(U256::from(n))
    }

    #[test]
    fn test_sdiv() {
        assert_eq!(sdiv(U256::from(10), U256::from(3)), U256::from(3));
        assert_eq!(sdiv(neg(10), U256::from(3)), neg(3));
        assert_eq!(sdiv(neg(10), neg(3)), U256::from(3));
        assert_eq!(sdiv(U256::from(10), U256::zero()), U256::zero());
    }

    #[test]
    fn test_sdiv_min_by_minus_one_wraps() {
        let min = U256::one() << 255;
        assert_eq!(sdiv(min, neg(1)), min);
    }

    #[test]
    fn test_smod_takes_dividend_sign() {
        assert_eq!(smod(neg(10), U256::from(3)), neg(1));
        assert_eq!(smod(U256::from(10), neg(3)), U256::from(1));
        assert_eq!(smod(U256::from(10), U256::zero()), U256::zero());
    }

    #[test]
    fn test_addmod_mulmod_do_not_wrap() {
        assert_eq!(addmod(U256::MAX, U256::from(2), U256::from(10)), U256::from(7));
        // (2^256 - 1)^2 mod 12: 2^256 = 4 (mod 12), so (4 - 1)^2 = 9
        assert_eq!(mulmod(U256::MAX, U256::MAX, U256::from(12)), U256::from(9));
        assert_eq!(addmod(U256::one(), U256::one(), U256::zero()), U256::zero());
        assert_eq!(mulmod(U256::one(), U256::one(), U256::zero()), U256::zero());
    }

    #[test]
    fn test_exp_wraps() {
        assert_eq!(exp(U256::from(2), U256::from(10)), U256::from(1024));
        assert_eq!(exp(U256::from(2), U256::from(256)), U256::zero());
        assert_eq!(exp(U256::zero(), U256::zero()), U256::one());
    }

    #[test]
    fn test_signextend() {
        assert_eq!(signextend(U256::zero(), U256::from(0xff)), U256::MAX);
        assert_eq!(signextend(U256::zero(), U256::from(0x7f)), U256::from(0x7f));
        assert_eq!(signextend(U256::one(), U256::from(0x0080)), U256::from(0x0080));
        assert_eq!(signextend(U256::from(40), U256::from(0xff)), U256::from(0xff));
    }

    #[test]
    fn test_byte() {
        let x = U256::from(0x1234);
        assert_eq!(byte(U256::from(31), x), U256::from(0x34));
        assert_eq!(byte(U256::from(30), x), U256::from(0x12));
        assert_eq!(byte(U256::zero(), x), U256::zero());
        assert_eq!(byte(U256::from(32), x), U256::zero());
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shl(U256::from(4), U256::one()), U256::from(16));
        assert_eq!(shr(U256::from(4), U256::from(16)), U256::one());
        assert_eq!(shl(U256::from(256), U256::one()), U256::zero());
        assert_eq!(sar(U256::from(4), neg(16)), neg(1));
        assert_eq!(sar(U256::from(300), neg(1)), U256::MAX);
        assert_eq!(sar(U256::from(300), U256::from(5)), U256::zero());
    }

    #[test]
    fn test_signed_compare() {
        assert!(slt(neg(1), U256::one()));
        assert!(!slt(U256::one(), neg(1)));
        assert!(sgt(U256::one(), neg(1)));
        assert!(slt(neg(2), neg(1)));
    }
}
