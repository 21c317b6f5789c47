use bitflags::bitflags;
use bitvec::prelude::*;
use num_traits::{NumCast, PrimInt, WrappingAdd, WrappingMul, WrappingNeg};

/// Width of every finished instruction word.
pub const WORD_BITS: usize = 32;

/// Bit record of one instruction, most significant bit first. Fields are
/// appended in template order, so a complete record is exactly 32 long.
pub type Bits = BitVec<u32, Msb0>;

bitflags! {
/// Fields of an instruction still waiting on a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending: u8 {
const OFFSET = 1 << 0; // 16-bit PC-relative branch offset
const INDEX = 1 << 1;  // 26-bit absolute jump index
}
}

/// Append the low `width` bits of `value`, MSB first.
pub fn push_field(bits: &mut Bits, value: u32, width: usize) {
    debug_assert!(width <= WORD_BITS);
    for i in (0..width).rev() {
        bits.push((value >> i) & 1 == 1);
    }
}

/// Overwrite `width` bits starting at `start` with the low bits of `value`.
pub fn patch_field(bits: &mut Bits, start: usize, width: usize, value: u32) {
    for k in 0..width {
        bits.set(start + k, (value >> (width - 1 - k)) & 1 == 1);
    }
}

/// Read `width` bits starting at `start` back as an unsigned value.
pub fn read_field(bits: &BitSlice<u32, Msb0>, start: usize, width: usize) -> u32 {
    bits[start..start + width]
        .iter()
        .fold(0u32, |acc, b| (acc << 1) | <u32 as From<bool>>::from(*b))
}

/// The finished word, or `None` while the record is not exactly 32 bits.
pub fn to_word(bits: &Bits) -> Option<u32> {
    (bits.len() == WORD_BITS).then(|| read_field(bits, 0, WORD_BITS))
}

fn mask(width: usize) -> i64 {
    (1i64 << width) - 1
}

/// Two's-complement pattern of `n` modulo 2^width.
pub fn truncate(n: i64, width: usize) -> u32 {
    (n & mask(width)) as u32
}

/// Inverse of [`truncate`]: reinterpret a `width`-bit field as signed.
pub fn sign_extend(field: u32, width: usize) -> i64 {
    let shift = 64 - width as u32;
    ((field as i64) << shift) >> shift
}

/// True when `n` survives truncation to `width` bits, read either as a
/// signed or as an unsigned field.
pub fn fits(n: i64, width: usize) -> bool {
    -(1i64 << (width - 1)) <= n && n <= mask(width)
}

/// A parsed numeric operand. Digits accumulate modulo 2^bits of `T`, so any
/// literal keeps its low bits; `wrapped` marks one that did not fit `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Number<T> {
    pub value: T,
    pub wrapped: bool,
}

/// Parse a numeric operand: optional sign, then decimal, `0x` hex or `0b` binary.
pub fn parse_number<T>(tok: &str) -> Option<Number<T>>
where
    T: PrimInt + WrappingAdd + WrappingMul + WrappingNeg,
{
    let (negative, body) = match tok.as_bytes().first()? {
        b'-' => (true, &tok[1..]),
        b'+' => (false, &tok[1..]),
        _ => (false, tok),
    };
    let (radix, digits) = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        (2, bin)
    } else {
        (10, body)
    };
    if digits.is_empty() {
        return None;
    }
    let base = <T as NumCast>::from(radix)?;
    let mut value = T::zero();
    let mut wrapped = false;
    for c in digits.chars() {
        let digit = <T as NumCast>::from(c.to_digit(radix)?)?;
        value = match value.checked_mul(&base).and_then(|v| v.checked_add(&digit)) {
            Some(v) => v,
            None => {
                wrapped = true;
                value.wrapping_mul(&base).wrapping_add(&digit)
            }
        };
    }
    if negative {
        value = value.wrapping_neg();
    }
    Some(Number { value, wrapped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read_back() {
        let mut bits = Bits::new();
        push_field(&mut bits, 0b000100, 6);
        push_field(&mut bits, 8, 5);
        push_field(&mut bits, 9, 5);
        push_field(&mut bits, 1, 16);
        assert_eq!(to_word(&bits), Some(0x1109_0001));
        assert_eq!(read_field(&bits, 6, 5), 8);
    }

    #[test]
    fn patch_overwrites_only_its_slot() {
        let mut bits = Bits::new();
        push_field(&mut bits, 0b000010, 6);
        push_field(&mut bits, 0, 26);
        patch_field(&mut bits, 6, 26, 0x3FF_FFFF);
        assert_eq!(to_word(&bits), Some(0x0BFF_FFFF));
    }

    #[test]
    fn short_record_has_no_word() {
        let mut bits = Bits::new();
        push_field(&mut bits, 0, 26);
        assert_eq!(to_word(&bits), None);
    }

    #[test]
    fn truncation_is_twos_complement() {
        assert_eq!(truncate(-1, 16), 0xFFFF);
        assert_eq!(truncate(-2, 5), 0b11110);
        assert_eq!(truncate(0x1_2345, 16), 0x2345);
        assert_eq!(sign_extend(0xFFFF, 16), -1);
        assert_eq!(sign_extend(0x7FFF, 16), 0x7FFF);
    }

    #[test]
    fn range_check_accepts_signed_and_unsigned() {
        assert!(fits(-32768, 16));
        assert!(fits(0xFFFF, 16));
        assert!(!fits(0x1_0000, 16));
        assert!(!fits(-32769, 16));
        assert!(fits(31, 5));
        assert!(!fits(32, 5));
    }

    fn value(tok: &str) -> Option<i64> {
        parse_number::<i64>(tok).map(|n| n.value)
    }

    #[test]
    fn numbers_in_all_radixes() {
        assert_eq!(value("42"), Some(42));
        assert_eq!(value("-8"), Some(-8));
        assert_eq!(value("+8"), Some(8));
        assert_eq!(value("0x1F"), Some(31));
        assert_eq!(value("-0x10"), Some(-16));
        assert_eq!(value("0b101"), Some(5));
        assert_eq!(value("loop"), None);
        assert_eq!(value("--1"), None);
        assert_eq!(value("-+1"), None);
        assert_eq!(value("0x"), None);
        assert_eq!(value(""), None);
        assert_eq!(value("12ab"), None);
    }

    #[test]
    fn oversized_literals_keep_their_low_bits() {
        // 2^64 + 1
        let n = parse_number::<i64>("18446744073709551617").unwrap();
        assert!(n.wrapped);
        assert_eq!(truncate(n.value, 16), 1);
        let n = parse_number::<i64>("-18446744073709551617").unwrap();
        assert_eq!(truncate(n.value, 16), 0xFFFF);
        let n = parse_number::<i64>("0x10000000000000003").unwrap();
        assert_eq!(truncate(n.value, 26), 3);
        assert!(!parse_number::<i64>("65535").unwrap().wrapped);
    }
}
