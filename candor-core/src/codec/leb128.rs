//! LEB128 variable-length integers.
//!
//! Unsigned values are split in 7-bit groups, least significant first, with the high bit of
//! every byte but the last set. The signed form uses the same layout over the two's
//! complement representation and sign-extends from bit 6 of the final byte.
use super::{DecodeError, cursor::Cursor};
use num_bigint::{BigInt, BigUint};
use num_traits::{One, ToPrimitive, Zero};

pub(crate) fn write_u64(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

pub(crate) fn write_i64(buf: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

pub(crate) fn write_usize(buf: &mut Vec<u8>, value: usize) {
    write_u64(buf, value as u64);
}

pub(crate) fn write_nat(buf: &mut Vec<u8>, value: &BigUint) {
    if let Some(small) = value.to_u64() {
        return write_u64(buf, small);
    }
    let mask = BigUint::from(0x7fu8);
    let mut value = value.clone();
    loop {
        let byte = (&value & &mask).to_u8().unwrap_or_default();
        value >>= 7u32;
        if value.is_zero() {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

pub(crate) fn write_int(buf: &mut Vec<u8>, value: &BigInt) {
    if let Some(small) = value.to_i64() {
        return write_i64(buf, small);
    }
    let mask = BigInt::from(0x7fu8);
    let minus_one = -BigInt::one();
    let mut value = value.clone();
    loop {
        let byte = (&value & &mask).to_u8().unwrap_or_default();
        // Arithmetic shift, rounds towards negative infinity.
        value >>= 7u32;
        let done = (value.is_zero() && byte & 0x40 == 0)
            || (value == minus_one && byte & 0x40 != 0);
        if done {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

pub(crate) fn read_u64(cursor: &mut Cursor<'_>) -> Result<u64, DecodeError> {
    let start = cursor.position();
    let mut result: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = cursor.read_byte()?;
        let low = u64::from(byte & 0x7f);
        if shift == 63 && low > 1 {
            return Err(DecodeError::MalformedLeb128(start));
        }
        result |= low << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift > 63 {
            return Err(DecodeError::MalformedLeb128(start));
        }
    }
}

pub(crate) fn read_i64(cursor: &mut Cursor<'_>) -> Result<i64, DecodeError> {
    let start = cursor.position();
    let mut result: i64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = cursor.read_byte()?;
        if shift == 63 && byte != 0x00 && byte != 0x7f {
            return Err(DecodeError::MalformedLeb128(start));
        }
        result |= i64::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                result |= -1i64 << shift;
            }
            return Ok(result);
        }
        if shift > 63 {
            return Err(DecodeError::MalformedLeb128(start));
        }
    }
}

/// Reads a length or count that must fit in memory.
pub(crate) fn read_usize(cursor: &mut Cursor<'_>) -> Result<usize, DecodeError> {
    let start = cursor.position();
    let value = read_u64(cursor)?;
    usize::try_from(value).map_err(|_| DecodeError::MalformedLeb128(start))
}

pub(crate) fn read_nat(cursor: &mut Cursor<'_>) -> Result<BigUint, DecodeError> {
    let mut result = BigUint::zero();
    let mut shift = 0u64;
    loop {
        let byte = cursor.read_byte()?;
        result |= BigUint::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

pub(crate) fn read_int(cursor: &mut Cursor<'_>) -> Result<BigInt, DecodeError> {
    let mut result = BigInt::zero();
    let mut shift = 0u64;
    loop {
        let byte = cursor.read_byte()?;
        result |= BigInt::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if byte & 0x40 != 0 {
                result -= BigInt::one() << shift;
            }
            return Ok(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uleb(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_u64(&mut buf, value);
        buf
    }

    fn sleb(value: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_i64(&mut buf, value);
        buf
    }

    #[test]
    fn test_unsigned_layout() {
        assert_eq!(uleb(0), vec![0x00]);
        assert_eq!(uleb(127), vec![0x7f]);
        assert_eq!(uleb(128), vec![0x80, 0x01]);
        assert_eq!(uleb(624_485), vec![0xe5, 0x8e, 0x26]);
        assert_eq!(uleb(u64::MAX).len(), 10);
    }

    #[test]
    fn test_signed_layout() {
        assert_eq!(sleb(0), vec![0x00]);
        assert_eq!(sleb(-1), vec![0x7f]);
        assert_eq!(sleb(63), vec![0x3f]);
        assert_eq!(sleb(64), vec![0xc0, 0x00]);
        assert_eq!(sleb(-64), vec![0x40]);
        assert_eq!(sleb(-123_456), vec![0xc0, 0xbb, 0x78]);
    }

    #[test]
    fn test_read_back_extremes() {
        for value in [0, 1, 127, 128, u64::from(u32::MAX), u64::MAX] {
            let bytes = uleb(value);
            assert_eq!(read_u64(&mut Cursor::new(&bytes)).unwrap(), value);
        }
        for value in [0, -1, 64, -65, i64::MIN, i64::MAX] {
            let bytes = sleb(value);
            assert_eq!(read_i64(&mut Cursor::new(&bytes)).unwrap(), value);
        }
    }

    #[test]
    fn test_big_values_match_small_encoding_at_the_boundary() {
        let mut big = Vec::new();
        write_nat(&mut big, &(BigUint::from(u64::MAX) + 1u32));
        assert_eq!(read_nat(&mut Cursor::new(&big)).unwrap(), BigUint::from(u64::MAX) + 1u32);
        assert_eq!(big.len(), 10);

        let negative = BigInt::from(i64::MIN) - 1;
        let mut buf = Vec::new();
        write_int(&mut buf, &negative);
        assert_eq!(read_int(&mut Cursor::new(&buf)).unwrap(), negative);

        let mut small = Vec::new();
        write_int(&mut small, &BigInt::from(-123_456));
        assert_eq!(small, sleb(-123_456));
        assert_eq!(read_int(&mut Cursor::new(&small)).unwrap(), BigInt::from(-123_456));
    }

    #[test]
    fn test_malformed_and_truncated() {
        // Continuation bit never clears within 64 bits.
        let overlong = [0xff; 11];
        assert!(matches!(
            read_u64(&mut Cursor::new(&overlong)),
            Err(DecodeError::MalformedLeb128(0))
        ));
        assert!(matches!(
            read_u64(&mut Cursor::new(&[0x80, 0x80])),
            Err(DecodeError::Truncated(_))
        ));
        assert!(matches!(
            read_nat(&mut Cursor::new(&[0xff])),
            Err(DecodeError::Truncated(_))
        ));
    }
}
