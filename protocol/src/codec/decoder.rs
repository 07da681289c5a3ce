use byteorder::ByteOrder;

use crate::error::IncompleteError;

pub fn check_len(input: &[u8], size: usize) -> Result<(), IncompleteError> {
    if input.len() < size {
        return Err(IncompleteError(size));
    }
    Ok(())
}

macro_rules! reader {
    ( $fn:ident, $size:expr, $ret:ty) => {
        #[allow(unused)]
        pub fn $fn(input: &[u8]) -> Result<(&[u8], $ret), IncompleteError> {
            check_len(input, $size)?;
            let x = byteorder::BigEndian::$fn(input);
            Ok((&input[$size..], x))
        }
    };
}

pub fn read_u8(input: &[u8]) -> Result<(&[u8], u8), IncompleteError> {
    check_len(input, 1)?;
    Ok((&input[1..], input[0]))
}

pub fn read_i8(input: &[u8]) -> Result<(&[u8], i8), IncompleteError> {
    read_u8(input).map(|(input, byte)| (input, byte as i8))
}

pub fn read_exact(input: &[u8], len: usize) -> Result<(&[u8], &[u8]), IncompleteError> {
    check_len(input, len)?;
    let (bytes, input) = input.split_at(len);
    Ok((input, bytes))
}

reader!(read_i16, 2, i16);
reader!(read_u16, 2, u16);
reader!(read_u32, 4, u32);
reader!(read_i32, 4, i32);
reader!(read_u64, 8, u64);
reader!(read_i64, 8, i64);
reader!(read_f32, 4, f32);
reader!(read_f64, 8, f64);

#[cfg(test)]
mod tests {
    use super::{read_exact, read_i8, read_u32};
    use crate::error::IncompleteError;

    #[test]
    fn read_short_input_test() {
        assert_eq!(Err(IncompleteError(4)), read_u32(&[0, 1]));
        assert_eq!(Err(IncompleteError(3)), read_exact(&[0, 1], 3));
    }

    #[test]
    fn read_i8_sign_test() {
        let (remaining, value) = read_i8(&[0xfe, 0x01]).unwrap();
        assert_eq!(-2, value);
        assert_eq!(&[0x01], remaining);
    }
}
