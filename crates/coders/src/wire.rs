//! Primitive big-endian reads and writes shared by the structural codecs.

use tandem_core::{Error, Result};

pub fn put_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

pub fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

pub fn put_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

pub fn put_i64(buf: &mut Vec<u8>, value: i64) {
    buf.extend_from_slice(&value.to_be_bytes());
}

pub fn put_f64(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_be_bytes());
}

pub fn read_exact<'a>(input: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    if input.len() < len {
        return Err(Error::codec(format!(
            "truncated input: needed {len} bytes, found {}",
            input.len()
        )));
    }
    let (head, tail) = input.split_at(len);
    *input = tail;
    Ok(head)
}

pub fn read_u8(input: &mut &[u8]) -> Result<u8> {
    Ok(read_exact(input, 1)?[0])
}

pub fn read_u32(input: &mut &[u8]) -> Result<u32> {
    let bytes = read_exact(input, 4)?;
    Ok(u32::from_be_bytes(bytes.try_into().expect("4 bytes")))
}

pub fn read_i32(input: &mut &[u8]) -> Result<i32> {
    let bytes = read_exact(input, 4)?;
    Ok(i32::from_be_bytes(bytes.try_into().expect("4 bytes")))
}

pub fn read_i64(input: &mut &[u8]) -> Result<i64> {
    let bytes = read_exact(input, 8)?;
    Ok(i64::from_be_bytes(bytes.try_into().expect("8 bytes")))
}

pub fn read_f64(input: &mut &[u8]) -> Result<f64> {
    let bytes = read_exact(input, 8)?;
    Ok(f64::from_be_bytes(bytes.try_into().expect("8 bytes")))
}
