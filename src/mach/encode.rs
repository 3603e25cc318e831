use crate::lang::{Name, NAME_END};

/// Largest payload an encoded index may carry.
pub const INDEX_WIDTH: usize = std::mem::size_of::<usize>();

/// Appends `idx` as a length byte followed by that many bytes, least
/// significant first. Zero is the single byte `0`.
pub fn encode_index(mut idx: usize, out: &mut Vec<u8>) {
    let mut bytes = [0u8; INDEX_WIDTH];
    let mut len = 0;
    while idx != 0 {
        bytes[len] = idx as u8;
        idx >>= 8;
        len += 1;
    }
    out.push(len as u8);
    out.extend_from_slice(&bytes[..len]);
}

/// Decodes an index at the start of `code`, returning it and the
/// number of bytes consumed.
pub fn decode_index(code: &[u8]) -> Option<(usize, usize)> {
    let len = *code.first()? as usize;
    if len > INDEX_WIDTH {
        return None;
    }
    let bytes = code.get(1..=len)?;
    let idx = bytes
        .iter()
        .rev()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    Some((idx, len + 1))
}

/// Appends the bytes of `name` and the terminator.
pub fn encode_name(name: &Name, out: &mut Vec<u8>) {
    out.extend_from_slice(name.as_bytes());
    out.push(NAME_END);
}

/// Reads a terminated name at the start of `code`, returning it and
/// the number of bytes consumed including the terminator.
pub fn read_name(code: &[u8]) -> Option<(Name, usize)> {
    let end = code.iter().position(|&b| b == NAME_END)?;
    let name = Name::from_code(&code[..end])?;
    Some((name, end + 1))
}
