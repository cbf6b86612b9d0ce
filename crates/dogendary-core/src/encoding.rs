//! Little-endian integers and Bitcoin-style compact-size varints.
//!
//! Only the 1, 3 and 5 byte varint forms are supported. Values above
//! `u32::MAX` fail with [`EncodingError::VarIntTooLarge`] instead of being
//! truncated, and the `0xff` prefix is rejected when reading.

use crate::error::EncodingError;

pub fn write_varint(buf: &mut Vec<u8>, n: u64) -> Result<(), EncodingError> {
    match n {
        0..=0xfc => buf.push(n as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => return Err(EncodingError::VarIntTooLarge(n)),
    }
    Ok(())
}

/// Varint length prefix followed by the bytes themselves.
pub fn write_var_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), EncodingError> {
    write_varint(buf, bytes.len() as u64)?;
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Cursor over a byte slice for decoding wire data.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], EncodingError> {
        if self.remaining() < n {
            return Err(EncodingError::UnexpectedEof { needed: n, remaining: self.remaining() });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], EncodingError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, EncodingError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, EncodingError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, EncodingError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, EncodingError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_varint(&mut self) -> Result<u64, EncodingError> {
        match self.read_u8()? {
            0xff => Err(EncodingError::UnsupportedVarIntPrefix),
            0xfe => Ok(self.read_u32_le()? as u64),
            0xfd => Ok(self.read_u16_le()? as u64),
            n => Ok(n as u64),
        }
    }

    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], EncodingError> {
        let len = self.read_varint()?;
        self.read_bytes(len as usize)
    }

    /// Fail if any input is left unread.
    pub fn finish(self) -> Result<(), EncodingError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(EncodingError::TrailingBytes(n)),
        }
    }
}
