//! Binary record codec shared by the three collections.
//!
//! Node records are encoded as a fixed sequence of optional neighbor
//! identifiers followed by a length-prefixed value payload. Everything is
//! little-endian and length-prefixed; decoding is bounds-checked and rejects
//! truncation, trailing bytes, and unknown tags as corruption rather than
//! guessing.

use crate::error::{Result, StoreError};
use crate::model::NodeId;

const TAG_ABSENT: u8 = 0;
const TAG_PRESENT: u8 = 1;

/// Value seam between the collections and caller value types.
///
/// Implementations must round-trip exactly: `decode(encode(v)) == v` for
/// every value. The record framing length-prefixes the payload, so
/// variable-width types need no terminator of their own.
pub trait StoredValue: Sized {
    /// Appends the encoded value to `buf`.
    fn encode(&self, buf: &mut Vec<u8>);
    /// Decodes a value from exactly `bytes`.
    fn decode(bytes: &[u8]) -> Result<Self>;
}

macro_rules! stored_int {
    ($($ty:ty),*) => {
        $(impl StoredValue for $ty {
            fn encode(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_le_bytes());
            }

            fn decode(bytes: &[u8]) -> Result<Self> {
                let arr: [u8; std::mem::size_of::<$ty>()] = bytes
                    .try_into()
                    .map_err(|_| StoreError::Corruption(
                        format!("integer payload of {} bytes", bytes.len()),
                    ))?;
                Ok(<$ty>::from_le_bytes(arr))
            }
        })*
    };
}

stored_int!(i32, i64, u32, u64);

impl StoredValue for String {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| StoreError::Corruption("invalid UTF-8 in string payload".into()))
    }
}

impl StoredValue for Vec<u8> {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

pub(crate) fn write_opt_id(buf: &mut Vec<u8>, id: Option<&NodeId>) {
    match id {
        None => buf.push(TAG_ABSENT),
        Some(id) => {
            buf.push(TAG_PRESENT);
            write_slab(buf, id.as_bytes());
        }
    }
}

pub(crate) fn write_slab(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

pub(crate) fn write_value<T: StoredValue>(buf: &mut Vec<u8>, value: &T) {
    let mut slab = Vec::new();
    value.encode(&mut slab);
    write_slab(buf, &slab);
}

/// Count slots hold a `u64` in little-endian; an absent slot means zero.
pub(crate) fn encode_count(count: u64) -> [u8; 8] {
    count.to_le_bytes()
}

pub(crate) fn decode_count(bytes: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Corruption(format!("count slot of {} bytes", bytes.len())))?;
    Ok(u64::from_le_bytes(arr))
}

/// Bounds-checked reader over an encoded record.
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, index: 0 }
    }

    fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.index + len > self.data.len() {
            return Err(StoreError::Corruption("record truncated".into()));
        }
        let start = self.index;
        self.index += len;
        Ok(&self.data[start..start + len])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes: [u8; 4] = self
            .read_exact(4)?
            .try_into()
            .expect("slice has exactly 4 bytes");
        Ok(u32::from_le_bytes(bytes))
    }

    pub(crate) fn read_opt_id(&mut self) -> Result<Option<NodeId>> {
        let tag = self.read_exact(1)?[0];
        match tag {
            TAG_ABSENT => Ok(None),
            TAG_PRESENT => {
                let len = self.read_u32()? as usize;
                let bytes = self.read_exact(len)?;
                if bytes.is_empty() {
                    return Err(StoreError::Corruption("empty neighbor identifier".into()));
                }
                Ok(Some(NodeId::from(bytes)))
            }
            other => Err(StoreError::Corruption(format!(
                "unknown neighbor tag: 0x{other:02X}"
            ))),
        }
    }

    pub(crate) fn read_value<T: StoredValue>(&mut self) -> Result<T> {
        let len = self.read_u32()? as usize;
        let slab = self.read_exact(len)?;
        T::decode(slab)
    }

    pub(crate) fn ensure_consumed(&self) -> Result<()> {
        if self.index != self.data.len() {
            return Err(StoreError::Corruption(
                "unexpected trailing bytes in record".into(),
            ));
        }
        Ok(())
    }
}
