//! Binary marshaling for boxed values
//!
//! Wire format per value: one kind-tag byte identifying the registered
//! abstract kind, followed by the raw 8-byte payload in little-endian order.
//! There is no versioning field; the tags are stable.

use tracing::trace;

use crate::error::{RuntimeError, RuntimeResult};
use crate::int64::{S64_TYPE, U64_TYPE};
use crate::value::{AbstractCell, AbstractType, EmValue, handle_table};

pub const TAG_S64: u8 = 0x01;
pub const TAG_U64: u8 = 0x02;

/// Serialized size of one boxed value: tag byte plus 8 payload bytes.
pub const MARSHALED_LEN: usize = 9;

fn type_for_tag(tag: u8) -> Option<&'static AbstractType> {
    match tag {
        TAG_S64 => Some(&S64_TYPE),
        TAG_U64 => Some(&U64_TYPE),
        _ => None,
    }
}

/// Serialize a boxed value. Only abstract values marshal; anything else is
/// an error.
pub fn marshal(value: &EmValue) -> RuntimeResult<Vec<u8>> {
    let cell = value.abstract_cell().ok_or_else(|| RuntimeError::BadMarshal {
        found: value.type_name().to_string(),
    })?;
    let mut out = Vec::with_capacity(MARSHALED_LEN);
    out.push(cell.ty().tag);
    (cell.ty().marshal)(cell.bits(), &mut out);
    trace!(kind = cell.ty().name, len = out.len(), "marshaled boxed value");
    Ok(out)
}

/// Deserialize one boxed value from an exact-length buffer.
///
/// Allocates a fresh cell of the tagged kind; round-tripping a value yields
/// one equal in kind and payload.
pub fn unmarshal(bytes: &[u8]) -> RuntimeResult<EmValue> {
    if bytes.len() != MARSHALED_LEN {
        return Err(RuntimeError::MarshalLength {
            expected: MARSHALED_LEN,
            got: bytes.len(),
        });
    }
    let ty = type_for_tag(bytes[0]).ok_or(RuntimeError::UnknownMarshalTag { tag: bytes[0] })?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[1..]);
    let bits = (ty.unmarshal)(&raw);
    trace!(kind = ty.name, "unmarshaled boxed value");
    Ok(EmValue::Abstract(
        handle_table().allocate(AbstractCell::new(ty, bits)),
    ))
}
