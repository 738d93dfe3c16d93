//! Boxed 64-bit integer kinds
//!
//! The host language's native number is a double, exact only up to 2^53.
//! This module extends it with two boxed kinds, `core/s64` and `core/u64`,
//! providing exact machine-integer semantics. It owns the two descriptors,
//! the coercion layer between the external shapes (number, decimal string,
//! existing box) and the raw bit pattern, and the constructor natives.

use std::cmp::Ordering;

use crate::arithmetic::{s64_method, u64_method};
use crate::error::{RuntimeError, RuntimeResult, check_fixarity};
use crate::marshal::{TAG_S64, TAG_U64};
use crate::value::{AbstractCell, AbstractType, EmValue, handle_table};

/// Largest integer magnitude a double holds exactly (2^53). Numbers beyond
/// this are rejected even though the bit pattern would fit, because the
/// source float cannot be trusted to carry the exact integer.
pub(crate) const MAX_INT_IN_DOUBLE: f64 = 9007199254740992.0;

/// Descriptor for boxed signed 64-bit integers.
pub static S64_TYPE: AbstractType = AbstractType {
    name: "core/s64",
    tag: TAG_S64,
    get_method: s64_method,
    render: render_s64,
    compare: compare_s64,
    hash: hash_int64,
    marshal: marshal_int64,
    unmarshal: unmarshal_int64,
};

/// Descriptor for boxed unsigned 64-bit integers.
pub static U64_TYPE: AbstractType = AbstractType {
    name: "core/u64",
    tag: TAG_U64,
    get_method: u64_method,
    render: render_u64,
    compare: compare_u64,
    hash: hash_int64,
    marshal: marshal_int64,
    unmarshal: unmarshal_int64,
};

fn render_s64(bits: u64) -> String {
    (bits as i64).to_string()
}

fn render_u64(bits: u64) -> String {
    bits.to_string()
}

fn compare_s64(a: u64, b: u64) -> Ordering {
    (a as i64).cmp(&(b as i64))
}

fn compare_u64(a: u64, b: u64) -> Ordering {
    a.cmp(&b)
}

/// Both kinds hash the same way: fold the two 32-bit halves together.
fn hash_int64(bits: u64) -> u32 {
    (bits as u32) ^ ((bits >> 32) as u32)
}

fn marshal_int64(bits: u64, out: &mut Vec<u8>) {
    out.extend_from_slice(&bits.to_le_bytes());
}

fn unmarshal_int64(raw: &[u8; 8]) -> u64 {
    u64::from_le_bytes(*raw)
}

/// Raw bit pattern of a value that is already a boxed integer of either
/// kind. Cross-kind reinterpretation is deliberate: it is the only
/// sanctioned path between the signed and unsigned kinds.
fn int_bits(value: &EmValue) -> Option<u64> {
    let handle = value.as_abstract()?;
    handle_table()
        .with_cell(handle, |cell| {
            (cell.is_type(&S64_TYPE) || cell.is_type(&U64_TYPE)).then(|| cell.bits())
        })
        .flatten()
}

/// Extract a signed 64-bit integer from any of the accepted shapes.
pub fn unwrap_s64(value: &EmValue) -> RuntimeResult<i64> {
    match value {
        EmValue::Number(n) if n.abs() <= MAX_INT_IN_DOUBLE => Ok(*n as i64),
        EmValue::String(s) => s
            .parse::<i64>()
            .map_err(|_| RuntimeError::bad_initializer("s64", value)),
        EmValue::Abstract(_) => int_bits(value)
            .map(|bits| bits as i64)
            .ok_or_else(|| RuntimeError::bad_initializer("s64", value)),
        _ => Err(RuntimeError::bad_initializer("s64", value)),
    }
}

/// Extract an unsigned 64-bit integer from any of the accepted shapes.
pub fn unwrap_u64(value: &EmValue) -> RuntimeResult<u64> {
    match value {
        EmValue::Number(n) if *n >= 0.0 && *n <= MAX_INT_IN_DOUBLE => Ok(*n as u64),
        EmValue::String(s) => s
            .parse::<u64>()
            .map_err(|_| RuntimeError::bad_initializer("u64", value)),
        EmValue::Abstract(_) => int_bits(value).ok_or_else(|| RuntimeError::bad_initializer("u64", value)),
        _ => Err(RuntimeError::bad_initializer("u64", value)),
    }
}

/// Allocate a fresh boxed signed integer.
pub fn wrap_s64(value: i64) -> EmValue {
    EmValue::Abstract(handle_table().allocate(AbstractCell::new(&S64_TYPE, value as u64)))
}

/// Allocate a fresh boxed unsigned integer.
pub fn wrap_u64(value: u64) -> EmValue {
    EmValue::Abstract(handle_table().allocate(AbstractCell::new(&U64_TYPE, value)))
}

/// Classification of an arbitrary value as a boxed integer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntClass {
    S64,
    U64,
    None,
}

/// Classify a value by descriptor identity alone.
pub fn int_class(value: &EmValue) -> IntClass {
    match value.abstract_type() {
        Some(ty) if AbstractType::same(ty, &S64_TYPE) => IntClass::S64,
        Some(ty) if AbstractType::same(ty, &U64_TYPE) => IntClass::U64,
        _ => IntClass::None,
    }
}

/// `(int/s64 value)` constructor.
pub(crate) fn s64_new(args: &[EmValue]) -> RuntimeResult<EmValue> {
    check_fixarity("int/s64", 1, args.len())?;
    Ok(wrap_s64(unwrap_s64(&args[0])?))
}

/// `(int/u64 value)` constructor.
pub(crate) fn u64_new(args: &[EmValue]) -> RuntimeResult<EmValue> {
    check_fixarity("int/u64", 1, args.len())?;
    Ok(wrap_u64(unwrap_u64(&args[0])?))
}
