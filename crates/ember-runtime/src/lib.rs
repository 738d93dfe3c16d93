//! Ember runtime library.
//!
//! Implements the boxed 64-bit integer subsystem of the Ember embeddable
//! language runtime. The host language's native number is a double, exact
//! only up to 2^53; this crate extends it with two opaque boxed kinds,
//! `core/s64` and `core/u64`, that behave as first-class values:
//!
//! - Value representation: generic [`EmValue`], immutable boxed cells in a
//!   global handle table, static per-kind descriptors
//! - Coercion: [`unwrap_s64`]/[`unwrap_u64`] from number, decimal string or
//!   existing box; [`wrap_s64`]/[`wrap_u64`] back into boxed values
//! - Operator protocol: wraparound arithmetic, bitwise operators, checked
//!   division, comparisons, with reverse-operand forms, dispatched through
//!   [`get_property`]
//! - Equality, hashing and ordering hooks usable for container keys
//! - Binary marshaling: [`marshal()`]/[`unmarshal`] with a fixed 9-byte wire
//!   format
//! - Environment registration: [`register_int_lib`] installs the `int/s64`
//!   and `int/u64` constructors

pub mod arithmetic;
pub mod builtins;
pub mod error;
pub mod int64;
pub mod marshal;
pub mod value;


pub use builtins::{Environment, get_property, register_int_lib};
pub use error::{RuntimeError, RuntimeResult};
pub use int64::{
    IntClass, S64_TYPE, U64_TYPE, int_class, unwrap_s64, unwrap_u64, wrap_s64, wrap_u64,
};
pub use marshal::{MARSHALED_LEN, TAG_S64, TAG_U64, marshal, unmarshal};
pub use value::{AbstractCell, AbstractType, EmHandle, EmValue, HandleTable, NativeFn, handle_table};
