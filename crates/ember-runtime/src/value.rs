//! Ember value representation and boxed abstract storage
//!
//! This module defines the runtime's generic value type and the handle-based
//! storage for boxed abstract values. Boxed values live in a global handle
//! table so the embedding host can manage their lifetime independently of any
//! particular Rust scope; a cell is immutable once allocated, and every
//! operation that "modifies" a value allocates a fresh cell instead.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use dashmap::DashMap;

use crate::error::RuntimeResult;

/// Native function callable from embedded code.
pub type NativeFn = fn(&[EmValue]) -> RuntimeResult<EmValue>;

/// Type descriptor for one kind of boxed abstract value.
///
/// Exactly one descriptor exists per kind, as a process-wide static; a cell's
/// kind is determined by pointer identity of its descriptor, never by
/// inspecting the payload.
pub struct AbstractType {
    /// Display name, e.g. `core/s64`.
    pub name: &'static str,
    /// Stable marshal tag byte for this kind.
    pub tag: u8,
    /// Method dispatch hook: operator-symbol text to implementation.
    pub get_method: fn(&str) -> Option<NativeFn>,
    /// Decimal rendering of the payload.
    pub render: fn(u64) -> String,
    /// Three-way comparison of two payloads of this kind.
    pub compare: fn(u64, u64) -> Ordering,
    /// Payload hash; equal payloads of the same kind hash identically.
    pub hash: fn(u64) -> u32,
    /// Append the payload bytes in wire order.
    pub marshal: fn(u64, &mut Vec<u8>),
    /// Rebuild a payload from wire-order bytes.
    pub unmarshal: fn(&[u8; 8]) -> u64,
}

impl AbstractType {
    /// Descriptor identity. Two descriptors are the same kind only if they
    /// are the same static.
    pub fn same(a: &'static AbstractType, b: &'static AbstractType) -> bool {
        std::ptr::eq(a, b)
    }
}

impl fmt::Debug for AbstractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbstractType")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// One boxed abstract value: a descriptor plus exactly one 8-byte payload.
#[derive(Clone, Copy)]
pub struct AbstractCell {
    ty: &'static AbstractType,
    bits: u64,
}

impl AbstractCell {
    pub fn new(ty: &'static AbstractType, bits: u64) -> Self {
        AbstractCell { ty, bits }
    }

    pub fn ty(&self) -> &'static AbstractType {
        self.ty
    }

    /// The raw 64-bit payload. Interpretation is up to the descriptor.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn is_type(&self, ty: &'static AbstractType) -> bool {
        AbstractType::same(self.ty, ty)
    }
}

impl fmt::Debug for AbstractCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.ty.name, (self.ty.render)(self.bits))
    }
}

/// Handle to a boxed abstract value in the global table.
///
/// Index 0 is reserved as the null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmHandle(u64);

impl EmHandle {
    pub fn null() -> Self {
        EmHandle(0)
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    pub(crate) fn from_index(index: u64) -> Self {
        EmHandle(index)
    }
}

/// Storage for boxed abstract values.
///
/// The table is the host runtime's value-lifetime mechanism: cells stay alive
/// until explicitly released. Access is read-only; there is no mutation API.
pub struct HandleTable {
    cells: DashMap<u64, AbstractCell>,
    next_index: AtomicU64,
}

impl HandleTable {
    fn new() -> Self {
        HandleTable {
            cells: DashMap::new(),
            // Start at 1, reserve 0 for null
            next_index: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh cell and return its handle.
    pub fn allocate(&self, cell: AbstractCell) -> EmHandle {
        let index = self.next_index.fetch_add(1, AtomicOrdering::Relaxed);
        self.cells.insert(index, cell);
        EmHandle::from_index(index)
    }

    /// Run a closure against the cell behind a handle.
    ///
    /// Returns `None` for the null handle or one already released.
    pub fn with_cell<T>(&self, handle: EmHandle, f: impl FnOnce(&AbstractCell) -> T) -> Option<T> {
        if handle.is_null() {
            return None;
        }
        self.cells.get(&handle.0).map(|entry| f(entry.value()))
    }

    /// Copy the cell behind a handle out of the table.
    pub fn cell(&self, handle: EmHandle) -> Option<AbstractCell> {
        self.with_cell(handle, |cell| *cell)
    }

    /// Release a handle. Releasing null or an unknown handle is a no-op.
    pub fn release(&self, handle: EmHandle) {
        if handle.is_null() {
            return;
        }
        self.cells.remove(&handle.0);
    }

    /// Drop every cell (test isolation).
    pub fn clear(&self) {
        self.cells.clear();
        self.next_index.store(1, AtomicOrdering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Global handle table instance
static HANDLE_TABLE: LazyLock<HandleTable> = LazyLock::new(HandleTable::new);

pub fn handle_table() -> &'static HandleTable {
    &HANDLE_TABLE
}

/// The runtime's generic value type.
#[derive(Clone)]
pub enum EmValue {
    Nil,
    Boolean(bool),
    /// Native double-precision number, exact only up to 2^53.
    Number(f64),
    String(Rc<str>),
    /// Symbol-shaped key used for property lookup.
    Keyword(Rc<str>),
    Function(NativeFn),
    /// Boxed abstract value, stored behind the global handle table.
    Abstract(EmHandle),
}

impl EmValue {
    pub fn number(n: f64) -> Self {
        EmValue::Number(n)
    }

    pub fn string(s: impl Into<Rc<str>>) -> Self {
        EmValue::String(s.into())
    }

    pub fn keyword(s: impl Into<Rc<str>>) -> Self {
        EmValue::Keyword(s.into())
    }

    pub fn boolean(b: bool) -> Self {
        EmValue::Boolean(b)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, EmValue::Nil)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            EmValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            EmValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            EmValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<NativeFn> {
        match self {
            EmValue::Function(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_abstract(&self) -> Option<EmHandle> {
        match self {
            EmValue::Abstract(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Resolve the boxed cell behind an `Abstract` value.
    pub fn abstract_cell(&self) -> Option<AbstractCell> {
        handle_table().cell(self.as_abstract()?)
    }

    /// Descriptor of an `Abstract` value, if it still resolves.
    pub fn abstract_type(&self) -> Option<&'static AbstractType> {
        self.abstract_cell().map(|cell| cell.ty())
    }

    /// Hash of a boxed value via its descriptor hook.
    pub fn abstract_hash(&self) -> Option<u32> {
        self.abstract_cell()
            .map(|cell| (cell.ty().hash)(cell.bits()))
    }

    /// Three-way comparison of two boxed values of the same kind.
    ///
    /// Values of different kinds are never ordered against each other;
    /// the result is `None` in that case.
    pub fn abstract_compare(&self, other: &EmValue) -> Option<Ordering> {
        let a = self.abstract_cell()?;
        let b = other.abstract_cell()?;
        if !AbstractType::same(a.ty(), b.ty()) {
            return None;
        }
        Some((a.ty().compare)(a.bits(), b.bits()))
    }

    /// Kind name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            EmValue::Nil => "nil",
            EmValue::Boolean(_) => "boolean",
            EmValue::Number(_) => "number",
            EmValue::String(_) => "string",
            EmValue::Keyword(_) => "keyword",
            EmValue::Function(_) => "function",
            EmValue::Abstract(_) => match self.abstract_type() {
                Some(ty) => ty.name,
                None => "abstract",
            },
        }
    }
}

impl PartialEq for EmValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EmValue::Nil, EmValue::Nil) => true,
            (EmValue::Boolean(a), EmValue::Boolean(b)) => a == b,
            (EmValue::Number(a), EmValue::Number(b)) => a == b,
            (EmValue::String(a), EmValue::String(b)) => a == b,
            (EmValue::Keyword(a), EmValue::Keyword(b)) => a == b,
            (EmValue::Function(a), EmValue::Function(b)) => std::ptr::fn_addr_eq(*a, *b),
            (EmValue::Abstract(_), EmValue::Abstract(_)) => {
                match (self.abstract_cell(), other.abstract_cell()) {
                    (Some(a), Some(b)) => {
                        AbstractType::same(a.ty(), b.ty()) && a.bits() == b.bits()
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl fmt::Debug for EmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmValue::Nil => write!(f, "Nil"),
            EmValue::Boolean(b) => write!(f, "Boolean({b})"),
            EmValue::Number(n) => write!(f, "Number({n})"),
            EmValue::String(s) => write!(f, "String({s:?})"),
            EmValue::Keyword(s) => write!(f, "Keyword(:{s})"),
            EmValue::Function(_) => write!(f, "Function"),
            EmValue::Abstract(handle) => match self.abstract_cell() {
                Some(cell) => write!(f, "Abstract({cell:?})"),
                None => write!(f, "Abstract(released #{})", handle.0),
            },
        }
    }
}

impl fmt::Display for EmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmValue::Nil => write!(f, "nil"),
            EmValue::Boolean(b) => write!(f, "{b}"),
            EmValue::Number(n) => write!(f, "{n}"),
            EmValue::String(s) => write!(f, "{s}"),
            EmValue::Keyword(s) => write!(f, ":{s}"),
            EmValue::Function(_) => write!(f, "<function>"),
            EmValue::Abstract(_) => match self.abstract_cell() {
                Some(cell) => write!(f, "{}", (cell.ty().render)(cell.bits())),
                None => write!(f, "<released>"),
            },
        }
    }
}
