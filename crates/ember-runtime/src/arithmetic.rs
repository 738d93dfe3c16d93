//! Operator protocol for boxed 64-bit integers
//!
//! Each kind carries a fixed table mapping operator-symbol text to a native
//! implementation; the tables are reachable only through generic property
//! lookup (see `builtins::get_property`), which is what lets the language's
//! arithmetic dispatch route through boxed values on either side of an
//! expression. Every implementation coerces each operand through the
//! coercion layer and allocates a fresh boxed result; operands are never
//! mutated.
//!
//! The additive, multiplicative and bitwise operators are variadic left
//! folds over wraparound machine arithmetic. The division family checks for
//! zero divisors, and the signed kind additionally rejects the one input
//! combination whose true result is unrepresentable.

use std::cmp::Ordering;

use crate::error::{RuntimeError, RuntimeResult, check_arity_at_least, check_fixarity};
use crate::int64::{unwrap_s64, unwrap_u64, wrap_s64, wrap_u64};
use crate::value::{EmValue, NativeFn};

/// One machine-integer kind behind a boxed value: a 64-bit payload with the
/// kind's own rules for the division family.
pub(crate) trait MachineInt: Copy {
    fn unwrap(value: &EmValue) -> RuntimeResult<Self>;
    fn wrap(self) -> EmValue;

    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn and(self, rhs: Self) -> Self;
    fn or(self, rhs: Self) -> Self;
    fn xor(self, rhs: Self) -> Self;
    fn shl(self, rhs: Self) -> Self;
    fn shr(self, rhs: Self) -> Self;

    /// Truncating division; zero divisors fail, and the signed kind rejects
    /// the minimum value divided by -1.
    fn div(self, rhs: Self) -> RuntimeResult<Self>;
    /// Truncating remainder, sign following the dividend; same failure rules
    /// as division.
    fn rem(self, rhs: Self) -> RuntimeResult<Self>;
    /// Floored modulo; only zero divisors fail.
    fn floored_mod(self, rhs: Self) -> RuntimeResult<Self>;

    fn compare(self, rhs: Self) -> Ordering;
}

impl MachineInt for i64 {
    fn unwrap(value: &EmValue) -> RuntimeResult<Self> {
        unwrap_s64(value)
    }

    fn wrap(self) -> EmValue {
        wrap_s64(self)
    }

    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    fn sub(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }

    fn mul(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }

    fn and(self, rhs: Self) -> Self {
        self & rhs
    }

    fn or(self, rhs: Self) -> Self {
        self | rhs
    }

    fn xor(self, rhs: Self) -> Self {
        self ^ rhs
    }

    // Shift counts are taken modulo the bit width.
    fn shl(self, rhs: Self) -> Self {
        self.wrapping_shl(rhs as u32)
    }

    fn shr(self, rhs: Self) -> Self {
        self.wrapping_shr(rhs as u32)
    }

    fn div(self, rhs: Self) -> RuntimeResult<Self> {
        if rhs == 0 {
            Err(RuntimeError::DivisionByZero)
        } else if self == i64::MIN && rhs == -1 {
            Err(RuntimeError::IntegerOverflow)
        } else {
            Ok(self / rhs)
        }
    }

    fn rem(self, rhs: Self) -> RuntimeResult<Self> {
        if rhs == 0 {
            Err(RuntimeError::DivisionByZero)
        } else if self == i64::MIN && rhs == -1 {
            Err(RuntimeError::IntegerOverflow)
        } else {
            Ok(self % rhs)
        }
    }

    fn floored_mod(self, rhs: Self) -> RuntimeResult<Self> {
        if rhs == 0 {
            return Err(RuntimeError::DivisionByZero);
        }
        // wrapping_rem makes MIN mod -1 well defined (it is 0).
        let r = self.wrapping_rem(rhs);
        if r != 0 && (r < 0) != (rhs < 0) {
            Ok(r + rhs)
        } else {
            Ok(r)
        }
    }

    fn compare(self, rhs: Self) -> Ordering {
        self.cmp(&rhs)
    }
}

impl MachineInt for u64 {
    fn unwrap(value: &EmValue) -> RuntimeResult<Self> {
        unwrap_u64(value)
    }

    fn wrap(self) -> EmValue {
        wrap_u64(self)
    }

    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    fn sub(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }

    fn mul(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }

    fn and(self, rhs: Self) -> Self {
        self & rhs
    }

    fn or(self, rhs: Self) -> Self {
        self | rhs
    }

    fn xor(self, rhs: Self) -> Self {
        self ^ rhs
    }

    fn shl(self, rhs: Self) -> Self {
        self.wrapping_shl(rhs as u32)
    }

    fn shr(self, rhs: Self) -> Self {
        self.wrapping_shr(rhs as u32)
    }

    fn div(self, rhs: Self) -> RuntimeResult<Self> {
        if rhs == 0 {
            Err(RuntimeError::DivisionByZero)
        } else {
            Ok(self / rhs)
        }
    }

    fn rem(self, rhs: Self) -> RuntimeResult<Self> {
        if rhs == 0 {
            Err(RuntimeError::DivisionByZero)
        } else {
            Ok(self % rhs)
        }
    }

    // No sign, no adjustment: unsigned mod is the truncating remainder.
    fn floored_mod(self, rhs: Self) -> RuntimeResult<Self> {
        self.rem(rhs)
    }

    fn compare(self, rhs: Self) -> Ordering {
        self.cmp(&rhs)
    }
}

/// Variadic left fold with an infallible combiner.
fn fold_op<T: MachineInt>(
    name: &'static str,
    args: &[EmValue],
    op: fn(T, T) -> T,
) -> RuntimeResult<EmValue> {
    check_arity_at_least(name, 2, args.len())?;
    let mut acc = T::unwrap(&args[0])?;
    for arg in &args[1..] {
        acc = op(acc, T::unwrap(arg)?);
    }
    Ok(acc.wrap())
}

/// Variadic left fold with a combiner that can fail.
fn fold_checked<T: MachineInt>(
    name: &'static str,
    args: &[EmValue],
    op: fn(T, T) -> RuntimeResult<T>,
) -> RuntimeResult<EmValue> {
    check_arity_at_least(name, 2, args.len())?;
    let mut acc = T::unwrap(&args[0])?;
    for arg in &args[1..] {
        acc = op(acc, T::unwrap(arg)?)?;
    }
    Ok(acc.wrap())
}

/// Two-operand swapped form: combines `second` with `first`, in that order.
/// Used when the boxed value sat on the right-hand side of the expression.
fn invert_op<T: MachineInt>(
    name: &'static str,
    args: &[EmValue],
    op: fn(T, T) -> T,
) -> RuntimeResult<EmValue> {
    check_fixarity(name, 2, args.len())?;
    let second = T::unwrap(&args[1])?;
    let first = T::unwrap(&args[0])?;
    Ok(op(second, first).wrap())
}

fn invert_checked<T: MachineInt>(
    name: &'static str,
    args: &[EmValue],
    op: fn(T, T) -> RuntimeResult<T>,
) -> RuntimeResult<EmValue> {
    check_fixarity(name, 2, args.len())?;
    let second = T::unwrap(&args[1])?;
    let first = T::unwrap(&args[0])?;
    Ok(op(second, first)?.wrap())
}

fn compare_op<T: MachineInt>(
    name: &'static str,
    args: &[EmValue],
    accept: fn(Ordering) -> bool,
) -> RuntimeResult<EmValue> {
    check_fixarity(name, 2, args.len())?;
    let lhs = T::unwrap(&args[0])?;
    let rhs = T::unwrap(&args[1])?;
    Ok(EmValue::boolean(accept(lhs.compare(rhs))))
}

fn add<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_op::<T>("+", args, T::add)
}

fn sub<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_op::<T>("-", args, T::sub)
}

fn rsub<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    invert_op::<T>("r-", args, T::sub)
}

fn mul<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_op::<T>("*", args, T::mul)
}

fn div<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_checked::<T>("/", args, T::div)
}

fn rdiv<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    invert_checked::<T>("r/", args, T::div)
}

fn rem<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_checked::<T>("%", args, T::rem)
}

fn rrem<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    invert_checked::<T>("r%", args, T::rem)
}

fn modulo<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_checked::<T>("mod", args, T::floored_mod)
}

fn rmodulo<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    invert_checked::<T>("rmod", args, T::floored_mod)
}

fn band<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_op::<T>("&", args, T::and)
}

fn bor<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_op::<T>("|", args, T::or)
}

fn bxor<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_op::<T>("^", args, T::xor)
}

fn shl<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_op::<T>("<<", args, T::shl)
}

fn shr<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    fold_op::<T>(">>", args, T::shr)
}

fn lt<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    compare_op::<T>("<", args, |o| o == Ordering::Less)
}

fn gt<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    compare_op::<T>(">", args, |o| o == Ordering::Greater)
}

fn le<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    compare_op::<T>("<=", args, |o| o != Ordering::Greater)
}

fn ge<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    compare_op::<T>(">=", args, |o| o != Ordering::Less)
}

fn eq<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    compare_op::<T>("=", args, |o| o == Ordering::Equal)
}

fn ne<T: MachineInt>(args: &[EmValue]) -> RuntimeResult<EmValue> {
    compare_op::<T>("!=", args, |o| o != Ordering::Equal)
}

/// Method table for one kind, instantiated from the generic implementations.
/// Commutative operators reuse the plain form for their reverse alias.
macro_rules! method_table {
    ($t:ty) => {
        &[
            ("+", add::<$t> as NativeFn),
            ("r+", add::<$t>),
            ("-", sub::<$t>),
            ("r-", rsub::<$t>),
            ("*", mul::<$t>),
            ("r*", mul::<$t>),
            ("/", div::<$t>),
            ("r/", rdiv::<$t>),
            ("mod", modulo::<$t>),
            ("rmod", rmodulo::<$t>),
            ("%", rem::<$t>),
            ("r%", rrem::<$t>),
            ("<", lt::<$t>),
            (">", gt::<$t>),
            ("<=", le::<$t>),
            (">=", ge::<$t>),
            ("=", eq::<$t>),
            ("!=", ne::<$t>),
            ("&", band::<$t>),
            ("r&", band::<$t>),
            ("|", bor::<$t>),
            ("r|", bor::<$t>),
            ("^", bxor::<$t>),
            ("r^", bxor::<$t>),
            ("<<", shl::<$t>),
            (">>", shr::<$t>),
        ]
    };
}

static S64_METHODS: &[(&str, NativeFn)] = method_table!(i64);
static U64_METHODS: &[(&str, NativeFn)] = method_table!(u64);

fn lookup(table: &[(&str, NativeFn)], name: &str) -> Option<NativeFn> {
    table
        .iter()
        .find(|(symbol, _)| *symbol == name)
        .map(|(_, f)| *f)
}

pub(crate) fn s64_method(name: &str) -> Option<NativeFn> {
    lookup(S64_METHODS, name)
}

pub(crate) fn u64_method(name: &str) -> Option<NativeFn> {
    lookup(U64_METHODS, name)
}
