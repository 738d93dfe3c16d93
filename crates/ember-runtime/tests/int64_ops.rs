//! End-to-end tests for the boxed integer operator protocol, driven the way
//! embedded code reaches it: constructors out of the environment, operators
//! through generic property lookup.

use ember_runtime::{
    EmValue, Environment, IntClass, NativeFn, RuntimeError, get_property, int_class, marshal,
    register_int_lib, unmarshal, unwrap_s64, unwrap_u64, wrap_s64, wrap_u64,
};

fn method(value: &EmValue, name: &str) -> NativeFn {
    get_property(value, &EmValue::keyword(name))
        .unwrap_or_else(|| panic!("no method {name}"))
        .as_function()
        .unwrap()
}

fn s64_ctor() -> NativeFn {
    let mut env = Environment::new();
    register_int_lib(&mut env);
    env.lookup("int/s64").unwrap().as_function().unwrap()
}

fn u64_ctor() -> NativeFn {
    let mut env = Environment::new();
    register_int_lib(&mut env);
    env.lookup("int/u64").unwrap().as_function().unwrap()
}

#[test]
fn signed_add_wraps_at_maximum() {
    let ctor = s64_ctor();
    let max = ctor(&[EmValue::string("9223372036854775807")]).unwrap();
    let add = method(&max, "+");
    let wrapped = add(&[max, EmValue::number(1.0)]).unwrap();
    assert_eq!(unwrap_s64(&wrapped).unwrap(), i64::MIN);
    assert_eq!(wrapped.to_string(), "-9223372036854775808");
}

#[test]
fn unsigned_add_wraps_at_maximum() {
    let ctor = u64_ctor();
    let max = ctor(&[EmValue::string("18446744073709551615")]).unwrap();
    let add = method(&max, "+");
    let wrapped = add(&[max, EmValue::number(1.0)]).unwrap();
    assert_eq!(unwrap_u64(&wrapped).unwrap(), 0);
    assert_eq!(wrapped.to_string(), "0");
}

#[test]
fn variadic_fold_matches_nested_application() {
    let (a, b, c) = (0x7fff_ffff_ffff_fff0_u64 as i64, 913, -77);
    let add = method(&wrap_s64(0), "+");

    let folded = add(&[wrap_s64(a), wrap_s64(b), wrap_s64(c)]).unwrap();
    let nested_inner = add(&[wrap_s64(a), wrap_s64(b)]).unwrap();
    let nested = add(&[nested_inner, wrap_s64(c)]).unwrap();
    assert_eq!(folded, nested);
    assert_eq!(
        unwrap_s64(&folded).unwrap(),
        a.wrapping_add(b).wrapping_add(c)
    );

    let uadd = method(&wrap_u64(0), "+");
    let ufolded = uadd(&[wrap_u64(u64::MAX), wrap_u64(5), wrap_u64(7)]).unwrap();
    let uinner = uadd(&[wrap_u64(u64::MAX), wrap_u64(5)]).unwrap();
    let unested = uadd(&[uinner, wrap_u64(7)]).unwrap();
    assert_eq!(ufolded, unested);
}

#[test]
fn subtraction_reverse_form_swaps_operands() {
    let a = wrap_s64(3);
    let rsub = method(&a, "r-");
    // r- computes second - first
    let result = rsub(&[a, wrap_s64(10)]).unwrap();
    assert_eq!(unwrap_s64(&result).unwrap(), 7);

    // No variadic form
    let b = wrap_s64(1);
    let rsub = method(&b, "r-");
    assert!(matches!(
        rsub(&[b.clone(), b.clone(), b]),
        Err(RuntimeError::WrongArity { .. })
    ));
}

#[test]
fn division_by_zero_fails_everywhere() {
    let s = wrap_s64(10);
    let u = wrap_u64(10);

    for op in ["/", "%", "mod"] {
        let f = method(&s, op);
        assert_eq!(
            f(&[s.clone(), wrap_s64(0)]).unwrap_err(),
            RuntimeError::DivisionByZero,
            "s64 {op}"
        );
        let f = method(&u, op);
        assert_eq!(
            f(&[u.clone(), wrap_u64(0)]).unwrap_err(),
            RuntimeError::DivisionByZero,
            "u64 {op}"
        );
    }
    for op in ["r/", "r%", "rmod"] {
        let f = method(&s, op);
        assert_eq!(
            f(&[wrap_s64(0), s.clone()]).unwrap_err(),
            RuntimeError::DivisionByZero,
            "s64 {op}"
        );
        let f = method(&u, op);
        assert_eq!(
            f(&[wrap_u64(0), u.clone()]).unwrap_err(),
            RuntimeError::DivisionByZero,
            "u64 {op}"
        );
    }

    // A zero anywhere in a variadic divisor list fails too
    let div = method(&s, "/");
    assert!(div(&[s.clone(), wrap_s64(2), wrap_s64(0)]).is_err());
}

#[test]
fn signed_minimum_divided_by_minus_one_overflows() {
    let min = wrap_s64(i64::MIN);

    let div = method(&min, "/");
    assert_eq!(
        div(&[min.clone(), wrap_s64(-1)]).unwrap_err(),
        RuntimeError::IntegerOverflow
    );
    let rem = method(&min, "%");
    assert_eq!(
        rem(&[min.clone(), wrap_s64(-1)]).unwrap_err(),
        RuntimeError::IntegerOverflow
    );
    let rdiv = method(&min, "r/");
    assert_eq!(
        rdiv(&[wrap_s64(-1), min.clone()]).unwrap_err(),
        RuntimeError::IntegerOverflow
    );

    // The unsigned kind has no most-negative case; the same bit pattern
    // divides cleanly.
    let u = wrap_u64(i64::MIN as u64);
    let udiv = method(&u, "/");
    let q = udiv(&[u, wrap_u64(u64::MAX)]).unwrap();
    assert_eq!(unwrap_u64(&q).unwrap(), 0);
}

#[test]
fn remainder_sign_follows_dividend() {
    let rem = method(&wrap_s64(0), "%");
    let r = rem(&[wrap_s64(-7), wrap_s64(3)]).unwrap();
    assert_eq!(unwrap_s64(&r).unwrap(), -1);
    let r = rem(&[wrap_s64(7), wrap_s64(-3)]).unwrap();
    assert_eq!(unwrap_s64(&r).unwrap(), 1);
}

#[test]
fn floored_modulo_sign_follows_divisor() {
    let modop = method(&wrap_s64(0), "mod");
    let cases = [
        (-7_i64, 3_i64, 2_i64),
        (7, -3, -2),
        (-7, -3, -1),
        (7, 3, 1),
        (-6, 3, 0),
    ];
    for (a, b, want) in cases {
        let r = modop(&[wrap_s64(a), wrap_s64(b)]).unwrap();
        assert_eq!(unwrap_s64(&r).unwrap(), want, "mod({a}, {b})");
    }

    // Reverse form swaps: rmod(first, second) computes second mod first
    let rmod = method(&wrap_s64(0), "rmod");
    let r = rmod(&[wrap_s64(3), wrap_s64(-7)]).unwrap();
    assert_eq!(unwrap_s64(&r).unwrap(), 2);

    // Unsigned mod is the plain truncating remainder
    let umod = method(&wrap_u64(0), "mod");
    let r = umod(&[wrap_u64(7), wrap_u64(3)]).unwrap();
    assert_eq!(unwrap_u64(&r).unwrap(), 1);
}

#[test]
fn bitwise_and_shift_operators() {
    let band = method(&wrap_u64(0), "&");
    let bor = method(&wrap_u64(0), "|");
    let bxor = method(&wrap_u64(0), "^");
    let shl = method(&wrap_u64(0), "<<");
    let shr = method(&wrap_u64(0), ">>");

    let v = band(&[wrap_u64(0xff00), wrap_u64(0x0ff0)]).unwrap();
    assert_eq!(unwrap_u64(&v).unwrap(), 0x0f00);
    let v = bor(&[wrap_u64(0xf0), wrap_u64(0x0f), wrap_u64(0x100)]).unwrap();
    assert_eq!(unwrap_u64(&v).unwrap(), 0x1ff);
    let v = bxor(&[wrap_u64(0xff), wrap_u64(0x0f)]).unwrap();
    assert_eq!(unwrap_u64(&v).unwrap(), 0xf0);
    let v = shl(&[wrap_u64(1), wrap_u64(63)]).unwrap();
    assert_eq!(unwrap_u64(&v).unwrap(), 1 << 63);
    let v = shr(&[wrap_u64(1 << 63), wrap_u64(60)]).unwrap();
    assert_eq!(unwrap_u64(&v).unwrap(), 8);

    // Signed right shift is arithmetic
    let sshr = method(&wrap_s64(0), ">>");
    let v = sshr(&[wrap_s64(-16), wrap_s64(2)]).unwrap();
    assert_eq!(unwrap_s64(&v).unwrap(), -4);
}

#[test]
fn comparisons_return_booleans() {
    let a = wrap_s64(-2);
    for (op, want) in [
        ("<", true),
        (">", false),
        ("<=", true),
        (">=", false),
        ("=", false),
        ("!=", true),
    ] {
        let f = method(&a, op);
        let result = f(&[a.clone(), wrap_s64(3)]).unwrap();
        assert_eq!(result.as_boolean().unwrap(), want, "s64 {op}");
    }

    // Unsigned comparison treats the high bit as magnitude
    let big = wrap_u64(u64::MAX);
    let lt = method(&big, "<");
    let result = lt(&[big, wrap_u64(1)]).unwrap();
    assert_eq!(result.as_boolean().unwrap(), false);

    // Two operands exactly
    let le = method(&wrap_s64(0), "<=");
    assert!(le(&[wrap_s64(1)]).is_err());
    assert!(le(&[wrap_s64(1), wrap_s64(2), wrap_s64(3)]).is_err());
}

#[test]
fn variadic_operators_need_two_operands() {
    let one = wrap_s64(1);
    for op in ["+", "-", "*", "/", "%", "mod", "&", "|", "^", "<<", ">>"] {
        let f = method(&one, op);
        assert!(
            matches!(f(&[one.clone()]), Err(RuntimeError::WrongArity { .. })),
            "{op} accepted a single operand"
        );
    }
}

#[test]
fn mixed_operand_shapes_coerce_per_argument() {
    let a = wrap_s64(100);
    let add = method(&a, "+");
    let sum = add(&[a, EmValue::string("-30"), EmValue::number(5.0)]).unwrap();
    assert_eq!(unwrap_s64(&sum).unwrap(), 75);

    // A bad operand shape aborts the whole fold
    let b = wrap_s64(1);
    let add = method(&b, "+");
    assert!(matches!(
        add(&[b, EmValue::Nil]),
        Err(RuntimeError::BadInitializer { .. })
    ));
}

#[test]
fn float_box_raw_round_trip() {
    for f in [0.0, 1.0, -1.0, 4503599627370496.0, -9007199254740992.0] {
        let raw = unwrap_s64(&EmValue::number(f)).unwrap();
        let boxed = wrap_s64(raw);
        assert_eq!(unwrap_s64(&boxed).unwrap(), raw);
    }
}

#[test]
fn construct_then_render_is_canonical() {
    let ctor = s64_ctor();
    for s in ["0", "-1", "9223372036854775807", "-9223372036854775808"] {
        let boxed = ctor(&[EmValue::string(s)]).unwrap();
        assert_eq!(boxed.to_string(), s);
    }
    let ctor = u64_ctor();
    for s in ["0", "18446744073709551615"] {
        let boxed = ctor(&[EmValue::string(s)]).unwrap();
        assert_eq!(boxed.to_string(), s);
    }
}

#[test]
fn marshal_round_trip_preserves_kind_and_payload() {
    for v in [
        wrap_s64(0),
        wrap_s64(-1),
        wrap_s64(i64::MIN),
        wrap_s64(i64::MAX),
        wrap_u64(0),
        wrap_u64(u64::MAX),
    ] {
        let bytes = marshal(&v).unwrap();
        let back = unmarshal(&bytes).unwrap();
        assert_eq!(back, v);
        assert_eq!(int_class(&back), int_class(&v));
    }
}

#[test]
fn marshal_wire_format_is_stable() {
    let bytes = marshal(&wrap_s64(-2)).unwrap();
    assert_eq!(
        bytes,
        vec![0x01, 0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
    );
    let bytes = marshal(&wrap_u64(0x0102_0304_0506_0708)).unwrap();
    assert_eq!(
        bytes,
        vec![0x02, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
    );
}

#[test]
fn marshal_rejects_bad_input() {
    assert!(matches!(
        marshal(&EmValue::number(1.0)),
        Err(RuntimeError::BadMarshal { .. })
    ));
    assert_eq!(
        unmarshal(&[0x7f, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap_err(),
        RuntimeError::UnknownMarshalTag { tag: 0x7f }
    );
    assert!(matches!(
        unmarshal(&[0x01, 0, 0]),
        Err(RuntimeError::MarshalLength { .. })
    ));
    assert!(unmarshal(&[0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
}

#[test]
fn hash_agrees_with_value_equality() {
    let pairs = [
        (wrap_s64(12345), wrap_s64(12345)),
        (wrap_u64(0), wrap_u64(0)),
        (wrap_s64(i64::MIN), wrap_s64(i64::MIN)),
    ];
    for (a, b) in pairs {
        assert_eq!(a, b);
        assert_eq!(a.abstract_hash(), b.abstract_hash());
    }
}

#[test]
fn cross_kind_reinterpretation_is_explicit_only() {
    let ctor = s64_ctor();
    let from_unsigned = ctor(&[wrap_u64(u64::MAX)]).unwrap();
    assert_eq!(int_class(&from_unsigned), IntClass::S64);
    assert_eq!(unwrap_s64(&from_unsigned).unwrap(), -1);

    // The two kinds never order against each other
    let signed = wrap_s64(-1);
    let unsigned = wrap_u64(u64::MAX);
    assert_eq!(signed.abstract_compare(&unsigned), None);
    assert_ne!(signed, unsigned);
}
