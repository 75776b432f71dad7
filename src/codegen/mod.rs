//! Value → watson program.
//!
//! The emitted program rebuilds the value from an empty stack using only
//! constructors and appends, so feeding it to a fresh [`Vm`](crate::Vm)
//! leaves exactly that value on top.

use std::io::{self, Write};

use crate::value::Value;
use crate::vm::Op;

pub fn emit(value: &Value) -> Vec<Op> {
    let mut ops = Vec::new();
    emit_into(value, &mut ops);
    ops
}

/// The program for `value`, spelled out as bytes.
pub fn encode(value: &Value) -> Vec<u8> {
    emit(value).into_iter().map(Op::to_byte).collect()
}

pub fn write_to<W: Write>(value: &Value, out: &mut W) -> io::Result<()> {
    out.write_all(&encode(value))
}

fn emit_into(value: &Value, ops: &mut Vec<Op>) {
    match value {
        Value::Nil => ops.push(Op::Nnew),
        Value::Bool(b) => {
            ops.push(Op::Bnew);
            if *b {
                ops.push(Op::Bneg);
            }
        }
        Value::Int(n) => emit_bits(*n as u64, ops),
        Value::Uint(n) => {
            emit_bits(*n, ops);
            ops.push(Op::Itou);
        }
        Value::Float(x) => emit_float(*x, ops),
        Value::String(bytes) => emit_bytes(bytes, ops),
        Value::Array(items) => {
            ops.push(Op::Anew);
            for item in items {
                emit_into(item, ops);
                ops.push(Op::Aadd);
            }
        }
        Value::Object(entries) => {
            ops.push(Op::Onew);
            for (key, value) in entries {
                emit_bytes(key, ops);
                emit_into(value, ops);
                ops.push(Op::Oadd);
            }
        }
    }
}

fn emit_bytes(bytes: &[u8], ops: &mut Vec<Op>) {
    ops.push(Op::Snew);
    for byte in bytes {
        emit_bits(u64::from(*byte), ops);
        ops.push(Op::Sadd);
    }
}

/// Push an Int holding `bits`: start from zero and feed bits in from the
/// most significant set bit down, doubling before each one.
fn emit_bits(bits: u64, ops: &mut Vec<Op>) {
    ops.push(Op::Inew);
    if bits == 0 {
        return;
    }
    let high = 63 - bits.leading_zeros();
    for i in (0..=high).rev() {
        if i != high {
            ops.push(Op::Ishl);
        }
        if bits & (1 << i) != 0 {
            ops.push(Op::Iinc);
        }
    }
}

fn emit_float(x: f64, ops: &mut Vec<Op>) {
    if x.is_nan() {
        ops.push(Op::Fnan);
    } else if x.is_infinite() {
        ops.push(Op::Finf);
        if x.is_sign_negative() {
            ops.push(Op::Fneg);
        }
    } else {
        emit_bits(x.to_bits(), ops);
        ops.push(Op::Itof);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Vm;

    fn rebuild(value: &Value) -> Value {
        let mut vm = Vm::new();
        vm.feed_multi(emit(value)).unwrap();
        assert_eq!(vm.depth(), 1, "program for {value:?} left extra values");
        vm.into_top().unwrap()
    }

    #[test]
    fn zero_is_a_single_inew() {
        assert_eq!(emit(&Value::Int(0)), vec![Op::Inew]);
    }

    #[test]
    fn small_ints_use_shift_and_increment() {
        // 5 = 0b101
        assert_eq!(
            emit(&Value::Int(5)),
            vec![Op::Inew, Op::Iinc, Op::Ishl, Op::Ishl, Op::Iinc]
        );
        assert_eq!(encode(&Value::Int(5)), b"Yummu".to_vec());
    }

    #[test]
    fn integers_rebuild() {
        for n in [1, 2, 3, 255, -1, -2, i64::MIN, i64::MAX, 0x7abc_def0] {
            assert_eq!(rebuild(&Value::Int(n)), Value::Int(n));
        }
        assert_eq!(rebuild(&Value::Uint(u64::MAX)), Value::Uint(u64::MAX));
        assert_eq!(rebuild(&Value::Uint(0)), Value::Uint(0));
    }

    #[test]
    fn floats_rebuild() {
        for x in [0.0, -0.0, 1.5, -2.25e300, f64::MIN_POSITIVE, f64::INFINITY, f64::NEG_INFINITY] {
            let got = rebuild(&Value::Float(x));
            assert_eq!(got.as_float().map(f64::to_bits), Some(x.to_bits()), "{x}");
        }
        assert!(rebuild(&Value::Float(f64::NAN)).as_float().is_some_and(f64::is_nan));
    }

    #[test]
    fn composites_rebuild() {
        let value = Value::object([
            ("name", Value::string("taro")),
            ("raw", Value::String(vec![0, 0xff, b'\n'])),
            ("ok", Value::Bool(true)),
            ("none", Value::Nil),
            (
                "list",
                Value::Array(vec![Value::Int(-3), Value::Array(vec![]), Value::object::<&str, _>([])]),
            ),
        ]);
        assert_eq!(rebuild(&value), value);
    }

    #[test]
    fn write_to_matches_encode() {
        let value = Value::Array(vec![Value::Bool(false), Value::Nil]);
        let mut out = Vec::new();
        write_to(&value, &mut out).unwrap();
        assert_eq!(out, encode(&value));
        assert_eq!(out, b"*%#.#".to_vec());
    }
}
