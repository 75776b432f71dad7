use std::fmt;

use tracing::{debug, trace};

use crate::value::{Kind, Object, Value};

mod op;
mod stack;

pub use op::Op;
pub use stack::Stack;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VmError {
    #[error("stack empty: {needed} operand(s) required, {depth} available")]
    StackEmpty { needed: usize, depth: usize },
    #[error("type mismatch: arg{position} must be {expected}, found {found}")]
    TypeMismatch { position: usize, expected: Operand, found: Kind },
}

pub type VmResult<T> = Result<T, VmError>;

/// What an opcode accepts in one operand slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Any,
    Of(Kind),
}

impl Operand {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Operand::Any => true,
            Operand::Of(kind) => value.kind() == kind,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Any => f.write_str("any value"),
            Operand::Of(kind) => write!(f, "{kind}"),
        }
    }
}

const ANY: Operand = Operand::Any;
const INT: Operand = Operand::Of(Kind::Int);
const FLOAT: Operand = Operand::Of(Kind::Float);
const STRING: Operand = Operand::Of(Kind::String);
const BOOL: Operand = Operand::Of(Kind::Bool);
const ARRAY: Operand = Operand::Of(Kind::Array);
const OBJECT: Operand = Operand::Of(Kind::Object);

/// Operand slots of `op`, arg1 (the top of the stack) first.
pub fn signature(op: Op) -> &'static [Operand] {
    match op {
        Op::Inew | Op::Finf | Op::Fnan | Op::Snew | Op::Onew | Op::Anew | Op::Bnew | Op::Nnew => &[],
        Op::Iinc | Op::Ishl | Op::Ineg | Op::Itof | Op::Itou => &[INT],
        Op::Iadd | Op::Isht => &[INT, INT],
        Op::Fneg => &[FLOAT],
        Op::Sadd => &[INT, STRING],
        Op::Oadd => &[ANY, STRING, OBJECT],
        Op::Aadd => &[ANY, ARRAY],
        Op::Bneg => &[BOOL],
        Op::Gdup | Op::Gpop => &[ANY],
        Op::Gswp => &[ANY, ANY],
    }
}

/// The watson execution engine: a value stack and nothing else.
///
/// Each opcode is validated against the stack before anything is popped, so
/// a failed [`Vm::feed`] leaves the stack exactly as it found it.
#[derive(Debug, Default)]
pub struct Vm {
    stack: Stack,
}

impl Vm {
    pub fn new() -> Self {
        Vm::default()
    }

    /// Execute one opcode.
    pub fn feed(&mut self, op: Op) -> VmResult<()> {
        trace!(%op, sp = self.stack.sp(), "feed");
        if let Err(e) = self.check(op) {
            debug!(%op, sp = self.stack.sp(), error = %e, "opcode rejected");
            return Err(e);
        }
        self.apply(op)
    }

    /// Execute `ops` in order, stopping at the first failure. Opcodes before
    /// the failing one stay applied.
    pub fn feed_multi<I>(&mut self, ops: I) -> VmResult<()>
    where
        I: IntoIterator<Item = Op>,
    {
        for op in ops {
            self.feed(op)?;
        }
        Ok(())
    }

    pub fn top(&self) -> VmResult<&Value> {
        self.stack.peek(0).ok_or(VmError::StackEmpty { needed: 1, depth: 0 })
    }

    /// Place a prebuilt value on the stack.
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Bottom first.
    pub fn stack(&self) -> &[Value] {
        self.stack.as_slice()
    }

    pub fn sp(&self) -> isize {
        self.stack.sp()
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn into_top(self) -> Option<Value> {
        self.stack.into_top()
    }

    // Count first, then types from arg1 down.
    fn check(&self, op: Op) -> VmResult<()> {
        let operands = signature(op);
        let depth = self.stack.depth();
        if depth < operands.len() {
            return Err(VmError::StackEmpty { needed: operands.len(), depth });
        }
        for (i, expected) in operands.iter().enumerate() {
            let Some(found) = self.stack.peek(i) else {
                return Err(VmError::StackEmpty { needed: operands.len(), depth });
            };
            if !expected.accepts(found) {
                return Err(VmError::TypeMismatch {
                    position: i + 1,
                    expected: *expected,
                    found: found.kind(),
                });
            }
        }
        Ok(())
    }

    fn apply(&mut self, op: Op) -> VmResult<()> {
        let result = match op {
            Op::Inew => Value::Int(0),
            Op::Iinc => Value::Int(self.pop_int(1)?.wrapping_add(1)),
            Op::Ishl => Value::Int(self.pop_int(1)?.wrapping_shl(1)),
            Op::Iadd => {
                let a = self.pop_int(1)?;
                let b = self.pop_int(2)?;
                Value::Int(a.wrapping_add(b))
            }
            Op::Ineg => Value::Int(self.pop_int(1)?.wrapping_neg()),
            Op::Isht => {
                let amount = self.pop_int(1)?;
                let value = self.pop_int(2)?;
                Value::Int(shift(value, amount))
            }
            Op::Itof => Value::Float(f64::from_bits(self.pop_int(1)? as u64)),
            Op::Itou => Value::Uint(self.pop_int(1)? as u64),

            Op::Finf => Value::Float(f64::INFINITY),
            Op::Fnan => Value::Float(f64::NAN),
            Op::Fneg => Value::Float(-self.pop_float(1)?),

            Op::Snew => Value::String(Vec::new()),
            Op::Sadd => {
                let byte = self.pop_int(1)? as u8;
                let mut bytes = self.pop_string(2)?;
                bytes.push(byte);
                Value::String(bytes)
            }

            Op::Onew => Value::Object(Object::new()),
            Op::Oadd => {
                // Moved off the stack: the object becomes its only owner.
                let value = self.pop_any()?;
                let key = self.pop_string(2)?;
                let mut object = self.pop_object(3)?;
                object.insert(key, value);
                Value::Object(object)
            }

            Op::Anew => Value::Array(Vec::new()),
            Op::Aadd => {
                let value = self.pop_any()?;
                let mut array = self.pop_array(2)?;
                array.push(value);
                Value::Array(array)
            }

            Op::Bnew => Value::Bool(false),
            Op::Bneg => Value::Bool(!self.pop_bool(1)?),

            Op::Nnew => Value::Nil,

            Op::Gdup => self.top()?.deep_copy(),
            Op::Gpop => {
                self.pop_any()?;
                return Ok(());
            }
            Op::Gswp => {
                let arg1 = self.pop_any()?;
                let arg2 = self.pop_any()?;
                self.stack.push(arg1);
                arg2
            }
        };
        self.stack.push(result);
        Ok(())
    }

    fn pop_any(&mut self) -> VmResult<Value> {
        self.stack.pop().ok_or(VmError::StackEmpty { needed: 1, depth: 0 })
    }

    fn pop_int(&mut self, position: usize) -> VmResult<i64> {
        match self.pop_any()? {
            Value::Int(n) => Ok(n),
            other => Err(mismatch(position, INT, &other)),
        }
    }

    fn pop_float(&mut self, position: usize) -> VmResult<f64> {
        match self.pop_any()? {
            Value::Float(x) => Ok(x),
            other => Err(mismatch(position, FLOAT, &other)),
        }
    }

    fn pop_bool(&mut self, position: usize) -> VmResult<bool> {
        match self.pop_any()? {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(position, BOOL, &other)),
        }
    }

    fn pop_string(&mut self, position: usize) -> VmResult<Vec<u8>> {
        match self.pop_any()? {
            Value::String(bytes) => Ok(bytes),
            other => Err(mismatch(position, STRING, &other)),
        }
    }

    fn pop_array(&mut self, position: usize) -> VmResult<Vec<Value>> {
        match self.pop_any()? {
            Value::Array(items) => Ok(items),
            other => Err(mismatch(position, ARRAY, &other)),
        }
    }

    fn pop_object(&mut self, position: usize) -> VmResult<Object> {
        match self.pop_any()? {
            Value::Object(entries) => Ok(entries),
            other => Err(mismatch(position, OBJECT, &other)),
        }
    }
}

fn mismatch(position: usize, expected: Operand, found: &Value) -> VmError {
    VmError::TypeMismatch { position, expected, found: found.kind() }
}

/// Left shift for non-negative `amount`, arithmetic right shift by
/// `|amount|` otherwise. Shifting by 64 or more drains every bit.
fn shift(value: i64, amount: i64) -> i64 {
    if amount >= 0 {
        if amount >= 64 { 0 } else { value << amount }
    } else {
        let amount = amount.unsigned_abs();
        if amount >= 64 { value >> 63 } else { value >> amount }
    }
}
