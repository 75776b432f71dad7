use crate::value::Value;

/// The operand stack. Grows without bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Stack::default()
    }

    /// Index of the top element, `-1` when empty.
    pub fn sp(&self) -> isize {
        self.values.len() as isize - 1
    }

    pub fn depth(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    /// The value `n` slots below the top; `peek(0)` is the top itself.
    pub fn peek(&self, n: usize) -> Option<&Value> {
        let idx = self.values.len().checked_sub(n + 1)?;
        self.values.get(idx)
    }

    /// Bottom first.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn into_top(mut self) -> Option<Value> {
        self.values.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_pointer_is_negative() {
        let stack = Stack::new();
        assert_eq!(stack.sp(), -1);
        assert!(stack.is_empty());
        assert_eq!(stack.peek(0), None);
    }

    #[test]
    fn peek_counts_down_from_top() {
        let mut stack = Stack::new();
        stack.push(Value::Int(1));
        stack.push(Value::Int(2));
        assert_eq!(stack.sp(), 1);
        assert_eq!(stack.peek(0), Some(&Value::Int(2)));
        assert_eq!(stack.peek(1), Some(&Value::Int(1)));
        assert_eq!(stack.peek(2), None);
    }

    #[test]
    fn pop_returns_last_pushed() {
        let mut stack = Stack::new();
        stack.push(Value::Nil);
        stack.push(Value::Bool(true));
        assert_eq!(stack.pop(), Some(Value::Bool(true)));
        assert_eq!(stack.into_top(), Some(Value::Nil));
    }
}
