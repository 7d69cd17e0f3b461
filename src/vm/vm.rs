use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::vm::chunk::{self, Chunk, OpCode, op_from_u8};
use crate::vm::value::Value;

/// The bytecode interpreter. One instance owns the value stack and the
/// globals table; globals survive across `interpret` calls, which is what
/// lets a REPL accumulate definitions line by line.
pub struct Vm {
    stack: Vec<Value>,
    globals: HashMap<String, Value>,
    output: Vec<String>,
    writer: Box<dyn Write>,
    trace: bool,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(256),
            globals: HashMap::new(),
            output: Vec::new(),
            writer: Box::new(std::io::stdout()),
            trace: false,
        }
    }

    /// Dump the stack and each instruction to stderr as it executes.
    pub fn with_trace(mut self) -> Self {
        self.trace = true;
        self
    }

    #[cfg(test)]
    fn new_capturing() -> Self {
        let mut vm = Self::new();
        vm.writer = Box::new(Vec::<u8>::new());
        vm
    }

    /// Everything `print` has written, one entry per statement.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Execute a chunk to completion or to the first runtime error. On
    /// error the stack is cleared; globals are kept either way.
    pub fn interpret(&mut self, chunk: Chunk) -> Result<(), RuntimeError> {
        let result = self.run(&chunk);
        if result.is_err() {
            self.stack.clear();
        }
        result
    }

    fn run(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        let mut ip = 0;
        loop {
            if self.trace {
                self.trace_instruction(chunk, ip);
            }

            let op = chunk.code[ip];
            ip += 1;

            match op_from_u8(op) {
                Some(OpCode::Constant) => {
                    let idx = chunk.code[ip];
                    ip += 1;
                    self.stack.push(chunk.constants[idx as usize].clone());
                }
                Some(OpCode::Nil) => self.stack.push(Value::Nil),
                Some(OpCode::True) => self.stack.push(Value::Bool(true)),
                Some(OpCode::False) => self.stack.push(Value::Bool(false)),
                Some(OpCode::Pop) => {
                    self.pop();
                }
                Some(OpCode::GetLocal) => {
                    let slot = chunk.code[ip] as usize;
                    ip += 1;
                    let value = self.stack[slot].clone();
                    self.stack.push(value);
                }
                Some(OpCode::SetLocal) => {
                    let slot = chunk.code[ip] as usize;
                    ip += 1;
                    // Assignment is an expression: the value stays on top.
                    let value = self.peek().clone();
                    self.stack[slot] = value;
                }
                Some(OpCode::GetGlobal) => {
                    let idx = chunk.code[ip];
                    ip += 1;
                    let name = name_constant(chunk, idx);
                    match self.globals.get(name) {
                        Some(value) => self.stack.push(value.clone()),
                        None => {
                            return Err(runtime_error(
                                chunk,
                                ip,
                                format!("Undefined variable '{name}'."),
                            ));
                        }
                    }
                }
                Some(OpCode::SetGlobal) => {
                    let idx = chunk.code[ip];
                    ip += 1;
                    let name = name_constant(chunk, idx);
                    if !self.globals.contains_key(name) {
                        return Err(runtime_error(
                            chunk,
                            ip,
                            format!("Undefined variable '{name}'."),
                        ));
                    }
                    let value = self.peek().clone();
                    self.globals.insert(name.to_string(), value);
                }
                Some(OpCode::DefineGlobal) => {
                    let idx = chunk.code[ip];
                    ip += 1;
                    let name = name_constant(chunk, idx);
                    let value = self.pop();
                    self.globals.insert(name.to_string(), value);
                }
                Some(OpCode::Equal) => {
                    let b = self.pop();
                    let a = self.pop();
                    self.stack.push(Value::Bool(a == b));
                }
                Some(OpCode::NotEqual) => {
                    let b = self.pop();
                    let a = self.pop();
                    self.stack.push(Value::Bool(a != b));
                }
                Some(OpCode::Greater) => self.binary_op(chunk, ip, |a, b| Value::Bool(a > b))?,
                Some(OpCode::GreaterEqual) => {
                    self.binary_op(chunk, ip, |a, b| Value::Bool(a >= b))?
                }
                Some(OpCode::Less) => self.binary_op(chunk, ip, |a, b| Value::Bool(a < b))?,
                Some(OpCode::LessEqual) => self.binary_op(chunk, ip, |a, b| Value::Bool(a <= b))?,
                Some(OpCode::Add) => {
                    let b = self.pop();
                    let a = self.pop();
                    match (&a, &b) {
                        (Value::Number(x), Value::Number(y)) => {
                            self.stack.push(Value::Number(x + y));
                        }
                        (Value::String(x), Value::String(y)) => {
                            self.stack.push(Value::String(Rc::new(format!("{x}{y}"))));
                        }
                        _ => {
                            return Err(runtime_error(
                                chunk,
                                ip,
                                "Operands must be two numbers or two strings.",
                            ));
                        }
                    }
                }
                Some(OpCode::Subtract) => self.binary_op(chunk, ip, |a, b| Value::Number(a - b))?,
                Some(OpCode::Multiply) => self.binary_op(chunk, ip, |a, b| Value::Number(a * b))?,
                Some(OpCode::Divide) => {
                    // IEEE-754 semantics: dividing by zero is inf/NaN, not an
                    // error.
                    self.binary_op(chunk, ip, |a, b| Value::Number(a / b))?
                }
                Some(OpCode::Not) => {
                    let value = self.pop();
                    self.stack.push(Value::Bool(value.is_falsey()));
                }
                Some(OpCode::Negate) => match self.pop() {
                    Value::Number(n) => self.stack.push(Value::Number(-n)),
                    _ => {
                        return Err(runtime_error(chunk, ip, "Operand must be a number."));
                    }
                },
                Some(OpCode::Print) => {
                    let value = self.pop();
                    let text = value.to_string();
                    writeln!(self.writer, "{text}").expect("write should succeed");
                    self.output.push(text);
                }
                Some(OpCode::Jump) => {
                    let offset = chunk.read_u16(ip);
                    ip += 2;
                    ip += offset as usize;
                }
                Some(OpCode::JumpIfFalse) => {
                    let offset = chunk.read_u16(ip);
                    ip += 2;
                    // Peeks: the compiler pops the condition on each arm.
                    if self.peek().is_falsey() {
                        ip += offset as usize;
                    }
                }
                Some(OpCode::Loop) => {
                    let offset = chunk.read_u16(ip);
                    ip += 2;
                    ip -= offset as usize;
                }
                Some(OpCode::Return) => {
                    return Ok(());
                }
                None => {
                    return Err(runtime_error(chunk, ip, format!("Unknown opcode {op}.")));
                }
            }
        }
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("stack not empty")
    }

    fn peek(&self) -> &Value {
        self.stack.last().expect("stack not empty")
    }

    fn binary_op(
        &mut self,
        chunk: &Chunk,
        ip: usize,
        op: fn(f64, f64) -> Value,
    ) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        match (&a, &b) {
            (Value::Number(x), Value::Number(y)) => {
                self.stack.push(op(*x, *y));
                Ok(())
            }
            _ => Err(runtime_error(chunk, ip, "Operands must be numbers.")),
        }
    }

    fn trace_instruction(&self, chunk: &Chunk, ip: usize) {
        let mut line = String::from("          ");
        for value in &self.stack {
            line.push_str(&format!("[ {value} ]"));
        }
        line.push('\n');
        chunk::disassemble_instruction(chunk, ip, &mut line);
        eprint!("{line}");
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

fn name_constant(chunk: &Chunk, idx: u8) -> &str {
    match &chunk.constants[idx as usize] {
        Value::String(s) => s,
        _ => panic!("expected string constant"),
    }
}

/// Attribute the error to the line of the most recently executed byte.
fn runtime_error(chunk: &Chunk, ip: usize, message: impl Into<String>) -> RuntimeError {
    RuntimeError::new(message, chunk.lines[ip - 1])
}
