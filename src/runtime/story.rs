//! The story virtual machine.
//!
//! [`Story`] executes a compiled [`Program`] as a cooperative loop: bytecode
//! runs until it flushes output, presents choices, or exits, and the embedder
//! drains lines with [`Story::continue_story`] and answers choice points with
//! [`Story::choose`].

use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::trace;

use crate::runtime::opcode::Opcode;
use crate::runtime::path::{ContentPath, DEFAULT_PATH, Program};
use crate::runtime::stream::OutputStream;
use crate::runtime::value::Value;

/// Maximum value-stack depth.
pub const STACK_MAX: usize = 128;
/// Maximum call depth.
pub const FRAMES_MAX: usize = 128;

/// A failure during story execution.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("call depth exceeded")]
    CallDepthExceeded,
    #[error("division by zero")]
    DivisionByZero,
    #[error("unknown content path '{0}'")]
    UnknownPath(String),
    #[error("undefined variable '{0}'")]
    UndefinedGlobal(String),
    #[error("invalid opcode 0x{0:02x}")]
    InvalidOpcode(u8),
    #[error("truncated bytecode in '{0}'")]
    TruncatedCode(String),
    #[error("constant index {0} out of range")]
    BadConstant(u8),
    #[error("stack slot {0} out of range")]
    BadSlot(u8),
    #[error("operands of '{op}' must be numbers, found {found}")]
    NotANumber { op: &'static str, found: &'static str },
    #[error("no choice numbered {0}")]
    InvalidChoice(usize),
}

/// A pending choice presented to the player.
#[derive(Debug, Clone)]
pub struct Choice {
    pub(crate) id: Value,
    pub text: String,
}

#[derive(Debug)]
struct Frame {
    path: Rc<ContentPath>,
    ip: usize,
    base: usize,
}

/// A story in progress.
pub struct Story {
    program: Program,
    globals: HashMap<String, Value>,
    stack: Vec<Value>,
    frames: Vec<Frame>,
    stream: OutputStream,
    choices: Vec<Choice>,
    current_choice_id: Value,
    can_continue: bool,
    is_exited: bool,
}

impl Story {
    /// Begin a story at its file-level content.
    pub fn new(program: Program) -> Self {
        let mut story = Self {
            program,
            globals: HashMap::new(),
            stack: Vec::new(),
            frames: Vec::new(),
            stream: OutputStream::new(),
            choices: Vec::new(),
            current_choice_id: Value::Int(-1),
            can_continue: false,
            is_exited: false,
        };
        if let Some(path) = story.program.get(DEFAULT_PATH) {
            let path = Rc::clone(path);
            for _ in 0..path.locals {
                story.stack.push(Value::Bool(false));
            }
            story.frames.push(Frame { path, ip: 0, base: 0 });
            story.can_continue = true;
        }
        story
    }

    pub fn can_continue(&self) -> bool {
        self.can_continue
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Advance the story and return the next output line, or `None` once it
    /// has stopped at a choice point or the end.
    pub fn continue_story(&mut self) -> Result<Option<String>, RuntimeError> {
        loop {
            if let Some(line) = self.stream.read_line() {
                if self.stream.is_empty()
                    && (self.is_exited || !self.choices.is_empty() || self.frames.is_empty())
                {
                    self.can_continue = false;
                }
                return Ok(Some(line));
            }
            if self.is_exited || !self.choices.is_empty() || self.frames.is_empty() {
                // No more output can arrive; hand out any unterminated tail.
                let tail = self.stream.read_rest();
                if tail.is_none() || self.stream.is_empty() {
                    self.can_continue = false;
                }
                return Ok(tail);
            }
            self.exec()?;
        }
    }

    /// Answer a pending choice point. Choices are numbered from one, in the
    /// order [`Story::choices`] lists them.
    pub fn choose(&mut self, number: usize) -> Result<(), RuntimeError> {
        if number == 0 || number > self.choices.len() {
            return Err(RuntimeError::InvalidChoice(number));
        }
        self.current_choice_id = self.choices[number - 1].id.clone();
        self.choices.clear();
        self.can_continue = true;
        Ok(())
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= STACK_MAX {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn peek(&self) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }

    /// Run bytecode until output is flushed, the story exits, or the last
    /// frame returns.
    fn exec(&mut self) -> Result<(), RuntimeError> {
        'frames: while let Some(frame) = self.frames.last() {
            let path = Rc::clone(&frame.path);
            let base = frame.base;
            let mut ip = frame.ip;

            loop {
                let op_offset = ip;
                let op = read_op(&path, &mut ip)?;
                trace!(path = %path.name, offset = op_offset, op = op.mnemonic());

                match op {
                    Opcode::Exit => {
                        self.save_ip(ip);
                        self.is_exited = true;
                        return Ok(());
                    }
                    Opcode::Ret => {
                        let value = self.pop()?;
                        let done = self.frames.pop();
                        if let Some(done) = done {
                            self.stack.truncate(done.base);
                        }
                        if self.frames.is_empty() {
                            return Ok(());
                        }
                        self.push(value)?;
                        continue 'frames;
                    }
                    Opcode::Pop => {
                        self.pop()?;
                    }
                    Opcode::True => self.push(Value::Bool(true))?,
                    Opcode::False => self.push(Value::Bool(false))?,
                    Opcode::Const => {
                        let value = read_const(&path, &mut ip)?;
                        self.push(value)?;
                    }
                    Opcode::Add
                    | Opcode::Sub
                    | Opcode::Mul
                    | Opcode::Div
                    | Opcode::Mod
                    | Opcode::CmpLt
                    | Opcode::CmpGt
                    | Opcode::CmpLte
                    | Opcode::CmpGte => self.binary_op(op)?,
                    Opcode::CmpEq => {
                        let rhs = self.pop()?;
                        let lhs = self.pop()?;
                        self.push(Value::Bool(lhs.value_eq(&rhs)))?;
                    }
                    Opcode::Neg => {
                        let v = self.pop()?;
                        let v = match v {
                            Value::Int(n) => Value::Int(-n),
                            Value::Float(n) => Value::Float(-n),
                            other => {
                                return Err(RuntimeError::NotANumber {
                                    op: op.mnemonic(),
                                    found: other.type_name(),
                                });
                            }
                        };
                        self.push(v)?;
                    }
                    Opcode::Not => {
                        let v = self.pop()?;
                        self.push(Value::Bool(v.is_falsey()))?;
                    }
                    Opcode::Jmp => {
                        let jump = read_u16(&path, &mut ip)?;
                        ip += jump;
                    }
                    Opcode::JmpT => {
                        let jump = read_u16(&path, &mut ip)?;
                        if !self.peek()?.is_falsey() {
                            ip += jump;
                        }
                    }
                    Opcode::JmpF => {
                        let jump = read_u16(&path, &mut ip)?;
                        if self.peek()?.is_falsey() {
                            ip += jump;
                        }
                    }
                    Opcode::Call => {
                        let name = read_name(&path, &mut ip)?;
                        self.save_ip(ip);
                        self.call(&name)?;
                        continue 'frames;
                    }
                    Opcode::Divert => {
                        let name = read_name(&path, &mut ip)?;
                        self.divert(&name)?;
                        continue 'frames;
                    }
                    Opcode::Load => {
                        let slot = read_byte(&path, &mut ip)?;
                        let value = self
                            .stack
                            .get(base + slot as usize)
                            .cloned()
                            .ok_or(RuntimeError::BadSlot(slot))?;
                        self.push(value)?;
                    }
                    Opcode::Store => {
                        let slot = read_byte(&path, &mut ip)?;
                        let value = self.peek()?.clone();
                        let dest = self
                            .stack
                            .get_mut(base + slot as usize)
                            .ok_or(RuntimeError::BadSlot(slot))?;
                        *dest = value;
                    }
                    Opcode::LoadGlobal => {
                        let name = read_name(&path, &mut ip)?;
                        let value = self
                            .globals
                            .get(name.as_ref())
                            .cloned()
                            .ok_or_else(|| RuntimeError::UndefinedGlobal(name.to_string()))?;
                        self.push(value)?;
                    }
                    Opcode::StoreGlobal => {
                        let name = read_name(&path, &mut ip)?;
                        let value = self.peek()?.clone();
                        self.globals.insert(name.to_string(), value);
                    }
                    Opcode::LoadChoiceId => {
                        let id = self.current_choice_id.clone();
                        self.push(id)?;
                    }
                    Opcode::ContentPush => {
                        let v = self.pop()?;
                        self.stream.write(&v.to_string());
                    }
                    Opcode::Line => self.stream.write_newline(),
                    Opcode::Glue => self.stream.trim_newlines(),
                    Opcode::ChoicePush => {
                        let id = self.pop()?;
                        let text = self.stream.read_rest().unwrap_or_default();
                        self.choices.push(Choice { id, text });
                    }
                    Opcode::Flush => {
                        self.save_ip(ip);
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    fn save_ip(&mut self, ip: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.ip = ip;
        }
    }

    /// Push a call frame. Arguments are already on the stack; they become the
    /// callee's first slots.
    fn call(&mut self, name: &str) -> Result<(), RuntimeError> {
        let path = self
            .program
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownPath(name.to_string()))?;
        if self.frames.len() >= FRAMES_MAX {
            return Err(RuntimeError::CallDepthExceeded);
        }
        let base = self
            .stack
            .len()
            .checked_sub(path.arity)
            .ok_or(RuntimeError::StackUnderflow)?;
        for _ in 0..path.locals {
            self.push(Value::Bool(false))?;
        }
        self.frames.push(Frame { path, ip: 0, base });
        Ok(())
    }

    /// Abandon the current call stack and restart at `name`. Any arguments on
    /// top of the stack carry over as the target's parameters.
    fn divert(&mut self, name: &str) -> Result<(), RuntimeError> {
        let path = self
            .program
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownPath(name.to_string()))?;
        let args_start = self
            .stack
            .len()
            .checked_sub(path.arity)
            .ok_or(RuntimeError::StackUnderflow)?;
        let args = self.stack.split_off(args_start);
        self.stack = args;
        for _ in 0..path.locals {
            self.push(Value::Bool(false))?;
        }
        self.frames.clear();
        self.frames.push(Frame { path, ip: 0, base: 0 });
        Ok(())
    }

    fn binary_op(&mut self, op: Opcode) -> Result<(), RuntimeError> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;

        // String concatenation coerces the other operand to text.
        if op == Opcode::Add && (matches!(lhs, Value::Str(_)) || matches!(rhs, Value::Str(_))) {
            return self.push(Value::string(format!("{lhs}{rhs}")));
        }

        if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
            let (a, b) = (*a, *b);
            let v = match op {
                Opcode::Add => Value::Int(a.wrapping_add(b)),
                Opcode::Sub => Value::Int(a.wrapping_sub(b)),
                Opcode::Mul => Value::Int(a.wrapping_mul(b)),
                Opcode::Div => {
                    if b == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    Value::Int(a.wrapping_div(b))
                }
                Opcode::Mod => {
                    if b == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    Value::Int(a.wrapping_rem(b))
                }
                Opcode::CmpLt => Value::Bool(a < b),
                Opcode::CmpGt => Value::Bool(a > b),
                Opcode::CmpLte => Value::Bool(a <= b),
                Opcode::CmpGte => Value::Bool(a >= b),
                _ => return Err(RuntimeError::InvalidOpcode(op as u8)),
            };
            return self.push(v);
        }

        let not_a_number = |v: &Value| RuntimeError::NotANumber {
            op: op.mnemonic(),
            found: v.type_name(),
        };
        let a = lhs.as_float().ok_or_else(|| not_a_number(&lhs))?;
        let b = rhs.as_float().ok_or_else(|| not_a_number(&rhs))?;
        let v = match op {
            Opcode::Add => Value::Float(a + b),
            Opcode::Sub => Value::Float(a - b),
            Opcode::Mul => Value::Float(a * b),
            Opcode::Div => Value::Float(a / b),
            Opcode::Mod => Value::Float(a % b),
            Opcode::CmpLt => Value::Bool(a < b),
            Opcode::CmpGt => Value::Bool(a > b),
            Opcode::CmpLte => Value::Bool(a <= b),
            Opcode::CmpGte => Value::Bool(a >= b),
            _ => return Err(RuntimeError::InvalidOpcode(op as u8)),
        };
        self.push(v)
    }
}

// ============================================================================
// Bytecode decoding
// ============================================================================

fn read_byte(path: &ContentPath, ip: &mut usize) -> Result<u8, RuntimeError> {
    let byte = *path
        .code
        .get(*ip)
        .ok_or_else(|| RuntimeError::TruncatedCode(path.name.clone()))?;
    *ip += 1;
    Ok(byte)
}

fn read_op(path: &ContentPath, ip: &mut usize) -> Result<Opcode, RuntimeError> {
    let byte = read_byte(path, ip)?;
    Opcode::try_from(byte).map_err(RuntimeError::InvalidOpcode)
}

fn read_u16(path: &ContentPath, ip: &mut usize) -> Result<usize, RuntimeError> {
    let hi = read_byte(path, ip)? as usize;
    let lo = read_byte(path, ip)? as usize;
    Ok((hi << 8) | lo)
}

fn read_const(path: &ContentPath, ip: &mut usize) -> Result<Value, RuntimeError> {
    let idx = read_byte(path, ip)?;
    path.consts
        .get(idx as usize)
        .cloned()
        .ok_or(RuntimeError::BadConstant(idx))
}

fn read_name(path: &ContentPath, ip: &mut usize) -> Result<Rc<str>, RuntimeError> {
    let idx = read_byte(path, ip)?;
    match path.consts.get(idx as usize) {
        Some(Value::Str(s)) => Ok(Rc::clone(s)),
        _ => Err(RuntimeError::BadConstant(idx)),
    }
}
