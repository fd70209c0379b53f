//! Compiled content paths.
//!
//! A story compiles to a table of named content paths, one per knot, stitch,
//! and function, plus a synthetic [`DEFAULT_PATH`] holding file-level
//! content. Each path owns its bytecode and constant pool.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::runtime::opcode::Opcode;
use crate::runtime::value::Value;

/// Name of the synthetic path holding file-level content; execution starts
/// here.
pub const DEFAULT_PATH: &str = "@main";

/// One compiled knot, stitch, or function body.
#[derive(Debug)]
pub struct ContentPath {
    /// Fully qualified name, e.g. `hike.summit`.
    pub name: String,
    /// Number of declared parameters; arguments occupy the first stack slots.
    pub arity: usize,
    /// Number of local slots past the parameters.
    pub locals: usize,
    pub code: Vec<u8>,
    pub consts: Vec<Value>,
}

/// A fully compiled story: content paths keyed by qualified name.
#[derive(Debug, Default)]
pub struct Program {
    pub paths: BTreeMap<String, Rc<ContentPath>>,
}

impl Program {
    pub fn get(&self, name: &str) -> Option<&Rc<ContentPath>> {
        self.paths.get(name)
    }

    /// Render every path's bytecode as human-readable assembly.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for path in self.paths.values() {
            let _ = writeln!(
                out,
                "=== {}(args: {}, locals: {}) ===",
                path.name, path.arity, path.locals
            );
            let mut offset = 0;
            while offset < path.code.len() {
                offset = disassemble_inst(&mut out, path, offset);
            }
        }
        out
    }
}

fn disassemble_inst(out: &mut String, path: &ContentPath, offset: usize) -> usize {
    let _ = write!(out, "{offset:04} ");
    let Ok(op) = Opcode::try_from(path.code[offset]) else {
        let _ = writeln!(out, "unknown opcode 0x{:02x}", path.code[offset]);
        return offset + 1;
    };
    match op {
        Opcode::Const => {
            let Some(&arg) = path.code.get(offset + 1) else {
                return truncated(out, path, op);
            };
            let _ = write!(out, "{} 0x{arg:02x}", op.mnemonic());
            match path.consts.get(arg as usize) {
                Some(Value::Str(s)) => {
                    let _ = writeln!(out, " '{s}'");
                }
                Some(v) => {
                    let _ = writeln!(out, " ({v})");
                }
                None => {
                    let _ = writeln!(out);
                }
            }
            offset + 2
        }
        Opcode::Call | Opcode::Divert | Opcode::LoadGlobal | Opcode::StoreGlobal => {
            let Some(&arg) = path.code.get(offset + 1) else {
                return truncated(out, path, op);
            };
            let _ = write!(out, "{} 0x{arg:02x}", op.mnemonic());
            if let Some(Value::Str(s)) = path.consts.get(arg as usize) {
                let _ = writeln!(out, " '{s}'");
            } else {
                let _ = writeln!(out);
            }
            offset + 2
        }
        Opcode::Load | Opcode::Store => {
            let Some(&arg) = path.code.get(offset + 1) else {
                return truncated(out, path, op);
            };
            let _ = writeln!(out, "{} 0x{arg:02x}", op.mnemonic());
            offset + 2
        }
        Opcode::Jmp | Opcode::JmpT | Opcode::JmpF => {
            let (Some(&hi), Some(&lo)) = (path.code.get(offset + 1), path.code.get(offset + 2))
            else {
                return truncated(out, path, op);
            };
            let jump = ((hi as usize) << 8) | lo as usize;
            let target = offset + 3 + jump;
            let _ = writeln!(out, "{} 0x{jump:04x} ({offset} -> {target})", op.mnemonic());
            offset + 3
        }
        _ => {
            let _ = writeln!(out, "{}", op.mnemonic());
            offset + 1
        }
    }
}

/// Operand bytes run past the end of the code. Note it and stop.
fn truncated(out: &mut String, path: &ContentPath, op: Opcode) -> usize {
    let _ = writeln!(out, "{} <truncated>", op.mnemonic());
    path.code.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_with(name: &str, code: Vec<u8>, consts: Vec<Value>) -> Program {
        let mut program = Program::default();
        program.paths.insert(
            name.to_string(),
            Rc::new(ContentPath {
                name: name.to_string(),
                arity: 0,
                locals: 0,
                code,
                consts,
            }),
        );
        program
    }

    #[test]
    fn disassembles_operands_and_jump_targets() {
        let code = vec![
            Opcode::Const as u8,
            0,
            Opcode::JmpF as u8,
            0,
            1,
            Opcode::Exit as u8,
        ];
        let program = program_with("demo", code, vec![Value::string("hi")]);
        let asm = program.disassemble();
        assert!(asm.contains("=== demo(args: 0, locals: 0) ==="));
        assert!(asm.contains("const 0x00 'hi'"));
        assert!(asm.contains("jmp_f 0x0001 (2 -> 6)"));
    }

    #[test]
    fn truncated_operands_do_not_panic() {
        // Hand-built paths can end mid-instruction; the disassembler notes
        // it instead of indexing past the code.
        for code in [
            vec![Opcode::Const as u8],
            vec![Opcode::Load as u8],
            vec![Opcode::Divert as u8],
            vec![Opcode::Jmp as u8, 0],
        ] {
            let program = program_with("cut", code, Vec::new());
            let asm = program.disassemble();
            assert!(asm.contains("<truncated>"), "missing note in: {asm}");
        }
    }
}
