//! Activation records
//!
//! Describes where each variable lives while code for a function is being
//! generated. Globals are labels in the data segment. Inside a function,
//! parameters sit above `$fp` (the last argument at offset 0) and locals
//! sit below the saved `$fp`/`$ra` pair.

use std::collections::HashMap;

use crate::backend::mips::program::Program;
use crate::frontend::symbol::{Symbol, SymbolId, SymbolRef};
use crate::types::Type;
use crate::utils::{Error, Result};

/// Bytes between `$fp` and the first local: the saved `$fp` and `$ra`
const SAVED_REGISTERS: usize = 8;

/// Storage size of a variable of type `ty`
pub fn num_bytes(ty: &Type) -> Result<usize> {
    ty.size_of()
        .ok_or_else(|| Error::CodeGen(format!("No size known for {}.", ty)))
}

/// Frame layout of one function
#[derive(Debug)]
pub struct FunctionFrame {
    name: String,
    parent: Box<ActivationRecord>,
    /// Bytes of locals allocated so far
    stack_size: usize,
    locals: HashMap<SymbolId, usize>,
    arguments: HashMap<SymbolId, usize>,
}

/// Where variables live
#[derive(Debug)]
pub enum ActivationRecord {
    Global,
    Function(FunctionFrame),
}

impl ActivationRecord {
    pub fn global() -> Self {
        ActivationRecord::Global
    }

    /// A fresh frame for `name`, nested in `parent`
    pub fn for_function(name: &str, parameters: &[SymbolRef], parent: ActivationRecord) -> Result<Self> {
        let mut arguments = HashMap::new();
        let mut offset = 0;
        for parameter in parameters.iter().rev() {
            arguments.insert(parameter.id(), offset);
            offset += num_bytes(&parameter.ty())?;
        }

        Ok(ActivationRecord::Function(FunctionFrame {
            name: name.to_string(),
            parent: Box::new(parent),
            stack_size: 0,
            locals: HashMap::new(),
            arguments,
        }))
    }

    /// Name of the function this record belongs to
    pub fn name(&self) -> Option<&str> {
        match self {
            ActivationRecord::Global => None,
            ActivationRecord::Function(frame) => Some(&frame.name),
        }
    }

    /// Bytes of locals in this frame
    pub fn stack_size(&self) -> usize {
        match self {
            ActivationRecord::Global => 0,
            ActivationRecord::Function(frame) => frame.stack_size,
        }
    }

    /// Leave this record, returning the enclosing one
    pub fn into_parent(self) -> ActivationRecord {
        match self {
            ActivationRecord::Global => ActivationRecord::Global,
            ActivationRecord::Function(frame) => *frame.parent,
        }
    }

    /// Allocate storage for a declared variable or array
    pub fn add(&mut self, program: &mut Program, symbol: &Symbol) -> Result<()> {
        let size = num_bytes(&symbol.ty())?;
        match self {
            ActivationRecord::Global => {
                program.append_data(format!("{}: .space {}", mangle(symbol.name()), size));
            }
            ActivationRecord::Function(frame) => {
                frame.stack_size += size;
                frame
                    .locals
                    .insert(symbol.id(), frame.stack_size + SAVED_REGISTERS);
                log::trace!(
                    "{}: local {} at -{}($fp)",
                    frame.name,
                    symbol.name(),
                    frame.stack_size + SAVED_REGISTERS
                );
            }
        }
        Ok(())
    }

    /// Emit code loading the address of `symbol` into `reg`
    pub fn get_address(&self, program: &mut Program, reg: &str, symbol: &Symbol) {
        match self {
            ActivationRecord::Global => {
                program.append_instruction(format!("la {}, {}", reg, mangle(symbol.name())));
            }
            ActivationRecord::Function(frame) => {
                if let Some(offset) = frame.arguments.get(&symbol.id()) {
                    program.append_instruction(format!("addi {}, $fp, {}", reg, offset));
                } else if let Some(offset) = frame.locals.get(&symbol.id()) {
                    program.append_instruction(format!("addi {}, $fp, -{}", reg, offset));
                } else {
                    frame.parent.get_address(program, reg, symbol);
                }
            }
        }
    }
}

fn mangle(name: &str) -> String {
    format!("cruxdata.{}", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::symbol::SymbolTable;

    fn symbol(table: &mut SymbolTable, name: &str, ty: Type) -> SymbolRef {
        let symbol = table.declare(name).unwrap();
        symbol.set_type(ty);
        symbol
    }

    #[test]
    fn test_globals_live_in_data_segment() {
        let mut table = SymbolTable::new();
        let x = symbol(&mut table, "x", Type::Int);
        let a = symbol(&mut table, "a", Type::array(2, Type::array(3, Type::Float)));

        let mut program = Program::new();
        let mut global = ActivationRecord::global();
        global.add(&mut program, &x).unwrap();
        global.add(&mut program, &a).unwrap();
        assert_eq!(program.data(), ["cruxdata.x: .space 4", "cruxdata.a: .space 24"]);

        global.get_address(&mut program, "$t1", &a);
        assert_eq!(program.code(), ["la $t1, cruxdata.a"]);
    }

    #[test]
    fn test_frame_layout() {
        let mut table = SymbolTable::new();
        let g = symbol(&mut table, "g", Type::Int);
        table.push_scope();
        let p = symbol(&mut table, "p", Type::Int);
        let q = symbol(&mut table, "q", Type::Float);
        let local = symbol(&mut table, "l", Type::Bool);
        let arr = symbol(&mut table, "arr", Type::array(3, Type::Int));

        let mut program = Program::new();
        let mut frame =
            ActivationRecord::for_function("f", &[p.clone(), q.clone()], ActivationRecord::global())
                .unwrap();
        frame.add(&mut program, &local).unwrap();
        frame.add(&mut program, &arr).unwrap();
        assert_eq!(frame.stack_size(), 16);
        assert_eq!(frame.name(), Some("f"));

        for sym in [&p, &q, &local, &arr, &g] {
            frame.get_address(&mut program, "$t1", sym);
        }
        assert_eq!(
            program.code(),
            [
                "addi $t1, $fp, 4",
                "addi $t1, $fp, 0",
                "addi $t1, $fp, -12",
                "addi $t1, $fp, -24",
                "la $t1, cruxdata.g",
            ]
        );
        assert!(matches!(frame.into_parent(), ActivationRecord::Global));
    }

    #[test]
    fn test_void_has_no_size() {
        let err = num_bytes(&Type::Void).unwrap_err();
        assert_eq!(err.to_string(), "No size known for void.");
    }
}
