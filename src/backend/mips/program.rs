//! MIPS program buffer
//!
//! Collects the code and data segments as text lines and lays them out,
//! together with the built-in routines, as one assembly file.

use std::io::{self, Write};

use crate::stdlib::BuiltinRegistry;

/// An assembly program under construction
#[derive(Debug, Default)]
pub struct Program {
    code: Vec<String>,
    data: Vec<String>,
    label_counter: usize,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// A label not used anywhere else in the program
    pub fn new_label(&mut self) -> String {
        let label = format!("label.{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    /// The label a function's code starts at
    pub fn func_label(name: &str) -> String {
        if name == "main" {
            "main".to_string()
        } else {
            format!("func.{}", name)
        }
    }

    /// Append an instruction, returning its index in the code segment
    pub fn append_instruction(&mut self, instr: impl Into<String>) -> usize {
        self.code.push(instr.into());
        self.code.len() - 1
    }

    /// Insert instructions at `pos`, shifting everything after it down
    pub fn insert_instructions<I>(&mut self, pos: usize, instrs: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.code.splice(pos..pos, instrs);
    }

    pub fn append_data(&mut self, data: impl Into<String>) {
        self.data.push(data.into());
    }

    pub fn code(&self) -> &[String] {
        &self.code
    }

    pub fn data(&self) -> &[String] {
        &self.data
    }

    // ==================== Operand Stack ====================

    pub fn push_int(&mut self, reg: &str) {
        self.append_instruction("subu $sp, $sp, 4");
        self.append_instruction(format!("sw {}, 0($sp)", reg));
    }

    pub fn push_float(&mut self, reg: &str) {
        self.append_instruction("subu $sp, $sp, 4");
        self.append_instruction(format!("s.s {}, 0($sp)", reg));
    }

    pub fn pop_int(&mut self, reg: &str) {
        self.append_instruction(format!("lw {}, 0($sp)", reg));
        self.append_instruction("addi $sp, $sp, 4");
    }

    pub fn pop_float(&mut self, reg: &str) {
        self.append_instruction(format!("l.s {}, 0($sp)", reg));
        self.append_instruction("addi $sp, $sp, 4");
    }

    // ==================== Frames ====================

    /// Insert a function prologue at `pos`, reserving `frame_size` bytes of locals
    pub fn insert_prologue(&mut self, pos: usize, frame_size: usize) {
        let prologue = [
            "subu $sp, $sp, 8".to_string(),
            "sw   $fp, 0($sp)".to_string(),
            "sw   $ra, 4($sp)".to_string(),
            "addi $fp, $sp, 8".to_string(),
            format!("subu $sp, $sp, {}", frame_size),
        ];
        self.insert_instructions(pos, prologue);
    }

    /// Release the frame and restore the caller's `$fp` and `$ra`
    pub fn append_epilogue(&mut self, frame_size: usize) {
        self.append_instruction(format!("addu $sp, $sp, {}", frame_size));
        self.append_instruction("lw   $ra, 4($sp)");
        self.append_instruction("lw   $fp, 0($sp)");
        self.append_instruction("addu $sp, $sp, 8");
    }

    pub fn append_return(&mut self) {
        self.append_instruction("jr   $ra");
    }

    /// Terminate the program
    pub fn append_exit_sequence(&mut self) {
        self.append_instruction("li    $v0, 10");
        self.append_instruction("syscall");
    }

    // ==================== Output ====================

    /// Write the complete assembly file
    pub fn print(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, ".data                         # BEGIN Data Segment")?;
        for data in &self.data {
            writeln!(out, "{}", data)?;
        }
        writeln!(out, "data.newline:      .asciiz       \"\\n\"")?;
        writeln!(out, "data.floatquery:   .asciiz       \"float?\"")?;
        writeln!(out, "data.intquery:     .asciiz       \"int?\"")?;
        writeln!(out, "data.trueString:   .asciiz       \"true\"")?;
        writeln!(out, "data.falseString:  .asciiz       \"false\"")?;
        writeln!(out, "                              # END Data Segment")?;

        writeln!(out, ".text                         # BEGIN Code Segment")?;
        for builtin in BuiltinRegistry::new().by_label() {
            writeln!(out, "{}:", builtin.label())?;
            for line in builtin.routine {
                writeln!(out, "{}", line)?;
            }
        }

        writeln!(out, ".text                         # BEGIN Crux Program")?;
        for code in &self.code {
            writeln!(out, "{}", code)?;
        }
        writeln!(out, "                              # END Code Segment")
    }

    /// The complete assembly file as a string
    pub fn to_asm(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.print(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
