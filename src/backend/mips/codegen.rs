//! MIPS code generator
//!
//! Walks a type-checked tree and emits stack-machine code into a
//! [`Program`]. Operands are pushed left to right; an operator pops its
//! right operand first. Function prologues are inserted once the body has
//! been generated and the frame size is known.

use crate::backend::codegen::CodeGen;
use crate::backend::mips::activation::{num_bytes, ActivationRecord};
use crate::backend::mips::program::Program;
use crate::frontend::ast::*;
use crate::frontend::semantic::TypeChecker;
use crate::frontend::symbol::SymbolRef;
use crate::types::{Type, WORD_SIZE};
use crate::utils::{Error, Result};

/// MIPS code generator
pub struct MipsCodeGen<'a> {
    checker: &'a TypeChecker,
    program: Program,
    frame: ActivationRecord,
    errors: Vec<String>,
}

impl<'a> MipsCodeGen<'a> {
    /// A generator reading node types from `checker`
    pub fn new(checker: &'a TypeChecker) -> Self {
        Self {
            checker,
            program: Program::new(),
            frame: ActivationRecord::global(),
            errors: Vec::new(),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn into_program(self) -> Program {
        self.program
    }

    fn type_of(&self, node: &Node) -> Result<&Type> {
        self.checker
            .type_of(node)
            .ok_or_else(|| Error::CodeGen(format!("No type recorded for {}.", node)))
    }

    fn is_float(&self, node: &Node) -> Result<bool> {
        Ok(self.type_of(node)?.is_float())
    }

    fn epilogue_label(&self) -> String {
        let name = self.frame.name().unwrap_or("main");
        format!("{}.epilogue", Program::func_label(name))
    }

    // ==================== Dispatch ====================

    fn visit(&mut self, node: &Node) -> Result<()> {
        let traced = !matches!(
            node.kind,
            NodeKind::VariableDeclaration(_) | NodeKind::ArrayDeclaration(_)
        );
        if traced {
            self.program
                .append_instruction(format!("{:>24} {}", "#begin", node));
        }

        match &node.kind {
            NodeKind::LiteralInt(value) => {
                self.program.append_instruction(format!("li $t1, {}", value));
                self.program.push_int("$t1");
            }
            NodeKind::LiteralFloat(value) => {
                self.program
                    .append_instruction(format!("li.s $f0, {}", float_literal(*value)));
                self.program.push_float("$f0");
            }
            NodeKind::LiteralBool(value) => {
                self.program
                    .append_instruction(format!("li $t1, {}", u8::from(*value)));
                self.program.push_int("$t1");
            }
            NodeKind::AddressOf(symbol) => {
                self.frame.get_address(&mut self.program, "$t1", symbol);
                self.program.push_int("$t1");
            }
            NodeKind::Dereference(address) => {
                self.visit(address)?;
                self.program.pop_int("$t1");
                if self.is_float(node)? {
                    self.program.append_instruction("l.s $f0, 0($t1)");
                    self.program.push_float("$f0");
                } else {
                    self.program.append_instruction("lw $t1, 0($t1)");
                    self.program.push_int("$t1");
                }
            }
            NodeKind::Index { base, amount } => self.visit_index(node, base, amount)?,
            NodeKind::Binary { op, left, right } => self.visit_binary(node, *op, left, right)?,
            NodeKind::Comparison { op, left, right } => self.visit_comparison(*op, left, right)?,
            NodeKind::LogicalNot(inner) => {
                self.visit(inner)?;
                self.program.pop_int("$t0");
                self.program.append_instruction("xori $t0, $t0, 1");
                self.program.push_int("$t0");
            }
            NodeKind::Call { function, arguments } => self.visit_call(function, arguments)?,
            NodeKind::Assignment {
                destination,
                source,
            } => {
                self.visit(destination)?;
                self.visit(source)?;
                if self.is_float(source)? {
                    self.program.pop_float("$f0");
                    self.program.pop_int("$t2");
                    self.program.append_instruction("s.s $f0, 0($t2)");
                } else {
                    self.program.pop_int("$t1");
                    self.program.pop_int("$t2");
                    self.program.append_instruction("sw $t1, 0($t2)");
                }
            }
            NodeKind::VariableDeclaration(symbol) | NodeKind::ArrayDeclaration(symbol) => {
                self.frame.add(&mut self.program, symbol)?;
            }
            NodeKind::FunctionDefinition {
                function,
                parameters,
                body,
            } => self.visit_function(function, parameters, body)?,
            NodeKind::IfElseBranch {
                condition,
                then_block,
                else_block,
            } => {
                let else_label = self.program.new_label();
                let exit_label = self.program.new_label();

                self.visit(condition)?;
                self.program.pop_int("$t0");
                self.program
                    .append_instruction(format!("beqz $t0, {}", else_label));
                self.visit(then_block)?;
                self.program.append_instruction(format!("j {}", exit_label));
                self.program.append_instruction(format!("{}:", else_label));
                self.visit(else_block)?;
                self.program.append_instruction(format!("{}:", exit_label));
            }
            NodeKind::WhileLoop { condition, body } => {
                let loop_label = self.program.new_label();
                let exit_label = self.program.new_label();

                self.program.append_instruction(format!("{}:", loop_label));
                self.visit(condition)?;
                self.program.pop_int("$t0");
                self.program
                    .append_instruction(format!("beqz $t0, {}", exit_label));
                self.visit(body)?;
                self.program.append_instruction(format!("j {}", loop_label));
                self.program.append_instruction(format!("{}:", exit_label));
            }
            NodeKind::Return(value) => {
                if let Some(value) = value {
                    self.visit(value)?;
                    // Floats travel in $v0 as raw bits
                    self.program.pop_int("$v0");
                }
                let label = self.epilogue_label();
                self.program.append_instruction(format!("j {}", label));
            }
            NodeKind::StatementList(statements) => {
                for statement in statements {
                    self.visit(statement)?;
                    // A call statement discards its result
                    if matches!(statement.kind, NodeKind::Call { .. })
                        && !self.type_of(statement)?.is_void()
                    {
                        self.program.pop_int("$t1");
                    }
                }
            }
            NodeKind::ExpressionList(items) | NodeKind::DeclarationList(items) => {
                for item in items {
                    self.visit(item)?;
                }
            }
            NodeKind::Error(_) => {
                return Err(Error::CodeGen(format!("CodeGen cannot compile a {}.", node)));
            }
        }

        if traced {
            self.program
                .append_instruction(format!("{:>24} {}", "#end", node));
        }
        Ok(())
    }

    fn visit_index(&mut self, node: &Node, base: &Node, amount: &Node) -> Result<()> {
        self.visit(base)?;
        self.visit(amount)?;

        let element = match self.type_of(node)? {
            Type::Address(element) => num_bytes(element)?,
            other => return Err(Error::CodeGen(format!("Cannot index into {}.", other))),
        };
        self.program.pop_int("$t2");
        self.program.pop_int("$t1");
        self.program
            .append_instruction(format!("li $t3, {}", element));
        self.program.append_instruction("mul $t2, $t2, $t3");
        self.program.append_instruction("add $t1, $t1, $t2");
        self.program.push_int("$t1");
        Ok(())
    }

    fn visit_binary(&mut self, node: &Node, op: BinaryOp, left: &Node, right: &Node) -> Result<()> {
        self.visit(left)?;
        self.visit(right)?;

        if self.is_float(node)? {
            let instr = match op {
                BinaryOp::Add => "add.s",
                BinaryOp::Sub => "sub.s",
                BinaryOp::Mul => "mul.s",
                BinaryOp::Div => "div.s",
                BinaryOp::And | BinaryOp::Or => {
                    return Err(Error::CodeGen(format!("No float form of {}.", node)))
                }
            };
            self.program.pop_float("$f1");
            self.program.pop_float("$f0");
            self.program
                .append_instruction(format!("{} $f0, $f0, $f1", instr));
            self.program.push_float("$f0");
        } else {
            let instr = match op {
                BinaryOp::Add => "add",
                BinaryOp::Sub => "sub",
                BinaryOp::Mul => "mul",
                BinaryOp::Div => "div",
                BinaryOp::And => "and",
                BinaryOp::Or => "or",
            };
            self.program.pop_int("$t1");
            self.program.pop_int("$t0");
            self.program
                .append_instruction(format!("{} $t0, $t0, $t1", instr));
            self.program.push_int("$t0");
        }
        Ok(())
    }

    fn visit_comparison(&mut self, op: CompareOp, left: &Node, right: &Node) -> Result<()> {
        self.visit(left)?;
        self.visit(right)?;

        let true_label = self.program.new_label();
        let false_label = self.program.new_label();
        let join_label = self.program.new_label();

        if self.is_float(left)? {
            self.program.pop_float("$f1");
            self.program.pop_float("$f0");
            // Only eq, lt and le exist; gt and ge swap operands, ne branches on false
            let (test, branch) = match op {
                CompareOp::Eq => ("c.eq.s $f0, $f1", "bc1t"),
                CompareOp::Ne => ("c.eq.s $f0, $f1", "bc1f"),
                CompareOp::Lt => ("c.lt.s $f0, $f1", "bc1t"),
                CompareOp::Le => ("c.le.s $f0, $f1", "bc1t"),
                CompareOp::Gt => ("c.lt.s $f1, $f0", "bc1t"),
                CompareOp::Ge => ("c.le.s $f1, $f0", "bc1t"),
            };
            self.program.append_instruction(test);
            self.program
                .append_instruction(format!("{} {}", branch, true_label));
        } else {
            self.program.pop_int("$t1");
            self.program.pop_int("$t0");
            let branch = match op {
                CompareOp::Eq => "beq",
                CompareOp::Ne => "bne",
                CompareOp::Lt => "blt",
                CompareOp::Le => "ble",
                CompareOp::Gt => "bgt",
                CompareOp::Ge => "bge",
            };
            self.program
                .append_instruction(format!("{} $t0, $t1, {}", branch, true_label));
        }

        self.program.append_instruction(format!("j {}", false_label));
        self.program.append_instruction(format!("{}:", true_label));
        self.program.append_instruction("li $t0, 1");
        self.program.append_instruction(format!("j {}", join_label));
        self.program.append_instruction(format!("{}:", false_label));
        self.program.append_instruction("li $t0, 0");
        self.program.append_instruction(format!("{}:", join_label));
        self.program.push_int("$t0");
        Ok(())
    }

    fn visit_call(&mut self, function: &SymbolRef, arguments: &Node) -> Result<()> {
        self.visit(arguments)?;

        let count = arguments.children().len();
        self.program
            .append_instruction(format!("jal {}", Program::func_label(function.name())));
        if count > 0 {
            self.program
                .append_instruction(format!("addi $sp, $sp, {}", count * WORD_SIZE));
        }

        let returns = match function.ty() {
            Type::Func { ret, .. } => !ret.is_void(),
            _ => false,
        };
        if returns {
            self.program.push_int("$v0");
        }
        Ok(())
    }

    fn visit_function(&mut self, function: &SymbolRef, parameters: &[SymbolRef], body: &Node) -> Result<()> {
        let name = function.name();
        let parent = std::mem::replace(&mut self.frame, ActivationRecord::global());
        self.frame = ActivationRecord::for_function(name, parameters, parent)?;

        let label = Program::func_label(name);
        let pos = self.program.append_instruction(format!("{}:", label));
        self.visit(body)?;

        let frame_size = self.frame.stack_size();
        log::debug!("function {} uses a {} byte frame", name, frame_size);
        self.program.insert_prologue(pos + 1, frame_size);

        self.program
            .append_instruction(format!("{}.epilogue:", label));
        self.program.append_epilogue(frame_size);
        if name == "main" {
            self.program.append_exit_sequence();
        } else {
            self.program.append_return();
        }

        let frame = std::mem::replace(&mut self.frame, ActivationRecord::global());
        self.frame = frame.into_parent();
        Ok(())
    }
}

/// Fixed-point spelling of a float immediate, always with a decimal point
fn float_literal(value: f32) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

impl CodeGen for MipsCodeGen<'_> {
    fn generate(&mut self, root: &Node) -> bool {
        self.frame = ActivationRecord::global();
        match self.visit(root) {
            Ok(()) => !self.has_error(),
            Err(err) => {
                log::debug!("code generation aborted: {}", err);
                self.errors.push(err.to_string());
                false
            }
        }
    }

    fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    fn error_report(&self) -> String {
        self.errors.concat()
    }

    fn name(&self) -> &str {
        "mips"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;

    /// Parse, check and generate, returning the code segment
    fn generate(source: &str) -> Vec<String> {
        let mut parser = Parser::from_source(source);
        let root = parser.parse();
        assert!(!parser.has_error(), "{}", parser.error_report());
        let mut checker = TypeChecker::new();
        assert!(checker.check(&root), "{}", checker.error_report());

        let mut codegen = MipsCodeGen::new(&checker);
        assert!(codegen.generate(&root), "{}", codegen.error_report());
        codegen
            .into_program()
            .code()
            .iter()
            .filter(|line| !line.trim_start().starts_with('#'))
            .cloned()
            .collect()
    }

    fn position(code: &[String], line: &str) -> usize {
        code.iter()
            .position(|l| l == line)
            .unwrap_or_else(|| panic!("missing {:?} in {:#?}", line, code))
    }

    #[test]
    fn test_row_major_indexing() {
        let code = generate(
            "array a: int[2][3];\nfunc main(): void { ::printInt(a[0][1]); }",
        );
        let outer = position(&code, "li $t3, 12");
        let inner = position(&code, "li $t3, 4");
        assert!(outer < inner);
        assert_eq!(code[outer + 1], "mul $t2, $t2, $t3");
        assert_eq!(code[outer + 2], "add $t1, $t1, $t2");
    }

    #[test]
    fn test_main_frame() {
        let code = generate("func main(): void { var x: int; array y: float[2]; let x = 3; }");
        assert_eq!(
            &code[..6],
            [
                "main:",
                "subu $sp, $sp, 8",
                "sw   $fp, 0($sp)",
                "sw   $ra, 4($sp)",
                "addi $fp, $sp, 8",
                "subu $sp, $sp, 12",
            ]
        );
        assert!(code.contains(&"addi $t1, $fp, -12".to_string()));
        assert_eq!(
            &code[code.len() - 7..],
            [
                "main.epilogue:",
                "addu $sp, $sp, 12",
                "lw   $ra, 4($sp)",
                "lw   $fp, 0($sp)",
                "addu $sp, $sp, 8",
                "li    $v0, 10",
                "syscall",
            ]
        );
    }

    #[test]
    fn test_function_call_convention() {
        let code = generate(
            "func add(a: int, b: int): int { return a + b; }\n\
             func main(): void { ::printInt(::add(1, 2)); }",
        );
        assert!(code.contains(&"addi $t1, $fp, 4".to_string()));
        assert!(code.contains(&"addi $t1, $fp, 0".to_string()));

        let ret = position(&code, "j func.add.epilogue");
        assert_eq!(code[ret - 2], "lw $v0, 0($sp)");
        let epilogue = position(&code, "func.add.epilogue:");
        assert_eq!(code[epilogue + 5], "jr   $ra");

        let call = position(&code, "jal func.add");
        assert_eq!(code[call + 1], "addi $sp, $sp, 8");
        assert_eq!(code[call + 2], "subu $sp, $sp, 4");
        assert_eq!(code[call + 3], "sw $v0, 0($sp)");
        let print = position(&code, "jal func.printInt");
        assert_eq!(code[print + 1], "addi $sp, $sp, 4");
    }

    #[test]
    fn test_call_statement_discards_result() {
        let code = generate("func main(): void { ::readInt(); ::println(); }");
        let read = position(&code, "jal func.readInt");
        assert_eq!(code[read + 1], "subu $sp, $sp, 4");
        assert_eq!(code[read + 2], "sw $v0, 0($sp)");
        assert_eq!(code[read + 3], "lw $t1, 0($sp)");
        assert_eq!(code[read + 4], "addi $sp, $sp, 4");
        let newline = position(&code, "jal func.println");
        assert_eq!(code[newline + 1], "main.epilogue:");
    }

    #[test]
    fn test_comparison_normalises_to_bool() {
        let code = generate("func main(): void { ::printBool(1.5 >= 2.5); }");
        let test = position(&code, "c.le.s $f1, $f0");
        assert_eq!(
            &code[test + 1..test + 8],
            [
                "bc1t label.0",
                "j label.1",
                "label.0:",
                "li $t0, 1",
                "j label.2",
                "label.1:",
                "li $t0, 0",
            ]
        );
        assert_eq!(code[test + 8], "label.2:");
    }

    #[test]
    fn test_control_flow_labels() {
        let code = generate(
            "var i: int;\n\
             func main(): void { while ::readInt() < 3 { if true { ::println(); } } }",
        );
        let top = position(&code, "label.0:");
        assert!(code.contains(&"beqz $t0, label.1".to_string()));
        assert!(code.contains(&"j label.0".to_string()));
        assert!(position(&code, "label.1:") > top);
        assert!(code.contains(&"beqz $t0, label.5".to_string()));
        assert!(code.contains(&"j label.6".to_string()));
    }

    #[test]
    fn test_globals_and_floats() {
        let mut parser = Parser::from_source(
            "var f: float;\nfunc main(): void { let f = 1.5 * 2.0; ::printFloat(f); }",
        );
        let root = parser.parse();
        let mut checker = TypeChecker::new();
        assert!(checker.check(&root));
        let mut codegen = MipsCodeGen::new(&checker);
        assert!(codegen.generate(&root));

        let program = codegen.program();
        assert_eq!(program.data(), ["cruxdata.f: .space 4"]);
        let code = program.code();
        assert!(code.contains(&"la $t1, cruxdata.f".to_string()));
        assert!(code.contains(&"li.s $f0, 1.5".to_string()));
        assert!(code.contains(&"mul.s $f0, $f0, $f1".to_string()));
        assert!(code.contains(&"s.s $f0, 0($t2)".to_string()));
        assert!(code.contains(&"l.s $f0, 0($t1)".to_string()));
    }

    #[test]
    fn test_local_array_index() {
        let code = generate("func main(): void { array a: int[3]; let a[2] = 7; }");
        assert_eq!(code[5], "subu $sp, $sp, 12");

        let base = position(&code, "addi $t1, $fp, -20");
        let scale = position(&code, "li $t3, 4");
        assert!(base < scale);
        assert_eq!(code[scale + 1], "mul $t2, $t2, $t3");
        assert_eq!(code[scale + 2], "add $t1, $t1, $t2");
        assert!(code.contains(&"sw $t1, 0($t2)".to_string()));
    }

    #[test]
    fn test_float_comparisons() {
        let code = generate(
            "func main(): void {\n\
             ::printBool(1.0 != 2.0);\n\
             ::printBool(1.0 < 2.0);\n\
             ::printBool(1.0 == 2.0);\n\
             }",
        );
        assert!(code.windows(2).any(|w| w == ["c.eq.s $f0, $f1", "bc1f label.0"]));
        assert!(code.windows(2).any(|w| w == ["c.lt.s $f0, $f1", "bc1t label.3"]));
        assert!(code.windows(2).any(|w| w == ["c.eq.s $f0, $f1", "bc1t label.6"]));
    }

    #[test]
    fn test_float_result_travels_through_v0() {
        let code = generate(
            "func half(x: float): float { return x / 2.0; }\n\
             func main(): void { ::printFloat(::half(3.0)); }",
        );
        let param = position(&code, "addi $t1, $fp, 0");
        assert_eq!(code[param + 3], "lw $t1, 0($sp)");
        assert!(code.contains(&"l.s $f0, 0($t1)".to_string()));
        assert!(code.contains(&"div.s $f0, $f0, $f1".to_string()));

        let ret = position(&code, "j func.half.epilogue");
        assert_eq!(code[ret - 2], "lw $v0, 0($sp)");

        let call = position(&code, "jal func.half");
        assert_eq!(
            &code[call + 1..call + 4],
            ["addi $sp, $sp, 4", "subu $sp, $sp, 4", "sw $v0, 0($sp)"]
        );
        assert_eq!(code[call + 4], "jal func.printFloat");
    }

    #[test]
    fn test_float_immediates_never_use_exponents() {
        assert_eq!(float_literal(1.5), "1.5");
        assert_eq!(float_literal(2.0), "2.0");
        assert_eq!(float_literal(1e20), "100000000000000000000.0");
        assert_eq!(float_literal(1e-7), "0.0000001");
    }

    #[test]
    fn test_error_node_aborts() {
        let mut parser = Parser::from_source("var x: int");
        let root = parser.parse();
        let checker = TypeChecker::new();
        let mut codegen = MipsCodeGen::new(&checker);
        assert!(!codegen.generate(&root));
        assert!(codegen.has_error());
        assert_eq!(codegen.error_report(), "CodeGen cannot compile a Error[1,11].");
        assert_eq!(codegen.name(), "mips");
    }
}
