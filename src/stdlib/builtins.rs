//! Built-in Functions Registry
//!
//! Defines the built-in functions every Crux program can call, together
//! with the MIPS routine that implements each one. Arguments arrive on the
//! operand stack; results leave in `$v0`.

use crate::types::Type;

/// Built-in function signature and implementation
#[derive(Debug, Clone)]
pub struct BuiltinFunc {
    pub name: &'static str,
    pub params: Vec<Type>,
    pub ret_type: Type,
    /// Routine body, emitted after the `func.<name>:` label
    pub routine: &'static [&'static str],
}

impl BuiltinFunc {
    /// The function type of this builtin
    pub fn func_type(&self) -> Type {
        Type::func(self.params.clone(), self.ret_type.clone())
    }

    pub fn label(&self) -> String {
        format!("func.{}", self.name)
    }
}

/// Registry of all built-in functions, in declaration order
pub struct BuiltinRegistry {
    functions: Vec<BuiltinFunc>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            functions: Vec::new(),
        };
        registry.register_all();
        registry
    }

    fn register_all(&mut self) {
        // Input
        self.register(BuiltinFunc {
            name: "readInt",
            params: vec![],
            ret_type: Type::Int,
            routine: &[
                "la   $a0, data.intquery",
                "li   $v0, 4",
                "syscall",
                "li   $v0, 5",
                "syscall",
                "jr $ra",
            ],
        });

        self.register(BuiltinFunc {
            name: "readFloat",
            params: vec![],
            ret_type: Type::Float,
            routine: &[
                "la   $a0, data.floatquery",
                "li   $v0, 4",
                "syscall",
                "li   $v0, 6",
                "syscall",
                "mfc1 $v0, $f0",
                "jr $ra",
            ],
        });

        // Output
        self.register(BuiltinFunc {
            name: "printBool",
            params: vec![Type::Bool],
            ret_type: Type::Void,
            routine: &[
                "lw $a0, 0($sp)",
                "beqz $a0, label.printBool.loadFalse",
                "la $a0, data.trueString",
                "j label.printBool.join",
                "label.printBool.loadFalse:",
                "la $a0, data.falseString",
                "label.printBool.join:",
                "li   $v0, 4",
                "syscall",
                "jr $ra",
            ],
        });

        self.register(BuiltinFunc {
            name: "printInt",
            params: vec![Type::Int],
            ret_type: Type::Void,
            routine: &["lw   $a0, 0($sp)", "li   $v0, 1", "syscall", "jr $ra"],
        });

        self.register(BuiltinFunc {
            name: "printFloat",
            params: vec![Type::Float],
            ret_type: Type::Void,
            routine: &["l.s  $f12, 0($sp)", "li   $v0,  2", "syscall", "jr $ra"],
        });

        self.register(BuiltinFunc {
            name: "println",
            params: vec![],
            ret_type: Type::Void,
            routine: &["la   $a0, data.newline", "li   $v0, 4", "syscall", "jr $ra"],
        });
    }

    fn register(&mut self, func: BuiltinFunc) {
        self.functions.push(func);
    }

    /// All built-ins in declaration order
    pub fn all(&self) -> impl Iterator<Item = &BuiltinFunc> {
        self.functions.iter()
    }

    /// All built-ins in the order their routines are laid out in the text segment
    pub fn by_label(&self) -> Vec<&BuiltinFunc> {
        let mut funcs: Vec<_> = self.functions.iter().collect();
        funcs.sort_by_key(|f| f.name);
        funcs
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order() {
        let registry = BuiltinRegistry::new();
        let names: Vec<_> = registry.all().map(|f| f.name).collect();
        assert_eq!(
            names,
            ["readInt", "readFloat", "printBool", "printInt", "printFloat", "println"]
        );
    }

    #[test]
    fn test_signatures() {
        let registry = BuiltinRegistry::new();
        let print_int = registry.all().find(|f| f.name == "printInt").unwrap();
        assert_eq!(print_int.func_type().to_string(), "func(TypeList(int)):void");
        assert_eq!(print_int.label(), "func.printInt");
        assert!(registry.all().all(|f| f.name != "main"));
    }

    #[test]
    fn test_routines_are_laid_out_by_label() {
        let registry = BuiltinRegistry::new();
        let names: Vec<_> = registry.by_label().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            ["printBool", "printFloat", "printInt", "println", "readFloat", "readInt"]
        );
        for func in registry.all() {
            assert_eq!(func.routine.last(), Some(&"jr $ra"));
        }
    }
}
