//! End-to-end tests: source text through parsing, type checking and code generation

use cruxc::backend::{CodeGen, MipsCodeGen};
use cruxc::frontend::ast::Node;
use cruxc::frontend::{Lexer, Parser, TypeChecker};
use pretty_assertions::assert_eq;

fn parse(source: &str) -> (Node, Parser) {
    let mut parser = Parser::new(Lexer::new(source));
    let root = parser.parse();
    (root, parser)
}

fn type_report(source: &str) -> String {
    let (root, parser) = parse(source);
    assert!(!parser.has_error(), "{}", parser.error_report());
    let mut checker = TypeChecker::new();
    checker.check(&root);
    checker.error_report()
}

fn compile(source: &str) -> String {
    let (root, parser) = parse(source);
    assert!(!parser.has_error(), "{}", parser.error_report());
    let mut checker = TypeChecker::new();
    assert!(checker.check(&root), "{}", checker.error_report());
    let mut codegen = MipsCodeGen::new(&checker);
    assert!(codegen.generate(&root), "{}", codegen.error_report());
    codegen.program().to_asm()
}

#[test]
fn test_global_assignment_checks_clean() {
    let (root, parser) = parse("var x: int; func main(): void { let x = 1; return; }");
    assert!(!parser.has_error());
    let mut checker = TypeChecker::new();
    assert!(checker.check(&root));
    assert_eq!(checker.error_report(), "");
}

#[test]
fn test_undeclared_name_reported_once() {
    let (_, parser) = parse("func main(): void { let y = 1; return; }");
    let report = parser.error_report();
    assert_eq!(report.matches("ResolveSymbolError").count(), 1);
    assert!(report.starts_with("ResolveSymbolError(1,25)[Could not find y.]\n"));
    assert_eq!(report.matches(" y.").count(), 1);
}

#[test]
fn test_missing_return_path() {
    assert_eq!(
        type_report("func f(): int { }"),
        "TypeError(1,1)[Not all paths in function f have a return.]\n"
    );
}

#[test]
fn test_main_must_be_void() {
    assert_eq!(
        type_report("func main(): int { return 0; }"),
        "TypeError(1,1)[Function main has invalid signature.]\n"
    );
}

#[test]
fn test_two_dimensional_index_arithmetic() {
    let asm = compile("array a: int[2][3];\nfunc main(): void { ::printInt(a[0][1]); }");
    let lines: Vec<&str> = asm.lines().collect();

    let row = lines.iter().position(|l| *l == "li $t3, 12").unwrap();
    let column = lines.iter().position(|l| *l == "li $t3, 4").unwrap();
    assert!(row < column);
    assert!(lines.contains(&"cruxdata.a: .space 24"));
    assert!(lines.contains(&"la $t1, cruxdata.a"));
}

#[test]
fn test_complete_program() {
    let source = "\
// Iterative factorial
var result: int;

func fact(n: int): int {
    var acc: int;
    let acc = 1;
    while n > 1 {
        let acc = acc * n;
        let n = n - 1;
    }
    return acc;
}

func main(): void {
    let result = ::fact(::readInt());
    if (result >= 100) and not false {
        ::printInt(result);
    } else {
        ::printBool(true);
    }
    ::println();
}
";
    let asm = compile(source);
    assert!(asm.starts_with(".data"));
    assert!(asm.contains("\nfunc.fact:\n"));
    assert!(asm.contains("\nfunc.fact.epilogue:\n"));
    assert!(asm.contains("\nmain:\n"));
    assert!(asm.contains("\nmain.epilogue:\n"));
    assert!(asm.contains("jal func.fact"));
    assert!(asm.contains("jal func.readInt"));

    let builtins = asm.find("func.printBool:").unwrap();
    let program = asm.find("# BEGIN Crux Program").unwrap();
    assert!(builtins < program);
}

#[test]
fn test_parse_errors_stop_before_type_checking() {
    let (root, parser) = parse("func main(): void { ::println() }");
    assert!(parser.has_error());
    assert_eq!(
        parser.error_report(),
        "SyntaxError(1,33)[Expected SEMICOLON but got CLOSE_BRACE.]\n"
    );
    assert!(root.is_error());
}
