//! End-to-end pipeline tests: CPL source in, resolved quad program out.
//!
//! These go through `cpq_drv::compile`, so every phase and the label
//! resolver run exactly as they do in the binary.

use cpq_drv::{compile, CompileError};
use cpq_ir::Opcode;

fn program(source: &str) -> Vec<String> {
    compile(source)
        .expect("compilation should succeed")
        .iter()
        .map(|q| q.to_string())
        .collect()
}

fn diagnostics(source: &str) -> Vec<String> {
    match compile(source) {
        Err(CompileError::Diagnostics(diagnostics)) => {
            diagnostics.iter().map(|d| d.to_string()).collect()
        }
        Ok(_) => panic!("compilation unexpectedly succeeded"),
        Err(other) => panic!("unexpected failure: {other}"),
    }
}

#[test]
fn test_simple_assignment() {
    assert_eq!(
        program("int a;\n{\n  a = 3;\n}\n"),
        vec!["IASN a 3", "HALT"]
    );
}

#[test]
fn test_mixed_assignment_casts_the_result() {
    assert_eq!(
        program("int a;\nfloat b;\n{\n  b = a + 1;\n}\n"),
        vec!["IADD t0 a 1", "ITOR t1 t0", "RASN b t1", "HALT"]
    );
}

#[test]
fn test_input_output() {
    assert_eq!(
        program("int a;\n{\n  input(a);\n  output(a);\n}\n"),
        vec!["IINP a", "IPRT a", "HALT"]
    );
}

#[test]
fn test_if_else_resolves_to_indices() {
    assert_eq!(
        program("int a;\n{\n  if (a > 0) a = 1; else a = 2;\n}\n"),
        vec![
            "IGRT t0 a 0",
            "JMPZ 5 t0",
            "IASN a 1",
            "JUMP 6",
            "IASN a 2",
            "HALT",
        ]
    );
}

#[test]
fn test_while_resolves_to_indices() {
    assert_eq!(
        program("int a;\n{\n  while (a > 0) a = a - 1;\n}\n"),
        vec![
            "IGRT t0 a 0",
            "JMPZ 6 t0",
            "ISUB t1 a 1",
            "IASN a t1",
            "JUMP 1",
            "HALT",
        ]
    );
}

#[test]
fn test_switch_resolves_to_indices() {
    assert_eq!(
        program("int x;\n{\n  switch (x) {\n    case 1: output(x); break;\n    default:\n  }\n}\n"),
        vec!["IEQL t0 x 1", "JMPZ 5 t0", "IPRT x", "JUMP 5", "HALT"]
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let source = "int a, b;\n{\n  while (a > 0 && b > 0) {\n    a = a - 1;\n    b = b - a;\n  }\n}\n";
    assert_eq!(program(source), program(source));
}

#[test]
fn test_every_jump_targets_a_valid_index() {
    let quads = compile(
        "int a, b;\n{\n  while (a >= b) {\n    if (a > 1) a = a - 1; else break;\n    switch (b) { case 0: b = 1; break; case 2: b = a; default: b = 0; }\n  }\n}\n",
    )
    .expect("compilation should succeed");

    let len = quads.len();
    for quad in &quads {
        if matches!(quad.op, Opcode::Jump | Opcode::Jmpz) {
            let target: usize = quad.dest.parse().expect("numeric jump target");
            assert!(
                (1..=len).contains(&target),
                "jump target {target} out of range 1..={len}"
            );
        }
    }
}

#[test]
fn test_final_instruction_is_halt() {
    let quads = compile("int a;\n{\n  if (a > 0) a = 1; else a = 2;\n}\n")
        .expect("compilation should succeed");
    assert_eq!(quads.last().map(|q| q.op), Some(Opcode::Halt));
}

#[test]
fn test_break_outside_any_construct_is_rejected() {
    assert_eq!(
        diagnostics("int a;\n{\n  break;\n}\n"),
        vec!["Error in line 3: break outside while/switch"]
    );
}

#[test]
fn test_duplicate_case_is_rejected() {
    assert_eq!(
        diagnostics("int x;\n{\n  switch (x) {\n    case 1: x = 1;\n    case 1: x = 2;\n    default:\n  }\n}\n"),
        vec!["Error in line 5: duplicate switch case value"]
    );
}

#[test]
fn test_undefined_symbol_is_rejected() {
    assert_eq!(
        diagnostics("{\n  output(x);\n}\n"),
        vec!["Error in line 2: Undefined reference to symbol x"]
    );
}
