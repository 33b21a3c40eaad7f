//! Directive handling: definitions, conditionals, expansion discipline and
//! error recovery.

mod common;

use common::{bf_payload, compile, compile_err, compile_ok};

#[test]
fn function_like_macro_substitutes_arguments() {
    let output = compile_ok("#define TWICE(n)\n+n +n\n#end\nTWICE(3)");
    assert_eq!(bf_payload(&output), "++++++");
}

#[test]
fn macro_arguments_balance_nested_parens() {
    // the comma inside the nested parens belongs to the argument
    let output = compile_ok("#define PICK(x, y)\n+x -y\n#end\nPICK((1+2), 1)");
    assert_eq!(bf_payload(&output), "+++-");
}

#[test]
fn parenthesised_count_continues_with_operators() {
    // operators scanned inside the call parens extend the expression
    let output = compile_ok("#define EMIT(n)\n+n\n#end\nEMIT((1+2)*2)");
    assert_eq!(bf_payload(&output), "++++++");
}

#[test]
fn multi_line_object_macro() {
    let output = compile_ok("#define BUMP\n+ +\n#end\nBUMP BUMP");
    assert_eq!(bf_payload(&output), "++++");
}

#[test]
fn empty_argument_list_arity_mismatch() {
    let (_, messages) = compile_err("#define ONE(a)\n+a\n#end\nONE()");
    assert!(
        messages.iter().any(|m| m.contains("expects 1 argument")),
        "{messages:?}"
    );
}

#[test]
fn missing_paren_after_function_like_name() {
    let (_, messages) = compile_err("#define ONE(a)\n+a\n#end\nONE");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("expected '(' after macro name 'ONE'")),
        "{messages:?}"
    );
}

#[test]
fn argument_list_must_not_cross_lines() {
    let (_, messages) = compile_err("#define ONE(a)\n+a\n#end\nONE(1\n)");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("unterminated macro argument list")),
        "{messages:?}"
    );
}

#[test]
fn self_referential_macro_reports_and_terminates() {
    let (_, messages) = compile_err("#define LOOP\nLOOP\n#end\nLOOP");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("macro 'LOOP' expands to itself")),
        "{messages:?}"
    );
}

#[test]
fn mutually_recursive_macros_report() {
    let (_, messages) = compile_err("#define A\nB\n#end\n#define B\nA\n#end\nA");
    assert!(
        messages.iter().any(|m| m.contains("expands to itself")),
        "{messages:?}"
    );
}

#[test]
fn undef_removes_macro() {
    let (_, messages) = compile_err("#define X 1\n#undef X\n+X");
    assert!(
        messages.iter().any(|m| m.contains("'X' is not defined")),
        "{messages:?}"
    );
}

#[test]
fn reserved_names_cannot_be_defined_or_undefined() {
    let (_, messages) = compile_err("#define set8 1");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("cannot define macro 'set8'")),
        "{messages:?}"
    );

    let (_, messages) = compile_err("#undef include");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("cannot undefine reserved name 'include'")),
        "{messages:?}"
    );
}

#[test]
fn duplicate_parameter_names_report() {
    let (_, messages) = compile_err("#define F(a, a)\n+a\n#end");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("duplicate parameter name 'a'")),
        "{messages:?}"
    );
}

#[test]
fn directive_inside_macro_body_reports() {
    let (_, messages) = compile_err("#define BAD\n#include \"x\"\n#end");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("contains a directive")),
        "{messages:?}"
    );
}

#[test]
fn unterminated_macro_reports() {
    let (_, messages) = compile_err("#define OPEN(a)\n+a");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("unterminated macro 'OPEN': missing #end")),
        "{messages:?}"
    );
}

#[test]
fn if_zero_block_is_opaque() {
    // Nothing inside a false branch is expanded or parsed; nested
    // conditionals only count for depth.
    let (output, pp) = compile(
        "#if 0\n\
         set8( garbage !!\n\
         #if 1\n\
         more garbage )))\n\
         #endif\n\
         still skipped\n\
         #endif\n\
         +",
    );
    assert!(!pp.has_errors(), "{:#?}", pp.diagnostics());
    assert_eq!(bf_payload(&output.unwrap()), "+");
}

#[test]
fn elsif_chain_takes_first_true_branch() {
    let src = |n: i32| {
        format!(
            "#define N {n}\n\
             #if N == 1\n+\n\
             #elsif N == 2\n++\n\
             #elsif N == 3\n+++\n\
             #else\n-\n\
             #endif"
        )
    };
    assert_eq!(bf_payload(&compile_ok(&src(1))), "+");
    assert_eq!(bf_payload(&compile_ok(&src(2))), "++");
    assert_eq!(bf_payload(&compile_ok(&src(3))), "+++");
    assert_eq!(bf_payload(&compile_ok(&src(7))), "-");
}

#[test]
fn else_after_else_reports() {
    // the first #else is the taken branch, so the second one is parsed
    let (_, messages) = compile_err("#if 0\n#else\n#else\n#endif");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("multiple #else in the same #if")),
        "{messages:?}"
    );
}

#[test]
fn unterminated_if_reports_at_opening() {
    let (_, messages) = compile_err("#if 1\n+");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("test.bfpp:1:") && m.contains("unterminated #if")),
        "{messages:?}"
    );
}

#[test]
fn endif_without_if_reports() {
    let (_, messages) = compile_err("#endif");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("#endif without matching #if")),
        "{messages:?}"
    );
}

#[test]
fn unknown_directive_reports_and_recovers() {
    let (_, messages) = compile_err("#frobnicate 1 2 3\n+");
    assert!(
        messages
            .iter()
            .any(|m| m.contains("unknown directive: '#frobnicate'")),
        "{messages:?}"
    );
}

#[test]
fn undefined_identifier_in_if_condition_is_zero() {
    let output = compile_ok("#if MISSING\n+\n#else\n-\n#endif");
    assert_eq!(bf_payload(&output), "-");
}

#[test]
fn division_by_zero_in_condition_reports_and_yields_zero() {
    let (output, messages) = compile_err("#if 1/0\n+\n#else\n-\n#endif");
    assert!(
        messages.iter().any(|m| m.contains("division by zero")),
        "{messages:?}"
    );
    // evaluation yielded 0, so the else branch was selected before the
    // error suppressed the output
    assert!(output.is_none());
}

#[test]
fn unexpected_tokens_after_directive_report() {
    let (_, messages) = compile_err("#undef\n+");
    assert!(
        messages.iter().any(|m| m.contains("expected macro name")),
        "{messages:?}"
    );
}
