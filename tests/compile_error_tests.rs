use ember_lox::vm::compile;

fn compile_errors(source: &str) -> Vec<String> {
    compile(source)
        .expect_err("compile should fail")
        .into_iter()
        .map(|e| e.to_string())
        .collect()
}

#[test]
fn reading_local_in_its_own_initializer() {
    let errors = compile_errors("{ var a = a; }");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        "[line 1] Error at 'a': Cannot read local variable in its own initializer."
    );
}

#[test]
fn duplicate_local_in_same_scope() {
    let errors = compile_errors("{\n  var dup = 1;\n  var dup = 2;\n}");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        "[line 3] Error at 'dup': Already a variable with this name in this scope."
    );
}

#[test]
fn invalid_assignment_target() {
    let errors = compile_errors("var a = 1; var b = 2; a + b = 3;");
    assert!(errors[0].contains("Invalid assignment target."));
}

#[test]
fn missing_semicolon_reported_at_end() {
    let errors = compile_errors("print 1");
    assert_eq!(errors[0], "[line 1] Error at end: Expect ';' after value.");
}

#[test]
fn lex_error_format() {
    let errors = compile_errors("var x = 1;\nprint @;");
    assert_eq!(errors[0], "[line 2] Error: Unexpected character.");
}

#[test]
fn unterminated_string_format() {
    let errors = compile_errors("print \"dangling");
    assert_eq!(errors[0], "[line 1] Error: Unterminated string.");
}

#[test]
fn unwired_keywords_are_not_expressions() {
    for source in ["return;", "fun f() {}", "class A {}", "super.x;", "this;"] {
        let errors = compile_errors(source);
        assert!(
            errors[0].contains("Expect expression."),
            "{source} should fail with 'Expect expression.', got {errors:?}"
        );
    }
}

#[test]
fn errors_on_successive_lines_are_all_reported() {
    let errors = compile_errors("print ;\nprint ;\nprint ;");
    assert_eq!(errors.len(), 3);
    for (i, error) in errors.iter().enumerate() {
        assert!(error.contains(&format!("[line {}]", i + 1)), "{error}");
    }
}

#[test]
fn valid_program_compiles_despite_unused_keywords_in_strings() {
    assert!(compile("print \"fun class return\";").is_ok());
}
