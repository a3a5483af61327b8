// ABOUTME: Whole-pipeline tests: source text in, captured stdout and diagnostic counts out

mod common;

use common::run_capturing;
use rei::diagnostics::Level;

#[test]
fn empty_program_runs_clean() {
    let (output, diags) = run_capturing("");
    assert_eq!(output, "");
    assert_eq!(diags.count(Level::Error), 0);
    assert!(!diags.has_fatal());
}

#[test]
fn short_circuit_and_never_evaluates_the_right_side() {
    let (output, diags) = run_capturing(
        r#"
        fun f() { print "called"; return true; }
        if (false and f()) { print "unreachable"; }
        print "done";
        "#,
    );
    assert_eq!(output, "done\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn short_circuit_or_never_evaluates_the_right_side() {
    let (output, diags) = run_capturing(
        r#"
        fun f() { print "called"; return false; }
        if (true or f()) { print "short-circuited"; }
        "#,
    );
    assert_eq!(output, "short-circuited\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn and_or_return_booleans_not_the_operand() {
    let (output, diags) = run_capturing(r#"print 1 and 2; print nil or "x";"#);
    assert_eq!(output, "true\ntrue\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn assignment_expression_yields_the_assigned_value() {
    let (output, diags) = run_capturing("var a; print (a = 5); print a;");
    assert_eq!(output, "5\n5\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn bound_method_keeps_its_original_this_after_being_stored() {
    let (output, diags) = run_capturing(
        r#"
        class Greeter { greet() { print this.name; } }
        var a = Greeter();
        a.name = "Ada";
        var b = Greeter();
        b.name = "Lin";
        var m = a.greet;
        b.greet = m;
        b.greet();
        "#,
    );
    assert_eq!(output, "Ada\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn calling_a_method_on_a_temporary_instance_does_not_panic() {
    let (output, diags) = run_capturing(
        r#"class C { hello(){ print "hi"; } } C().hello();"#,
    );
    assert_eq!(output, "hi\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn bound_method_outlives_the_variable_it_was_read_from() {
    let (output, diags) = run_capturing(
        r#"
        class C { greet(){ print this.name; } }
        var o = C();
        o.name = "Rei";
        var m = o.greet;
        o = nil;
        m();
        "#,
    );
    assert_eq!(output, "Rei\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn division_by_zero_is_a_runtime_error_at_the_operator_line() {
    let (output, diags) = run_capturing("print 1 / 0;");
    assert_eq!(output, "");
    assert_eq!(diags.count(Level::Error), 1);
    assert_eq!(diags.entries()[0].line, Some(1));
}

#[test]
fn calling_with_the_wrong_arity_is_a_runtime_error() {
    let (_, diags) = run_capturing("fun f(a, b) { return a + b; } f(1);");
    assert_eq!(diags.count(Level::Error), 1);
    assert!(diags.entries()[0].message.contains("Expected 2"));
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    let (_, diags) = run_capturing("var x = 1; x();");
    assert_eq!(diags.count(Level::Error), 1);
}

#[test]
fn undefined_variable_is_a_runtime_error() {
    let (_, diags) = run_capturing("print nope;");
    assert_eq!(diags.count(Level::Error), 1);
}

#[test]
fn ternary_is_right_associative_and_evaluates_one_branch() {
    let (output, diags) = run_capturing("print true ? 1 : false ? 2 : 3;");
    assert_eq!(output, "1\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn while_loop_break_and_continue() {
    let (output, diags) = run_capturing(
        r#"
        var i = 0;
        while (true) {
            i = i + 1;
            if (i == 2) continue;
            if (i > 3) break;
            print i;
        }
        "#,
    );
    assert_eq!(output, "1\n3\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn lambda_closes_over_its_declaration_environment() {
    let (output, diags) = run_capturing(
        r#"
        fun counter() {
            var n = 0;
            return fun() { n = n + 1; return n; };
        }
        var c = counter();
        print c();
        print c();
        print c();
        "#,
    );
    assert_eq!(output, "1\n2\n3\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn global_var_redeclaration_is_permitted() {
    let (output, diags) = run_capturing("var x = 1; var x = 2; print x;");
    assert_eq!(output, "2\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn local_var_redeclaration_is_a_static_error() {
    let (_, diags) = run_capturing("{ var x = 1; var x = 2; }");
    assert_eq!(diags.count(Level::Error), 1);
}

#[test]
fn multiple_parse_errors_are_all_reported() {
    let (_, diags) = run_capturing("var = ; var = ; print 1;");
    assert_eq!(diags.count(Level::Error), 2);
}

#[test]
fn uninitialized_var_reads_as_nil() {
    let (output, diags) = run_capturing("var a; print a;");
    assert_eq!(output, "nil\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn integer_valued_number_prints_without_a_decimal_point() {
    let (output, _) = run_capturing("print 6.0 / 2.0;");
    assert_eq!(output, "3\n");
}

#[test]
fn recursive_function_computes_factorial() {
    let (output, diags) = run_capturing(
        r#"
        fun fact(n) {
            if (n <= 1) return 1;
            return n * fact(n - 1);
        }
        print fact(6);
        "#,
    );
    assert_eq!(output, "720\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn each_instance_has_independent_fields() {
    let (output, diags) = run_capturing(
        r#"
        class Counter { }
        var a = Counter();
        var b = Counter();
        a.n = 1;
        b.n = 2;
        print a.n;
        print b.n;
        "#,
    );
    assert_eq!(output, "1\n2\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn unknown_character_does_not_stop_lexing() {
    let (_, diags) = run_capturing("1 @ 2;");
    assert_eq!(diags.count(Level::Error), 1);
}
