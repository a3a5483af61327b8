// ABOUTME: The literal end-to-end scenarios named in the specification

mod common;

use common::run_capturing;
use rei::diagnostics::Level;

#[test]
fn arithmetic_precedence() {
    let (output, diags) = run_capturing("print 1 + 2 * 3;");
    assert_eq!(output, "7\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn string_concatenation_and_reassignment() {
    let (output, diags) = run_capturing(r#"var s = "a"; s = s + "b"; print s;"#);
    assert_eq!(output, "ab\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn closure_captures_the_enclosing_parameter() {
    let (output, diags) = run_capturing(
        "fun mk(n){ fun g(){ return n; } return g; } var g = mk(42); print g();",
    );
    assert_eq!(output, "42\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn for_loop_continue_runs_the_increment_before_retesting() {
    let (output, diags) = run_capturing(
        "for (var i = 0; i < 3; i = i + 1) { if (i == 1) continue; print i; }",
    );
    assert_eq!(output, "0\n2\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn class_method_call() {
    let (output, diags) = run_capturing(r#"class C { hello(){ print "hi"; } } var o = C(); o.hello();"#);
    assert_eq!(output, "hi\n");
    assert_eq!(diags.count(Level::Error), 0);
}

#[test]
fn method_reads_this_bound_field() {
    let (output, diags) = run_capturing(
        r#"class C { greet(){ print this.name; } } var o = C(); o.name = "Rei"; o.greet();"#,
    );
    assert_eq!(output, "Rei\n");
    assert_eq!(diags.count(Level::Error), 0);
}
