// ABOUTME: Standard-library built-ins registered into the global environment

use crate::callable::BuiltIn;
use crate::env::Environment;
use crate::value::Value;
use rand::Rng;
use std::io::Read;
use std::rc::Rc;

/// Registers `input`, `num`, and `rand` into the given (global) environment.
pub fn register(globals: &Rc<Environment>) {
    globals.define(
        "input".to_string(),
        Value::Callable(Rc::new(BuiltIn {
            builtin_name: "input",
            builtin_arity: 0,
            builtin_display: "input :: void -> string",
            func: Box::new(|_interp, _args| Ok(Value::Text(read_one_token()))),
        })),
    );

    globals.define(
        "num".to_string(),
        Value::Callable(Rc::new(BuiltIn {
            builtin_name: "num",
            builtin_arity: 1,
            builtin_display: "num :: t -> number",
            func: Box::new(|_interp, mut args| Ok(num_of(args.remove(0)))),
        })),
    );

    globals.define(
        "rand".to_string(),
        Value::Callable(Rc::new(BuiltIn {
            builtin_name: "rand",
            builtin_arity: 2,
            builtin_display: "rand :: (num, num) -> num",
            func: Box::new(|_interp, args| Ok(rand_between(&args[0], &args[1]))),
        })),
    );
}

/// Mirrors `std::cin >> input`: skip leading whitespace, then collect bytes
/// up to (not including) the next whitespace or end of input.
fn read_one_token() -> String {
    let stdin = std::io::stdin();
    let mut bytes = stdin.lock().bytes();
    let mut token = String::new();
    for byte in bytes.by_ref() {
        let Ok(b) = byte else { break };
        if (b as char).is_whitespace() {
            if token.is_empty() {
                continue;
            }
            break;
        }
        token.push(b as char);
    }
    token
}

fn num_of(value: Value) -> Value {
    match value {
        Value::Nil => Value::Nil,
        Value::Bool(b) => Value::Number(if b { 1.0 } else { 0.0 }),
        Value::Number(n) => Value::Number(n),
        Value::Text(s) => parse_leading_double(&s).map(Value::Number).unwrap_or(Value::Nil),
        _ => Value::Nil,
    }
}

/// Parses the leading numeric prefix of `s`, ignoring trailing garbage, the
/// way `std::stod` does: skip leading whitespace, then an optional sign,
/// digits, an optional `.` + digits, and an optional exponent. Returns
/// `None` if no digit is found at all.
fn parse_leading_double(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i] as char).is_whitespace() {
        i += 1;
    }
    let start = i;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i == digits_start || (i == digits_start + 1 && bytes[digits_start] == b'.') {
        return None;
    }
    let mantissa_end = i;
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_digits_start {
            i = j;
        }
    }
    let end = if i > mantissa_end { i } else { mantissa_end };
    s[start..end].parse::<f64>().ok()
}

fn rand_between(low: &Value, high: &Value) -> Value {
    let (Some(low), Some(high)) = (low.as_number(), high.as_number()) else {
        return Value::Nil;
    };
    let lo = low.floor() as i64;
    let hi = high.ceil() as i64;
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let n = rand::thread_rng().gen_range(lo..=hi);
    Value::Number(n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_of_nil_is_nil() {
        assert!(matches!(num_of(Value::Nil), Value::Nil));
    }

    #[test]
    fn num_of_bool() {
        assert_eq!(num_of(Value::Bool(true)).as_number(), Some(1.0));
        assert_eq!(num_of(Value::Bool(false)).as_number(), Some(0.0));
    }

    #[test]
    fn num_of_parseable_text() {
        assert_eq!(num_of(Value::Text("3.5".to_string())).as_number(), Some(3.5));
    }

    #[test]
    fn num_of_unparseable_text_is_nil() {
        assert!(matches!(num_of(Value::Text("abc".to_string())), Value::Nil));
    }

    #[test]
    fn num_of_text_with_trailing_garbage_parses_the_leading_prefix() {
        assert_eq!(num_of(Value::Text("3.5abc".to_string())).as_number(), Some(3.5));
        assert_eq!(num_of(Value::Text("-42xyz".to_string())).as_number(), Some(-42.0));
    }

    #[test]
    fn rand_between_non_numeric_is_nil() {
        assert!(matches!(rand_between(&Value::Nil, &Value::Number(1.0)), Value::Nil));
    }

    #[test]
    fn rand_between_is_within_the_rounded_range() {
        for _ in 0..20 {
            let v = rand_between(&Value::Number(1.2), &Value::Number(3.4));
            let n = v.as_number().unwrap();
            assert!((1.0..=4.0).contains(&n));
        }
    }
}
