// ABOUTME: Shared test helpers for running a program and capturing its stdout

use rei::diagnostics::Diagnostics;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

/// A `Write` sink backed by a shared buffer, so the test can read back what
/// `print` wrote after the interpreter's writer has been dropped.
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl io::Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `source` through the full pipeline and returns everything `print`
/// wrote, plus the accumulated diagnostics.
pub fn run_capturing(source: &str) -> (String, Diagnostics) {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let diags = rei::run_to_writer(source, Box::new(SharedSink(Rc::clone(&buffer))));
    let output = String::from_utf8(buffer.borrow().clone()).expect("program output is not valid UTF-8");
    (output, diags)
}
