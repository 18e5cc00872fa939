use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use lox_interpreter::Session;

/// `Write` sink whose bytes stay readable after the session takes ownership.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session printing into a fresh buffer.
pub fn session() -> (Session, SharedBuffer) {
    let buffer = SharedBuffer::default();
    (Session::with_output(buffer.clone()), buffer)
}
