// quill-object - Print sink
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Destination for `print` output.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Where printed lines go. Cloning shares the same sink.
#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    Buffer(Rc<RefCell<String>>),
}

impl Output {
    /// A fresh in-memory sink.
    pub fn buffer() -> Self {
        Output::Buffer(Rc::new(RefCell::new(String::new())))
    }

    pub fn write_line(&self, line: &str) {
        match self {
            Output::Stdout => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                // A closed stdout is not a program error
                let _ = writeln!(lock, "{}", line);
            }
            Output::Buffer(buf) => {
                let mut buf = buf.borrow_mut();
                buf.push_str(line);
                buf.push('\n');
            }
        }
    }

    /// Write without a trailing newline (prompts).
    pub fn write(&self, text: &str) {
        match self {
            Output::Stdout => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                let _ = write!(lock, "{}", text);
                let _ = lock.flush();
            }
            Output::Buffer(buf) => buf.borrow_mut().push_str(text),
        }
    }

    /// Everything written so far (empty for stdout).
    pub fn contents(&self) -> String {
        match self {
            Output::Stdout => String::new(),
            Output::Buffer(buf) => buf.borrow().clone(),
        }
    }

    pub fn clear(&self) {
        if let Output::Buffer(buf) = self {
            buf.borrow_mut().clear();
        }
    }
}
