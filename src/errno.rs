use crate::context::ThreadContext;
use std::str;

/// A libproj error number, read from a handle or a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Errno(pub libc::c_int);

impl Errno {
    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }

    pub fn message(&self, context: &ThreadContext) -> Result<String, str::Utf8Error> {
        let ptr = unsafe { proj_sys::proj_context_errno_string(context.as_ptr(), self.0) };
        if ptr.is_null() {
            return Ok(format!("libproj error {}", self.0));
        }
        unsafe { crate::_string(ptr) }
    }

    /// Like [`Errno::message`], but falls back to `fallback` when the error number is zero
    /// and never fails on malformed text.
    pub fn describe(&self, context: &ThreadContext, fallback: &str) -> String {
        if self.is_ok() {
            return fallback.to_string();
        }
        self.message(context)
            .unwrap_or_else(|_| format!("libproj error {}", self.0))
    }
}
