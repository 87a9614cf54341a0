use libc::c_char;
use std::ffi::{CString, NulError};
use std::ptr;

/// A null-terminated array of C strings for passing to PROJ functions.
///
/// Used both for `KEY=VALUE` option lists (e.g. `proj_as_wkt`, `proj_identify`) and for
/// counted string lists such as the resource search paths of a context.
///
/// The null-terminated pointer array is maintained incrementally as strings are added.
pub(crate) struct CStringArray {
    /// Owns the CString data.
    cstrings: Vec<CString>,
    /// Null-terminated pointer array.
    ptrs: Vec<*const c_char>,
}

impl CStringArray {
    pub fn new() -> Self {
        Self {
            cstrings: Vec::new(),
            ptrs: vec![ptr::null()],
        }
    }

    /// Build an array from `KEY=VALUE` options, failing on the first interior nul byte.
    pub fn from_options<'a>(options: impl IntoIterator<Item = &'a str>) -> Result<Self, NulError> {
        let mut array = Self::new();
        for option in options {
            array.push(option)?;
        }
        Ok(array)
    }

    /// Adds a string to the array.
    ///
    /// Returns an error if the string contains an interior nul byte.
    pub fn push(&mut self, s: impl Into<String>) -> Result<(), NulError> {
        let cstring = CString::new(s.into())?;
        self.push_cstring(cstring);
        Ok(())
    }

    /// Adds an already validated string to the array.
    pub fn push_cstring(&mut self, cstring: CString) {
        debug_assert_eq!(self.ptrs.last(), Some(&ptr::null()));
        // Moving the CString into `cstrings` does not move its heap buffer, so the pointer
        // stays valid for the lifetime of the array.
        self.ptrs.insert(self.ptrs.len() - 1, cstring.as_ptr());
        self.cstrings.push(cstring);
    }

    pub fn len(&self) -> usize {
        self.cstrings.len()
    }

    /// Returns a pointer to a null-terminated array of C string pointers, or null if the
    /// array is empty. libproj documents NULL as "no options".
    pub fn as_ptr(&self) -> *const *const c_char {
        debug_assert_eq!(self.ptrs.len(), self.cstrings.len() + 1);
        if self.cstrings.is_empty() {
            ptr::null()
        } else {
            self.ptrs.as_ptr()
        }
    }
}

impl Default for CStringArray {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_empty() {
        let arr = CStringArray::new();
        assert!(arr.as_ptr().is_null());
        assert_eq!(arr.len(), 0);
    }

    #[test]
    fn test_options_are_null_terminated() {
        let arr = CStringArray::from_options(["MULTILINE=NO", "INDENTATION_WIDTH=0"]).unwrap();
        assert_eq!(arr.len(), 2);
        let ptr = arr.as_ptr();
        unsafe {
            assert_eq!(CStr::from_ptr(*ptr).to_str().unwrap(), "MULTILINE=NO");
            assert_eq!(CStr::from_ptr(*ptr.add(1)).to_str().unwrap(), "INDENTATION_WIDTH=0");
            assert!((*ptr.add(2)).is_null());
        }
    }

    #[test]
    fn test_nul_error() {
        let mut arr = CStringArray::new();
        assert!(arr.push("invalid\0string").is_err());
        assert!(CStringArray::from_options(["A=1", "B\0=2"]).is_err());
    }
}
