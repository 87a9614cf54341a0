use crate::ProjError;

/// Version and build metadata of the linked libproj.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Projinfo {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    pub release: String,
    pub version: String,
    pub searchpath: String,
}

impl Projinfo {
    /// Whether the linked library is at least `major.minor`.
    pub fn at_least(&self, major: i32, minor: i32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }
}

/// Information about the current state of a PROJ instance.
pub trait Info {
    /// Metadata of the linked libproj.
    fn info(&self) -> Result<Projinfo, ProjError> {
        library_info()
    }

    /// Whether remote grid access is enabled for this object's context.
    fn network_enabled(&self) -> bool;

    /// The CDN endpoint used for remote grids.
    fn get_url_endpoint(&self) -> Result<String, ProjError>;
}

/// Query the linked libproj for its version and search path.
pub fn library_info() -> Result<Projinfo, ProjError> {
    let pinfo = unsafe { proj_sys::proj_info() };
    let text = |ptr: *const libc::c_char| -> Result<String, ProjError> {
        if ptr.is_null() {
            Ok(String::new())
        } else {
            Ok(unsafe { crate::_string(ptr) }?)
        }
    };
    Ok(Projinfo {
        major: pinfo.major,
        minor: pinfo.minor,
        patch: pinfo.patch,
        release: text(pinfo.release)?,
        version: text(pinfo.version)?,
        searchpath: text(pinfo.searchpath)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_info() {
        let info = library_info().unwrap();
        assert!(info.major >= 6);
        assert_eq!(
            info.version,
            format!("{}.{}.{}", info.major, info.minor, info.patch)
        );
        assert!(info.at_least(6, 0));
        assert!(!info.at_least(info.major + 1, 0));
    }
}
