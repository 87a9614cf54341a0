use crate::cstring_array::CStringArray;
use crate::errno::Errno;
use crate::info::{Info, Projinfo};
use crate::{Crs, ProjError, Transformer};
use libc::{c_char, c_int, c_void};
use log::{debug, trace, warn};
use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr;

/// PROJ thread context
pub(crate) struct ThreadContext(ptr::NonNull<proj_sys::PJ_CONTEXT>);

impl ThreadContext {
    pub fn new() -> Self {
        // Safety: `proj_context_create` always returns a valid pointer to a thread context.
        let ctx = unsafe {
            let ctx_ptr = proj_sys::proj_context_create();
            ThreadContext::from_raw(ctx_ptr)
        };
        unsafe {
            proj_sys::proj_log_func(ctx.as_ptr(), ptr::null_mut(), Some(log_to_facade));
        }
        ctx
    }

    /// # Safety
    ///
    /// Must provide a non-null pointer to a PROJ thread context.
    unsafe fn from_raw(ctx_ptr: *mut proj_sys::PJ_CONTEXT) -> Self {
        debug_assert!(!ctx_ptr.is_null());
        ThreadContext(unsafe { ptr::NonNull::new_unchecked(ctx_ptr) })
    }

    pub fn as_ptr(&self) -> *mut proj_sys::PJ_CONTEXT {
        self.0.as_ptr()
    }

    pub fn errno(&self) -> Errno {
        Errno(unsafe { proj_sys::proj_context_errno(self.as_ptr()) })
    }

    pub fn network_enabled(&self) -> bool {
        unsafe { proj_sys::proj_context_is_network_enabled(self.as_ptr()) == 1 }
    }

    pub fn url_endpoint(&self) -> Result<String, ProjError> {
        let ptr = unsafe { proj_sys::proj_context_get_url_endpoint(self.as_ptr()) };
        if ptr.is_null() {
            return Ok(String::new());
        }
        Ok(unsafe { crate::_string(ptr) }?)
    }
}

impl Drop for ThreadContext {
    fn drop(&mut self) {
        // Safety: The pointer being provided to `proj_context_destroy` will always be a valid
        // thread context, so long as the same `ThreadContext` doesn't get dropped twice.
        unsafe { proj_sys::proj_context_destroy(self.0.as_ptr()) };
    }
}

/// libproj log callback: forwards library diagnostics to the `log` facade.
///
/// Errors are reported at debug level because every failing call is also surfaced to the
/// caller as a [`ProjError`].
unsafe extern "C" fn log_to_facade(_user_data: *mut c_void, level: c_int, message: *const c_char) {
    if message.is_null() {
        return;
    }
    let message = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    if level == proj_sys::PJ_LOG_LEVEL_PJ_LOG_ERROR as c_int {
        debug!(target: "libproj", "{}", message.trim_end());
    } else {
        trace!(target: "libproj", "{}", message.trim_end());
    }
}

/// Configuration applied to the libproj context of every object it creates.
///
/// Every [`Crs`] and [`Transformer`] owns a private libproj context; a `ContextBuilder`
/// records how those contexts are set up (resource search paths, network access for
/// remote grids, grid cache), and is the entry point for building objects with that setup.
///
/// ```no_run
/// use simple_proj::{ContextBuilder, Info};
///
/// let mut builder = ContextBuilder::new();
/// builder.set_search_paths(["/usr/local/share/proj"]).unwrap();
/// builder.enable_network(true);
/// let transformer = builder.transformer_known_crs("EPSG:4326", "EPSG:3857").unwrap();
/// assert!(transformer.network_enabled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    search_paths: Vec<CString>,
    network: Option<bool>,
    url_endpoint: Option<CString>,
    grid_cache: Option<bool>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the directories libproj searches for resource files (`proj.db`, grids).
    pub fn set_search_paths<I, P>(&mut self, paths: I) -> Result<&mut Self, ProjError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.search_paths = paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref().to_string_lossy().into_owned();
                CString::new(path.as_str()).map_err(|source| ProjError::ArgumentNul {
                    input: path.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Allow libproj to fetch remote grids. Has no effect if libproj was built without
    /// network support.
    pub fn enable_network(&mut self, enable: bool) -> &mut Self {
        self.network = Some(enable);
        self
    }

    /// Set the CDN endpoint used for remote grids.
    pub fn set_url_endpoint(&mut self, endpoint: &str) -> Result<&mut Self, ProjError> {
        let url = CString::new(endpoint).map_err(|source| ProjError::ArgumentNul {
            input: endpoint.to_string(),
            source,
        })?;
        self.url_endpoint = Some(url);
        Ok(self)
    }

    /// Enable or disable the local cache of downloaded grid chunks.
    pub fn grid_cache_enable(&mut self, enable: bool) -> &mut Self {
        self.grid_cache = Some(enable);
        self
    }

    /// Create a CRS descriptor using this configuration.
    pub fn crs(&self, definition: &str) -> Result<Crs, ProjError> {
        Crs::with_config(self, definition)
    }

    /// Create a transformer from a single definition using this configuration.
    ///
    /// See [`Transformer::new`].
    pub fn transformer(&self, definition: &str) -> Result<Transformer, ProjError> {
        let source = self.crs(definition)?;
        Transformer::build(&source, crate::Target::DefaultGeographic)
    }

    /// Create a transformer between two CRS definitions using this configuration.
    ///
    /// See [`Transformer::new_known_crs`].
    pub fn transformer_known_crs(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Transformer, ProjError> {
        let source = self.crs(source)?;
        let target = self.crs(target)?;
        Transformer::build(&source, crate::Target::Explicit(&target))
    }

    /// Create a fresh libproj context with this configuration applied.
    pub(crate) fn context(&self) -> ThreadContext {
        let ctx = ThreadContext::new();
        if !self.search_paths.is_empty() {
            let mut paths = CStringArray::new();
            for path in &self.search_paths {
                paths.push_cstring(path.clone());
            }
            unsafe {
                proj_sys::proj_context_set_search_paths(
                    ctx.as_ptr(),
                    paths.len() as c_int,
                    paths.as_ptr(),
                );
            }
        }
        if let Some(enable) = self.network {
            let applied =
                unsafe { proj_sys::proj_context_set_enable_network(ctx.as_ptr(), enable as c_int) };
            if enable && applied == 0 {
                warn!("libproj was built without network support; remote grids are unavailable");
            }
        }
        if let Some(url) = &self.url_endpoint {
            unsafe { proj_sys::proj_context_set_url_endpoint(ctx.as_ptr(), url.as_ptr()) };
        }
        if let Some(enable) = self.grid_cache {
            unsafe { proj_sys::proj_grid_cache_set_enable(ctx.as_ptr(), enable as c_int) };
        }
        ctx
    }
}

impl Info for ContextBuilder {
    fn info(&self) -> Result<Projinfo, ProjError> {
        crate::info::library_info()
    }

    fn network_enabled(&self) -> bool {
        self.context().network_enabled()
    }

    fn get_url_endpoint(&self) -> Result<String, ProjError> {
        self.context().url_endpoint()
    }
}
