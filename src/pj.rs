use crate::axis::{Axis, AxisOrder, AxisUnit};
use crate::context::ThreadContext;
use crate::crs::Ellipsoid;
use crate::cstring_array::CStringArray;
use crate::errno::Errno;
use crate::error::{PjCreateError, ProjError};
use crate::format::Format;
use crate::transformer::Direction;
use libc::{c_char, c_int};
use parking_lot::{Mutex, MutexGuard};
use std::{ffi, ptr, rc, str};

/// Message used when libproj flags a failure without setting an error number.
const OUT_OF_DOMAIN: &str = "coordinate outside the domain of the operation";

/// A safe wrapper around `proj_sys::PJ`.
pub(crate) struct Pj {
    pj: ptr::NonNull<proj_sys::PJ>,
    ctx: rc::Rc<ThreadContext>,
}

impl Pj {
    pub fn from_definition(
        ctx: rc::Rc<ThreadContext>,
        definition: &str,
    ) -> Result<Self, PjCreateError> {
        let definition =
            ffi::CString::new(definition).map_err(PjCreateError::ArgumentNulError)?;
        let pj_ptr = unsafe { proj_sys::proj_create(ctx.as_ptr(), definition.as_ptr()) };
        Pj::from_pj_ptr(ctx, pj_ptr)
    }

    pub fn from_crs_to_crs(
        ctx: rc::Rc<ThreadContext>,
        source_crs: &str,
        target_crs: &str,
    ) -> Result<Self, PjCreateError> {
        let source_crs =
            ffi::CString::new(source_crs).map_err(PjCreateError::ArgumentNulError)?;
        let target_crs =
            ffi::CString::new(target_crs).map_err(PjCreateError::ArgumentNulError)?;
        let pj_ptr = unsafe {
            proj_sys::proj_create_crs_to_crs(
                ctx.as_ptr(),
                source_crs.as_ptr(),
                target_crs.as_ptr(),
                ptr::null_mut(),
            )
        };
        Pj::from_pj_ptr(ctx, pj_ptr)
    }

    pub fn from_pj_ptr(
        ctx: rc::Rc<ThreadContext>,
        pj_ptr: *mut proj_sys::PJconsts,
    ) -> Result<Self, PjCreateError> {
        ptr::NonNull::new(pj_ptr)
            .ok_or_else(|| match ctx.errno().message(&ctx) {
                Ok(s) => PjCreateError::ProjError(s),
                Err(err) => PjCreateError::ProjErrorMessageUtf8Error(err),
            })
            .map(|ptr| Pj { pj: ptr, ctx })
    }

    /// Wrap an object obtained from this one in the same context; `None` if libproj
    /// returned null.
    fn derived(&self, pj_ptr: *mut proj_sys::PJ) -> Option<Pj> {
        ptr::NonNull::new(pj_ptr).map(|pj| Pj {
            pj,
            ctx: self.ctx.clone(),
        })
    }

    pub fn as_ptr(&self) -> *mut proj_sys::PJ {
        self.pj.as_ptr()
    }

    pub fn context(&self) -> &ThreadContext {
        &self.ctx
    }

    pub fn errno_reset(&self) -> Errno {
        Errno(unsafe { proj_sys::proj_errno_reset(self.as_ptr()) })
    }

    pub fn errno(&self) -> Errno {
        Errno(unsafe { proj_sys::proj_errno(self.as_ptr()) })
    }

    /// Error number of the last call, from the handle or else from its context.
    fn last_errno(&self) -> Errno {
        let errno = self.errno();
        if errno.is_ok() { self.ctx.errno() } else { errno }
    }

    pub fn trans(&self, direction: Direction, coord: [f64; 3]) -> Result<[f64; 3], String> {
        self.errno_reset();
        let out = unsafe { proj_sys::proj_trans(self.as_ptr(), direction.as_raw(), pj_coord(coord)) };
        let out = coord_values(&out);
        let errno = self.errno();
        if errno.is_ok() && is_valid_output(&out) {
            Ok(out)
        } else {
            Err(errno.describe(&self.ctx, OUT_OF_DOMAIN))
        }
    }

    /// Transform `coords` in place. Individual failures leave non-finite values behind;
    /// the returned error is libproj's summary for the whole array.
    pub fn trans_array(
        &self,
        direction: Direction,
        coords: &mut [proj_sys::PJ_COORD],
    ) -> Result<(), String> {
        if coords.is_empty() {
            return Ok(());
        }
        self.errno_reset();
        let err = unsafe {
            proj_sys::proj_trans_array(
                self.as_ptr(),
                direction.as_raw(),
                coords.len(),
                coords.as_mut_ptr(),
            )
        };
        let errno = Errno(err);
        if errno.is_ok() {
            Ok(())
        } else {
            Err(errno.describe(&self.ctx, OUT_OF_DOMAIN))
        }
    }

    /// Evaluate the local distortion at (`lam`, `phi`), in radians.
    pub fn factors(&self, lam: f64, phi: f64) -> Result<proj_sys::PJ_FACTORS, String> {
        self.errno_reset();
        let lp = proj_sys::PJ_COORD {
            lpzt: proj_sys::PJ_LPZT {
                lam,
                phi,
                z: 0.0,
                t: f64::INFINITY,
            },
        };
        let factors = unsafe { proj_sys::proj_factors(self.as_ptr(), lp) };
        let errno = self.last_errno();
        if errno.is_ok() {
            Ok(factors)
        } else {
            Err(errno.describe(&self.ctx, "derivatives could not be evaluated"))
        }
    }

    pub fn is_crs(&self) -> bool {
        unsafe { proj_sys::proj_is_crs(self.as_ptr()) == 1 }
    }

    pub fn kind(&self) -> proj_sys::PJ_TYPE {
        unsafe { proj_sys::proj_get_type(self.as_ptr()) }
    }

    /// Whether this is a coordinate operation; operations instantiated straight from a PROJ
    /// string may carry no ISO metadata and report an unknown type.
    pub fn is_operation(&self) -> bool {
        matches!(
            self.kind(),
            proj_sys::PJ_TYPE_PJ_TYPE_CONVERSION
                | proj_sys::PJ_TYPE_PJ_TYPE_TRANSFORMATION
                | proj_sys::PJ_TYPE_PJ_TYPE_CONCATENATED_OPERATION
                | proj_sys::PJ_TYPE_PJ_TYPE_OTHER_COORDINATE_OPERATION
                | proj_sys::PJ_TYPE_PJ_TYPE_UNKNOWN
        )
    }

    /// Whether `proj_factors` can differentiate this object: a projected CRS (possibly the
    /// horizontal part of a compound CRS), or an operation mapping radians to linear units.
    pub fn has_map_projection(&self) -> bool {
        match self.kind() {
            proj_sys::PJ_TYPE_PJ_TYPE_PROJECTED_CRS => true,
            proj_sys::PJ_TYPE_PJ_TYPE_COMPOUND_CRS => self
                .horizontal_crs()
                .is_some_and(|horizontal| horizontal.kind() == proj_sys::PJ_TYPE_PJ_TYPE_PROJECTED_CRS),
            _ => {
                !self.is_crs()
                    && self.angular_input(Direction::Forward)
                    && !self.angular_output(Direction::Forward)
            }
        }
    }

    /// Whether the operation reads angles in radians when applied in `direction`.
    pub fn angular_input(&self, direction: Direction) -> bool {
        unsafe { proj_sys::proj_angular_input(self.as_ptr(), direction.as_raw()) == 1 }
    }

    /// Whether the operation writes angles in radians when applied in `direction`.
    pub fn angular_output(&self, direction: Direction) -> bool {
        unsafe { proj_sys::proj_angular_output(self.as_ptr(), direction.as_raw()) == 1 }
    }

    /// The textual definition libproj keeps for this object, if any.
    pub fn definition(&self) -> Result<Option<String>, str::Utf8Error> {
        let info = unsafe { proj_sys::proj_pj_info(self.as_ptr()) };
        if info.definition.is_null() {
            return Ok(None);
        }
        let text = unsafe { crate::_string(info.definition) }?;
        Ok((!text.trim().is_empty()).then_some(text))
    }

    pub fn name(&self) -> Result<Option<String>, str::Utf8Error> {
        let name = unsafe { proj_sys::proj_get_name(self.as_ptr()) };
        if name.is_null() {
            return Ok(None);
        }
        unsafe { crate::_string(name) }.map(Some)
    }

    /// Export in `format`; `None` when libproj cannot represent the object in it.
    pub fn export(
        &self,
        format: Format,
        options: &CStringArray,
    ) -> Result<Option<String>, str::Utf8Error> {
        let ctx = self.ctx.as_ptr();
        let text = match format.wkt_type() {
            Some(wkt_type) => unsafe {
                proj_sys::proj_as_wkt(ctx, self.as_ptr(), wkt_type, options.as_ptr())
            },
            None if format == Format::ProjJson => unsafe {
                proj_sys::proj_as_projjson(ctx, self.as_ptr(), options.as_ptr())
            },
            None => unsafe {
                proj_sys::proj_as_proj_string(
                    ctx,
                    self.as_ptr(),
                    proj_sys::PJ_PROJ_STRING_TYPE_PJ_PROJ_5,
                    options.as_ptr(),
                )
            },
        };
        if text.is_null() {
            return Ok(None);
        }
        unsafe { crate::_string(text) }.map(Some)
    }

    pub fn source_crs(&self) -> Option<Pj> {
        self.derived(unsafe { proj_sys::proj_get_source_crs(self.ctx.as_ptr(), self.as_ptr()) })
    }

    pub fn target_crs(&self) -> Option<Pj> {
        self.derived(unsafe { proj_sys::proj_get_target_crs(self.ctx.as_ptr(), self.as_ptr()) })
    }

    fn horizontal_crs(&self) -> Option<Pj> {
        self.derived(unsafe { proj_sys::proj_crs_get_sub_crs(self.ctx.as_ptr(), self.as_ptr(), 0) })
    }

    /// The coordinate system of this CRS; compound CRSs answer with their horizontal part
    /// and bound CRSs with their base CRS.
    fn coordinate_system(&self) -> Option<Pj> {
        if !self.is_crs() {
            return None;
        }
        match self.kind() {
            proj_sys::PJ_TYPE_PJ_TYPE_COMPOUND_CRS => self.horizontal_crs()?.coordinate_system(),
            proj_sys::PJ_TYPE_PJ_TYPE_BOUND_CRS => self.source_crs()?.coordinate_system(),
            _ => self.derived(unsafe {
                proj_sys::proj_crs_get_coordinate_system(self.ctx.as_ptr(), self.as_ptr())
            }),
        }
    }

    /// Axis order declared by this CRS; `None` for objects without CRS metadata.
    pub fn axis_order(&self) -> Result<Option<AxisOrder>, str::Utf8Error> {
        let Some(cs) = self.coordinate_system() else {
            return Ok(None);
        };
        let ctx = self.ctx.as_ptr();
        let count = unsafe { proj_sys::proj_cs_get_axis_count(ctx, cs.as_ptr()) };
        if count < 2 {
            return Ok(None);
        }
        let angular = unsafe { proj_sys::proj_cs_get_type(ctx, cs.as_ptr()) }
            == proj_sys::PJ_COORDINATE_SYSTEM_TYPE_PJ_CS_TYPE_ELLIPSOIDAL;
        let mut unit = if angular { AxisUnit::Degrees } else { AxisUnit::Linear };
        let mut order = [Axis::Other; 2];
        for (index, axis) in order.iter_mut().enumerate() {
            let mut direction: *const c_char = ptr::null();
            let mut unit_conv_factor = 0.0;
            let found = unsafe {
                proj_sys::proj_cs_get_axis_info(
                    ctx,
                    cs.as_ptr(),
                    index as c_int,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    &mut direction,
                    &mut unit_conv_factor,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                )
            };
            if found == 0 || direction.is_null() {
                return Ok(None);
            }
            let direction = unsafe { crate::_string(direction) }?;
            *axis = Axis::from_direction(&direction, angular);
            if angular && (unit_conv_factor - 1.0).abs() < 1e-12 {
                unit = AxisUnit::Radians;
            }
        }
        Ok(Some(AxisOrder { unit, order }))
    }

    /// The first identifier attached to the object, as `AUTHORITY:CODE`.
    fn id(&self) -> Result<Option<String>, str::Utf8Error> {
        let auth = unsafe { proj_sys::proj_get_id_auth_name(self.as_ptr(), 0) };
        let code = unsafe { proj_sys::proj_get_id_code(self.as_ptr(), 0) };
        if auth.is_null() || code.is_null() {
            return Ok(None);
        }
        let auth = unsafe { crate::_string(auth) }?;
        let code = unsafe { crate::_string(code) }?;
        Ok(Some(format!("{auth}:{code}")))
    }

    /// Find the `authority` code this object corresponds to: its own identifier if it has
    /// one, else the best `proj_identify` match scoring at least `min_confidence`.
    pub fn identify(
        &self,
        authority: &str,
        min_confidence: c_int,
    ) -> Result<Option<String>, ProjError> {
        let from_authority = |id: &str| {
            id.split_once(':')
                .is_some_and(|(auth, _)| auth.eq_ignore_ascii_case(authority))
        };
        if let Some(id) = self.id()? {
            if from_authority(&id) {
                return Ok(Some(id));
            }
        }
        let auth_name = ffi::CString::new(authority).map_err(|source| ProjError::ArgumentNul {
            input: authority.to_string(),
            source,
        })?;
        let ctx = self.ctx.as_ptr();
        let mut candidates = ObjList {
            list: ptr::null_mut(),
            confidence: ptr::null_mut(),
        };
        candidates.list = unsafe {
            proj_sys::proj_identify(
                ctx,
                self.as_ptr(),
                auth_name.as_ptr(),
                ptr::null(),
                &mut candidates.confidence,
            )
        };
        if candidates.list.is_null() {
            return Ok(None);
        }
        let count = unsafe { proj_sys::proj_list_get_count(candidates.list) };
        let mut best: Option<(c_int, String)> = None;
        for index in 0..count {
            let score = if candidates.confidence.is_null() {
                0
            } else {
                unsafe { *candidates.confidence.add(index as usize) }
            };
            if score < min_confidence || best.as_ref().is_some_and(|(top, _)| *top >= score) {
                continue;
            }
            let candidate = self.derived(unsafe { proj_sys::proj_list_get(ctx, candidates.list, index) });
            if let Some(id) = candidate.map(|c| c.id()).transpose()?.flatten() {
                if from_authority(&id) {
                    best = Some((score, id));
                }
            }
        }
        Ok(best.map(|(_, id)| id))
    }

    pub fn ellipsoid(&self) -> Option<Ellipsoid> {
        let ctx = self.ctx.as_ptr();
        let ellipsoid = self.derived(unsafe { proj_sys::proj_get_ellipsoid(ctx, self.as_ptr()) })?;
        let mut semi_major_metre = 0.0;
        let mut semi_minor_metre = 0.0;
        let mut is_semi_minor_computed: c_int = 0;
        let mut inverse_flattening = 0.0;
        let found = unsafe {
            proj_sys::proj_ellipsoid_get_parameters(
                ctx,
                ellipsoid.as_ptr(),
                &mut semi_major_metre,
                &mut semi_minor_metre,
                &mut is_semi_minor_computed,
                &mut inverse_flattening,
            )
        };
        (found == 1).then_some(Ellipsoid {
            semi_major_metre,
            semi_minor_metre,
            is_semi_minor_computed: is_semi_minor_computed == 1,
            inverse_flattening,
        })
    }
}

impl Drop for Pj {
    fn drop(&mut self) {
        unsafe {
            proj_sys::proj_destroy(self.as_ptr());
        }
    }
}

/// Result list of `proj_identify`, released on drop.
struct ObjList {
    list: *mut proj_sys::PJ_OBJ_LIST,
    confidence: *mut c_int,
}

impl Drop for ObjList {
    fn drop(&mut self) {
        unsafe {
            if !self.list.is_null() {
                proj_sys::proj_list_destroy(self.list);
            }
            if !self.confidence.is_null() {
                proj_sys::proj_int_list_destroy(self.confidence);
            }
        }
    }
}

pub(crate) fn pj_coord([x, y, z]: [f64; 3]) -> proj_sys::PJ_COORD {
    proj_sys::PJ_COORD {
        xyzt: proj_sys::PJ_XYZT {
            x,
            y,
            z,
            t: f64::INFINITY,
        },
    }
}

pub(crate) fn coord_values(coord: &proj_sys::PJ_COORD) -> [f64; 3] {
    let v = unsafe { coord.v };
    [v[0], v[1], v[2]]
}

/// libproj marks failed coordinates with `HUGE_VAL`.
pub(crate) fn is_valid_output(coord: &[f64; 3]) -> bool {
    coord[0].is_finite() && coord[1].is_finite()
}

/// Marker for values whose `Pj` handles all share a single context that nothing outside
/// the value refers to.
///
/// # Safety
///
/// Implementors must not hand out handles that outlive a borrow of the value.
pub(crate) unsafe trait SharesContext {}

unsafe impl SharesContext for Pj {}

/// A set of handles on one libproj context, usable from several threads.
///
/// libproj contexts and handles keep per-call scratch state, so every call goes through
/// the lock, including calls on temporaries derived from the handles.
pub(crate) struct Locked<T: SharesContext>(Mutex<T>);

// Safety: the context and its handles are only reachable through the mutex, and derived
// handles are dropped before the guard is released.
unsafe impl<T: SharesContext> Send for Locked<T> {}
unsafe impl<T: SharesContext> Sync for Locked<T> {}

impl<T: SharesContext> Locked<T> {
    pub fn new(value: T) -> Self {
        Locked(Mutex::new(value))
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> rc::Rc<ThreadContext> {
        rc::Rc::new(ThreadContext::new())
    }

    #[test]
    fn test_create_failure_carries_message() {
        let err = Pj::from_definition(ctx(), "EPSG:999999999").err().unwrap();
        match err {
            PjCreateError::ProjError(message) => assert!(!message.is_empty()),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_kinds() {
        let crs = Pj::from_definition(ctx(), "EPSG:3857").unwrap();
        assert!(crs.is_crs());
        assert!(crs.has_map_projection());
        let geographic = Pj::from_definition(ctx(), "EPSG:4326").unwrap();
        assert!(geographic.is_crs());
        assert!(!geographic.has_map_projection());
        let operation = Pj::from_definition(ctx(), "+proj=webmerc").unwrap();
        assert!(!operation.is_crs());
        assert!(operation.is_operation());
        assert!(operation.angular_input(Direction::Forward));
        assert!(operation.angular_output(Direction::Inverse));
    }

    #[test]
    fn test_axis_order_from_crs_metadata() {
        let geographic = Pj::from_definition(ctx(), "EPSG:4326").unwrap();
        assert_eq!(
            geographic.axis_order().unwrap(),
            Some(AxisOrder {
                unit: AxisUnit::Degrees,
                order: [Axis::Latitude, Axis::Longitude],
            })
        );
        let projected = Pj::from_definition(ctx(), "EPSG:3857").unwrap();
        assert_eq!(projected.axis_order().unwrap(), Some(AxisOrder::EAST_NORTH));
        let operation = Pj::from_definition(ctx(), "+proj=webmerc").unwrap();
        assert_eq!(operation.axis_order().unwrap(), None);
    }

    #[test]
    fn test_trans_reports_domain_errors() {
        let merc = Pj::from_definition(ctx(), "+proj=merc +ellps=WGS84").unwrap();
        // the pole maps to infinity
        let err = merc.trans(Direction::Forward, [0.0, 90f64.to_radians(), 0.0]);
        assert!(err.is_err());
    }

    #[test]
    fn test_coord_values() {
        assert_eq!(coord_values(&pj_coord([1.0, 2.0, 3.0])), [1.0, 2.0, 3.0]);
        assert!(!is_valid_output(&[f64::INFINITY, 0.0, 0.0]));
    }
}
