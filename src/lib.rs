#![doc(html_logo_url = "https://raw.githubusercontent.com/georust/meta/master/logo/logo.png")]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! `simple_proj` builds coordinate transformation pipelines on top of
//! [PROJ](https://proj.org): it resolves CRS definitions, pairs them into pipelines, keeps
//! track of axis order and angular units at both ends, and evaluates the local distortion
//! of map projections.
//!
//! # Usage
//!
//! A [`Crs`] is built from a PROJ string, an `AUTHORITY:CODE`, WKT or PROJJSON. On its own
//! it transforms between geographic longitude/latitude in degrees and itself:
//!
//! ```
//! use simple_proj::Crs;
//! # use approx::assert_relative_eq;
//!
//! let webmerc = Crs::new("+proj=webmerc").unwrap();
//! let (x, y) = webmerc.forward((135.0, 35.0)).unwrap();
//! assert_relative_eq!(x, 15028131.257091932, epsilon = 1e-6);
//! assert_relative_eq!(y, 4163881.144064294, epsilon = 1e-6);
//! ```
//!
//! A [`Transformer`] resolves the operation between two CRSs:
//!
//! ```
//! use simple_proj::Transformer;
//! # use approx::assert_relative_eq;
//!
//! let to_webmerc = Transformer::new_known_crs("EPSG:4326", "EPSG:3857").unwrap();
//! // (longitude, latitude) in degrees, whatever order EPSG:4326 declares
//! let (x, y) = to_webmerc.forward((135.0, 35.0)).unwrap();
//! assert_relative_eq!(x, 15028131.257091932, epsilon = 1e-6);
//! // the native order of EPSG:4326 is (latitude, longitude)
//! let (lat, lon) = to_webmerc.transform_inverse((x, y)).unwrap();
//! assert_relative_eq!(lat, 35.0, epsilon = 1e-9);
//! assert_relative_eq!(lon, 135.0, epsilon = 1e-9);
//! ```
//!
//! Three calling conventions are available on both types and must not be mixed; see
//! [`AxisPolicy`].
//!
//! ## Distortion factors
//!
//! ```
//! use simple_proj::Crs;
//! # use approx::assert_relative_eq;
//!
//! let merc = Crs::new("+proj=merc +R=6378137").unwrap();
//! let factors = merc.factors(0.0, 0.0).unwrap();
//! assert_relative_eq!(factors.meridional_scale, 1.0, epsilon = 1e-6);
//! assert!(factors.angular_distortion.abs() < 1e-8);
//! ```
//!
//! ## Serialization
//!
//! CRSs serialize to the WKT dialects, PROJJSON and PROJ strings listed in [`Format`]. The
//! single-line WKT written by [`Serializable::to_portable_string`] is the durable form of a
//! descriptor:
//!
//! ```
//! use simple_proj::{Crs, Format, Serializable};
//!
//! let crs = Crs::new("EPSG:3857").unwrap();
//! let wkt = crs.serialize(Format::Wkt1Esri).unwrap().unwrap();
//! assert!(wkt.starts_with("PROJCS["));
//! let restored = Crs::from_portable_string(&crs.to_portable_string().unwrap()).unwrap();
//! assert_eq!(restored.identify_epsg().unwrap().as_deref(), Some("EPSG:3857"));
//! ```
//!
//! ## Network, cache and search paths
//!
//! Resource search paths, remote grid download and the grid cache are set on a
//! [`ContextBuilder`], which then builds descriptors and transformers. Network access is
//! disabled by default.
//!
//! # Requirements
//!
//! By default this links against a `libproj` found on the system. The `bundled_proj`
//! feature builds PROJ from source through `proj-sys`, and `network` enables its remote
//! grid support.
//!
//! # Concurrency
//!
//! [`Crs`] and [`Transformer`] are `Send + Sync`. Each owns a private libproj context and
//! serialises the calls it makes into libproj, so sharing one object between threads is
//! safe but does not parallelise.

mod axis;
mod context;
mod coord;
mod crs;
mod cstring_array;
mod errno;
mod error;
mod factors;
mod format;
#[cfg(feature = "geo-types")]
mod geo_types;
mod info;
mod pj;
mod transform;
mod transformer;

pub use crate::axis::{Axis, AxisOrder, AxisPolicy, AxisTransform, AxisUnit, Endpoint};
pub use crate::axis::{from_pipeline_order, to_pipeline_order};
pub use crate::context::ContextBuilder;
pub use crate::coord::{Coord, CoordinateType};
pub use crate::crs::{Crs, DEFAULT_GEOGRAPHIC, Ellipsoid};
pub use crate::error::ProjError;
pub use crate::factors::{FACTORS_BYTES, FACTORS_FIELDS, Factors};
pub use crate::format::{Format, Serializable};
pub use crate::info::{Info, Projinfo, library_info};
pub use crate::transform::Transform;
pub use crate::transformer::{Direction, Target, Transformer};

use libc::c_char;
use std::ffi::CStr;
use std::str;

/// Copy a NUL-terminated string owned by libproj.
///
/// # Safety
///
/// `raw_ptr` must point to a valid NUL-terminated string.
pub(crate) unsafe fn _string(raw_ptr: *const c_char) -> Result<String, str::Utf8Error> {
    debug_assert!(!raw_ptr.is_null());
    let c_str = unsafe { CStr::from_ptr(raw_ptr) };
    Ok(str::from_utf8(c_str.to_bytes())?.to_string())
}
