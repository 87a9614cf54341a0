use crate::axis::{AxisOrder, AxisPolicy};
use crate::context::ContextBuilder;
use crate::coord::{Coord, CoordinateType};
use crate::cstring_array::CStringArray;
use crate::factors::Factors;
use crate::format::{Format, Serializable};
use crate::info::{Info, library_info};
use crate::pj::{Locked, Pj};
use crate::transformer::{Target, Transformer};
use crate::ProjError;
use log::debug;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

/// Geographic longitude/latitude in degrees; the implicit other end of a single-definition
/// pipeline.
pub const DEFAULT_GEOGRAPHIC: &str = "+proj=latlong +type=crs";

/// Minimum `proj_identify` confidence for [`Crs::identify_epsg`] to accept a match.
const IDENTIFY_CONFIDENCE: libc::c_int = 70;

/// Format of [`Serializable::to_portable_string`] for CRSs.
const PORTABLE_FORMAT: Format = Format::Wkt2_2018;

/// Parameters of the ellipsoid of a CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub semi_major_metre: f64,
    pub semi_minor_metre: f64,
    pub is_semi_minor_computed: bool,
    pub inverse_flattening: f64,
}

/// A coordinate reference system, or a bare coordinate operation, built from a definition.
///
/// Accepted definitions are PROJ strings (`+proj=utm +zone=33`), `AUTHORITY:CODE`
/// (`EPSG:4326`), WKT and PROJJSON. The definition, the native handle and the derived
/// [`AxisOrder`] never change after construction.
///
/// A descriptor used on its own ([`Crs::forward`], [`Crs::inverse`]) transforms between
/// geographic longitude/latitude in degrees and itself; the pipeline for this is resolved on
/// first use and kept for later calls.
///
/// ```
/// use simple_proj::Crs;
/// # use approx::assert_relative_eq;
///
/// let webmerc = Crs::new("EPSG:3857").unwrap();
/// let (x, y) = webmerc.forward((135.0, 35.0)).unwrap();
/// assert_relative_eq!(x, 15028131.257091932, epsilon = 1e-6);
/// assert_relative_eq!(y, 4163881.144064294, epsilon = 1e-6);
/// ```
pub struct Crs {
    definition: String,
    config: ContextBuilder,
    handle: Locked<Pj>,
    axis_order: AxisOrder,
    is_crs: bool,
    projected: bool,
    pipeline: OnceLock<Transformer>,
}

impl Crs {
    /// Build a descriptor with the default libproj configuration.
    ///
    /// Fails with [`ProjError::Definition`] if libproj cannot parse `definition` into a CRS
    /// or a coordinate operation.
    pub fn new(definition: &str) -> Result<Crs, ProjError> {
        Crs::with_config(&ContextBuilder::new(), definition)
    }

    pub(crate) fn with_config(config: &ContextBuilder, definition: &str) -> Result<Crs, ProjError> {
        let invalid = |message: String| ProjError::Definition {
            definition: definition.to_string(),
            message,
        };
        let ctx = Rc::new(config.context());
        let pj = Pj::from_definition(ctx, definition)
            .map_err(|err| err.into_error(definition, invalid))?;
        if !pj.is_crs() && !pj.is_operation() {
            return Err(invalid(
                "not a coordinate reference system or coordinate operation".to_string(),
            ));
        }
        let is_crs = pj.is_crs();
        let axis_order = pj
            .axis_order()?
            .unwrap_or_else(|| AxisOrder::from_definition(definition));
        let projected = pj.has_map_projection();
        debug!(
            "created {} {definition:?}: axes {:?} in {:?}",
            if is_crs { "crs" } else { "operation" },
            axis_order.order,
            axis_order.unit,
        );
        Ok(Crs {
            definition: definition.to_string(),
            config: config.clone(),
            handle: Locked::new(pj),
            axis_order,
            is_crs,
            projected,
            pipeline: OnceLock::new(),
        })
    }

    pub(crate) fn config(&self) -> &ContextBuilder {
        &self.config
    }

    /// The definition string this descriptor was built from, verbatim.
    pub fn definition_text(&self) -> &str {
        &self.definition
    }

    /// Canonical PROJ-style definition: every parameter prefixed with `+`, separated by
    /// single spaces. `None` when libproj has no single textual definition for the object.
    pub fn definition(&self) -> Result<Option<String>, ProjError> {
        textual_definition(&self.handle.lock())
    }

    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    /// Whether libproj resolved the definition to a CRS (rather than an operation).
    pub fn is_crs(&self) -> bool {
        self.is_crs
    }

    pub(crate) fn has_map_projection(&self) -> bool {
        self.projected
    }

    /// The `EPSG:CODE` this descriptor corresponds to, if it is a registered CRS.
    pub fn identify_epsg(&self) -> Result<Option<String>, ProjError> {
        if !self.is_crs {
            return Ok(None);
        }
        self.handle.lock().identify("EPSG", IDENTIFY_CONFIDENCE)
    }

    /// WKT2:2015 (simplified) text of the CRS.
    pub fn to_wkt(&self) -> Result<Option<String>, ProjError> {
        self.serialize(Format::Wkt2_2015Simplified)
    }

    pub fn to_projjson(&self) -> Result<Option<String>, ProjError> {
        self.serialize(Format::ProjJson)
    }

    pub fn to_proj_string(&self) -> Result<Option<String>, ProjError> {
        self.serialize(Format::ProjString)
    }

    pub fn ellipsoid(&self) -> Option<Ellipsoid> {
        self.handle.lock().ellipsoid()
    }

    pub fn name(&self) -> Result<Option<String>, ProjError> {
        Ok(self.handle.lock().name()?)
    }

    /// A new, independent descriptor built from the same definition and configuration.
    pub fn try_clone(&self) -> Result<Crs, ProjError> {
        Crs::with_config(&self.config, &self.definition)
    }

    /// The pipeline between geographic longitude/latitude and this descriptor, resolved on
    /// first call.
    pub fn pipeline(&self) -> Result<&Transformer, ProjError> {
        if let Some(pipeline) = self.pipeline.get() {
            return Ok(pipeline);
        }
        let built = Transformer::build(self, Target::DefaultGeographic)?;
        Ok(self.pipeline.get_or_init(|| built))
    }

    /// Longitude/latitude in degrees to this CRS.
    pub fn forward<T, C>(&self, coord: C) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.pipeline()?.forward(coord)
    }

    /// This CRS to longitude/latitude in degrees.
    pub fn inverse<T, C>(&self, coord: C) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.pipeline()?.inverse(coord)
    }

    /// Like [`Crs::forward`], taking `(latitude, longitude)`.
    pub fn forward_latlon<T, C>(&self, coord: C) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.pipeline()?.forward_latlon(coord)
    }

    /// Like [`Crs::inverse`], returning `(latitude, longitude)`.
    pub fn inverse_latlon<T, C>(&self, coord: C) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.pipeline()?.inverse_latlon(coord)
    }

    pub fn forward_with<T, C>(&self, coord: C, policy: AxisPolicy) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.pipeline()?.forward_with(coord, policy)
    }

    pub fn inverse_with<T, C>(&self, coord: C, policy: AxisPolicy) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.pipeline()?.inverse_with(coord, policy)
    }

    /// Local distortion of the map projection at (`lon`, `lat`) in degrees.
    ///
    /// Requires a projected CRS or an operation from angles to linear units; anything else,
    /// and any point where libproj cannot differentiate the projection, fails with
    /// [`ProjError::FactorsUnavailable`].
    pub fn factors(&self, lon: f64, lat: f64) -> Result<Factors, ProjError> {
        let unavailable = |message: String| ProjError::FactorsUnavailable { lon, lat, message };
        if !self.projected {
            return Err(unavailable(format!(
                "{:?} is not a map projection",
                self.definition
            )));
        }
        let raw = self
            .handle
            .lock()
            .factors(lon.to_radians(), lat.to_radians())
            .map_err(unavailable)?;
        checked_factors(raw, lon, lat)
    }

    fn export(&self, format: Format, options: &[&str]) -> Result<Option<String>, ProjError> {
        format.check_supported(&library_info()?)?;
        if format.requires_crs() && !self.is_crs {
            return Ok(None);
        }
        let options = CStringArray::from_options(options.iter().copied()).map_err(|source| {
            ProjError::ArgumentNul {
                input: options.join(","),
                source,
            }
        })?;
        Ok(self.handle.lock().export(format, &options)?)
    }
}

impl Serializable for Crs {
    /// Serialize the CRS to `format`. Bare operations have no WKT or PROJJSON form and give
    /// `Ok(None)`, though most can still be written as a PROJ string.
    fn serialize(&self, format: Format) -> Result<Option<String>, ProjError> {
        self.export(format, &[])
    }

    /// Single-line WKT2:2018 for CRSs, the PROJ string for bare operations.
    fn to_portable_string(&self) -> Result<String, ProjError> {
        let format = if self.is_crs { PORTABLE_FORMAT } else { Format::ProjString };
        self.export(format, &["MULTILINE=NO"])?
            .ok_or_else(|| ProjError::UnsupportedFormat {
                format: format.to_string(),
                message: format!("{:?} cannot be exported", self.definition),
            })
    }

    fn from_portable_string(portable: &str) -> Result<Self, ProjError> {
        Crs::new(portable)
    }
}

impl Info for Crs {
    fn network_enabled(&self) -> bool {
        self.handle.lock().context().network_enabled()
    }

    fn get_url_endpoint(&self) -> Result<String, ProjError> {
        self.handle.lock().context().url_endpoint()
    }
}

impl fmt::Debug for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crs")
            .field("definition", &self.definition)
            .field("is_crs", &self.is_crs)
            .field("axis_order", &self.axis_order)
            .finish()
    }
}

/// Definition text of `pj` in canonical form, falling back to its PROJ string export.
pub(crate) fn textual_definition(pj: &Pj) -> Result<Option<String>, ProjError> {
    let text = match pj.definition()? {
        Some(text) if text.contains("proj=") => Some(text),
        // placeholder for several candidate operations, none chosen yet
        Some(text) if text.to_ascii_lowercase().starts_with("unavailable") => None,
        _ => pj.export(Format::ProjString, &CStringArray::new())?,
    };
    Ok(text.map(|text| canonical_definition(&text)))
}

/// Normalise a PROJ parameter list: `+` on every token, single spaces between them.
pub(crate) fn canonical_definition(text: &str) -> String {
    text.split_whitespace()
        .map(|token| format!("+{}", token.trim_start_matches('+')))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn checked_factors(
    raw: proj_sys::PJ_FACTORS,
    lon: f64,
    lat: f64,
) -> Result<Factors, ProjError> {
    let factors = Factors::from(raw);
    if factors.is_finite() {
        Ok(factors)
    } else {
        Err(ProjError::FactorsUnavailable {
            lon,
            lat,
            message: "derivatives are not finite at this point".to_string(),
        })
    }
}
