use crate::axis::{
    AxisOrder, AxisPolicy, AxisTransform, Endpoint, from_pipeline_order, to_pipeline_order,
};
use crate::context::ContextBuilder;
use crate::coord::{Coord, CoordinateType, components, from_raw, to_raw};
use crate::crs::{Crs, DEFAULT_GEOGRAPHIC, checked_factors, textual_definition};
use crate::cstring_array::CStringArray;
use crate::factors::Factors;
use crate::format::{Format, Serializable};
use crate::info::{Info, library_info};
use crate::pj::{Locked, Pj, SharesContext, coord_values, is_valid_output, pj_coord};
use crate::ProjError;
use log::{debug, trace};
use std::fmt;
use std::rc::Rc;

/// Direction in which a pipeline is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Inverse,
}

impl Direction {
    pub(crate) fn as_raw(self) -> proj_sys::PJ_DIRECTION {
        match self {
            Direction::Forward => proj_sys::PJ_DIRECTION_PJ_FWD,
            Direction::Inverse => proj_sys::PJ_DIRECTION_PJ_INV,
        }
    }
}

/// The other end of a pipeline built by [`Transformer::build`].
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// Transform from the source to this CRS.
    Explicit(&'a Crs),
    /// Pair the source with geographic longitude/latitude in degrees: a CRS source becomes
    /// the target of a pipeline starting at [`DEFAULT_GEOGRAPHIC`], a bare operation is used
    /// as the pipeline itself.
    DefaultGeographic,
}

/// Handles owned by one transformer, all on the transformer's context.
pub(crate) struct Pipeline {
    op: Pj,
    /// The projected CRS at one end of the pipeline, for distortion factors; the target
    /// when both ends are projected.
    projection: Option<Pj>,
}

unsafe impl SharesContext for Pipeline {}

/// A resolved coordinate operation between two coordinate reference systems.
///
/// Besides the operation itself a transformer knows the axis order and angular unit at
/// both of its ends, so coordinates can be passed in three conventions (see
/// [`AxisPolicy`]):
///
/// - [`forward`](Transformer::forward) / [`inverse`](Transformer::inverse) take and return
///   `(longitude, latitude)` in degrees at geographic ends and `(easting, northing)` at
///   projected ends;
/// - [`forward_latlon`](Transformer::forward_latlon) /
///   [`inverse_latlon`](Transformer::inverse_latlon) use `(latitude, longitude)` instead;
/// - [`transform_forward`](Transformer::transform_forward) /
///   [`transform_inverse`](Transformer::transform_inverse) hand values to libproj as they
///   are, in the CRS-declared order and in radians where the operation expects radians.
///
/// ```
/// use simple_proj::Transformer;
/// # use approx::assert_relative_eq;
///
/// let to_webmerc = Transformer::new_known_crs("EPSG:4326", "EPSG:3857").unwrap();
/// // EPSG:4326 declares latitude first
/// let (x, y) = to_webmerc.transform_forward((35.0, 135.0)).unwrap();
/// assert_relative_eq!(x, 15028131.257091932, epsilon = 1e-6);
/// assert_relative_eq!(y, 4163881.144064294, epsilon = 1e-6);
///
/// let (lat, lon) = to_webmerc.transform_inverse((x, y)).unwrap();
/// assert_relative_eq!(lat, 35.0, epsilon = 1e-9);
/// assert_relative_eq!(lon, 135.0, epsilon = 1e-9);
/// ```
///
/// A transformer may be shared between threads; calls are serialised on an internal lock.
pub struct Transformer {
    source_definition: String,
    target_definition: Option<String>,
    /// Textual form of the operation, fixed before its first use.
    definition: Option<String>,
    handle: Locked<Pipeline>,
    axes: AxisTransform,
    config: ContextBuilder,
}

impl Transformer {
    /// Build a transformer from a single definition.
    ///
    /// If `definition` is a CRS, the pipeline goes from geographic longitude/latitude in
    /// degrees to that CRS. Otherwise `definition` must be a coordinate operation (for
    /// example `+proj=webmerc` or a `+proj=pipeline`), which is used as is.
    ///
    /// ```
    /// use simple_proj::Transformer;
    /// # use approx::assert_relative_eq;
    ///
    /// let webmerc = Transformer::new("+proj=webmerc").unwrap();
    /// let (x, y) = webmerc.forward((135.0, 35.0)).unwrap();
    /// assert_relative_eq!(x, 15028131.257091932, epsilon = 1e-6);
    /// assert_relative_eq!(y, 4163881.144064294, epsilon = 1e-6);
    /// ```
    pub fn new(definition: &str) -> Result<Transformer, ProjError> {
        ContextBuilder::new().transformer(definition)
    }

    /// Build a transformer between two CRSs.
    ///
    /// Fails with [`ProjError::NoOperationFound`] when libproj knows no operation between
    /// them.
    pub fn new_known_crs(source: &str, target: &str) -> Result<Transformer, ProjError> {
        ContextBuilder::new().transformer_known_crs(source, target)
    }

    /// Resolve the pipeline from `source` to `target`. The transformer gets its own libproj
    /// context, configured like the one of `source`.
    pub fn build(source: &Crs, target: Target<'_>) -> Result<Transformer, ProjError> {
        let config = source.config().clone();
        let ctx = Rc::new(config.context());
        let source_definition = source.definition_text();
        let (pipeline, (source_axes, target_axes), target_definition) = match target {
            Target::Explicit(target) => {
                let target_definition = target.definition_text();
                let op = Pj::from_crs_to_crs(ctx.clone(), source_definition, target_definition)
                    .map_err(|err| {
                        err.into_error(source_definition, |message| ProjError::NoOperationFound {
                            source_crs: source_definition.to_string(),
                            target_crs: target_definition.to_string(),
                            message,
                        })
                    })?;
                let projection = if target.has_map_projection() {
                    Some(reparse(ctx, target_definition)?)
                } else if source.has_map_projection() {
                    Some(reparse(ctx, source_definition)?)
                } else {
                    None
                };
                (
                    Pipeline { op, projection },
                    (source.axis_order(), target.axis_order()),
                    Some(target_definition.to_string()),
                )
            }
            Target::DefaultGeographic if source.is_crs() => {
                let op = Pj::from_crs_to_crs(ctx.clone(), DEFAULT_GEOGRAPHIC, source_definition)
                    .map_err(|err| {
                        err.into_error(source_definition, |message| ProjError::NoOperationFound {
                            source_crs: DEFAULT_GEOGRAPHIC.to_string(),
                            target_crs: source_definition.to_string(),
                            message,
                        })
                    })?;
                let projection = if source.has_map_projection() {
                    Some(reparse(ctx, source_definition)?)
                } else {
                    None
                };
                (
                    Pipeline { op, projection },
                    (AxisOrder::LON_LAT, source.axis_order()),
                    None,
                )
            }
            Target::DefaultGeographic => {
                let op = reparse(ctx, source_definition)?;
                let axes = embedded_axes(&op)?
                    .unwrap_or((AxisOrder::LON_LAT, source.axis_order()));
                let projection = op.target_crs().filter(Pj::has_map_projection);
                (Pipeline { op, projection }, axes, None)
            }
        };

        let axes = AxisTransform {
            source: Endpoint {
                axes: source_axes,
                radians: pipeline.op.angular_input(Direction::Forward),
            },
            target: Endpoint {
                axes: target_axes,
                radians: pipeline.op.angular_output(Direction::Forward),
            },
        };
        // libproj reports the candidate last used once the operation has run
        let definition = textual_definition(&pipeline.op)?;
        debug!(
            "resolved pipeline {source_definition:?} -> {}: {}",
            target_definition.as_deref().unwrap_or("(geographic)"),
            definition.as_deref().unwrap_or("(no textual definition)"),
        );
        debug!("pipeline axes {axes:?}");

        Ok(Transformer {
            source_definition: source_definition.to_string(),
            target_definition,
            definition,
            handle: Locked::new(pipeline),
            axes,
            config,
        })
    }

    /// Axis orders and angular units at both ends of the pipeline.
    pub fn axis_transform(&self) -> AxisTransform {
        self.axes
    }

    /// Canonical definition of the resolved operation; `None` when libproj has no single
    /// textual definition for it, as when several candidate operations are kept.
    pub fn definition(&self) -> Result<Option<String>, ProjError> {
        Ok(self.definition.clone())
    }

    pub fn source_crs(&self) -> Result<Option<Crs>, ProjError> {
        self.related_crs(Pj::source_crs)
    }

    pub fn target_crs(&self) -> Result<Option<Crs>, ProjError> {
        self.related_crs(Pj::target_crs)
    }

    fn related_crs(&self, related: impl Fn(&Pj) -> Option<Pj>) -> Result<Option<Crs>, ProjError> {
        let wkt = {
            let pipeline = self.handle.lock();
            let Some(crs) = related(&pipeline.op) else {
                return Ok(None);
            };
            crs.export(Format::Wkt2_2018, &CStringArray::new())?
        };
        wkt.map(|wkt| Crs::with_config(&self.config, &wkt))
            .transpose()
    }

    /// Transform `coord` in `direction`, under the calling convention `policy`.
    pub fn convert<T, C>(&self, direction: Direction, coord: C, policy: AxisPolicy) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        let (input, output) = self.axes.endpoints(direction);
        let raw = to_pipeline_order(to_raw(&coord), input, policy);
        let out = self
            .handle
            .lock()
            .op
            .trans(direction, raw)
            .map_err(|message| ProjError::Transform {
                coordinate: components(&coord),
                message,
            })?;
        trace!("{direction:?} {raw:?} -> {out:?}");
        Ok(from_raw(
            from_pipeline_order(out, output, policy),
            coord.z().is_some(),
        ))
    }

    pub fn forward_with<T, C>(&self, coord: C, policy: AxisPolicy) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.convert(Direction::Forward, coord, policy)
    }

    pub fn inverse_with<T, C>(&self, coord: C, policy: AxisPolicy) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.convert(Direction::Inverse, coord, policy)
    }

    /// Forward transform of `(longitude, latitude)` in degrees or `(easting, northing)`.
    pub fn forward<T, C>(&self, coord: C) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.forward_with(coord, AxisPolicy::LonLat)
    }

    /// Inverse transform, returning `(longitude, latitude)` in degrees at geographic ends.
    pub fn inverse<T, C>(&self, coord: C) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.inverse_with(coord, AxisPolicy::LonLat)
    }

    /// Forward transform taking `(latitude, longitude)` at geographic ends.
    pub fn forward_latlon<T, C>(&self, coord: C) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.forward_with(coord, AxisPolicy::LatLon)
    }

    /// Inverse transform returning `(latitude, longitude)` at geographic ends.
    pub fn inverse_latlon<T, C>(&self, coord: C) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.inverse_with(coord, AxisPolicy::LatLon)
    }

    /// Forward transform in the pipeline's native axis order and units.
    pub fn transform_forward<T, C>(&self, coord: C) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.forward_with(coord, AxisPolicy::Raw)
    }

    /// Inverse transform in the pipeline's native axis order and units.
    pub fn transform_inverse<T, C>(&self, coord: C) -> Result<C, ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.inverse_with(coord, AxisPolicy::Raw)
    }

    /// Transform every coordinate of `coords` in place.
    ///
    /// Either all coordinates are transformed or, if any of them fails, none is modified
    /// and the error names the first failing coordinate. A failure libproj reports for the
    /// batch as a whole is [`ProjError::TransformArray`].
    ///
    /// ```
    /// use simple_proj::{AxisPolicy, Direction, Transformer};
    /// # use approx::assert_relative_eq;
    ///
    /// let webmerc = Transformer::new("EPSG:3857").unwrap();
    /// let mut points = [(135.0, 35.0), (0.0, 0.0)];
    /// webmerc.transform_array(Direction::Forward, &mut points, AxisPolicy::LonLat).unwrap();
    /// assert_relative_eq!(points[0].0, 15028131.257091932, epsilon = 1e-6);
    /// assert_relative_eq!(points[1].1, 0.0, epsilon = 1e-6);
    /// ```
    pub fn transform_array<T, C>(
        &self,
        direction: Direction,
        coords: &mut [C],
        policy: AxisPolicy,
    ) -> Result<(), ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        let (input, output) = self.axes.endpoints(direction);
        let prepared = |coord: &C| to_pipeline_order(to_raw(coord), input, policy);
        let mut raw: Vec<proj_sys::PJ_COORD> =
            coords.iter().map(|coord| pj_coord(prepared(coord))).collect();
        {
            let pipeline = self.handle.lock();
            let status = pipeline.op.trans_array(direction, &mut raw);
            match batch_failure(&status, &raw) {
                None => {}
                Some(BatchFailure::Array(message)) => {
                    return Err(ProjError::TransformArray {
                        count: coords.len(),
                        message,
                    });
                }
                Some(BatchFailure::Coordinate(index)) => {
                    let coord = &coords[index];
                    // repeat the failing coordinate alone for its own error message
                    let message = match pipeline.op.trans(direction, prepared(coord)) {
                        Err(message) => message,
                        Ok(_) => status.err().unwrap_or_else(|| {
                            "coordinate outside the domain of the operation".to_string()
                        }),
                    };
                    return Err(ProjError::Transform {
                        coordinate: components(coord),
                        message,
                    });
                }
            }
        }
        trace!("{direction:?} {} coordinates", coords.len());
        for (coord, out) in coords.iter_mut().zip(&raw) {
            let has_z = coord.z().is_some();
            *coord = from_raw(from_pipeline_order(coord_values(out), output, policy), has_z);
        }
        Ok(())
    }

    pub fn forward_array<T, C>(&self, coords: &mut [C], policy: AxisPolicy) -> Result<(), ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.transform_array(Direction::Forward, coords, policy)
    }

    pub fn inverse_array<T, C>(&self, coords: &mut [C], policy: AxisPolicy) -> Result<(), ProjError>
    where
        T: CoordinateType,
        C: Coord<T>,
    {
        self.transform_array(Direction::Inverse, coords, policy)
    }

    /// Local distortion at (`lon`, `lat`) in degrees of the map projection at either end
    /// of the pipeline, the target when both are projected.
    pub fn factors(&self, lon: f64, lat: f64) -> Result<Factors, ProjError> {
        let unavailable = |message: String| ProjError::FactorsUnavailable { lon, lat, message };
        let pipeline = self.handle.lock();
        let projection = match &pipeline.projection {
            Some(projection) => projection,
            None if pipeline.op.has_map_projection() => &pipeline.op,
            None => return Err(unavailable("the pipeline has no map projection".to_string())),
        };
        let raw = projection
            .factors(lon.to_radians(), lat.to_radians())
            .map_err(unavailable)?;
        checked_factors(raw, lon, lat)
    }

    fn export(&self, format: Format, options: &CStringArray) -> Result<Option<String>, ProjError> {
        format.check_supported(&library_info()?)?;
        Ok(self.handle.lock().op.export(format, options)?)
    }
}

/// Parse `definition` again on the transformer's own context.
fn reparse(ctx: Rc<crate::context::ThreadContext>, definition: &str) -> Result<Pj, ProjError> {
    Pj::from_definition(ctx, definition).map_err(|err| {
        err.into_error(definition, |message| ProjError::Definition {
            definition: definition.to_string(),
            message,
        })
    })
}

#[derive(Debug, PartialEq)]
enum BatchFailure {
    /// Index of the first coordinate without a finite result.
    Coordinate(usize),
    /// An error for the whole batch while every result is finite.
    Array(String),
}

fn batch_failure(
    status: &Result<(), String>,
    outputs: &[proj_sys::PJ_COORD],
) -> Option<BatchFailure> {
    match outputs.iter().position(|out| !is_valid_output(&coord_values(out))) {
        Some(index) => Some(BatchFailure::Coordinate(index)),
        None => status.clone().err().map(BatchFailure::Array),
    }
}

/// Axis orders of the CRSs an operation declares it runs between, if it declares both.
fn embedded_axes(op: &Pj) -> Result<Option<(AxisOrder, AxisOrder)>, ProjError> {
    let (Some(source), Some(target)) = (op.source_crs(), op.target_crs()) else {
        return Ok(None);
    };
    match (source.axis_order()?, target.axis_order()?) {
        (Some(source), Some(target)) => Ok(Some((source, target))),
        _ => Ok(None),
    }
}

impl Serializable for Transformer {
    /// Serialize the resolved operation. `Ok(None)` when libproj cannot write the operation
    /// in `format`, as for operations built from PROJ strings without ISO metadata.
    fn serialize(&self, format: Format) -> Result<Option<String>, ProjError> {
        self.export(format, &CStringArray::new())
    }

    /// The portable forms of the source and, if there is one, the target, one per line:
    /// single-line WKT2:2018 for CRSs, the PROJ string for a bare operation.
    fn to_portable_string(&self) -> Result<String, ProjError> {
        let mut ends =
            vec![Crs::with_config(&self.config, &self.source_definition)?.to_portable_string()?];
        if let Some(target) = &self.target_definition {
            ends.push(Crs::with_config(&self.config, target)?.to_portable_string()?);
        }
        Ok(ends.join("\n"))
    }

    /// Rebuild the pipeline between the CRSs written by
    /// [`to_portable_string`](Serializable::to_portable_string).
    fn from_portable_string(portable: &str) -> Result<Self, ProjError> {
        let mut ends = portable.lines().filter(|line| !line.trim().is_empty());
        match (ends.next(), ends.next(), ends.next()) {
            (Some(source), None, _) => Transformer::new(source),
            (Some(source), Some(target), None) => Transformer::new_known_crs(source, target),
            _ => Err(ProjError::Definition {
                definition: portable.to_string(),
                message: "expected one or two definitions, one per line".to_string(),
            }),
        }
    }
}

impl Info for Transformer {
    fn network_enabled(&self) -> bool {
        self.handle.lock().op.context().network_enabled()
    }

    fn get_url_endpoint(&self) -> Result<String, ProjError> {
        self.handle.lock().op.context().url_endpoint()
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("source", &self.source_definition)
            .field("target", &self.target_definition)
            .field("definition", &self.definition)
            .field("axes", &self.axes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;

    const ENGINEERING: &str = r#"ENGCRS["Local",EDATUM["Unknown"],CS[Cartesian,2],AXIS["(E)",east,ORDER[1],LENGTHUNIT["metre",1]],AXIS["(N)",north,ORDER[2],LENGTHUNIT["metre",1]]]"#;

    #[test]
    fn test_round_trip_raw() {
        let transformer = Transformer::new_known_crs("EPSG:4326", "EPSG:3857").unwrap();
        let (x, y) = transformer.transform_forward((35.0, 135.0)).unwrap();
        assert_relative_eq!(x, 15028131.257091932, epsilon = 1e-6);
        assert_relative_eq!(y, 4163881.144064294, epsilon = 1e-6);
        let (lat, lon) = transformer.transform_inverse((x, y)).unwrap();
        assert_relative_eq!(lat, 35.0, epsilon = 1e-9);
        assert_relative_eq!(lon, 135.0, epsilon = 1e-9);
    }

    #[test]
    fn test_convenience_reorders_latitude_first_crs() {
        let transformer = Transformer::new_known_crs("EPSG:4326", "EPSG:3857").unwrap();
        let (x, y) = transformer.forward((135.0, 35.0)).unwrap();
        assert_relative_eq!(x, 15028131.257091932, epsilon = 1e-6);
        assert_relative_eq!(y, 4163881.144064294, epsilon = 1e-6);
        let (lon, lat) = transformer.inverse((x, y)).unwrap();
        assert_relative_eq!(lon, 135.0, epsilon = 1e-9);
        assert_relative_eq!(lat, 35.0, epsilon = 1e-9);
        let (lat, lon) = transformer.inverse_latlon((x, y)).unwrap();
        assert_relative_eq!(lon, 135.0, epsilon = 1e-9);
        assert_relative_eq!(lat, 35.0, epsilon = 1e-9);
    }

    #[test]
    fn test_latlong_to_epsg_4326_is_an_axis_swap() {
        let transformer = Transformer::new_known_crs("+proj=latlong", "EPSG:4326").unwrap();
        let definition = transformer.definition().unwrap().unwrap();
        assert!(definition.contains("+proj=axisswap"), "{definition}");
        assert!(definition.contains("+order=2,1"), "{definition}");
        assert!(definition.contains("+ellps=GRS80"), "{definition}");
        let (a, b) = transformer.transform_forward((135.0, 35.0)).unwrap();
        assert_relative_eq!(a, 35.0, epsilon = 1e-12);
        assert_relative_eq!(b, 135.0, epsilon = 1e-12);
    }

    #[test]
    fn test_definition_does_not_depend_on_use() {
        // NAD27 to WGS 84 has one candidate operation per region
        let transformer = Transformer::new_known_crs("EPSG:4267", "EPSG:4326").unwrap();
        let before = transformer.definition().unwrap();
        transformer.forward((-100.0, 40.0)).unwrap();
        transformer.forward((-80.0, 25.0)).unwrap();
        assert_eq!(transformer.definition().unwrap(), before);
    }

    #[test]
    fn test_single_crs_definition_starts_at_lon_lat() {
        let transformer = Transformer::new("EPSG:3857").unwrap();
        let axes = transformer.axis_transform();
        assert_eq!(axes.source.axes, AxisOrder::LON_LAT);
        assert_eq!(axes.target.axes, AxisOrder::EAST_NORTH);
        let (x, y) = transformer.forward((135.0, 35.0)).unwrap();
        assert_relative_eq!(x, 15028131.257091932, epsilon = 1e-6);
        assert_relative_eq!(y, 4163881.144064294, epsilon = 1e-6);
    }

    #[test]
    fn test_operation_takes_radians() {
        let transformer = Transformer::new("+proj=webmerc").unwrap();
        let axes = transformer.axis_transform();
        assert!(axes.source.radians);
        assert!(!axes.target.radians);
        let (x, _) = transformer
            .transform_forward((135f64.to_radians(), 35f64.to_radians()))
            .unwrap();
        assert_relative_eq!(x, 15028131.257091932, epsilon = 1e-6);
    }

    #[test]
    fn test_no_operation_found() {
        let err = Transformer::new_known_crs(ENGINEERING, "EPSG:4326").unwrap_err();
        assert_matches!(err, ProjError::NoOperationFound { ref target_crs, .. } if target_crs == "EPSG:4326");
    }

    #[test]
    fn test_invalid_definition() {
        assert_matches!(
            Transformer::new_known_crs("EPSG:999999999", "EPSG:4326"),
            Err(ProjError::Definition { .. })
        );
        assert_matches!(
            Transformer::new("+proj=nonexistent"),
            Err(ProjError::Definition { .. })
        );
    }

    #[test]
    fn test_transform_error_carries_input() {
        let transformer = Transformer::new("+proj=merc +ellps=WGS84").unwrap();
        let err = transformer.forward((0.0, 90.0)).unwrap_err();
        assert_matches!(err, ProjError::Transform { ref coordinate, .. } if coordinate == &vec![0.0, 90.0]);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let transformer = Transformer::new("+proj=merc +ellps=WGS84").unwrap();
        let mut coords = vec![(10.0, 10.0), (0.0, 90.0), (20.0, 20.0)];
        let err = transformer
            .forward_array(&mut coords, AxisPolicy::LonLat)
            .unwrap_err();
        assert_matches!(err, ProjError::Transform { ref coordinate, .. } if coordinate == &vec![0.0, 90.0]);
        assert_eq!(coords, vec![(10.0, 10.0), (0.0, 90.0), (20.0, 20.0)]);

        let mut coords = vec![(10.0, 10.0), (20.0, 20.0)];
        transformer
            .forward_array(&mut coords, AxisPolicy::LonLat)
            .unwrap();
        transformer
            .inverse_array(&mut coords, AxisPolicy::LonLat)
            .unwrap();
        assert_relative_eq!(coords[1].0, 20.0, epsilon = 1e-9);
        assert_relative_eq!(coords[1].1, 20.0, epsilon = 1e-9);

        let mut empty: Vec<(f64, f64)> = vec![];
        assert!(transformer.forward_array(&mut empty, AxisPolicy::Raw).is_ok());
    }

    #[test]
    fn test_batch_failure_location() {
        let finite = [pj_coord([1.0, 2.0, 0.0]), pj_coord([3.0, 4.0, 0.0])];
        assert_eq!(batch_failure(&Ok(()), &finite), None);
        assert_eq!(
            batch_failure(&Err("generic error".to_string()), &finite),
            Some(BatchFailure::Array("generic error".to_string()))
        );

        let partial = [pj_coord([1.0, 2.0, 0.0]), pj_coord([f64::INFINITY, f64::INFINITY, 0.0])];
        assert_eq!(
            batch_failure(&Err("generic error".to_string()), &partial),
            Some(BatchFailure::Coordinate(1))
        );
        assert_eq!(batch_failure(&Ok(()), &partial), Some(BatchFailure::Coordinate(1)));
    }

    #[test]
    fn test_source_and_target_crs() {
        let transformer = Transformer::new_known_crs("EPSG:4326", "EPSG:3857").unwrap();
        let source = transformer.source_crs().unwrap().unwrap();
        assert_eq!(source.identify_epsg().unwrap().as_deref(), Some("EPSG:4326"));
        let target = transformer.target_crs().unwrap().unwrap();
        assert_eq!(target.identify_epsg().unwrap().as_deref(), Some("EPSG:3857"));

        let operation = Transformer::new("+proj=webmerc").unwrap();
        assert!(operation.source_crs().unwrap().is_none());
    }

    #[test]
    fn test_factors() {
        let transformer = Transformer::new_known_crs("EPSG:4326", "EPSG:3395").unwrap();
        let factors = transformer.factors(10.0, 20.0).unwrap();
        assert!(factors.meridional_scale > 1.0);
        assert_relative_eq!(factors.meridional_scale, factors.parallel_scale, epsilon = 1e-6);

        let geographic = Transformer::new_known_crs("EPSG:4326", "EPSG:4258").unwrap();
        assert_matches!(
            geographic.factors(10.0, 20.0),
            Err(ProjError::FactorsUnavailable { .. })
        );
    }

    #[test]
    fn test_factors_at_projected_source() {
        let transformer = Transformer::new_known_crs("EPSG:3857", "EPSG:4326").unwrap();
        let factors = transformer.factors(10.0, 20.0).unwrap();
        let expected = Transformer::new("EPSG:3857").unwrap().factors(10.0, 20.0).unwrap();
        assert_relative_eq!(factors.meridional_scale, expected.meridional_scale, epsilon = 1e-9);
        assert_relative_eq!(factors.areal_scale, expected.areal_scale, epsilon = 1e-9);
    }

    #[test]
    fn test_portable_round_trip() {
        for transformer in [
            Transformer::new("EPSG:3857").unwrap(),
            Transformer::new_known_crs("EPSG:4326", "EPSG:3395").unwrap(),
        ] {
            let portable = transformer.to_portable_string().unwrap();
            let restored = Transformer::from_portable_string(&portable).unwrap();
            assert_eq!(restored.axis_transform(), transformer.axis_transform());

            let expected: (f64, f64) = transformer.forward((10.0, 50.0)).unwrap();
            let actual: (f64, f64) = restored.forward((10.0, 50.0)).unwrap();
            assert_relative_eq!(actual.0, expected.0, epsilon = 1e-6);
            assert_relative_eq!(actual.1, expected.1, epsilon = 1e-6);

            let expected = transformer.factors(10.0, 50.0).unwrap();
            let actual = restored.factors(10.0, 50.0).unwrap();
            assert_relative_eq!(actual.meridional_scale, expected.meridional_scale, epsilon = 1e-9);
        }

        let operation = Transformer::new("+proj=webmerc").unwrap();
        let restored =
            Transformer::from_portable_string(&operation.to_portable_string().unwrap()).unwrap();
        assert!(restored.axis_transform().source.radians);

        assert_matches!(
            Transformer::from_portable_string("EPSG:4326\nEPSG:3857\nEPSG:3395"),
            Err(ProjError::Definition { .. })
        );
    }

    #[test]
    fn test_shared_between_threads() {
        let transformer = Transformer::new_known_crs("EPSG:4326", "EPSG:3857").unwrap();
        std::thread::scope(|scope| {
            for i in 0..4 {
                let transformer = &transformer;
                scope.spawn(move || {
                    for j in 0..100 {
                        let lon = (i * 100 + j) as f64 * 0.1;
                        let projected = transformer.forward((lon, 10.0)).unwrap();
                        let (back, _) = transformer.inverse(projected).unwrap();
                        assert_relative_eq!(back, lon, epsilon = 1e-9);
                    }
                });
            }
        });
    }
}
