use crate::axis::AxisPolicy;
use crate::coord::{Coord, CoordinateType};
use crate::transformer::{Direction, Transformer};
use crate::ProjError;

/// Transform a geometry through a [`Transformer`].
///
/// Transforms are all-or-nothing: if any coordinate of the geometry fails, the geometry is
/// left untouched and the error names the failing coordinate.
pub trait Transform<T> {
    type Output;

    /// Transform a geometry by mutating it in place.
    ///
    #[cfg_attr(feature = "geo-types", doc = r##"
# Examples

```
use simple_proj::{AxisPolicy, Direction, Transform, Transformer};
# use approx::assert_relative_eq;

let mut point = geo_types::point!(x: 135.0, y: 35.0);
let webmerc = Transformer::new("EPSG:3857").unwrap();
point.transform(&webmerc, Direction::Forward, AxisPolicy::LonLat).unwrap();

assert_relative_eq!(
    point,
    geo_types::point!(x: 15028131.257091932, y: 4163881.144064294),
    epsilon = 1e-6
);
```
"##)]
    fn transform(
        &mut self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<(), ProjError>;

    /// Immutable flavor of [`Transform::transform`], which allocates a new geometry.
    fn transformed(
        &self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<Self::Output, ProjError>;

    /// Transform a geometry given as `(longitude, latitude)` or `(easting, northing)` from
    /// one CRS to another.
    ///
    #[cfg_attr(feature = "geo-types", doc = r##"
# Examples

```
use simple_proj::Transform;
use geo_types::{point, Point};
# use approx::assert_relative_eq;

let mut point: Point<f64> = point!(x: 135.0, y: 35.0);
point.transform_crs_to_crs("EPSG:4326", "EPSG:3857").unwrap();

assert_relative_eq!(point, point!(x: 15028131.257091932, y: 4163881.144064294), epsilon = 1e-6);
```
"##)]
    fn transform_crs_to_crs(&mut self, source_crs: &str, target_crs: &str) -> Result<(), ProjError> {
        let transformer = Transformer::new_known_crs(source_crs, target_crs)?;
        self.transform(&transformer, Direction::Forward, AxisPolicy::LonLat)
    }

    /// Immutable flavor of [`Transform::transform_crs_to_crs`], which allocates a new
    /// geometry.
    fn transformed_crs_to_crs(
        &self,
        source_crs: &str,
        target_crs: &str,
    ) -> Result<Self::Output, ProjError> {
        let transformer = Transformer::new_known_crs(source_crs, target_crs)?;
        self.transformed(&transformer, Direction::Forward, AxisPolicy::LonLat)
    }
}

impl<T, C> Transform<T> for [C]
where
    T: CoordinateType,
    C: Coord<T> + Clone,
{
    type Output = Vec<C>;

    fn transform(
        &mut self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<(), ProjError> {
        transformer.transform_array(direction, self, policy)
    }

    fn transformed(
        &self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<Vec<C>, ProjError> {
        let mut output = self.to_vec();
        output.transform(transformer, direction, policy)?;
        Ok(output)
    }
}

impl<T, C> Transform<T> for Vec<C>
where
    T: CoordinateType,
    C: Coord<T> + Clone,
{
    type Output = Vec<C>;

    fn transform(
        &mut self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<(), ProjError> {
        self.as_mut_slice().transform(transformer, direction, policy)
    }

    fn transformed(
        &self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<Vec<C>, ProjError> {
        self.as_slice().transformed(transformer, direction, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;

    #[test]
    fn test_transform_vec() {
        let webmerc = Transformer::new("EPSG:3857").unwrap();
        let points = vec![[135.0, 35.0], [0.0, 0.0]];
        let projected = points
            .transformed(&webmerc, Direction::Forward, AxisPolicy::LonLat)
            .unwrap();
        assert_relative_eq!(projected[0][0], 15028131.257091932, epsilon = 1e-6);
        assert_relative_eq!(projected[0][1], 4163881.144064294, epsilon = 1e-6);
        assert_relative_eq!(projected[1][0], 0.0, epsilon = 1e-6);
        // the original is untouched
        assert_eq!(points[0], [135.0, 35.0]);
    }

    #[test]
    fn test_transform_crs_to_crs() {
        let mut points = vec![(135.0, 35.0)];
        points.transform_crs_to_crs("EPSG:4326", "EPSG:3857").unwrap();
        assert_relative_eq!(points[0].0, 15028131.257091932, epsilon = 1e-6);
    }

    #[test]
    fn test_failure_leaves_geometry_untouched() {
        let merc = Transformer::new("+proj=merc +ellps=WGS84").unwrap();
        let mut points = vec![(1.0, 1.0), (0.0, 90.0)];
        let err = points
            .transform(&merc, Direction::Forward, AxisPolicy::LonLat)
            .unwrap_err();
        assert_matches!(err, ProjError::Transform { .. });
        assert_eq!(points, vec![(1.0, 1.0), (0.0, 90.0)]);
    }
}
