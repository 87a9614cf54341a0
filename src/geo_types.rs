use crate::axis::AxisPolicy;
use crate::coord::CoordinateType;
use crate::transform::Transform;
use crate::transformer::{Direction, Transformer};
use crate::ProjError;

///```rust
/// # use approx::assert_relative_eq;
/// use simple_proj::Transformer;
/// use geo_types::Coord;
///
/// let webmerc = Transformer::new("EPSG:3857").unwrap();
/// let result = webmerc.forward(Coord { x: 135.0f64, y: 35.0f64 }).unwrap();
/// assert_relative_eq!(result.x, 15028131.257091932, epsilon = 1e-6);
/// assert_relative_eq!(result.y, 4163881.144064294, epsilon = 1e-6);
/// ```
impl<T: CoordinateType> crate::Coord<T> for geo_types::Coord<T> {
    fn x(&self) -> T {
        self.x
    }
    fn y(&self) -> T {
        self.y
    }
    fn from_xyz(x: T, y: T, _z: Option<T>) -> Self {
        Self { x, y }
    }
}

///```rust
/// # use approx::assert_relative_eq;
/// use simple_proj::Transformer;
/// use geo_types::Point;
///
/// let to_webmerc = Transformer::new_known_crs("EPSG:4326", "EPSG:3857").unwrap();
/// let result = to_webmerc.forward(Point::new(135.0f64, 35.0f64)).unwrap();
/// assert_relative_eq!(result.x(), 15028131.257091932, epsilon = 1e-6);
/// assert_relative_eq!(result.y(), 4163881.144064294, epsilon = 1e-6);
/// ```
impl<T: CoordinateType> crate::Coord<T> for geo_types::Point<T> {
    fn x(&self) -> T {
        geo_types::Point::x(*self)
    }
    fn y(&self) -> T {
        geo_types::Point::y(*self)
    }
    fn from_xyz(x: T, y: T, _z: Option<T>) -> Self {
        Self::new(x, y)
    }
}

impl<T: CoordinateType> Transform<T> for geo_types::Coord<T> {
    type Output = Self;

    fn transform(
        &mut self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<(), ProjError> {
        *self = transformer.convert(direction, *self, policy)?;
        Ok(())
    }

    fn transformed(
        &self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<Self, ProjError> {
        transformer.convert(direction, *self, policy)
    }
}

impl<T: CoordinateType> Transform<T> for geo_types::Point<T> {
    type Output = Self;

    fn transform(
        &mut self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<(), ProjError> {
        self.0.transform(transformer, direction, policy)
    }

    fn transformed(
        &self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<Self, ProjError> {
        Ok(geo_types::Point(self.0.transformed(transformer, direction, policy)?))
    }
}

impl<T: CoordinateType> Transform<T> for geo_types::LineString<T> {
    type Output = Self;

    fn transform(
        &mut self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<(), ProjError> {
        self.0.transform(transformer, direction, policy)
    }

    fn transformed(
        &self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<Self, ProjError> {
        Ok(geo_types::LineString(
            self.0.transformed(transformer, direction, policy)?,
        ))
    }
}

impl<T: CoordinateType> Transform<T> for geo_types::Polygon<T> {
    type Output = Self;

    fn transform(
        &mut self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<(), ProjError> {
        *self = self.transformed(transformer, direction, policy)?;
        Ok(())
    }

    fn transformed(
        &self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<Self, ProjError> {
        let exterior = self.exterior().transformed(transformer, direction, policy)?;
        let interiors = self
            .interiors()
            .iter()
            .map(|ring| ring.transformed(transformer, direction, policy))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(geo_types::Polygon::new(exterior, interiors))
    }
}

impl<T: CoordinateType> Transform<T> for geo_types::MultiPoint<T> {
    type Output = Self;

    fn transform(
        &mut self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<(), ProjError> {
        self.0.transform(transformer, direction, policy)
    }

    fn transformed(
        &self,
        transformer: &Transformer,
        direction: Direction,
        policy: AxisPolicy,
    ) -> Result<Self, ProjError> {
        Ok(geo_types::MultiPoint(
            self.0.transformed(transformer, direction, policy)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;
    use geo_types::{LineString, MultiPoint, Point, Polygon, line_string, point, polygon};

    fn to_webmerc() -> Transformer {
        Transformer::new_known_crs("EPSG:4326", "EPSG:3857").unwrap()
    }

    #[test]
    fn test_point() {
        let point: Point<f64> = point!(x: 135.0, y: 35.0);
        let projected = point
            .transformed(&to_webmerc(), Direction::Forward, AxisPolicy::LonLat)
            .unwrap();
        assert_relative_eq!(
            projected,
            point!(x: 15028131.257091932, y: 4163881.144064294),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_polygon_round_trip() {
        let transformer = to_webmerc();
        let original: Polygon<f64> = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 0.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 1.0)]],
        );
        let mut polygon = original.clone();
        polygon
            .transform(&transformer, Direction::Forward, AxisPolicy::LonLat)
            .unwrap();
        assert_relative_eq!(polygon.exterior().0[1].x, 1113194.9079327357, epsilon = 1e-6);
        polygon
            .transform(&transformer, Direction::Inverse, AxisPolicy::LonLat)
            .unwrap();
        assert_relative_eq!(polygon, original, epsilon = 1e-9);
    }

    #[test]
    fn test_line_string_failure_is_atomic() {
        let merc = Transformer::new("+proj=merc +ellps=WGS84").unwrap();
        let mut line: LineString<f64> = line_string![(x: 1.0, y: 1.0), (x: 2.0, y: 90.0)];
        let err = line
            .transform(&merc, Direction::Forward, AxisPolicy::LonLat)
            .unwrap_err();
        assert_matches!(err, ProjError::Transform { ref coordinate, .. } if coordinate == &vec![2.0, 90.0]);
        assert_eq!(line, line_string![(x: 1.0, y: 1.0), (x: 2.0, y: 90.0)]);
    }

    #[test]
    fn test_multi_point_latlon() {
        let transformer = to_webmerc();
        let points: MultiPoint<f64> = vec![point!(x: 35.0, y: 135.0)].into();
        let projected = points
            .transformed(&transformer, Direction::Forward, AxisPolicy::LatLon)
            .unwrap();
        assert_relative_eq!(projected.0[0].x(), 15028131.257091932, epsilon = 1e-6);
    }
}
