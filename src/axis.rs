//! Axis order metadata and the adaptation of coordinate tuples between the caller's order
//! and the order a resolved pipeline expects.
//!
//! Three calling conventions exist, selected with [`AxisPolicy`]:
//!
//! - [`AxisPolicy::Raw`]: values are already in the pipeline's native axis order and
//!   angular unit (radians for operations that take angles in radians);
//! - [`AxisPolicy::LonLat`]: geographic values are `(longitude, latitude)` in degrees and
//!   projected values are `(easting, northing)`, whatever the CRS declares;
//! - [`AxisPolicy::LatLon`]: as `LonLat`, but every geographic end is presented as
//!   `(latitude, longitude)`.
//!
//! Mixing conventions (for example passing already swapped values with `LonLat`) gives
//! geometrically wrong output without an error.

/// The meaning of one coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Easting,
    Northing,
    Longitude,
    Latitude,
    /// Geocentric, vertical or otherwise unclassified axis.
    Other,
}

impl Axis {
    /// Classify an axis from its libproj direction (`"east"`, `"north"`, ...).
    pub fn from_direction(direction: &str, angular: bool) -> Axis {
        match (direction.to_ascii_lowercase().as_str(), angular) {
            ("east" | "west", true) => Axis::Longitude,
            ("north" | "south", true) => Axis::Latitude,
            ("east" | "west", false) => Axis::Easting,
            ("north" | "south", false) => Axis::Northing,
            _ => Axis::Other,
        }
    }
}

/// Unit of the horizontal axes of a CRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisUnit {
    Degrees,
    Radians,
    Linear,
}

/// Which axis occupies the first and second position of a CRS, and in which unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisOrder {
    pub unit: AxisUnit,
    pub order: [Axis; 2],
}

impl AxisOrder {
    /// Geographic longitude/latitude in degrees.
    pub const LON_LAT: AxisOrder = AxisOrder {
        unit: AxisUnit::Degrees,
        order: [Axis::Longitude, Axis::Latitude],
    };

    /// Projected easting/northing in linear units.
    pub const EAST_NORTH: AxisOrder = AxisOrder {
        unit: AxisUnit::Linear,
        order: [Axis::Easting, Axis::Northing],
    };

    /// Axis order of an object that carries no CRS metadata, guessed from its definition:
    /// `latlong`-style PROJ strings are longitude/latitude in degrees, anything else is
    /// easting/northing.
    pub fn from_definition(definition: &str) -> AxisOrder {
        let geographic = definition
            .split_whitespace()
            .map(|token| token.trim_start_matches('+'))
            .filter_map(|token| token.strip_prefix("proj="))
            .any(|name| matches!(name, "latlong" | "longlat" | "latlon" | "lonlat"));
        if geographic {
            AxisOrder::LON_LAT
        } else {
            AxisOrder::EAST_NORTH
        }
    }

    /// Whether the horizontal axes are angles.
    pub fn is_angular(&self) -> bool {
        self.unit != AxisUnit::Linear
    }

    /// Whether the CRS puts its northern axis first (`lat, lon` or `northing, easting`).
    pub fn is_north_first(&self) -> bool {
        matches!(self.order[0], Axis::Latitude | Axis::Northing)
    }
}

/// Calling convention of a transform call. See the [module documentation](self).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AxisPolicy {
    Raw,
    #[default]
    LonLat,
    LatLon,
}

/// One end of a pipeline: the axes declared by its CRS and whether libproj reads or
/// writes angles there in radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub axes: AxisOrder,
    pub radians: bool,
}

/// Axis handling for both ends of a resolved pipeline, fixed when the pipeline is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisTransform {
    pub source: Endpoint,
    pub target: Endpoint,
}

impl AxisTransform {
    /// Input and output endpoints for a call in `direction`.
    pub fn endpoints(&self, direction: crate::Direction) -> (Endpoint, Endpoint) {
        match direction {
            crate::Direction::Forward => (self.source, self.target),
            crate::Direction::Inverse => (self.target, self.source),
        }
    }
}

/// Reorder and unit-convert a caller's tuple into the order the pipeline expects at
/// `endpoint`.
pub fn to_pipeline_order(coord: [f64; 3], endpoint: Endpoint, policy: AxisPolicy) -> [f64; 3] {
    let [mut a, mut b, z] = coord;
    if policy == AxisPolicy::Raw {
        return coord;
    }
    if policy == AxisPolicy::LatLon && endpoint.axes.is_angular() {
        std::mem::swap(&mut a, &mut b);
    }
    if endpoint.axes.is_north_first() {
        std::mem::swap(&mut a, &mut b);
    }
    if endpoint.radians {
        a = a.to_radians();
        b = b.to_radians();
    }
    [a, b, z]
}

/// Inverse of [`to_pipeline_order`]: adapt a pipeline's raw output at `endpoint` back
/// into the caller's convention.
pub fn from_pipeline_order(coord: [f64; 3], endpoint: Endpoint, policy: AxisPolicy) -> [f64; 3] {
    let [mut a, mut b, z] = coord;
    if policy == AxisPolicy::Raw {
        return coord;
    }
    if endpoint.radians {
        a = a.to_degrees();
        b = b.to_degrees();
    }
    if endpoint.axes.is_north_first() {
        std::mem::swap(&mut a, &mut b);
    }
    if policy == AxisPolicy::LatLon && endpoint.axes.is_angular() {
        std::mem::swap(&mut a, &mut b);
    }
    [a, b, z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LAT_LON: AxisOrder = AxisOrder {
        unit: AxisUnit::Degrees,
        order: [Axis::Latitude, Axis::Longitude],
    };

    fn endpoint(axes: AxisOrder, radians: bool) -> Endpoint {
        Endpoint { axes, radians }
    }

    #[test]
    fn test_from_direction() {
        assert_eq!(Axis::from_direction("east", true), Axis::Longitude);
        assert_eq!(Axis::from_direction("North", true), Axis::Latitude);
        assert_eq!(Axis::from_direction("east", false), Axis::Easting);
        assert_eq!(Axis::from_direction("south", false), Axis::Northing);
        assert_eq!(Axis::from_direction("up", false), Axis::Other);
        assert_eq!(Axis::from_direction("geocentricX", false), Axis::Other);
    }

    #[test]
    fn test_from_definition() {
        assert_eq!(AxisOrder::from_definition("+proj=latlong"), AxisOrder::LON_LAT);
        assert_eq!(
            AxisOrder::from_definition("proj=longlat datum=WGS84"),
            AxisOrder::LON_LAT
        );
        assert_eq!(AxisOrder::from_definition("+proj=webmerc"), AxisOrder::EAST_NORTH);
        assert_eq!(
            AxisOrder::from_definition("+proj=pipeline +step +proj=axisswap +order=2,1"),
            AxisOrder::EAST_NORTH
        );
    }

    #[test]
    fn test_raw_is_untouched() {
        let coord = [1.0, 2.0, 3.0];
        let lat_lon = endpoint(LAT_LON, true);
        assert_eq!(to_pipeline_order(coord, lat_lon, AxisPolicy::Raw), coord);
        assert_eq!(from_pipeline_order(coord, lat_lon, AxisPolicy::Raw), coord);
    }

    #[test]
    fn test_lonlat_into_latlon_crs() {
        let out = to_pipeline_order([135.0, 35.0, 0.0], endpoint(LAT_LON, false), AxisPolicy::LonLat);
        assert_eq!(out, [35.0, 135.0, 0.0]);
    }

    #[test]
    fn test_lonlat_into_radian_operation() {
        let out = to_pipeline_order(
            [135.0, 35.0, 7.0],
            endpoint(AxisOrder::LON_LAT, true),
            AxisPolicy::LonLat,
        );
        assert_relative_eq!(out[0], 135f64.to_radians());
        assert_relative_eq!(out[1], 35f64.to_radians());
        assert_eq!(out[2], 7.0);
    }

    #[test]
    fn test_latlon_swaps_only_geographic_ends() {
        let geographic = endpoint(AxisOrder::LON_LAT, false);
        let projected = endpoint(AxisOrder::EAST_NORTH, false);
        assert_eq!(
            to_pipeline_order([35.0, 135.0, 0.0], geographic, AxisPolicy::LatLon),
            [135.0, 35.0, 0.0]
        );
        assert_eq!(
            from_pipeline_order([10.0, 20.0, 0.0], projected, AxisPolicy::LatLon),
            [10.0, 20.0, 0.0]
        );
    }

    #[test]
    fn test_adaptation_inverts() {
        let endpoints = [
            endpoint(AxisOrder::LON_LAT, true),
            endpoint(LAT_LON, false),
            endpoint(LAT_LON, true),
            endpoint(AxisOrder::EAST_NORTH, false),
        ];
        for e in endpoints {
            for policy in [AxisPolicy::LonLat, AxisPolicy::LatLon] {
                let there = to_pipeline_order([12.5, -33.25, 4.0], e, policy);
                let back = from_pipeline_order(there, e, policy);
                assert_relative_eq!(back[0], 12.5, epsilon = 1e-12);
                assert_relative_eq!(back[1], -33.25, epsilon = 1e-12);
                assert_eq!(back[2], 4.0);
            }
        }
    }
}
