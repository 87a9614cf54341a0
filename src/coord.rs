use num_traits::Float;
use std::fmt::Debug;

/// Floating point type usable as a coordinate component.
pub trait CoordinateType: Float + Copy + PartialOrd + Debug {}
impl<T: Float + Copy + PartialOrd + Debug> CoordinateType for T {}

/// A coordinate tuple: two horizontal components and an optional height.
///
/// Anything implementing this trait can be passed to the transform functions. Implemented
/// for `(T, T)`, `(T, T, T)`, `[T; 2]`, `[T; 3]` and, with the `geo-types` feature, for
/// `geo_types::Coord` and `geo_types::Point`.
///
/// A missing height is sent to libproj as `0` and dropped again from the result.
pub trait Coord<T>
where
    T: CoordinateType,
{
    fn x(&self) -> T;
    fn y(&self) -> T;
    fn z(&self) -> Option<T> {
        None
    }
    fn from_xyz(x: T, y: T, z: Option<T>) -> Self;
}

impl<T: CoordinateType> Coord<T> for (T, T) {
    fn x(&self) -> T {
        self.0
    }
    fn y(&self) -> T {
        self.1
    }
    fn from_xyz(x: T, y: T, _z: Option<T>) -> Self {
        (x, y)
    }
}

impl<T: CoordinateType> Coord<T> for (T, T, T) {
    fn x(&self) -> T {
        self.0
    }
    fn y(&self) -> T {
        self.1
    }
    fn z(&self) -> Option<T> {
        Some(self.2)
    }
    fn from_xyz(x: T, y: T, z: Option<T>) -> Self {
        (x, y, z.unwrap_or_else(T::zero))
    }
}

impl<T: CoordinateType> Coord<T> for [T; 2] {
    fn x(&self) -> T {
        self[0]
    }
    fn y(&self) -> T {
        self[1]
    }
    fn from_xyz(x: T, y: T, _z: Option<T>) -> Self {
        [x, y]
    }
}

impl<T: CoordinateType> Coord<T> for [T; 3] {
    fn x(&self) -> T {
        self[0]
    }
    fn y(&self) -> T {
        self[1]
    }
    fn z(&self) -> Option<T> {
        Some(self[2])
    }
    fn from_xyz(x: T, y: T, z: Option<T>) -> Self {
        [x, y, z.unwrap_or_else(T::zero)]
    }
}

fn to_f64<T: CoordinateType>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

fn from_f64<T: CoordinateType>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::nan)
}

/// The three components sent to libproj, height defaulting to zero.
pub(crate) fn to_raw<T: CoordinateType, C: Coord<T>>(coord: &C) -> [f64; 3] {
    [
        to_f64(coord.x()),
        to_f64(coord.y()),
        coord.z().map(to_f64).unwrap_or(0.0),
    ]
}

/// The components the caller supplied, for error reporting.
pub(crate) fn components<T: CoordinateType, C: Coord<T>>(coord: &C) -> Vec<f64> {
    let mut out = vec![to_f64(coord.x()), to_f64(coord.y())];
    if let Some(z) = coord.z() {
        out.push(to_f64(z));
    }
    out
}

/// Rebuild a caller's coordinate from libproj output; the height survives only if the
/// input carried one.
pub(crate) fn from_raw<T: CoordinateType, C: Coord<T>>(raw: [f64; 3], has_z: bool) -> C {
    let z = has_z.then(|| from_f64(raw[2]));
    C::from_xyz(from_f64(raw[0]), from_f64(raw[1]), z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_height_defaults_to_zero() {
        assert_eq!(to_raw(&(1.0f64, 2.0f64)), [1.0, 2.0, 0.0]);
        assert_eq!(to_raw(&[1.0f32, 2.0, 3.0]), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_height_is_dropped_when_absent() {
        let xy: (f64, f64) = from_raw([1.0, 2.0, 99.0], false);
        assert_eq!(xy, (1.0, 2.0));
        let xyz: (f32, f32, f32) = from_raw([1.0, 2.0, 3.0], true);
        assert_eq!(xyz, (1.0, 2.0, 3.0));
    }

    #[test]
    fn test_components() {
        assert_eq!(components(&(1.0f64, 2.0f64)), vec![1.0, 2.0]);
        assert_eq!(components(&(1.0f64, 2.0f64, 3.0f64)), vec![1.0, 2.0, 3.0]);
    }
}
