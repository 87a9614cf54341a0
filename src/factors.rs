use std::mem;

/// Number of fields in a [`Factors`] record.
pub const FACTORS_FIELDS: usize = 12;

/// Size in bytes of the binary factors record: twelve doubles in declaration order, in the
/// host's native byte order.
pub const FACTORS_BYTES: usize = FACTORS_FIELDS * mem::size_of::<f64>();

const _: () = assert!(mem::size_of::<proj_sys::PJ_FACTORS>() == FACTORS_BYTES);

/// Local distortion of a map projection at one geographic point.
///
/// Scale fields are ratios, angles are in radians, and the partial derivatives are taken
/// with respect to longitude (`lam`) and latitude (`phi`) in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Factors {
    pub meridional_scale: f64,
    pub parallel_scale: f64,
    pub areal_scale: f64,
    pub angular_distortion: f64,
    pub meridian_parallel_angle: f64,
    pub meridian_convergence: f64,
    pub tissot_semimajor: f64,
    pub tissot_semiminor: f64,
    pub dx_dlam: f64,
    pub dx_dphi: f64,
    pub dy_dlam: f64,
    pub dy_dphi: f64,
}

impl Factors {
    /// Field names in record order.
    pub const FIELD_NAMES: [&'static str; FACTORS_FIELDS] = [
        "meridional_scale",
        "parallel_scale",
        "areal_scale",
        "angular_distortion",
        "meridian_parallel_angle",
        "meridian_convergence",
        "tissot_semimajor",
        "tissot_semiminor",
        "dx_dlam",
        "dx_dphi",
        "dy_dlam",
        "dy_dphi",
    ];

    pub fn from_array(values: [f64; FACTORS_FIELDS]) -> Self {
        let [
            meridional_scale,
            parallel_scale,
            areal_scale,
            angular_distortion,
            meridian_parallel_angle,
            meridian_convergence,
            tissot_semimajor,
            tissot_semiminor,
            dx_dlam,
            dx_dphi,
            dy_dlam,
            dy_dphi,
        ] = values;
        Factors {
            meridional_scale,
            parallel_scale,
            areal_scale,
            angular_distortion,
            meridian_parallel_angle,
            meridian_convergence,
            tissot_semimajor,
            tissot_semiminor,
            dx_dlam,
            dx_dphi,
            dy_dlam,
            dy_dphi,
        }
    }

    pub fn to_array(&self) -> [f64; FACTORS_FIELDS] {
        [
            self.meridional_scale,
            self.parallel_scale,
            self.areal_scale,
            self.angular_distortion,
            self.meridian_parallel_angle,
            self.meridian_convergence,
            self.tissot_semimajor,
            self.tissot_semiminor,
            self.dx_dlam,
            self.dx_dphi,
            self.dy_dlam,
            self.dy_dphi,
        ]
    }

    /// Decode a record from its native-endian binary form.
    pub fn from_ne_bytes(buf: &[u8; FACTORS_BYTES]) -> Self {
        let mut values = [0.0; FACTORS_FIELDS];
        for (value, chunk) in values.iter_mut().zip(buf.chunks_exact(mem::size_of::<f64>())) {
            let mut bytes = [0u8; mem::size_of::<f64>()];
            bytes.copy_from_slice(chunk);
            *value = f64::from_ne_bytes(bytes);
        }
        Factors::from_array(values)
    }

    pub fn to_ne_bytes(&self) -> [u8; FACTORS_BYTES] {
        let mut buf = [0u8; FACTORS_BYTES];
        for (chunk, value) in buf
            .chunks_exact_mut(mem::size_of::<f64>())
            .zip(self.to_array())
        {
            chunk.copy_from_slice(&value.to_ne_bytes());
        }
        buf
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl From<proj_sys::PJ_FACTORS> for Factors {
    fn from(raw: proj_sys::PJ_FACTORS) -> Self {
        // Safety: `PJ_FACTORS` is a `#[repr(C)]` struct of exactly twelve doubles, declared in
        // the same order as `Factors`, so its bytes are the native-endian record.
        let buf: [u8; FACTORS_BYTES] = unsafe { mem::transmute(raw) };
        Factors::from_ne_bytes(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Factors {
        Factors::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0])
    }

    #[test]
    fn test_decode_from_native_buffer() {
        let mut buf = [0u8; FACTORS_BYTES];
        for (i, chunk) in buf.chunks_exact_mut(8).enumerate() {
            chunk.copy_from_slice(&((i + 1) as f64).to_ne_bytes());
        }
        let factors = Factors::from_ne_bytes(&buf);
        assert_eq!(factors, sample());
        assert_eq!(factors.to_ne_bytes(), buf);
    }

    #[test]
    fn test_from_pj_factors_keeps_field_order() {
        let raw = proj_sys::PJ_FACTORS {
            meridional_scale: 1.0,
            parallel_scale: 2.0,
            areal_scale: 3.0,
            angular_distortion: 4.0,
            meridian_parallel_angle: 5.0,
            meridian_convergence: 6.0,
            tissot_semimajor: 7.0,
            tissot_semiminor: 8.0,
            dx_dlam: 9.0,
            dx_dphi: 10.0,
            dy_dlam: 11.0,
            dy_dphi: 12.0,
        };
        assert_eq!(Factors::from(raw), sample());
    }

    #[test]
    fn test_is_finite() {
        assert!(sample().is_finite());
        let mut factors = sample();
        factors.dy_dphi = f64::INFINITY;
        assert!(!factors.is_finite());
    }
}
