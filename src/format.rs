use crate::ProjError;
use crate::info::Projinfo;
use std::fmt;
use std::str::FromStr;

/// Textual serialization formats for CRS definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Format {
    Wkt2_2015,
    Wkt2_2015Simplified,
    /// WKT2:2018, published by libproj as WKT2:2019.
    Wkt2_2018,
    Wkt2_2018Simplified,
    Wkt1Gdal,
    Wkt1Esri,
    ProjJson,
    /// PROJ string (`+proj=... +type=crs`).
    ProjString,
}

impl Format {
    pub const ALL: [Format; 8] = [
        Format::Wkt2_2015,
        Format::Wkt2_2015Simplified,
        Format::Wkt2_2018,
        Format::Wkt2_2018Simplified,
        Format::Wkt1Gdal,
        Format::Wkt1Esri,
        Format::ProjJson,
        Format::ProjString,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Format::Wkt2_2015 => "WKT2_2015",
            Format::Wkt2_2015Simplified => "WKT2_2015_SIMPLIFIED",
            Format::Wkt2_2018 => "WKT2_2018",
            Format::Wkt2_2018Simplified => "WKT2_2018_SIMPLIFIED",
            Format::Wkt1Gdal => "WKT1_GDAL",
            Format::Wkt1Esri => "WKT1_ESRI",
            Format::ProjJson => "PROJJSON",
            Format::ProjString => "PROJ",
        }
    }

    /// The libproj WKT dialect, or `None` for the non-WKT formats.
    pub(crate) fn wkt_type(&self) -> Option<proj_sys::PJ_WKT_TYPE> {
        match self {
            Format::Wkt2_2015 => Some(proj_sys::PJ_WKT_TYPE_PJ_WKT2_2015),
            Format::Wkt2_2015Simplified => Some(proj_sys::PJ_WKT_TYPE_PJ_WKT2_2015_SIMPLIFIED),
            Format::Wkt2_2018 => Some(proj_sys::PJ_WKT_TYPE_PJ_WKT2_2019),
            Format::Wkt2_2018Simplified => Some(proj_sys::PJ_WKT_TYPE_PJ_WKT2_2019_SIMPLIFIED),
            Format::Wkt1Gdal => Some(proj_sys::PJ_WKT_TYPE_PJ_WKT1_GDAL),
            Format::Wkt1Esri => Some(proj_sys::PJ_WKT_TYPE_PJ_WKT1_ESRI),
            Format::ProjJson | Format::ProjString => None,
        }
    }

    /// Whether the format describes CRS objects only (everything but PROJ strings).
    pub(crate) fn requires_crs(&self) -> bool {
        *self != Format::ProjString
    }

    /// Oldest libproj release that writes this format.
    fn introduced_in(&self) -> (i32, i32) {
        match self {
            Format::Wkt2_2018 | Format::Wkt2_2018Simplified => (6, 0),
            Format::ProjJson => (6, 2),
            _ => (6, 0),
        }
    }

    /// Fail with [`ProjError::UnsupportedFormat`] if `library` cannot write this format.
    pub fn check_supported(&self, library: &Projinfo) -> Result<(), ProjError> {
        let (major, minor) = self.introduced_in();
        if library.at_least(major, minor) {
            Ok(())
        } else {
            Err(ProjError::UnsupportedFormat {
                format: self.name().to_string(),
                message: format!(
                    "requires PROJ {major}.{minor} or later, linked version is {}",
                    library.version
                ),
            })
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = ProjError;

    /// Parse a format name, ignoring case and treating `-` like `_`.
    /// `WKT2_2019` is accepted as an alias of `WKT2_2018`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        let format = match normalized.as_str() {
            "WKT2_2015" => Format::Wkt2_2015,
            "WKT2_2015_SIMPLIFIED" => Format::Wkt2_2015Simplified,
            "WKT2_2018" | "WKT2_2019" => Format::Wkt2_2018,
            "WKT2_2018_SIMPLIFIED" | "WKT2_2019_SIMPLIFIED" => Format::Wkt2_2018Simplified,
            "WKT1_GDAL" => Format::Wkt1Gdal,
            "WKT1_ESRI" => Format::Wkt1Esri,
            "PROJJSON" => Format::ProjJson,
            "PROJ" | "PROJ_STRING" => Format::ProjString,
            _ => {
                return Err(ProjError::UnsupportedFormat {
                    format: s.to_string(),
                    message: "unknown format name".to_string(),
                });
            }
        };
        Ok(format)
    }
}

/// Objects that can be written out as WKT, PROJJSON or a PROJ string, and restored from
/// their portable (WKT) form.
pub trait Serializable {
    /// Serialize to `format`. `Ok(None)` means the object has no representation in that
    /// format (for example a bare operation has no WKT CRS).
    fn serialize(&self, format: Format) -> Result<Option<String>, ProjError>;

    /// Durable form of the object, suitable for storage or for crossing a process boundary.
    fn to_portable_string(&self) -> Result<String, ProjError>;

    /// Rebuild an operationally equivalent object from [`Serializable::to_portable_string`]
    /// output.
    fn from_portable_string(portable: &str) -> Result<Self, ProjError>
    where
        Self: Sized;
}
