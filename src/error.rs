use std::{ffi, str};
use thiserror::Error;

/// Errors raised by descriptors, transformers and the factors engine.
///
/// Every variant carries the input that caused it, so a failure can be diagnosed without
/// re-deriving the call that produced it. None of them are retried or recovered internally.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProjError {
    /// A definition string is invalid or refers to an unknown authority/code.
    #[error("invalid definition {definition:?}: {message}")]
    Definition { definition: String, message: String },

    /// No coordinate operation connects the two CRSs.
    #[error("no coordinate operation from {source_crs:?} to {target_crs:?}: {message}")]
    NoOperationFound {
        source_crs: String,
        target_crs: String,
        message: String,
    },

    /// A serialization format is unknown or unavailable in the linked libproj.
    #[error("unsupported format {format:?}: {message}")]
    UnsupportedFormat { format: String, message: String },

    /// A coordinate could not be transformed (domain violation, missing grid, singular point).
    #[error("could not transform {coordinate:?}: {message}")]
    Transform { coordinate: Vec<f64>, message: String },

    /// libproj rejected a batch without marking which of its coordinates failed.
    #[error("could not transform a batch of {count} coordinates: {message}")]
    TransformArray { count: usize, message: String },

    /// Local derivatives could not be evaluated at the requested point.
    #[error("distortion factors unavailable at lon={lon}, lat={lat}: {message}")]
    FactorsUnavailable { lon: f64, lat: f64, message: String },

    #[error("a nul byte was found in {input:?}")]
    ArgumentNul {
        input: String,
        #[source]
        source: ffi::NulError,
    },

    #[error("libproj returned text that is not valid UTF-8")]
    Utf8(#[from] str::Utf8Error),
}

/// Failure to create a native PROJ object.
#[derive(Error, Debug)]
pub(crate) enum PjCreateError {
    #[error("A nul byte was found in the PROJ string definition or CRS argument: {0}")]
    ArgumentNulError(ffi::NulError),
    #[error("The underlying PROJ call failed: {0}")]
    ProjError(String),
    #[error("A UTF8 error occurred when constructing a PROJ error message")]
    ProjErrorMessageUtf8Error(str::Utf8Error),
}

impl PjCreateError {
    /// Convert into the public error for `input`, using `kind` to classify libproj failures.
    pub fn into_error(self, input: &str, kind: impl FnOnce(String) -> ProjError) -> ProjError {
        match self {
            PjCreateError::ArgumentNulError(source) => ProjError::ArgumentNul {
                input: input.to_string(),
                source,
            },
            PjCreateError::ProjError(message) => kind(message),
            PjCreateError::ProjErrorMessageUtf8Error(err) => ProjError::Utf8(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_messages_carry_input() {
        let err = ProjError::Transform {
            coordinate: vec![1.0, 2.0],
            message: "point outside of projection domain".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "could not transform [1.0, 2.0]: point outside of projection domain"
        );

        let err = ProjError::NoOperationFound {
            source_crs: "EPSG:4326".to_string(),
            target_crs: "ENGCRS[...]".to_string(),
            message: "no operation found".to_string(),
        };
        assert!(err.to_string().contains("\"EPSG:4326\""));

        let err = ProjError::TransformArray {
            count: 3,
            message: "generic error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "could not transform a batch of 3 coordinates: generic error"
        );
    }

    #[test]
    fn test_create_error_classification() {
        let err = PjCreateError::ProjError("crs not found".to_string())
            .into_error("EPSG:0", |message| ProjError::Definition {
                definition: "EPSG:0".to_string(),
                message,
            });
        assert_matches!(err, ProjError::Definition { ref definition, .. } if definition == "EPSG:0");

        let nul = ffi::CString::new("a\0b").unwrap_err();
        let err = PjCreateError::ArgumentNulError(nul).into_error("a\0b", |message| {
            ProjError::Definition {
                definition: String::new(),
                message,
            }
        });
        assert_matches!(err, ProjError::ArgumentNul { .. });
    }
}
