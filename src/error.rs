//! Error types for city generation

use std::fmt;

/// Errors that can occur during city generation or configuration
///
/// The four geometry errors are retryable: the generator catches them,
/// reseeds its random stream and rebuilds from scratch. They only reach
/// the caller once the retry budget is exhausted, wrapped in
/// `GenerationFailed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// The walled area produced no usable gate candidate
    BadWalledArea,
    /// No street could be routed from a gate to the city center
    UnableToBuildStreet,
    /// The citadel patch is too elongated to host a castle
    BadCitadelShape,
    /// A patch collapsed below three distinct vertices
    DegeneratePatch,
    /// Every build attempt failed
    GenerationFailed {
        /// Number of attempts made before giving up
        attempts: u32,
    },
}

impl fmt::Display for CityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CityError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            CityError::BadWalledArea => write!(f, "bad walled area shape"),
            CityError::UnableToBuildStreet => write!(f, "unable to build a street"),
            CityError::BadCitadelShape => write!(f, "bad citadel shape"),
            CityError::DegeneratePatch => write!(f, "degenerate patch"),
            CityError::GenerationFailed { attempts } => {
                write!(f, "generation failed after {} attempts", attempts)
            }
        }
    }
}

impl std::error::Error for CityError {}

/// Result type alias for city generation operations
pub type Result<T> = std::result::Result<T, CityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CityError::InvalidConfig("bad".to_string()).to_string(),
            "invalid configuration: bad"
        );
        assert_eq!(
            CityError::GenerationFailed { attempts: 10 }.to_string(),
            "generation failed after 10 attempts"
        );
    }
}
