//! Error types.

use thiserror::Error;

/// Errors produced by the nesting engine.
///
/// Unplaceable parts are not errors: they are reported in the run result.
#[derive(Debug, Error)]
pub enum Error {
    /// Polygon input that cannot form a valid part.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Sheet dimensions or spacing out of range.
    #[error("invalid sheet: {0}")]
    InvalidSheet(String),

    /// A configuration record holds an out-of-range value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A geometry backend required by the selected strategy was compiled out.
    #[error("strategy '{strategy}' requires {dependency}, which is not available in this build")]
    DependencyMissing {
        /// Strategy that was requested.
        strategy: String,
        /// Name of the missing backend.
        dependency: String,
    },

    /// Geometry the selected strategy cannot handle (e.g. concave parts under SAT).
    #[error("unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    /// Internal failure such as a poisoned lock.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_missing_message() {
        let err = Error::DependencyMissing {
            strategy: "Greedy".into(),
            dependency: "polygon boolean operations".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Greedy"));
        assert!(msg.contains("polygon boolean operations"));
    }
}
