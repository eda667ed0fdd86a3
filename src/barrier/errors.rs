/// Result alias for the barrier layer.
pub type BarrierResult<T> = Result<T, BarrierError>;

/// Errors of the barrier geometry and router.
#[derive(Debug, Clone, PartialEq)]
pub enum BarrierError {
    /// A polygon needs at least three vertices.
    DegeneratePolygon { index: usize, vertices: usize },

    /// Polygon vertices must be finite.
    NonFiniteVertex { polygon: usize, vertex: usize },

    /// The outward nudge margin must be finite and non-negative.
    InvalidMargin { margin: f64 },

    /// The pass budget must be at least one.
    InvalidMaxPasses { max_passes: usize },

    /// Correction was requested on an empty track.
    EmptyTrack,

    /// Correction was requested with a fit whose status is failed. The
    /// spliced state blends the fitted process noise into the covariance,
    /// so an unfit model would produce meaningless corrections.
    UnfitModel,

    /// The pass budget was exhausted with residual barrier intersections.
    /// Each entry is the `(first, last)` index range of an offending run in
    /// the final track.
    Unresolved { runs: Vec<(usize, usize)> },
}

impl std::error::Error for BarrierError {}

impl std::fmt::Display for BarrierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BarrierError::DegeneratePolygon { index, vertices } => {
                write!(f, "polygon {index} has only {vertices} vertices; at least 3 required")
            }
            BarrierError::NonFiniteVertex { polygon, vertex } => {
                write!(f, "polygon {polygon} vertex {vertex} is non-finite")
            }
            BarrierError::InvalidMargin { margin } => {
                write!(f, "invalid nudge margin {margin}: must be finite and non-negative")
            }
            BarrierError::InvalidMaxPasses { max_passes } => {
                write!(f, "invalid pass budget {max_passes}: must be at least one")
            }
            BarrierError::EmptyTrack => {
                write!(f, "cannot correct an empty track")
            }
            BarrierError::UnfitModel => {
                write!(f, "model fit did not converge: barrier correction refused")
            }
            BarrierError::Unresolved { runs } => {
                write!(
                    f,
                    "barrier correction left {} unresolved run(s) after the pass budget: {runs:?}",
                    runs.len()
                )
            }
        }
    }
}
