//! barrier — barrier-aware correction of predicted tracks.
//!
//! Purpose
//! -------
//! Keep predicted tracks out of forbidden regions (land). `geometry`
//! validates the polygon set and provides the planar predicates; `router`
//! detects offending runs and replaces them with boundary-following
//! detours whose state stays plausible under the fitted dynamics.
//!
//! Conventions
//! -----------
//! - Boundary points count as outside: only strictly interior points are
//!   violations.
//! - The geometry is immutable and freely shareable across concurrent
//!   router invocations.
//! - Residual intersections after the pass budget are reported via
//!   [`errors::BarrierError::Unresolved`], never dropped.

pub mod errors;
pub mod geometry;
pub mod router;

pub use self::errors::{BarrierError, BarrierResult};
pub use self::geometry::{BarrierGeometry, BarrierPolygon};
pub use self::router::{correct_track, RouterOptions};
