//! barrier::router — boundary-following correction of predicted tracks.
//!
//! Purpose
//! -------
//! Post-process a smoothed [`Track`] against a [`BarrierGeometry`] so that
//! no point of the result lies strictly inside a barrier polygon. Maximal
//! runs of offending points and crossing segments are replaced by detours
//! that follow the barrier boundary between the run's entry and exit
//! crossings, with timestamps mapped onto the detour by arc length and the
//! state blended back toward the fitted dynamics.
//!
//! This is a deliberate approximation: refitting the state-space model
//! under a hard avoidance constraint is computationally prohibitive, so
//! the router performs a deterministic, bounded-cost local correction.
//!
//! Key behaviors
//! -------------
//! - Detour direction: both perimeter walks between entry and exit are
//!   measured; the shorter one wins, ties going to the ascending-vertex
//!   direction.
//! - Detour vertices are nudged outward by `margin` so corrected points sit
//!   strictly off the boundary and a second pass finds nothing to do
//!   (idempotence).
//! - Replaced points keep their timestamps and are repositioned along the
//!   detour by arc length; inserted corners get interpolated timestamps.
//!   All such points are tagged [`PointKind::Rerouted`].
//! - Velocities across a splice are recomputed by central differences and
//!   position covariance is inflated by the fitted process noise over the
//!   local time offset.
//! - A bounded number of passes re-checks the whole track; residual
//!   intersections are reported via [`BarrierError::Unresolved`], never
//!   silently dropped.

use nalgebra::{Matrix4, Vector2, Vector4};

use crate::{
    barrier::{
        errors::{BarrierError, BarrierResult},
        geometry::{BarrierGeometry, Hit},
    },
    movement::{
        core::matrices::process_noise,
        models::FitResult,
        smoother::{PointKind, StateEstimate, Track},
    },
};

/// Router configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterOptions {
    /// Maximum number of whole-track correction passes.
    pub max_passes: usize,
    /// Outward nudge applied to detour points, in coordinate units.
    pub margin: f64,
}

impl RouterOptions {
    pub fn new(max_passes: usize, margin: f64) -> BarrierResult<Self> {
        if max_passes == 0 {
            return Err(BarrierError::InvalidMaxPasses { max_passes });
        }
        if !margin.is_finite() || margin < 0.0 {
            return Err(BarrierError::InvalidMargin { margin });
        }
        Ok(Self { max_passes, margin })
    }
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self { max_passes: 8, margin: 1e-6 }
    }
}

/// A maximal offending run: the interior points `prev+1 .. next` lie
/// strictly inside (possibly none, for a pure segment transit), anchored by
/// the outside points at `prev` and `next` when they exist.
#[derive(Debug, Clone, PartialEq)]
struct Run {
    prev: Option<usize>,
    next: Option<usize>,
}

/// Correct a track against the barrier geometry.
///
/// Returns a new track; the input is never mutated. Running the router on
/// its own output is a no-op.
///
/// # Errors
/// - [`BarrierError::UnfitModel`] when the fit did not converge; the
///   router refuses to blend process noise from an unfit model.
/// - [`BarrierError::EmptyTrack`] for an empty input.
/// - [`BarrierError::Unresolved`] when offending runs remain after
///   `max_passes` passes.
pub fn correct_track(
    track: &Track,
    fit: &FitResult,
    geometry: &BarrierGeometry,
    opts: &RouterOptions,
) -> BarrierResult<Track> {
    if !fit.is_converged() {
        return Err(BarrierError::UnfitModel);
    }
    if track.is_empty() {
        return Err(BarrierError::EmptyTrack);
    }
    let mut points = track.points.clone();
    for _ in 0..opts.max_passes {
        let runs = find_runs(&points, geometry);
        if runs.is_empty() {
            return Ok(Track { points });
        }
        // Splice back to front so earlier run indices stay valid.
        for run in runs.iter().rev() {
            apply_run(&mut points, run, fit, geometry, opts);
        }
        recompute_spliced_velocities(&mut points);
    }
    let residual = find_runs(&points, geometry);
    if residual.is_empty() {
        Ok(Track { points })
    } else {
        let runs = residual
            .iter()
            .map(|run| {
                let first = run.prev.map(|p| p + 1).unwrap_or(0);
                let last = run.next.map(|n| n.saturating_sub(1)).unwrap_or(points.len() - 1);
                (first, last.max(first))
            })
            .collect();
        Err(BarrierError::Unresolved { runs })
    }
}

/// Detect maximal offending runs: blocks of strictly-inside points and
/// outside-to-outside segments that transit a boundary.
fn find_runs(points: &[StateEstimate], geometry: &BarrierGeometry) -> Vec<Run> {
    let inside: Vec<bool> = points
        .iter()
        .map(|p| geometry.strictly_inside(p.position()).is_some())
        .collect();
    let n = points.len();
    let mut runs = Vec::new();
    let mut k = 0;
    while k < n {
        if inside[k] {
            let first = k;
            while k + 1 < n && inside[k + 1] {
                k += 1;
            }
            runs.push(Run {
                prev: first.checked_sub(1),
                next: if k + 1 < n { Some(k + 1) } else { None },
            });
        } else if k + 1 < n
            && !inside[k + 1]
            && geometry.crosses(points[k].position(), points[k + 1].position())
        {
            runs.push(Run { prev: Some(k), next: Some(k + 1) });
        }
        k += 1;
    }
    runs
}

/// Replace one run in place. Runs the router cannot resolve in this pass
/// (missing anchors are projected instead; entry and exit on different
/// polygons are left untouched) are picked up by the residual check.
fn apply_run(
    points: &mut Vec<StateEstimate>,
    run: &Run,
    fit: &FitResult,
    geometry: &BarrierGeometry,
    opts: &RouterOptions,
) {
    let (prev, next) = match (run.prev, run.next) {
        (Some(prev), Some(next)) => (prev, next),
        // Run touches a track end: no anchor to route between, so project
        // each inside point just outside the nearest boundary.
        _ => {
            let first = run.prev.map(|p| p + 1).unwrap_or(0);
            let last = run.next.map(|n| n - 1).unwrap_or(points.len() - 1);
            for point in &mut points[first..=last] {
                if let Some((pi, q)) = geometry.nearest_boundary(point.position()) {
                    let moved = nudge_outward(q, geometry, pi, opts.margin);
                    point.mean[0] = moved.x;
                    point.mean[1] = moved.y;
                    point.kind = PointKind::Rerouted;
                }
            }
            return;
        }
    };

    let entry = first_hit(geometry, points[prev].position(), points[prev + 1].position());
    let exit = last_hit(geometry, points[next - 1].position(), points[next].position());
    let (entry, exit) = match (entry, exit) {
        (Some(e), Some(x)) if e.polygon == x.polygon => (e, x),
        _ => return,
    };

    let detour = build_detour(geometry, &entry, &exit, opts.margin);

    // Arc-length parameterization of prev → detour → next.
    let mut path = vec![points[prev].position()];
    path.extend(detour.iter().copied());
    path.push(points[next].position());
    let cum = cumulative_lengths(&path);
    let total = *cum.last().unwrap_or(&0.0);

    let t0 = points[prev].time;
    let t1 = points[next].time;
    let span = t1 - t0;

    // Inserted corners with interpolated timestamps.
    let mut replacements: Vec<StateEstimate> = Vec::new();
    for (i, vertex) in detour.iter().enumerate() {
        let s = cum[i + 1];
        let frac = if total > 0.0 { s / total } else { 0.0 };
        let time = t0 + frac * span;
        replacements.push(spliced_estimate(*vertex, time, points, prev, next, fit));
    }
    // Replaced originals keep their timestamps, mapped by arc length.
    for original in &points[prev + 1..next] {
        let frac = if span > 0.0 { (original.time - t0) / span } else { 0.0 };
        let position = point_at_arclength(&path, &cum, frac * total);
        replacements.push(spliced_estimate(position, original.time, points, prev, next, fit));
    }
    replacements.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));
    replacements.dedup_by(|a, b| (a.time - b.time).abs() < 1e-9);

    points.splice(prev + 1..next, replacements);
}

/// Build the boundary-following detour between entry and exit, nudged
/// outward. The shorter perimeter direction wins; exact ties go to the
/// ascending-vertex walk.
fn build_detour(
    geometry: &BarrierGeometry,
    entry: &Hit,
    exit: &Hit,
    margin: f64,
) -> Vec<Vector2<f64>> {
    let poly = geometry.polygon(entry.polygon);
    let up = poly.corner_walk(entry.edge, exit.edge, true);
    let down = poly.corner_walk(entry.edge, exit.edge, false);

    let walk_len = |corners: &[Vector2<f64>]| -> f64 {
        let mut length = 0.0;
        let mut at = entry.point;
        for c in corners {
            length += (c - at).norm();
            at = *c;
        }
        length + (exit.point - at).norm()
    };

    let corners = if walk_len(&up) <= walk_len(&down) { up } else { down };

    let mut detour = Vec::with_capacity(corners.len() + 2);
    detour.push(nudge_outward(entry.point, geometry, entry.polygon, margin));
    detour.extend(
        corners
            .into_iter()
            .map(|c| nudge_outward(c, geometry, entry.polygon, margin)),
    );
    detour.push(nudge_outward(exit.point, geometry, entry.polygon, margin));
    detour
}

/// Push a boundary point outward from the polygon centroid by `margin`.
fn nudge_outward(
    p: Vector2<f64>,
    geometry: &BarrierGeometry,
    polygon: usize,
    margin: f64,
) -> Vector2<f64> {
    let centroid = geometry.polygon(polygon).centroid();
    let dir = p - centroid;
    let norm = dir.norm();
    if norm == 0.0 {
        return p;
    }
    p + dir * (margin / norm)
}

/// State estimate for a spliced point: position from the detour, covariance
/// interpolated between the anchors and inflated by the fitted process
/// noise over the offset from the nearer anchor. Velocity is filled in by
/// [`recompute_spliced_velocities`] once the whole pass is spliced.
fn spliced_estimate(
    position: Vector2<f64>,
    time: f64,
    points: &[StateEstimate],
    prev: usize,
    next: usize,
    fit: &FitResult,
) -> StateEstimate {
    let (t0, t1) = (points[prev].time, points[next].time);
    let w = if t1 > t0 { ((time - t0) / (t1 - t0)).clamp(0.0, 1.0) } else { 0.0 };
    let base: Matrix4<f64> = points[prev].cov * (1.0 - w) + points[next].cov * w;
    let dt_near = (time - t0).min(t1 - time).max(0.0);
    let cov = base + process_noise(fit.params.beta, fit.params.sigma, dt_near);
    StateEstimate {
        time,
        mean: Vector4::new(position.x, position.y, 0.0, 0.0),
        cov,
        kind: PointKind::Rerouted,
    }
}

/// Recompute velocities at rerouted points and their direct neighbors by
/// central differences of position over time.
fn recompute_spliced_velocities(points: &mut [StateEstimate]) {
    let n = points.len();
    let needs: Vec<bool> = (0..n)
        .map(|k| {
            points[k].kind == PointKind::Rerouted
                || (k > 0 && points[k - 1].kind == PointKind::Rerouted)
                || (k + 1 < n && points[k + 1].kind == PointKind::Rerouted)
        })
        .collect();
    for k in 0..n {
        if !needs[k] {
            continue;
        }
        let lo = if k > 0 { k - 1 } else { k };
        let hi = if k + 1 < n { k + 1 } else { k };
        let dt = points[hi].time - points[lo].time;
        if dt <= 0.0 {
            continue;
        }
        let v = (points[hi].position() - points[lo].position()) / dt;
        points[k].mean[2] = v.x;
        points[k].mean[3] = v.y;
    }
}

fn first_hit(geometry: &BarrierGeometry, a: Vector2<f64>, b: Vector2<f64>) -> Option<Hit> {
    geometry.segment_hits(a, b).into_iter().next()
}

fn last_hit(geometry: &BarrierGeometry, a: Vector2<f64>, b: Vector2<f64>) -> Option<Hit> {
    geometry.segment_hits(a, b).into_iter().last()
}

fn cumulative_lengths(path: &[Vector2<f64>]) -> Vec<f64> {
    let mut cum = Vec::with_capacity(path.len());
    let mut total = 0.0;
    cum.push(0.0);
    for w in path.windows(2) {
        total += (w[1] - w[0]).norm();
        cum.push(total);
    }
    cum
}

/// Point on the polyline `path` at arc length `s`, clamped to its ends.
fn point_at_arclength(path: &[Vector2<f64>], cum: &[f64], s: f64) -> Vector2<f64> {
    if path.is_empty() {
        return Vector2::zeros();
    }
    let total = *cum.last().unwrap_or(&0.0);
    let s = s.clamp(0.0, total);
    for i in 1..cum.len() {
        if s <= cum[i] {
            let seg_len = cum[i] - cum[i - 1];
            if seg_len == 0.0 {
                return path[i - 1];
            }
            let frac = (s - cum[i - 1]) / seg_len;
            return path[i - 1] + (path[i] - path[i - 1]) * frac;
        }
    }
    path[path.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{
        core::params::CtcrwParams,
        models::{FitResult, FitStatus},
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Run detection for inside points and pure segment transits.
    // - Detour construction around a rectangle with the shorter-side rule.
    // - Idempotence of the correction.
    //
    // The end-to-end rectangle scenario lives in the integration tests.
    // -------------------------------------------------------------------------

    fn fit_stub() -> FitResult {
        FitResult {
            status: FitStatus::Converged,
            params: CtcrwParams { beta: 0.01, sigma: 0.5, taus: vec![10.0] },
            theta_hat: array![0.0],
            loglik: 0.0,
            covariance: None,
        }
    }

    fn estimate(t: f64, x: f64, y: f64) -> StateEstimate {
        StateEstimate {
            time: t,
            mean: Vector4::new(x, y, 0.0, 0.0),
            cov: Matrix4::identity(),
            kind: PointKind::Predicted,
        }
    }

    fn rect() -> BarrierGeometry {
        // Rectangle x ∈ [2, 4], y ∈ [−1, 1].
        BarrierGeometry::new(vec![vec![[2.0, -1.0], [4.0, -1.0], [4.0, 1.0], [2.0, 1.0]]]).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // An interior point and a pure transit segment are both detected as
    // runs with the right anchors.
    fn run_detection_covers_points_and_transits() {
        let geo = rect();

        let with_inside =
            vec![estimate(0.0, 0.0, 0.0), estimate(1.0, 3.0, 0.0), estimate(2.0, 6.0, 0.0)];
        let runs = find_runs(&with_inside, &geo);
        assert_eq!(runs, vec![Run { prev: Some(0), next: Some(2) }]);

        // Transit with both endpoints outside, no interior point.
        let transit = vec![estimate(0.0, 0.0, 0.0), estimate(1.0, 6.0, 0.0)];
        let runs = find_runs(&transit, &geo);
        assert_eq!(runs, vec![Run { prev: Some(0), next: Some(1) }]);

        let clean = vec![estimate(0.0, 0.0, 5.0), estimate(1.0, 6.0, 5.0)];
        assert!(find_runs(&clean, &geo).is_empty());
    }

    #[test]
    // Purpose
    // -------
    // A straight path through the rectangle is detoured around one side,
    // ends up strictly outside everywhere, grows in length, and keeps the
    // anchor points untouched.
    fn transit_is_detoured_outside_and_longer() {
        // Arrange
        let geo = rect();
        let opts = RouterOptions::default();
        let track = Track {
            points: vec![
                estimate(0.0, 0.0, 0.0),
                estimate(600.0, 3.0, 0.0),
                estimate(1200.0, 6.0, 0.0),
            ],
        };
        let straight = track.path_length();

        // Act
        let corrected = correct_track(&track, &fit_stub(), &geo, &opts).unwrap();

        // Assert
        for p in &corrected.points {
            assert!(geo.strictly_inside(p.position()).is_none());
        }
        assert!(corrected.path_length() > straight);
        assert_eq!(corrected.points.first().unwrap().position(), Vector2::new(0.0, 0.0));
        assert_eq!(corrected.points.last().unwrap().position(), Vector2::new(6.0, 0.0));
        assert!(corrected.points.iter().any(|p| p.kind == PointKind::Rerouted));
        // Timestamps stay sorted after the splice.
        assert!(corrected.points.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    // Purpose
    // -------
    // Correcting an already-corrected track changes nothing.
    fn correction_is_idempotent() {
        let geo = rect();
        let opts = RouterOptions::default();
        let track = Track {
            points: vec![
                estimate(0.0, 0.0, 0.0),
                estimate(600.0, 3.0, 0.0),
                estimate(1200.0, 6.0, 0.0),
            ],
        };

        let once = correct_track(&track, &fit_stub(), &geo, &opts).unwrap();
        let twice = correct_track(&once, &fit_stub(), &geo, &opts).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    // Purpose
    // -------
    // A failed fit is refused up front, even when the track does cross the
    // barrier, so no correction is ever built from unfit parameters.
    fn failed_fit_is_refused() {
        // Arrange
        let geo = rect();
        let failed = FitResult { status: FitStatus::Failed, covariance: None, ..fit_stub() };
        let crossing = Track {
            points: vec![
                estimate(0.0, 0.0, 0.0),
                estimate(600.0, 3.0, 0.0),
                estimate(1200.0, 6.0, 0.0),
            ],
        };

        // Act / Assert
        assert!(matches!(
            correct_track(&crossing, &failed, &geo, &RouterOptions::default()),
            Err(BarrierError::UnfitModel)
        ));
    }

    #[test]
    // Purpose
    // -------
    // Options validation and the empty-track guard.
    fn options_and_empty_track_are_validated() {
        assert!(matches!(RouterOptions::new(0, 1e-6), Err(BarrierError::InvalidMaxPasses { .. })));
        assert!(matches!(
            RouterOptions::new(4, -1.0),
            Err(BarrierError::InvalidMargin { margin: m }) if m == -1.0
        ));

        let empty = Track { points: vec![] };
        assert!(matches!(
            correct_track(&empty, &fit_stub(), &rect(), &RouterOptions::default()),
            Err(BarrierError::EmptyTrack)
        ));
    }
}
