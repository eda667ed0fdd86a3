//! Parameter roles, box constraints, and the working-space transform.
//!
//! Purpose
//! -------
//! Describe the CTCRW parameter vector `[β, σ, τ_c1, …, τ_cK]` (classes in
//! sorted label order), where each entry is either held fixed or estimated
//! subject to optional box constraints, and provide the bijection between
//! the constrained natural space and the unconstrained working space the
//! optimizer sees.
//!
//! Key behaviors
//! -------------
//! - [`ParamRole`] tags each parameter `Fixed(value)` or
//!   `Free { init, lower, upper }` and validates itself at spec
//!   construction, before any filtering starts.
//! - [`ParamSpec`] assembles the full ordered specification, enforces the
//!   scale-anchor rule (at least one τ fixed), and packs/unpacks the free
//!   subvector.
//! - The working transform uses guarded softplus/logistic maps so bounded
//!   parameters can never leave their box, regardless of what the line
//!   search tries:
//!   - lower bound only: `x = l + softplus(w)`
//!   - upper bound only: `x = u − softplus(w)`
//!   - both bounds: `x = l + (u − l)·logistic(w)`
//!   - unbounded: identity.
//!
//! Conventions
//! -----------
//! - `θ` (working space) is an `ndarray` vector over **free** parameters
//!   only; fixed parameters are substituted on every unpack.
//! - Natural-space parameters are bundled in [`CtcrwParams`] with τ values
//!   ordered by sorted class label.

use ndarray::Array1;

use crate::{
    movement::{
        core::classes::ErrorModel,
        errors::{CtcrwError, CtcrwResult},
    },
    optimization::{
        errors::OptError,
        loglik_optimizer::Theta,
        numerical_stability::{safe_logistic, safe_logit, safe_softplus, safe_softplus_inv},
    },
};

/// Default lower bound applied by [`ParamRole::free_positive`] to keep the
/// mean-reversion and noise scales away from degenerate near-zero fits.
pub const DEFAULT_POSITIVE_FLOOR: f64 = 1e-6;

/// Role of a single model parameter: held constant or estimated.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamRole {
    /// Held at the given value on every likelihood evaluation.
    Fixed(f64),
    /// Estimated, starting from `init`, constrained to `[lower, upper]`
    /// where either bound may be absent.
    Free { init: f64, lower: Option<f64>, upper: Option<f64> },
}

impl ParamRole {
    /// Free parameter bounded below by [`DEFAULT_POSITIVE_FLOOR`].
    pub fn free_positive(init: f64) -> Self {
        ParamRole::Free { init, lower: Some(DEFAULT_POSITIVE_FLOOR), upper: None }
    }

    /// Free parameter with explicit box constraints.
    pub fn free_bounded(init: f64, lower: f64, upper: f64) -> Self {
        ParamRole::Free { init, lower: Some(lower), upper: Some(upper) }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, ParamRole::Free { .. })
    }

    /// Validate the role under its parameter name.
    ///
    /// # Errors
    /// - [`CtcrwError::InvalidFixedValue`] for non-finite fixed values.
    /// - [`CtcrwError::InvalidBounds`] when `lower > upper`.
    /// - [`CtcrwError::InvalidInit`] when the initial value is non-finite
    ///   or strictly outside the box.
    pub fn validate(&self, name: &str) -> CtcrwResult<()> {
        match *self {
            ParamRole::Fixed(value) => {
                if !value.is_finite() {
                    return Err(CtcrwError::InvalidFixedValue {
                        name: name.to_string(),
                        value,
                    });
                }
                Ok(())
            }
            ParamRole::Free { init, lower, upper } => {
                if let (Some(l), Some(u)) = (lower, upper) {
                    if l > u {
                        return Err(CtcrwError::InvalidBounds {
                            name: name.to_string(),
                            lower: l,
                            upper: u,
                        });
                    }
                }
                let below = lower.map(|l| init < l).unwrap_or(false);
                let above = upper.map(|u| init > u).unwrap_or(false);
                if !init.is_finite() || below || above {
                    return Err(CtcrwError::InvalidInit { name: name.to_string(), init });
                }
                Ok(())
            }
        }
    }

    /// Map a natural-space value into working space.
    ///
    /// Values at or inside a guard distance of a bound are clamped by the
    /// guarded transforms; callers pass values already validated against
    /// the box.
    fn to_working(&self, natural: f64) -> f64 {
        match *self {
            ParamRole::Fixed(_) => natural,
            ParamRole::Free { lower, upper, .. } => match (lower, upper) {
                (Some(l), Some(u)) => safe_logit((natural - l) / (u - l)),
                (Some(l), None) => safe_softplus_inv(natural - l),
                (None, Some(u)) => safe_softplus_inv(u - natural),
                (None, None) => natural,
            },
        }
    }

    /// Map a working-space value back into the (bounded) natural space.
    fn from_working(&self, working: f64) -> f64 {
        match *self {
            ParamRole::Fixed(value) => value,
            ParamRole::Free { lower, upper, .. } => match (lower, upper) {
                (Some(l), Some(u)) => l + (u - l) * safe_logistic(working),
                (Some(l), None) => l + safe_softplus(working),
                (None, Some(u)) => u - safe_softplus(working),
                (None, None) => working,
            },
        }
    }
}

/// Natural-space CTCRW parameters for one likelihood evaluation.
///
/// `taus` holds per-class measurement scales ordered by sorted class label;
/// indices match [`ParamSpec::class_index`].
#[derive(Debug, Clone, PartialEq)]
pub struct CtcrwParams {
    pub beta: f64,
    pub sigma: f64,
    pub taus: Vec<f64>,
}

impl CtcrwParams {
    /// Measurement scale of the class at `index`.
    pub fn tau(&self, index: usize) -> f64 {
        self.taus[index]
    }
}

/// Full ordered parameter specification: process roles plus the error model.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    beta: ParamRole,
    sigma: ParamRole,
    classes: Vec<(String, ParamRole)>,
}

impl ParamSpec {
    /// Validate and assemble a specification.
    ///
    /// Roles are validated individually and the error model must carry a
    /// fixed scale anchor (enforced by [`ErrorModel`] at its own
    /// construction). Class labels are kept in sorted order.
    pub fn new(beta: ParamRole, sigma: ParamRole, errors: ErrorModel) -> CtcrwResult<Self> {
        beta.validate("beta")?;
        sigma.validate("sigma")?;
        let classes = errors.into_sorted_roles();
        for (label, role) in &classes {
            role.validate(&format!("tau[{label}]"))?;
        }
        Ok(Self { beta, sigma, classes })
    }

    /// Index of an error class in the τ ordering.
    ///
    /// # Errors
    /// [`CtcrwError::MissingErrorClass`] for unknown labels.
    pub fn class_index(&self, label: &str) -> CtcrwResult<usize> {
        self.classes
            .iter()
            .position(|(known, _)| known == label)
            .ok_or_else(|| CtcrwError::MissingErrorClass { class: label.to_string() })
    }

    /// All roles in natural parameter order `[β, σ, τ…]`.
    fn roles(&self) -> impl Iterator<Item = &ParamRole> {
        std::iter::once(&self.beta)
            .chain(std::iter::once(&self.sigma))
            .chain(self.classes.iter().map(|(_, role)| role))
    }

    /// Number of free (estimated) parameters.
    pub fn free_len(&self) -> usize {
        self.roles().filter(|role| role.is_free()).count()
    }

    /// Initial working-space vector over free parameters.
    pub fn initial_working(&self) -> Theta {
        let values: Vec<f64> = self
            .roles()
            .filter_map(|role| match *role {
                ParamRole::Free { init, .. } => Some(role.to_working(init)),
                ParamRole::Fixed(_) => None,
            })
            .collect();
        Array1::from(values)
    }

    /// Unpack a working-space vector into natural parameters, substituting
    /// fixed values.
    ///
    /// # Errors
    /// [`CtcrwError::Optimizer`] wrapping a dimension mismatch when `theta`
    /// has the wrong length.
    pub fn params_from_working(&self, theta: &Theta) -> CtcrwResult<CtcrwParams> {
        if theta.len() != self.free_len() {
            return Err(CtcrwError::Optimizer(OptError::InvalidParameter {
                text: format!(
                    "working vector has length {}, expected {}",
                    theta.len(),
                    self.free_len()
                ),
            }));
        }
        let mut free = theta.iter();
        let mut next = |role: &ParamRole| -> f64 {
            match role {
                ParamRole::Fixed(value) => *value,
                ParamRole::Free { .. } => {
                    // free_len() matched above, so the iterator cannot run dry
                    role.from_working(free.next().copied().unwrap_or(f64::NAN))
                }
            }
        };
        let beta = next(&self.beta);
        let sigma = next(&self.sigma);
        let taus = self.classes.iter().map(|(_, role)| next(role)).collect();
        Ok(CtcrwParams { beta, sigma, taus })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::core::classes::ErrorModel;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Role validation (bounds, fixed values, initial values).
    // - Round-trip of the working-space transform for every bound shape.
    // - Packing and unpacking of the free subvector with fixed substitution.
    // -------------------------------------------------------------------------

    fn anchor_model() -> ErrorModel {
        ErrorModel::new(vec![
            ("3".to_string(), ParamRole::Fixed(50.0)),
            ("B".to_string(), ParamRole::free_positive(100.0)),
        ])
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // lower > upper is rejected at spec construction, before any filtering.
    fn spec_rejects_inverted_bounds() {
        let beta = ParamRole::free_bounded(0.5, 1.0, 0.1);
        let err = ParamSpec::new(beta, ParamRole::free_positive(1.0), anchor_model()).unwrap_err();
        assert!(matches!(err, CtcrwError::InvalidBounds { ref name, .. } if name == "beta"));
    }

    #[test]
    // Purpose
    // -------
    // Non-finite fixed values and out-of-box initial values are rejected.
    fn spec_rejects_bad_fixed_and_init_values() {
        let bad_fixed =
            ParamSpec::new(ParamRole::Fixed(f64::NAN), ParamRole::free_positive(1.0), anchor_model());
        assert!(matches!(bad_fixed, Err(CtcrwError::InvalidFixedValue { .. })));

        let below = ParamRole::Free { init: -1.0, lower: Some(0.0), upper: None };
        let bad_init = ParamSpec::new(below, ParamRole::free_positive(1.0), anchor_model());
        assert!(matches!(bad_init, Err(CtcrwError::InvalidInit { .. })));
    }

    #[test]
    // Purpose
    // -------
    // to_working/from_working round-trips for lower-only, two-sided, and
    // unbounded roles.
    fn working_transform_round_trips() {
        let lower_only = ParamRole::Free { init: 2.0, lower: Some(0.5), upper: None };
        let two_sided = ParamRole::Free { init: 0.3, lower: Some(0.1), upper: Some(1.0) };
        let unbounded = ParamRole::Free { init: -4.2, lower: None, upper: None };

        for (role, natural) in
            [(lower_only, 2.0_f64), (two_sided, 0.3), (unbounded, -4.2)]
        {
            let back = role.from_working(role.to_working(natural));
            assert_relative_eq!(back, natural, max_relative = 1e-9);
        }
    }

    #[test]
    // Purpose
    // -------
    // Bounded roles cannot produce natural values outside the box, however
    // extreme the working value.
    fn bounded_transform_respects_box() {
        let role = ParamRole::free_bounded(0.5, 0.1, 1.0);
        for w in [-1e6, -30.0, 0.0, 30.0, 1e6] {
            let x = role.from_working(w);
            assert!(x >= 0.1 && x <= 1.0, "x = {x} escaped the box for w = {w}");
        }
    }

    #[test]
    // Purpose
    // -------
    // params_from_working substitutes fixed values and maps free entries in
    // [β, σ, τ…] order.
    //
    // Given
    // -----
    // - β fixed at 0.7, σ free (positive), τ_3 fixed at 50, τ_B free.
    //
    // Expect
    // ------
    // - free_len = 2, initial working round-trips to the initial naturals.
    fn pack_unpack_respects_roles_and_order() {
        // Arrange
        let spec = ParamSpec::new(
            ParamRole::Fixed(0.7),
            ParamRole::free_positive(2.5),
            anchor_model(),
        )
        .unwrap();

        // Act
        let theta0 = spec.initial_working();
        let params = spec.params_from_working(&theta0).unwrap();

        // Assert
        assert_eq!(spec.free_len(), 2);
        assert_eq!(theta0.len(), 2);
        assert_relative_eq!(params.beta, 0.7, max_relative = 1e-12);
        assert_relative_eq!(params.sigma, 2.5, max_relative = 1e-9);
        assert_relative_eq!(params.tau(spec.class_index("3").unwrap()), 50.0);
        assert_relative_eq!(params.tau(spec.class_index("B").unwrap()), 100.0, max_relative = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // A working vector of the wrong length is rejected, and unknown class
    // labels report MissingErrorClass.
    fn unpack_checks_dimension_and_labels() {
        let spec = ParamSpec::new(
            ParamRole::free_positive(0.5),
            ParamRole::free_positive(1.0),
            anchor_model(),
        )
        .unwrap();

        assert!(spec.params_from_working(&array![0.0]).is_err());
        assert!(matches!(
            spec.class_index("Z"),
            Err(CtcrwError::MissingErrorClass { ref class }) if class == "Z"
        ));
    }
}
