//! Error-class → measurement-scale mapping.
//!
//! Telemetry fixes carry categorical quality classes; each class maps to a
//! measurement-error scale parameter. The CTCRW process scale and the
//! measurement scales are not jointly identifiable, so at least one class
//! must be held fixed to anchor the model. That rule is enforced here, at
//! construction, never later.

use std::collections::BTreeMap;

use crate::movement::{
    core::params::ParamRole,
    errors::{CtcrwError, CtcrwResult},
};

/// Mapping from error-class label to the role of its measurement scale.
///
/// Labels are kept in sorted order so the τ block of the parameter vector
/// has a deterministic layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorModel {
    roles: BTreeMap<String, ParamRole>,
}

impl ErrorModel {
    /// Build a validated error model.
    ///
    /// # Errors
    /// - [`CtcrwError::EmptySeries`] is *not* used here; an empty mapping
    ///   surfaces as [`CtcrwError::NoAnchorClass`], since no class can
    ///   anchor the scale.
    /// - [`CtcrwError::NoAnchorClass`] when no class scale is `Fixed`.
    /// - Role validation errors for each entry, named `tau[<label>]`.
    pub fn new(entries: Vec<(String, ParamRole)>) -> CtcrwResult<Self> {
        let roles: BTreeMap<String, ParamRole> = entries.into_iter().collect();
        if !roles.values().any(|role| matches!(role, ParamRole::Fixed(_))) {
            return Err(CtcrwError::NoAnchorClass);
        }
        for (label, role) in &roles {
            role.validate(&format!("tau[{label}]"))?;
        }
        Ok(Self { roles })
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Consume the model into `(label, role)` pairs in sorted label order.
    pub fn into_sorted_roles(self) -> Vec<(String, ParamRole)> {
        self.roles.into_iter().collect()
    }
}
