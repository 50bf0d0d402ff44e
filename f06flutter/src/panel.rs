//! This module implements the non-dimensional dynamic pressure used to
//! present supersonic panel flutter results (Sawyer's lambda).

use serde::{Serialize, Deserialize};

use crate::roots::CriticalRoot;

/// The reference values of a panel flutter analysis.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PanelReference {
  /// Reference velocity the solver's velocities are scaled by.
  pub vref: f64,
  /// Reference chord (panel length in the flow direction).
  pub chord: f64,
  /// Reference density.
  pub rho: f64,
  /// Panel bending stiffness (D11 for a laminate).
  pub stiffness: f64
}

impl PanelReference {
  /// Computes the non-dimensional dynamic pressure at a velocity and Mach
  /// number. Only defined for supersonic flow and non-zero stiffness.
  pub fn dynamic_pressure(&self, velocity: f64, mach: f64) -> Option<f64> {
    if mach <= 1.0 || self.stiffness == 0.0 {
      return None;
    }
    let beta = (mach * mach - 1.0).sqrt();
    let v = velocity * self.vref;
    return Some(self.rho * v * v * self.chord.powi(3) / (beta * self.stiffness));
  }

  /// Computes the non-dimensional dynamic pressure at a critical root.
  pub fn critical_dynamic_pressure(&self, root: &CriticalRoot) -> Option<f64> {
    return self.dynamic_pressure(root.velocity()?, root.key.sweep.mach_number);
  }
}
