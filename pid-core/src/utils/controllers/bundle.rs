//! Fixed-size bundles of independent PID units.
//!
//! Slot `i` always controls the same degree of freedom (x/y/z or thruster
//! index). Units never read each other's state, so per-axis updates are
//! order-insensitive.

use glam::Vec3;

use super::pid::{Gains, PidUnit};

/// `N` independent PID units, one per controlled axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBundle<const N: usize> {
    units: [PidUnit; N],
}

/// Bundle for a 3D vector error.
pub type Vec3Bundle = AxisBundle<3>;

impl<const N: usize> Default for AxisBundle<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> AxisBundle<N> {
    pub const fn new() -> Self {
        Self {
            units: [PidUnit::new(); N],
        }
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Update every axis with the same gains.
    pub fn update(
        &mut self,
        errors: [f32; N],
        dt: f32,
        gains: Gains,
    ) -> [f32; N] {
        let mut out = [0.0; N];
        for ((unit, error), slot) in self.units.iter_mut().zip(errors).zip(out.iter_mut()) {
            *slot = unit.update_with(error, dt, gains);
        }
        out
    }

    /// Update every axis with its own gains.
    pub fn update_per_axis(
        &mut self,
        errors: [f32; N],
        dt: f32,
        gains: &[Gains; N],
    ) -> [f32; N] {
        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.units[i].update_with(errors[i], dt, gains[i]);
        }
        out
    }

    /// Update a single slot; `None` if `index` is out of range.
    pub fn update_axis(
        &mut self,
        index: usize,
        error: f32,
        dt: f32,
        gains: Gains,
    ) -> Option<f32> {
        self.units
            .get_mut(index)
            .map(|unit| unit.update_with(error, dt, gains))
    }

    /// Reset one slot. Out-of-range indices are ignored.
    pub fn reset_axis(
        &mut self,
        index: usize,
    ) {
        if let Some(unit) = self.units.get_mut(index) {
            unit.reset();
        }
    }

    pub fn reset_all(&mut self) {
        self.units.iter_mut().for_each(PidUnit::reset);
    }

    pub fn unit(
        &self,
        index: usize,
    ) -> Option<&PidUnit> {
        self.units.get(index)
    }

    pub fn is_at_rest(&self) -> bool {
        self.units.iter().all(PidUnit::is_at_rest)
    }
}

impl AxisBundle<3> {
    /// Component-wise update of a vector error.
    pub fn update_vec3(
        &mut self,
        error: Vec3,
        dt: f32,
        gains: Gains,
    ) -> Vec3 {
        Vec3::from_array(self.update(error.to_array(), dt, gains))
    }
}
