//! Moving particles through a mesh while tracking the cell each one is in.

use crate::{
    geometry::{Point3, Vec3},
    interpolation::{CellAffinity, CellShape, LinearInterpolator},
    num::BFloat,
};
use atomic_counter::{AtomicCounter, RelaxedCounter};
use rayon::prelude::*;

/// A set of particles with positions, velocities and cell affinities.
#[derive(Clone, Debug, Default)]
pub struct ParticleSet<F: BFloat> {
    positions: Vec<Point3<F>>,
    velocities: Vec<Vec3<F>>,
    affinities: Vec<CellAffinity>,
}

impl<F: BFloat> ParticleSet<F> {
    /// Creates an empty particle set.
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            velocities: Vec::new(),
            affinities: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Point3<F>] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3<F>] {
        &self.velocities
    }

    pub fn affinities(&self) -> &[CellAffinity] {
        &self.affinities
    }

    /// Adds particles at rest at the given positions and finds their cells.
    pub fn inject<S, const N: usize>(
        &mut self,
        interpolator: &LinearInterpolator<F, S, N>,
        positions: &[Point3<F>],
    ) where
        S: CellShape<N>,
    {
        let affinities: Vec<_> = positions
            .par_iter()
            .map(|position| interpolator.initial_affinity(position))
            .collect();

        self.positions.extend_from_slice(positions);
        self.velocities
            .extend(std::iter::repeat(Vec3::zero()).take(positions.len()));
        self.affinities.extend(affinities);
    }

    /// Moves each particle along its velocity for the given time step and
    /// updates its cell affinity.
    ///
    /// # Returns
    ///
    /// The number of particles that left the domain during this step.
    pub fn update_positions<S, const N: usize>(
        &mut self,
        interpolator: &LinearInterpolator<F, S, N>,
        time_step: F,
    ) -> usize
    where
        S: CellShape<N>,
    {
        let n_lost = RelaxedCounter::new(0);
        self.positions
            .par_iter_mut()
            .zip(self.velocities.par_iter())
            .zip(self.affinities.par_iter_mut())
            .for_each(|((position, velocity), affinity)| {
                let was_inside = !affinity.has_left_domain();
                *position = *position + *velocity * time_step;
                if was_inside && interpolator.update_cell(position, affinity).has_left_domain() {
                    n_lost.inc();
                }
            });
        n_lost.get()
    }

    /// Accelerates each particle in the interpolated vector field of its cell.
    ///
    /// Particles that have left the domain keep their velocity.
    pub fn update_velocities<S, const N: usize>(
        &mut self,
        interpolator: &LinearInterpolator<F, S, N>,
        time_step: F,
        charge_over_mass: F,
    ) where
        S: CellShape<N>,
    {
        let factor = charge_over_mass * time_step;
        self.velocities
            .par_iter_mut()
            .zip(self.positions.par_iter())
            .zip(self.affinities.par_iter())
            .for_each(|((velocity, position), affinity)| {
                if let Some(cell) = affinity.cell() {
                    *velocity = *velocity + interpolator.interp_vector(position, cell) * factor;
                }
            });
    }

    /// Removes the particles that have left the domain.
    ///
    /// # Returns
    ///
    /// The number of removed particles.
    pub fn clear_lost_particles(&mut self) -> usize {
        let keep: Vec<bool> = self
            .affinities
            .iter()
            .map(|affinity| !affinity.has_left_domain())
            .collect();
        let n_removed = keep.iter().filter(|&&kept| !kept).count();
        if n_removed == 0 {
            return 0;
        }

        let mut kept = keep.iter().copied();
        self.positions.retain(|_| kept.next().unwrap_or(false));
        let mut kept = keep.iter().copied();
        self.velocities.retain(|_| kept.next().unwrap_or(false));
        self.affinities.retain(|affinity| !affinity.has_left_domain());

        n_removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::Dim3::Z,
        interpolation::{InterpolatorConfig, Solution, TetrahedronInterpolator},
        io::Verbosity,
        mesh::test_meshes,
    };
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn uniform_field_interpolator(field: Vec3<f64>) -> TetrahedronInterpolator<f64> {
        let mesh = test_meshes::box_tetrahedral_mesh(4);
        let solutions = vec![Solution::from_vector(field); mesh.n_nodes()];
        LinearInterpolator::new(
            Arc::new(mesh),
            solutions,
            InterpolatorConfig::default(),
            &Verbosity::Quiet,
        )
    }

    #[test]
    fn injected_particles_are_at_rest_in_containing_cells() {
        let interpolator = uniform_field_interpolator(Vec3::zero());
        let mut particles = ParticleSet::new();
        particles.inject(
            &interpolator,
            &[Point3::new(0.3, 0.4, 0.6), Point3::new(2.0, 0.0, 0.0)],
        );

        assert_eq!(particles.len(), 2);
        assert_eq!(particles.velocities()[0], Vec3::zero());
        let cell = particles.affinities()[0].cell().unwrap();
        assert!(interpolator.contains_point(&particles.positions()[0], cell, 0.0));
        assert!(particles.affinities()[1].has_left_domain());
    }

    #[test]
    fn particles_follow_the_field_and_keep_valid_cells() {
        let interpolator = uniform_field_interpolator(Vec3::new(0.0, 0.0, 1.0));
        let mut particles = ParticleSet::new();
        particles.inject(&interpolator, &[Point3::new(0.55, 0.45, 0.04)]);

        for _ in 0..20 {
            particles.update_velocities(&interpolator, 0.05, 1.0);
            assert_eq!(particles.update_positions(&interpolator, 0.05), 0);
            let cell = particles.affinities()[0].cell().unwrap();
            assert!(interpolator.contains_point(&particles.positions()[0], cell, 0.0));
        }
        assert_abs_diff_eq!(
            particles.velocities()[0],
            Vec3::new(0.0, 0.0, 1.0),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(particles.positions()[0][Z], 0.565, epsilon = 1e-12);
    }

    #[test]
    fn particles_leaving_the_box_are_cleared() {
        let interpolator = uniform_field_interpolator(Vec3::new(1.0, 0.0, 0.0));
        let mut particles = ParticleSet::new();
        particles.inject(
            &interpolator,
            &[Point3::new(0.9, 0.5, 0.5), Point3::new(0.1, 0.5, 0.5)],
        );

        particles.update_velocities(&interpolator, 1.0, 0.5);
        assert_eq!(particles.update_positions(&interpolator, 1.0), 1);
        assert!(particles.affinities()[0].has_left_domain());
        assert!(!particles.affinities()[1].has_left_domain());

        assert_eq!(particles.clear_lost_particles(), 1);
        assert_eq!(particles.len(), 1);
        assert_abs_diff_eq!(particles.positions()[0], Point3::new(0.6, 0.5, 0.5));
        assert_eq!(particles.clear_lost_particles(), 0);
        assert_eq!(particles.update_positions(&interpolator, 1.0), 1);
        assert_eq!(particles.update_positions(&interpolator, 1.0), 0);
    }
}
