use std::collections::BTreeSet;

use crate::bodies::RigidBody;
use crate::collision::{CollisionPair, ContactManifold, NarrowPhase};
use crate::core::{BodyHandle, PhysicsWorld};
use crate::error::PhysicsError;
use crate::Result;

/// Steps shorter than this are treated as zero in variable mode
const MIN_VARIABLE_STEP: f32 = f32::EPSILON;

impl PhysicsWorld {
    /// Advances the world by `time_step` seconds using the configured
    /// fixed step and sub-step cap
    pub fn step(&mut self, time_step: f32) -> Result<u32> {
        let max_sub_steps = self.config.max_sub_steps;
        let fixed_time_step = self.config.fixed_time_step;
        self.step_simulation(time_step, max_sub_steps, fixed_time_step)
    }

    /// Advances the world by `time_step` seconds and returns the number of
    /// sub-steps executed.
    ///
    /// With `max_sub_steps > 0` time accumulates and is consumed in chunks of
    /// `fixed_time_step`; at most `max_sub_steps` chunks run per call and the
    /// surplus is dropped. With `max_sub_steps == 0` a single sub-step of
    /// `time_step` runs.
    pub fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32, fixed_time_step: f32) -> Result<u32> {
        if !(time_step.is_finite() && time_step >= 0.0) {
            return Err(PhysicsError::InvalidParameter(format!(
                "time step must be finite and non-negative, got {}",
                time_step
            )));
        }

        let (sub_steps, step_length, interpolate) = if max_sub_steps > 0 {
            if !(fixed_time_step.is_finite() && fixed_time_step > 0.0) {
                return Err(PhysicsError::InvalidParameter(format!(
                    "fixed time step must be finite and positive, got {}",
                    fixed_time_step
                )));
            }

            self.local_time += time_step;
            let mut available = 0u32;
            if self.local_time >= fixed_time_step {
                let whole = (self.local_time / fixed_time_step).floor();
                self.local_time -= whole * fixed_time_step;
                available = whole.min(u32::MAX as f32) as u32;
            }

            if available > max_sub_steps {
                log::debug!(
                    "world {}: clamping {} sub-steps to {}",
                    self.get_id(),
                    available,
                    max_sub_steps
                );
            }
            (available.min(max_sub_steps), fixed_time_step, true)
        } else {
            self.local_time = 0.0;
            let steps = if time_step < MIN_VARIABLE_STEP { 0 } else { 1 };
            (steps, time_step, false)
        };

        for _ in 0..sub_steps {
            self.single_step(step_length);
        }
        self.synchronize_graphics_transforms(interpolate);
        self.flush_warnings();

        log::trace!(
            "world {}: {} sub-steps, {} bodies, {} manifolds, {:.4}s carried",
            self.get_id(),
            sub_steps,
            self.bodies.len(),
            self.manifolds.len(),
            self.local_time
        );

        Ok(sub_steps)
    }

    /// One sub-step of length `dt`
    fn single_step(&mut self, dt: f32) {
        for (_, body) in self.bodies.iter_mut() {
            body.apply_gravity();
            body.integrate_forces(dt);
        }

        self.update_contacts();

        self.solver.solve(
            &mut self.bodies,
            &mut self.manifolds,
            &self.config,
            dt,
            &mut self.warnings,
        );

        for (handle, body) in self.bodies.iter_mut() {
            if let Err(error) = body.integrate_transform(dt) {
                self.warnings.push(format!("{:?}: {}", handle, error));
            }
            body.clear_forces();
        }
    }

    /// Runs the broadphase, drops manifolds of pairs that stopped
    /// overlapping, then refreshes and extends the remaining ones
    fn update_contacts(&mut self) {
        let pairs = {
            let bodies: Vec<(BodyHandle, &RigidBody)> = self.bodies.iter().collect();
            self.broad_phase.update(&bodies, self.config.aabb_margin);
            self.broad_phase.get_collision_pairs()
        };

        let active: BTreeSet<CollisionPair> = pairs.iter().copied().collect();
        self.manifolds.retain(|pair, _| active.contains(pair));

        let threshold = self.config.contact_breaking_threshold;
        for pair in pairs {
            let (body_a, body_b) = match (self.bodies.get(pair.body_a), self.bodies.get(pair.body_b)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let transform_a = body_a.get_world_transform();
            let transform_b = body_b.get_world_transform();

            let manifold = self
                .manifolds
                .entry(pair)
                .or_insert_with(|| ContactManifold::new(pair, threshold));
            manifold.refresh_contact_points(&transform_a, &transform_b);

            let contacts = NarrowPhase::generate_contacts(
                body_a.get_shape().get_geometry(),
                &transform_a,
                body_b.get_shape().get_geometry(),
                &transform_b,
                threshold,
                &mut self.warnings,
            );
            for contact in &contacts {
                manifold.add_contact(contact, &transform_a, &transform_b);
            }
        }
    }

    /// Extrapolates graphics transforms by the carried time, or copies the
    /// world transforms when there is nothing to extrapolate
    fn synchronize_graphics_transforms(&mut self, interpolate: bool) {
        let local_time = self.local_time;
        for (_, body) in self.bodies.iter_mut() {
            let world = body.get_world_transform();
            let graphics = if interpolate && !body.is_static() && local_time > 0.0 {
                world.integrate(body.get_linear_velocity(), body.get_angular_velocity(), local_time)
            } else {
                world
            };
            body.set_graphics_transform(graphics);
        }
    }

    /// Sends the diagnostics of the last step to the log and the debug drawer
    fn flush_warnings(&mut self) {
        if self.warnings.is_empty() {
            return;
        }

        let id = self.get_id();
        for warning in std::mem::take(&mut self.warnings) {
            log::warn!("world {}: {}", id, warning);
            if let Some(drawer) = self.debug_drawer.as_mut() {
                drawer.report_error_warning(&warning);
            }
        }
    }
}
