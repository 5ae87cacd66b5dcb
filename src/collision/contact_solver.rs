use std::collections::{BTreeMap, HashMap};

use crate::bodies::{RigidBody, AnisotropicFrictionMode};
use crate::collision::collision_pair::CollisionPair;
use crate::collision::contact_manifold::ContactManifold;
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::math::{Vector3, Matrix3, Transform};

/// Pair coefficients are clamped to this magnitude
const MAX_FRICTION: f32 = 10.0;

/// Trait for contact constraint solvers
pub trait ContactSolver {
    /// Resolves the contacts of every manifold for one sub-step, updating
    /// body velocities and the manifolds' cached impulses.
    ///
    /// Diagnostics are appended to `warnings`.
    fn solve(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        manifolds: &mut BTreeMap<CollisionPair, ContactManifold>,
        config: &SimulationConfig,
        dt: f32,
        warnings: &mut Vec<String>,
    );
}

/// Velocity state of one body while the solver runs
#[derive(Debug, Clone)]
struct SolverBody {
    handle: BodyHandle,
    inv_mass: f32,
    inv_inertia_world: Matrix3,
    transform: Transform,
    linear_velocity: Vector3,
    angular_velocity: Vector3,
    push_velocity: Vector3,
    turn_velocity: Vector3,
}

impl SolverBody {
    fn from_body(handle: BodyHandle, body: &RigidBody) -> Self {
        Self {
            handle,
            inv_mass: body.get_inverse_mass(),
            inv_inertia_world: *body.get_inverse_inertia_tensor_world(),
            transform: body.get_world_transform(),
            linear_velocity: body.get_linear_velocity(),
            angular_velocity: body.get_angular_velocity(),
            push_velocity: body.get_push_velocity(),
            turn_velocity: body.get_turn_velocity(),
        }
    }

    fn velocity_at(&self, rel_pos: Vector3) -> Vector3 {
        self.linear_velocity + self.angular_velocity.cross(&rel_pos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Normal,
    Friction,
    Rolling,
}

/// One scalar constraint row between two solver bodies
#[derive(Debug, Clone)]
struct SolverConstraint {
    kind: RowKind,
    body_a: usize,
    body_b: usize,

    /// Linear Jacobian for A; B uses the negation
    linear: Vector3,
    angular_a: Vector3,
    angular_b: Vector3,

    /// Velocity change per unit impulse
    delta_linear_a: Vector3,
    delta_angular_a: Vector3,
    delta_linear_b: Vector3,
    delta_angular_b: Vector3,

    jac_diag_inv: f32,
    rhs: f32,
    rhs_penetration: f32,
    cfm: f32,
    lower: f32,
    upper: f32,

    /// Friction coefficient, for rows limited by a normal row
    friction: f32,

    /// Index of the normal row limiting this friction row
    normal_row: usize,

    applied_impulse: f32,
    applied_push_impulse: f32,
}

impl SolverConstraint {
    fn new(
        kind: RowKind,
        bodies: &[SolverBody],
        (body_a, body_b): (usize, usize),
        linear: Vector3,
        angular_a: Vector3,
        angular_b: Vector3,
    ) -> Self {
        let a = &bodies[body_a];
        let b = &bodies[body_b];
        let delta_linear_a = linear * a.inv_mass;
        let delta_angular_a = a.inv_inertia_world.multiply_vector(angular_a);
        let delta_linear_b = -linear * b.inv_mass;
        let delta_angular_b = b.inv_inertia_world.multiply_vector(angular_b);

        let diag = linear.dot(&delta_linear_a)
            + angular_a.dot(&delta_angular_a)
            - linear.dot(&delta_linear_b)
            + angular_b.dot(&delta_angular_b);

        Self {
            kind,
            body_a,
            body_b,
            linear,
            angular_a,
            angular_b,
            delta_linear_a,
            delta_angular_a,
            delta_linear_b,
            delta_angular_b,
            jac_diag_inv: if diag > f32::EPSILON { 1.0 / diag } else { 0.0 },
            rhs: 0.0,
            rhs_penetration: 0.0,
            cfm: 0.0,
            lower: 0.0,
            upper: 0.0,
            friction: 0.0,
            normal_row: 0,
            applied_impulse: 0.0,
            applied_push_impulse: 0.0,
        }
    }

    fn relative_velocity(&self, bodies: &[SolverBody]) -> f32 {
        let a = &bodies[self.body_a];
        let b = &bodies[self.body_b];
        self.linear.dot(&a.linear_velocity) + self.angular_a.dot(&a.angular_velocity)
            - self.linear.dot(&b.linear_velocity)
            + self.angular_b.dot(&b.angular_velocity)
    }

    fn relative_push_velocity(&self, bodies: &[SolverBody]) -> f32 {
        let a = &bodies[self.body_a];
        let b = &bodies[self.body_b];
        self.linear.dot(&a.push_velocity) + self.angular_a.dot(&a.turn_velocity)
            - self.linear.dot(&b.push_velocity)
            + self.angular_b.dot(&b.turn_velocity)
    }

    fn apply(&self, bodies: &mut [SolverBody], impulse: f32) {
        let a = &mut bodies[self.body_a];
        a.linear_velocity += self.delta_linear_a * impulse;
        a.angular_velocity += self.delta_angular_a * impulse;
        let b = &mut bodies[self.body_b];
        b.linear_velocity += self.delta_linear_b * impulse;
        b.angular_velocity += self.delta_angular_b * impulse;
    }

    fn apply_push(&self, bodies: &mut [SolverBody], impulse: f32) {
        let a = &mut bodies[self.body_a];
        a.push_velocity += self.delta_linear_a * impulse;
        a.turn_velocity += self.delta_angular_a * impulse;
        let b = &mut bodies[self.body_b];
        b.push_velocity += self.delta_linear_b * impulse;
        b.turn_velocity += self.delta_angular_b * impulse;
    }

    /// One projected Gauss-Seidel update
    fn resolve(&mut self, bodies: &mut [SolverBody]) {
        let mut delta = self.rhs - self.applied_impulse * self.cfm;
        delta -= self.relative_velocity(bodies) * self.jac_diag_inv;

        let sum = self.applied_impulse + delta;
        let clamped = sum.clamp(self.lower, self.upper);
        let delta = clamped - self.applied_impulse;
        self.applied_impulse = clamped;
        self.apply(bodies, delta);
    }

    fn resolve_split(&mut self, bodies: &mut [SolverBody]) {
        if self.rhs_penetration == 0.0 {
            return;
        }
        let mut delta = self.rhs_penetration - self.applied_push_impulse * self.cfm;
        delta -= self.relative_push_velocity(bodies) * self.jac_diag_inv;

        let sum = (self.applied_push_impulse + delta).max(self.lower);
        let delta = sum - self.applied_push_impulse;
        self.applied_push_impulse = sum;
        self.apply_push(bodies, delta);
    }
}

/// Where the impulses of a normal row are written back
#[derive(Debug, Clone, Copy)]
struct PointRows {
    pair: CollisionPair,
    point: usize,
    normal: usize,
    friction1: usize,
    friction2: usize,
    friction_dir: Vector3,
}

/// Scales a world direction per local axis of a body, leaving it unchanged
/// when the body does not use anisotropic friction for `mode`
fn apply_anisotropic_friction(body: &RigidBody, direction: Vector3, mode: AnisotropicFrictionMode) -> Vector3 {
    match body.get_material().anisotropic_scale(mode) {
        Some(scale) => {
            let transform = body.get_world_transform();
            let local = transform.inverse_transform_direction(direction).component_mul(&scale);
            transform.transform_direction(local)
        }
        None => direction,
    }
}

/// Sequential impulse-based contact solver
#[derive(Debug, Default)]
pub struct SequentialImpulseSolver {
    bodies: Vec<SolverBody>,
    rows: Vec<SolverConstraint>,
    points: Vec<PointRows>,
}

impl SequentialImpulseSolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    fn setup_point(
        &mut self,
        (index_a, index_b): (usize, usize),
        (body_a, body_b): (&RigidBody, &RigidBody),
        pair: CollisionPair,
        point_index: usize,
        manifold: &ContactManifold,
        config: &SimulationConfig,
        dt: f32,
    ) {
        let point = manifold.get_points()[point_index];
        let normal = point.normal_world_on_b;
        let pos_a = self.bodies[index_a].transform.position;
        let pos_b = self.bodies[index_b].transform.position;
        let rel_pos_a = point.position_world_on_a - pos_a;
        let rel_pos_b = point.position_world_on_b - pos_b;

        let mat_a = body_a.get_material();
        let mat_b = body_b.get_material();
        let friction = (mat_a.friction * mat_b.friction).clamp(-MAX_FRICTION, MAX_FRICTION);
        let restitution = mat_a.restitution * mat_b.restitution;
        let rolling = (mat_a.rolling_friction * mat_b.friction + mat_a.friction * mat_b.rolling_friction)
            .clamp(-MAX_FRICTION, MAX_FRICTION);
        let spinning = (mat_a.spinning_friction * mat_b.friction + mat_a.friction * mat_b.spinning_friction)
            .clamp(-MAX_FRICTION, MAX_FRICTION);

        // normal row
        let mut row = SolverConstraint::new(
            RowKind::Normal,
            &self.bodies,
            (index_a, index_b),
            normal,
            rel_pos_a.cross(&normal),
            -rel_pos_b.cross(&normal),
        );

        let soft = body_a.has_contact_stiffness_and_damping() || body_b.has_contact_stiffness_and_damping();
        let penetration = point.distance;
        let split = config.split_impulse && penetration <= config.split_impulse_penetration_threshold;
        let mut erp = if split { config.split_impulse_erp } else { config.erp };
        if soft {
            let stiffness = 1.0 / (1.0 / mat_a.contact_stiffness + 1.0 / mat_b.contact_stiffness);
            let damping = mat_a.contact_damping + mat_b.contact_damping;
            let denom = dt * stiffness + damping;
            if denom > f32::EPSILON {
                erp = dt * stiffness / denom;
                let cfm = 1.0 / denom / dt;
                let diag = if row.jac_diag_inv > 0.0 { 1.0 / row.jac_diag_inv } else { 0.0 };
                row.jac_diag_inv = if diag + cfm > f32::EPSILON { 1.0 / (diag + cfm) } else { 0.0 };
                row.cfm = cfm * row.jac_diag_inv;
            }
        }

        let rel_vel = row.relative_velocity(&self.bodies);
        let mut bounce = 0.0;
        if point.lifetime <= config.resting_contact_restitution_threshold
            && -rel_vel > config.restitution_velocity_threshold
        {
            bounce = (-rel_vel * restitution).max(0.0);
        }

        let mut velocity_error = bounce - rel_vel;
        let positional_error = if penetration > 0.0 {
            velocity_error -= penetration / dt;
            0.0
        } else {
            -penetration * erp / dt
        };

        let penetration_impulse = positional_error * row.jac_diag_inv;
        let velocity_impulse = velocity_error * row.jac_diag_inv;
        if split && !soft {
            row.rhs = velocity_impulse;
            row.rhs_penetration = penetration_impulse;
        } else {
            row.rhs = velocity_impulse + penetration_impulse;
        }
        row.lower = 0.0;
        row.upper = 1.0e10;
        row.applied_impulse = point.applied_impulse * config.warm_starting_factor;

        let normal_index = self.rows.len();
        self.rows.push(row);

        // two sliding friction directions: those of last sub-step while the
        // point persists, otherwise the first along the slip if any
        let cached = point
            .lateral_friction_dir
            .map(|dir| dir - normal * normal.dot(&dir))
            .filter(|dir| dir.length_squared() > 0.25)
            .and_then(|dir| dir.try_normalize());
        let relative = self.bodies[index_a].velocity_at(rel_pos_a) - self.bodies[index_b].velocity_at(rel_pos_b);
        let lateral = relative - normal * normal.dot(&relative);
        let (dir1, dir2) = match cached.or_else(|| lateral.try_normalize().filter(|_| lateral.length_squared() > f32::EPSILON)) {
            Some(dir1) => {
                let dir2 = dir1.cross(&normal).try_normalize().unwrap_or(normal.plane_space().1);
                (dir1, dir2)
            }
            None => normal.plane_space(),
        };

        let mut friction_rows = [0usize; 2];
        for (slot, (direction, warm)) in [
            (dir1, point.applied_impulse_lateral1),
            (dir2, point.applied_impulse_lateral2),
        ]
        .into_iter()
        .enumerate()
        {
            let direction = apply_anisotropic_friction(body_a, direction, AnisotropicFrictionMode::Friction);
            let direction = apply_anisotropic_friction(body_b, direction, AnisotropicFrictionMode::Friction);

            let mut row = SolverConstraint::new(
                RowKind::Friction,
                &self.bodies,
                (index_a, index_b),
                direction,
                rel_pos_a.cross(&direction),
                -rel_pos_b.cross(&direction),
            );
            row.rhs = -row.relative_velocity(&self.bodies) * row.jac_diag_inv;
            row.friction = friction;
            row.normal_row = normal_index;
            row.applied_impulse = warm * config.warm_starting_factor;
            friction_rows[slot] = self.rows.len();
            self.rows.push(row);
        }

        // torsional rows resisting spin about the normal and rolling about the tangents
        if spinning > 0.0 {
            self.push_torsional_row((index_a, index_b), normal, spinning, normal_index);
        }
        if rolling > 0.0 {
            let (axis1, axis2) = normal.plane_space();
            for axis in [axis1, axis2] {
                let axis = apply_anisotropic_friction(body_a, axis, AnisotropicFrictionMode::RollingFriction);
                let axis = apply_anisotropic_friction(body_b, axis, AnisotropicFrictionMode::RollingFriction);
                if axis.length() > 0.001 {
                    self.push_torsional_row((index_a, index_b), axis.normalize(), rolling, normal_index);
                }
            }
        }

        self.points.push(PointRows {
            pair,
            point: point_index,
            normal: normal_index,
            friction1: friction_rows[0],
            friction2: friction_rows[1],
            friction_dir: dir1,
        });
    }

    fn push_torsional_row(&mut self, bodies: (usize, usize), axis: Vector3, friction: f32, normal_row: usize) {
        let mut row = SolverConstraint::new(RowKind::Rolling, &self.bodies, bodies, Vector3::zero(), axis, -axis);
        row.rhs = -row.relative_velocity(&self.bodies) * row.jac_diag_inv;
        row.friction = friction;
        row.normal_row = normal_row;
        self.rows.push(row);
    }

    fn warm_start(&mut self) {
        for row in &self.rows {
            if row.applied_impulse != 0.0 {
                row.apply(&mut self.bodies, row.applied_impulse);
            }
        }
    }

    fn iterate(&mut self) {
        for i in 0..self.rows.len() {
            let row = &self.rows[i];
            if row.kind != RowKind::Normal {
                let limit = row.friction * self.rows[row.normal_row].applied_impulse;
                let row = &mut self.rows[i];
                row.lower = -limit;
                row.upper = limit;
            }
            self.rows[i].resolve(&mut self.bodies);
        }

        for row in self.rows.iter_mut().filter(|r| r.kind == RowKind::Normal) {
            row.resolve_split(&mut self.bodies);
        }
    }
}

impl ContactSolver for SequentialImpulseSolver {
    fn solve(
        &mut self,
        storage: &mut BodyStorage<RigidBody>,
        manifolds: &mut BTreeMap<CollisionPair, ContactManifold>,
        config: &SimulationConfig,
        dt: f32,
        warnings: &mut Vec<String>,
    ) {
        self.bodies.clear();
        self.rows.clear();
        self.points.clear();

        if dt <= 0.0 || manifolds.values().all(ContactManifold::is_empty) {
            return;
        }

        let mut index_of: HashMap<BodyHandle, usize> = HashMap::new();
        for (handle, body) in storage.iter() {
            index_of.insert(handle, self.bodies.len());
            self.bodies.push(SolverBody::from_body(handle, body));
        }

        for (pair, manifold) in manifolds.iter() {
            let (Some(&ia), Some(&ib)) = (index_of.get(&pair.body_a), index_of.get(&pair.body_b)) else {
                continue;
            };
            let (Some(body_a), Some(body_b)) = (storage.get(pair.body_a), storage.get(pair.body_b)) else {
                continue;
            };
            for point_index in 0..manifold.len() {
                self.setup_point((ia, ib), (body_a, body_b), *pair, point_index, manifold, config, dt);
            }
        }

        self.warm_start();
        for _ in 0..config.solver_iterations {
            self.iterate();
        }

        for rows in &self.points {
            if let Some(manifold) = manifolds.get_mut(&rows.pair) {
                if let Some(point) = manifold.get_points_mut().get_mut(rows.point) {
                    point.applied_impulse = self.rows[rows.normal].applied_impulse;
                    point.applied_impulse_lateral1 = self.rows[rows.friction1].applied_impulse;
                    point.applied_impulse_lateral2 = self.rows[rows.friction2].applied_impulse;
                    point.lateral_friction_dir = Some(rows.friction_dir);
                }
            }
        }

        for solver_body in &self.bodies {
            let Some(body) = storage.get_mut(solver_body.handle) else { continue };
            if body.is_static() {
                continue;
            }

            body.set_solver_velocities(
                solver_body.linear_velocity,
                solver_body.angular_velocity,
                solver_body.push_velocity,
                solver_body.turn_velocity,
            );
            if body.sanitize_velocities() {
                warnings.push(format!(
                    "non-finite velocity on {:?} after contact solve, velocities reset",
                    solver_body.handle
                ));
            }
        }
    }
}
