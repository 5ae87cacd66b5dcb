use crate::bodies::{body_flags::BodyFlags, Material, RigidBodyType, AnisotropicFrictionMode};
use crate::collision::CollisionFilterGroups;
use crate::error::PhysicsError;
use crate::math::{Vector3, Transform, Matrix3, Aabb};
use crate::shapes::{SharedShape, ShapeType};
use crate::Result;

/// A rigid body for physics simulation.
///
/// Bodies are created and owned by a [`PhysicsWorld`](crate::PhysicsWorld);
/// the world hands out [`BodyHandle`](crate::core::BodyHandle)s to reach them.
#[derive(Debug, Clone)]
pub struct RigidBody {
    /// The body's collision shape, possibly shared with other bodies
    shape: SharedShape,

    /// Simulated transform
    world_transform: Transform,

    /// Transform for rendering, extrapolated by the leftover step time
    graphics_transform: Transform,

    linear_velocity: Vector3,
    angular_velocity: Vector3,

    /// Position-correction velocity, consumed by the next transform integration
    push_velocity: Vector3,

    /// Orientation-correction velocity, consumed by the next transform integration
    turn_velocity: Vector3,

    total_force: Vector3,
    total_torque: Vector3,

    mass: f32,
    inv_mass: f32,

    /// Principal moments of inertia in local space
    local_inertia: Vector3,
    inv_inertia_local: Vector3,
    inv_inertia_world: Matrix3,

    linear_damping: f32,
    angular_damping: f32,

    material: Material,
    flags: BodyFlags,

    collision_group: CollisionFilterGroups,
    collision_mask: CollisionFilterGroups,

    /// Gravity acceleration, kept in sync with the world
    gravity: Vector3,
}

fn check_finite(name: &str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PhysicsError::InvalidParameter(format!("{} must be finite, got {}", name, value)))
    }
}

fn check_finite_vector(name: &str, value: Vector3) -> Result<Vector3> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PhysicsError::InvalidParameter(format!("{} must be finite, got {}", name, value)))
    }
}

fn check_mass(mass: f32) -> Result<f32> {
    if mass.is_finite() && mass >= 0.0 {
        Ok(mass)
    } else {
        Err(PhysicsError::InvalidParameter(format!(
            "mass must be finite and non-negative, got {}",
            mass
        )))
    }
}

impl RigidBody {
    /// Creates a body with the inertia implied by `mass` and the shape.
    ///
    /// A mass of zero makes the body static. Static planes cannot be dynamic.
    pub fn new(mass: f32, transform: Transform, shape: SharedShape) -> Result<Self> {
        let mass = check_mass(mass)?;
        if !transform.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "body transform must be finite, got position {} rotation {}",
                transform.position, transform.rotation
            )));
        }
        if mass > 0.0 && shape.shape_type() == ShapeType::StaticPlane {
            return Err(PhysicsError::UnsupportedShape(format!(
                "a static plane cannot have a mass of {}",
                mass
            )));
        }

        let transform = Transform::new(transform.position, transform.rotation.normalize());
        let (collision_group, collision_mask) = CollisionFilterGroups::defaults_for(mass == 0.0);
        let local_inertia = shape.get_geometry().local_inertia(mass);

        let mut body = Self {
            shape,
            world_transform: transform,
            graphics_transform: transform,
            linear_velocity: Vector3::zero(),
            angular_velocity: Vector3::zero(),
            push_velocity: Vector3::zero(),
            turn_velocity: Vector3::zero(),
            total_force: Vector3::zero(),
            total_torque: Vector3::zero(),
            mass: 0.0,
            inv_mass: 0.0,
            local_inertia: Vector3::zero(),
            inv_inertia_local: Vector3::zero(),
            inv_inertia_world: Matrix3::zero(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            material: Material::default(),
            flags: BodyFlags::empty(),
            collision_group,
            collision_mask,
            gravity: Vector3::zero(),
        };
        body.set_mass_props(mass, local_inertia)?;

        Ok(body)
    }

    pub fn get_body_type(&self) -> RigidBodyType {
        if self.is_static() {
            RigidBodyType::Static
        } else {
            RigidBodyType::Dynamic
        }
    }

    /// True for zero-mass bodies
    pub fn is_static(&self) -> bool {
        self.flags.contains(BodyFlags::STATIC_OBJECT)
    }

    pub fn get_flags(&self) -> BodyFlags {
        self.flags
    }

    pub fn get_shape(&self) -> &SharedShape {
        &self.shape
    }

    /// Replaces the collision shape. Mass and inertia are left untouched.
    pub fn set_shape(&mut self, shape: SharedShape) {
        self.shape = shape;
    }

    pub fn get_world_transform(&self) -> Transform {
        self.world_transform
    }

    /// Teleports the body. The graphics transform follows immediately.
    pub fn set_world_transform(&mut self, transform: Transform) -> Result<()> {
        if !transform.is_finite() {
            return Err(PhysicsError::InvalidParameter(
                "body transform must be finite".to_string(),
            ));
        }
        self.world_transform = Transform::new(transform.position, transform.rotation.normalize());
        self.graphics_transform = self.world_transform;
        self.update_inertia_tensor_world();
        Ok(())
    }

    pub fn get_graphics_transform(&self) -> Transform {
        self.graphics_transform
    }

    pub(crate) fn set_graphics_transform(&mut self, transform: Transform) {
        self.graphics_transform = transform;
    }

    pub fn get_position(&self) -> Vector3 {
        self.world_transform.position
    }

    /// World-space bounds of the body's shape
    pub fn get_aabb(&self) -> Aabb {
        self.shape.get_geometry().world_aabb(&self.world_transform)
    }

    pub fn get_mass(&self) -> f32 {
        self.mass
    }

    pub fn get_inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn get_local_inertia(&self) -> Vector3 {
        self.local_inertia
    }

    pub fn get_inverse_inertia_local(&self) -> Vector3 {
        self.inv_inertia_local
    }

    pub fn get_inverse_inertia_tensor_world(&self) -> &Matrix3 {
        &self.inv_inertia_world
    }

    /// Sets mass and principal inertia directly. A zero mass makes the body
    /// static; zero inertia components lock rotation about that axis.
    ///
    /// When the body switches between static and dynamic while it still has
    /// the default collision group and mask of its old kind, it takes the
    /// defaults of its new kind. A filter set through
    /// [`set_collision_filter`](Self::set_collision_filter) is left alone.
    pub fn set_mass_props(&mut self, mass: f32, inertia: Vector3) -> Result<()> {
        let mass = check_mass(mass)?;
        let inertia = check_finite_vector("inertia", inertia)?;
        if inertia.x < 0.0 || inertia.y < 0.0 || inertia.z < 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "inertia must be non-negative, got {}",
                inertia
            )));
        }

        let was_static = self.is_static();
        let now_static = mass == 0.0;
        if was_static != now_static
            && (self.collision_group, self.collision_mask) == CollisionFilterGroups::defaults_for(was_static)
        {
            (self.collision_group, self.collision_mask) = CollisionFilterGroups::defaults_for(now_static);
        }

        self.mass = mass;
        if mass == 0.0 {
            self.flags.insert(BodyFlags::STATIC_OBJECT);
            self.inv_mass = 0.0;
        } else {
            self.flags.remove(BodyFlags::STATIC_OBJECT);
            self.inv_mass = 1.0 / mass;
        }

        let invert = |i: f32| if i != 0.0 { 1.0 / i } else { 0.0 };
        self.local_inertia = inertia;
        self.inv_inertia_local = if mass == 0.0 {
            Vector3::zero()
        } else {
            Vector3::new(invert(inertia.x), invert(inertia.y), invert(inertia.z))
        };
        self.update_inertia_tensor_world();

        Ok(())
    }

    /// Recomputes `R · I⁻¹ · Rᵀ` for the current orientation
    pub(crate) fn update_inertia_tensor_world(&mut self) {
        self.inv_inertia_world = self
            .world_transform
            .basis()
            .scaled_congruence(self.inv_inertia_local);
    }

    pub fn get_material(&self) -> &Material {
        &self.material
    }

    pub fn get_friction(&self) -> f32 {
        self.material.friction
    }

    pub fn set_friction(&mut self, friction: f32) -> Result<()> {
        self.material.friction = check_finite("friction", friction)?;
        Ok(())
    }

    pub fn get_rolling_friction(&self) -> f32 {
        self.material.rolling_friction
    }

    pub fn set_rolling_friction(&mut self, friction: f32) -> Result<()> {
        self.material.rolling_friction = check_finite("rolling friction", friction)?;
        Ok(())
    }

    pub fn get_spinning_friction(&self) -> f32 {
        self.material.spinning_friction
    }

    pub fn set_spinning_friction(&mut self, friction: f32) -> Result<()> {
        self.material.spinning_friction = check_finite("spinning friction", friction)?;
        Ok(())
    }

    pub fn get_anisotropic_friction(&self) -> Vector3 {
        self.material.anisotropic_friction
    }

    pub fn get_anisotropic_friction_mode(&self) -> AnisotropicFrictionMode {
        self.material.anisotropic_mode
    }

    pub fn set_anisotropic_friction(
        &mut self,
        friction: Vector3,
        mode: AnisotropicFrictionMode,
    ) -> Result<()> {
        self.material.anisotropic_friction = check_finite_vector("anisotropic friction", friction)?;
        self.material.anisotropic_mode = mode;
        Ok(())
    }

    pub fn get_restitution(&self) -> f32 {
        self.material.restitution
    }

    pub fn set_restitution(&mut self, restitution: f32) -> Result<()> {
        self.material.restitution = check_finite("restitution", restitution)?;
        Ok(())
    }

    pub fn get_contact_stiffness(&self) -> f32 {
        self.material.contact_stiffness
    }

    pub fn get_contact_damping(&self) -> f32 {
        self.material.contact_damping
    }

    /// Whether contacts of this body use the soft stiffness/damping model
    pub fn has_contact_stiffness_and_damping(&self) -> bool {
        self.flags.contains(BodyFlags::HAS_CONTACT_STIFFNESS_DAMPING)
    }

    /// Turns on soft contacts for this body
    pub fn set_contact_stiffness_and_damping(&mut self, stiffness: f32, damping: f32) -> Result<()> {
        if !(stiffness.is_finite() && stiffness > 0.0) {
            return Err(PhysicsError::InvalidParameter(format!(
                "contact stiffness must be finite and positive, got {}",
                stiffness
            )));
        }
        if !(damping.is_finite() && damping >= 0.0) {
            return Err(PhysicsError::InvalidParameter(format!(
                "contact damping must be finite and non-negative, got {}",
                damping
            )));
        }

        self.material.contact_stiffness = stiffness;
        self.material.contact_damping = damping;
        self.flags.insert(BodyFlags::HAS_CONTACT_STIFFNESS_DAMPING);
        Ok(())
    }

    pub fn get_linear_damping(&self) -> f32 {
        self.linear_damping
    }

    pub fn get_angular_damping(&self) -> f32 {
        self.angular_damping
    }

    /// Sets the fraction of velocity lost per second, each in `[0, 1]`
    pub fn set_damping(&mut self, linear: f32, angular: f32) -> Result<()> {
        for (name, value) in [("linear damping", linear), ("angular damping", angular)] {
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(PhysicsError::InvalidParameter(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        self.linear_damping = linear;
        self.angular_damping = angular;
        Ok(())
    }

    pub fn get_collision_group(&self) -> CollisionFilterGroups {
        self.collision_group
    }

    pub fn get_collision_mask(&self) -> CollisionFilterGroups {
        self.collision_mask
    }

    pub fn set_collision_filter(&mut self, group: CollisionFilterGroups, mask: CollisionFilterGroups) {
        self.collision_group = group;
        self.collision_mask = mask;
    }

    pub fn get_gravity(&self) -> Vector3 {
        self.gravity
    }

    pub(crate) fn set_gravity(&mut self, gravity: Vector3) {
        self.gravity = gravity;
    }

    pub fn get_linear_velocity(&self) -> Vector3 {
        self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector3) -> Result<()> {
        self.linear_velocity = check_finite_vector("linear velocity", velocity)?;
        Ok(())
    }

    pub fn get_angular_velocity(&self) -> Vector3 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, velocity: Vector3) -> Result<()> {
        self.angular_velocity = check_finite_vector("angular velocity", velocity)?;
        Ok(())
    }

    pub fn get_push_velocity(&self) -> Vector3 {
        self.push_velocity
    }

    pub fn set_push_velocity(&mut self, velocity: Vector3) -> Result<()> {
        self.push_velocity = check_finite_vector("push velocity", velocity)?;
        Ok(())
    }

    pub fn get_turn_velocity(&self) -> Vector3 {
        self.turn_velocity
    }

    pub fn set_turn_velocity(&mut self, velocity: Vector3) -> Result<()> {
        self.turn_velocity = check_finite_vector("turn velocity", velocity)?;
        Ok(())
    }

    /// Velocity of a point given relative to the centre of mass
    pub fn get_velocity_in_local_point(&self, rel_pos: Vector3) -> Vector3 {
        self.linear_velocity + self.angular_velocity.cross(&rel_pos)
    }

    pub fn get_total_force(&self) -> Vector3 {
        self.total_force
    }

    pub fn get_total_torque(&self) -> Vector3 {
        self.total_torque
    }

    pub fn clear_forces(&mut self) {
        self.total_force = Vector3::zero();
        self.total_torque = Vector3::zero();
    }

    pub fn apply_central_force(&mut self, force: Vector3) {
        if self.is_static() {
            return;
        }
        self.total_force += force;
    }

    /// Applies a force at `rel_pos`, relative to the centre of mass in world axes
    pub fn apply_force(&mut self, force: Vector3, rel_pos: Vector3) {
        if self.is_static() {
            return;
        }
        self.total_force += force;
        self.total_torque += rel_pos.cross(&force);
    }

    pub fn apply_torque(&mut self, torque: Vector3) {
        if self.is_static() {
            return;
        }
        self.total_torque += torque;
    }

    pub fn apply_central_impulse(&mut self, impulse: Vector3) {
        if self.is_static() {
            return;
        }
        self.linear_velocity += impulse * self.inv_mass;
    }

    pub fn apply_impulse(&mut self, impulse: Vector3, rel_pos: Vector3) {
        if self.is_static() {
            return;
        }
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += self.inv_inertia_world.multiply_vector(rel_pos.cross(&impulse));
    }

    pub fn apply_torque_impulse(&mut self, torque: Vector3) {
        if self.is_static() {
            return;
        }
        self.angular_velocity += self.inv_inertia_world.multiply_vector(torque);
    }

    pub fn apply_central_push_impulse(&mut self, impulse: Vector3) {
        if self.is_static() {
            return;
        }
        self.push_velocity += impulse * self.inv_mass;
    }

    pub fn apply_push_impulse(&mut self, impulse: Vector3, rel_pos: Vector3) {
        if self.is_static() {
            return;
        }
        self.push_velocity += impulse * self.inv_mass;
        self.turn_velocity += self.inv_inertia_world.multiply_vector(rel_pos.cross(&impulse));
    }

    pub fn apply_torque_turn_impulse(&mut self, torque: Vector3) {
        if self.is_static() {
            return;
        }
        self.turn_velocity += self.inv_inertia_world.multiply_vector(torque);
    }

    /// Adds `mass * gravity` to the force accumulator
    pub(crate) fn apply_gravity(&mut self) {
        if self.is_static() {
            return;
        }
        self.total_force += self.gravity * self.mass;
    }

    /// Integrates accumulated force and torque into velocity, then applies
    /// exponential damping
    pub(crate) fn integrate_forces(&mut self, dt: f32) {
        if self.is_static() {
            return;
        }

        self.linear_velocity += self.total_force * (self.inv_mass * dt);
        self.angular_velocity += self.inv_inertia_world.multiply_vector(self.total_torque) * dt;

        self.linear_velocity *= (1.0 - self.linear_damping).powf(dt);
        self.angular_velocity *= (1.0 - self.angular_damping).powf(dt);
    }

    /// Moves the body by its velocity plus the correction channels, which are
    /// then consumed.
    ///
    /// A move that would leave the transform non-finite is rejected: the body
    /// stays put and all its velocities are zeroed.
    pub(crate) fn integrate_transform(&mut self, dt: f32) -> Result<()> {
        if self.is_static() {
            return Ok(());
        }

        let next = self.world_transform.integrate(
            self.linear_velocity + self.push_velocity,
            self.angular_velocity + self.turn_velocity,
            dt,
        );
        self.push_velocity = Vector3::zero();
        self.turn_velocity = Vector3::zero();

        if !next.is_finite() {
            self.linear_velocity = Vector3::zero();
            self.angular_velocity = Vector3::zero();
            return Err(PhysicsError::SimulationError(format!(
                "integration from {} produced a non-finite transform; body stopped",
                self.world_transform.position
            )));
        }

        self.world_transform = next;
        self.update_inertia_tensor_world();
        Ok(())
    }

    pub(crate) fn set_solver_velocities(&mut self, linear: Vector3, angular: Vector3, push: Vector3, turn: Vector3) {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self.push_velocity = push;
        self.turn_velocity = turn;
    }

    /// Zeroes any non-finite velocity. Returns true if something was reset.
    pub(crate) fn sanitize_velocities(&mut self) -> bool {
        let mut reset = false;
        for velocity in [
            &mut self.linear_velocity,
            &mut self.angular_velocity,
            &mut self.push_velocity,
            &mut self.turn_velocity,
        ] {
            if !velocity.is_finite() {
                *velocity = Vector3::zero();
                reset = true;
            }
        }
        reset
    }
}
