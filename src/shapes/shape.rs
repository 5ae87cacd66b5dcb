use std::ffi::c_void;
use std::sync::atomic::{AtomicI32, AtomicPtr, Ordering};
use std::sync::Arc;

use crate::error::PhysicsError;
use crate::math::{Vector3, Aabb, Ray, Transform};
use crate::shapes::{BoxShape, Box2dShape, Sphere, Capsule, Cylinder, Cone, Plane};
use crate::Result;

/// A shape shared between the caller and any number of bodies
pub type SharedShape = Arc<Shape>;

/// Half extent used for the bounds of unbounded shapes
pub const LARGE_EXTENT: f32 = 1.0e18;

/// Stable numeric shape kinds. The values are part of the C interface and
/// must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ShapeType {
    Box = 0,
    Sphere = 8,
    Capsule = 10,
    Cone = 11,
    Cylinder = 13,
    Box2d = 17,
    StaticPlane = 28,
}

impl ShapeType {
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Box),
            8 => Some(Self::Sphere),
            10 => Some(Self::Capsule),
            11 => Some(Self::Cone),
            13 => Some(Self::Cylinder),
            17 => Some(Self::Box2d),
            28 => Some(Self::StaticPlane),
            _ => None,
        }
    }
}

/// Principal axis that a capsule, cylinder or cone is aligned with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vector3 {
        Vector3::zero().with(self.index(), 1.0)
    }

    /// Swaps the shape axis with Y, so axis-aligned shapes can be written once
    /// against a Y-up frame. The swap is its own inverse.
    #[inline]
    pub(crate) fn canonical(self, v: Vector3) -> Vector3 {
        match self {
            Axis::X => Vector3::new(v.y, v.x, v.z),
            Axis::Y => v,
            Axis::Z => Vector3::new(v.x, v.z, v.y),
        }
    }
}

/// Result of a ray query against a shape in its local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeRayHit {
    /// Ray parameter in `[0, 1]`
    pub fraction: f32,

    /// Surface normal at the hit, facing the ray origin side for solids
    pub normal: Vector3,

    /// False when the ray hit a one-sided surface from behind
    pub front_face: bool,
}

impl ShapeRayHit {
    pub(crate) fn front(fraction: f32, normal: Vector3) -> Self {
        Self { fraction, normal, front_face: true }
    }
}

/// Geometry of a collision shape; each variant carries only its own dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeGeometry {
    Box(BoxShape),
    Box2d(Box2dShape),
    Sphere(Sphere),
    Capsule(Capsule),
    Cylinder(Cylinder),
    Cone(Cone),
    StaticPlane(Plane),
}

impl ShapeGeometry {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeGeometry::Box(_) => ShapeType::Box,
            ShapeGeometry::Box2d(_) => ShapeType::Box2d,
            ShapeGeometry::Sphere(_) => ShapeType::Sphere,
            ShapeGeometry::Capsule(_) => ShapeType::Capsule,
            ShapeGeometry::Cylinder(_) => ShapeType::Cylinder,
            ShapeGeometry::Cone(_) => ShapeType::Cone,
            ShapeGeometry::StaticPlane(_) => ShapeType::StaticPlane,
        }
    }

    /// Whether the shape supports the support-mapping queries used by GJK/EPA
    pub fn is_convex(&self) -> bool {
        !matches!(self, ShapeGeometry::StaticPlane(_))
    }

    /// Radius-like margin wrapped around the core returned by [`Self::core_support`]
    pub fn margin(&self) -> f32 {
        match self {
            ShapeGeometry::Sphere(s) => s.get_radius(),
            ShapeGeometry::Capsule(c) => c.get_radius(),
            _ => 0.0,
        }
    }

    /// Support point of the shape's core (the shape shrunk by its margin) in local space
    pub fn core_support(&self, direction: Vector3) -> Vector3 {
        match self {
            ShapeGeometry::Box(b) => b.support(direction),
            ShapeGeometry::Box2d(b) => b.as_box().support(direction),
            ShapeGeometry::Sphere(_) => Vector3::zero(),
            ShapeGeometry::Capsule(c) => c.core_support(direction),
            ShapeGeometry::Cylinder(c) => c.support(direction),
            ShapeGeometry::Cone(c) => c.support(direction),
            ShapeGeometry::StaticPlane(p) => p.support(direction),
        }
    }

    /// Support point of the full shape (core plus margin) in local space
    pub fn support(&self, direction: Vector3) -> Vector3 {
        let core = self.core_support(direction);
        let margin = self.margin();
        if margin > 0.0 {
            let dir = direction.try_normalize().unwrap_or(Vector3::unit_y());
            core + dir * margin
        } else {
            core
        }
    }

    pub fn local_aabb(&self) -> Aabb {
        match self {
            ShapeGeometry::Box(b) => b.local_aabb(),
            ShapeGeometry::Box2d(b) => b.as_box().local_aabb(),
            ShapeGeometry::Sphere(s) => s.local_aabb(),
            ShapeGeometry::Capsule(c) => c.local_aabb(),
            ShapeGeometry::Cylinder(c) => c.local_aabb(),
            ShapeGeometry::Cone(c) => c.local_aabb(),
            ShapeGeometry::StaticPlane(_) => {
                Aabb::from_center_half_extents(Vector3::zero(), Vector3::splat(LARGE_EXTENT))
            }
        }
    }

    /// World-space bounds, found from the support mapping along each world axis
    pub fn world_aabb(&self, transform: &Transform) -> Aabb {
        if !self.is_convex() {
            return self.local_aabb();
        }

        let mut min = Vector3::zero();
        let mut max = Vector3::zero();
        for axis in 0..3 {
            let dir = Vector3::zero().with(axis, 1.0);
            let hi = transform.transform_point(self.support(transform.inverse_transform_direction(dir)));
            let lo = transform.transform_point(self.support(transform.inverse_transform_direction(-dir)));
            max = max.with(axis, hi[axis]);
            min = min.with(axis, lo[axis]);
        }
        Aabb::new(min, max)
    }

    /// Principal moments of inertia for a body of the given mass
    pub fn local_inertia(&self, mass: f32) -> Vector3 {
        match self {
            ShapeGeometry::Box(b) => b.local_inertia(mass),
            ShapeGeometry::Box2d(b) => b.as_box().local_inertia(mass),
            ShapeGeometry::Sphere(s) => s.local_inertia(mass),
            ShapeGeometry::Capsule(c) => c.local_inertia(mass),
            ShapeGeometry::Cylinder(c) => c.local_inertia(mass),
            ShapeGeometry::Cone(c) => c.local_inertia(mass),
            ShapeGeometry::StaticPlane(_) => Vector3::zero(),
        }
    }

    /// Casts a local-space ray segment (`t` in `[0, 1]`) against the shape
    pub fn ray_cast(&self, ray: &Ray) -> Option<ShapeRayHit> {
        match self {
            ShapeGeometry::Box(b) => b.ray_cast(ray),
            ShapeGeometry::Box2d(b) => b.as_box().ray_cast(ray),
            ShapeGeometry::Sphere(s) => s.ray_cast(ray),
            ShapeGeometry::Capsule(c) => c.ray_cast(ray),
            ShapeGeometry::Cylinder(c) => c.ray_cast(ray),
            ShapeGeometry::Cone(c) => c.ray_cast(ray),
            ShapeGeometry::StaticPlane(p) => p.ray_cast(ray),
        }
    }
}

/// A collision shape plus opaque user metadata.
///
/// The metadata is stored in atomics so it can be updated through a shared
/// handle; the shape never interprets it.
#[derive(Debug)]
pub struct Shape {
    geometry: ShapeGeometry,
    user_pointer: AtomicPtr<c_void>,
    user_index: AtomicI32,
}

fn check_dimension(name: &str, value: f32) -> Result<f32> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PhysicsError::InvalidParameter(format!(
            "{} must be finite and non-negative, got {}",
            name, value
        )))
    }
}

fn check_extents(name: &str, value: Vector3) -> Result<Vector3> {
    check_dimension(name, value.x)?;
    check_dimension(name, value.y)?;
    check_dimension(name, value.z)?;
    Ok(value)
}

impl Shape {
    /// Wraps a geometry with empty user metadata
    pub fn from_geometry(geometry: ShapeGeometry) -> Self {
        Self {
            geometry,
            user_pointer: AtomicPtr::new(std::ptr::null_mut()),
            user_index: AtomicI32::new(0),
        }
    }

    /// Creates a box from its half extents
    pub fn new_box(half_extents: Vector3) -> Result<Self> {
        let half_extents = check_extents("box half extents", half_extents)?;
        Ok(Self::from_geometry(ShapeGeometry::Box(BoxShape::new(half_extents))))
    }

    /// Creates a rectangle in the local XY plane
    pub fn new_box_2d(half_x: f32, half_y: f32) -> Result<Self> {
        let half_x = check_dimension("2D box half extent", half_x)?;
        let half_y = check_dimension("2D box half extent", half_y)?;
        Ok(Self::from_geometry(ShapeGeometry::Box2d(Box2dShape::new(half_x, half_y))))
    }

    pub fn new_sphere(radius: f32) -> Result<Self> {
        let radius = check_dimension("sphere radius", radius)?;
        Ok(Self::from_geometry(ShapeGeometry::Sphere(Sphere::new(radius))))
    }

    /// Creates the plane `normal · p = distance`. The normal is normalized on store.
    pub fn new_plane(normal: Vector3, distance: f32) -> Result<Self> {
        if !normal.is_finite() || !distance.is_finite() {
            return Err(PhysicsError::InvalidParameter(format!(
                "plane normal {} and distance {} must be finite",
                normal, distance
            )));
        }
        let normal = normal.try_normalize().ok_or_else(|| {
            PhysicsError::InvalidParameter("plane normal must be non-zero".to_string())
        })?;
        Ok(Self::from_geometry(ShapeGeometry::StaticPlane(Plane::new(normal, distance))))
    }

    /// Creates a capsule; `height` is the distance between the hemisphere centres
    pub fn new_capsule(axis: Axis, radius: f32, height: f32) -> Result<Self> {
        let radius = check_dimension("capsule radius", radius)?;
        let height = check_dimension("capsule height", height)?;
        Ok(Self::from_geometry(ShapeGeometry::Capsule(Capsule::new(axis, radius, height * 0.5))))
    }

    /// Creates a cylinder from the half extents of its bounding box
    pub fn new_cylinder(axis: Axis, half_extents: Vector3) -> Result<Self> {
        let half_extents = check_extents("cylinder half extents", half_extents)?;
        let radius = match axis {
            Axis::X => half_extents.y,
            Axis::Y | Axis::Z => half_extents.x,
        };
        let half_height = half_extents[axis.index()];
        Ok(Self::from_geometry(ShapeGeometry::Cylinder(Cylinder::new(axis, radius, half_height))))
    }

    /// Creates a cone whose apex sits at `+height/2` along `axis`
    pub fn new_cone(axis: Axis, radius: f32, height: f32) -> Result<Self> {
        let radius = check_dimension("cone radius", radius)?;
        let height = check_dimension("cone height", height)?;
        Ok(Self::from_geometry(ShapeGeometry::Cone(Cone::new(axis, radius, height))))
    }

    pub fn get_geometry(&self) -> &ShapeGeometry {
        &self.geometry
    }

    pub fn shape_type(&self) -> ShapeType {
        self.geometry.shape_type()
    }

    pub fn set_user_pointer(&self, pointer: *mut c_void) {
        self.user_pointer.store(pointer, Ordering::Relaxed);
    }

    pub fn get_user_pointer(&self) -> *mut c_void {
        self.user_pointer.load(Ordering::Relaxed)
    }

    pub fn set_user_index(&self, index: i32) {
        self.user_index.store(index, Ordering::Relaxed);
    }

    pub fn get_user_index(&self) -> i32 {
        self.user_index.load(Ordering::Relaxed)
    }
}

/// Real roots of `a t² + 2 b t + c = 0` in ascending order
pub(crate) fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a.abs() < crate::math::EPSILON {
        if b.abs() < crate::math::EPSILON {
            return None;
        }
        let t = -c / (2.0 * b);
        return Some((t, t));
    }
    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let (t0, t1) = ((-b - root) / a, (-b + root) / a);
    Some((t0.min(t1), t0.max(t1)))
}
