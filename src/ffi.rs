//! C-compatible interface mirroring the `cbt*` function family.
//!
//! Worlds, shapes and bodies are handed out as opaque pointers:
//!
//! * a world handle owns a boxed [`PhysicsWorld`] together with the records
//!   behind its body handles;
//! * a shape handle is the raw pointer of an `Arc<Shape>`, so every body
//!   using the shape keeps it alive and `cbtBodyGetShape` returns the address
//!   the caller created;
//! * a body handle points at a record naming its world and arena slot. The
//!   world keeps one record per slot and frees them all when it is
//!   destroyed. After `cbtBodyDestroy`, calls through the old handle are
//!   rejected and logged until another body takes the slot; that body is
//!   then handed the same record.
//!
//! Null handles and rejected arguments turn calls into logged no-ops that
//! return zero values.
//!
//! # Safety
//!
//! Every non-null handle must come from the matching create function and must
//! not be used after the destroy function of its owner has run. Vector
//! arguments must point to three readable (or writable) floats, and transform
//! arguments to four such vectors.
#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]

use std::ffi::{c_char, c_void, CString};
use std::ptr;
use std::sync::Arc;

use crate::bodies::{AnisotropicFrictionMode, RigidBody};
use crate::collision::CollisionFilterGroups;
use crate::core::{BodyHandle, PhysicsWorld, RayCastFlags};
use crate::debug::DebugDraw;
use crate::math::{Transform, Vector3};
use crate::shapes::{Axis, Shape};
use crate::Result;

pub const CBT_COLLISION_FILTER_DEFAULT: i32 = 1;
pub const CBT_COLLISION_FILTER_STATIC: i32 = 2;
pub const CBT_COLLISION_FILTER_KINEMATIC: i32 = 4;
pub const CBT_COLLISION_FILTER_DEBRIS: i32 = 8;
pub const CBT_COLLISION_FILTER_SENSOR_TRIGGER: i32 = 16;
pub const CBT_COLLISION_FILTER_CHARACTER: i32 = 32;
pub const CBT_COLLISION_FILTER_ALL: i32 = -1;

pub const CBT_RAYCAST_FLAG_SKIP_BACKFACES: u32 = 1;
pub const CBT_RAYCAST_FLAG_KEEP_UNFLIPPED_NORMALS: u32 = 2;

pub const CBT_ANISOTROPIC_FRICTION_DISABLED: i32 = 0;
pub const CBT_ANISOTROPIC_FRICTION: i32 = 1;
pub const CBT_ANISOTROPIC_ROLLING_FRICTION: i32 = 2;

pub const CBT_SHAPE_TYPE_BOX: i32 = 0;
pub const CBT_SHAPE_TYPE_BOX_2D: i32 = 17;
pub const CBT_SHAPE_TYPE_SPHERE: i32 = 8;
pub const CBT_SHAPE_TYPE_CAPSULE: i32 = 10;
pub const CBT_SHAPE_TYPE_CONE: i32 = 11;
pub const CBT_SHAPE_TYPE_CYLINDER: i32 = 13;
pub const CBT_SHAPE_TYPE_STATIC_PLANE: i32 = 28;

pub type CbtVector3 = [f32; 3];

/// A world plus the records behind its body handles
pub struct CbtWorld {
    world: PhysicsWorld,

    /// Body records indexed by arena slot, freed with the world
    records: Vec<*mut CbtBody>,
}

impl CbtWorld {
    /// The record handed out for a live body
    fn record_of(&self, handle: BodyHandle) -> CbtBodyHandle {
        self.records
            .get(handle.index as usize)
            .copied()
            // SAFETY: non-null records stay allocated until the world drops
            .filter(|record| !record.is_null() && unsafe { (**record).handle } == handle)
            .unwrap_or(ptr::null_mut())
    }

    /// Points the record of the body's slot at `handle`, allocating it the
    /// first time the slot is used
    fn bind_record(&mut self, world_handle: CbtWorldHandle, handle: BodyHandle) -> CbtBodyHandle {
        let slot = handle.index as usize;
        if slot >= self.records.len() {
            self.records.resize(slot + 1, ptr::null_mut());
        }

        let record = &mut self.records[slot];
        if record.is_null() {
            *record = Box::into_raw(Box::new(CbtBody { world: world_handle, handle }));
        } else {
            // SAFETY: the record was allocated above on an earlier call and
            // is only freed by `Drop`
            unsafe { (**record).handle = handle };
        }
        *record
    }
}

impl Drop for CbtWorld {
    fn drop(&mut self) {
        for record in self.records.drain(..).filter(|record| !record.is_null()) {
            // SAFETY: each record was leaked from a box by `cbtBodyCreate`
            drop(unsafe { Box::from_raw(record) });
        }
    }
}

/// What a body handle points at
#[derive(Debug, Clone, Copy)]
pub struct CbtBody {
    world: *mut CbtWorld,
    handle: BodyHandle,
}

pub type CbtWorldHandle = *mut CbtWorld;
pub type CbtShapeHandle = *const Shape;
pub type CbtBodyHandle = *mut CbtBody;

pub type CbtDrawLineCallback =
    unsafe extern "C" fn(p0: *const f32, p1: *const f32, color: *const f32, user_data: *mut c_void);
pub type CbtDrawContactPointCallback = unsafe extern "C" fn(
    point: *const f32,
    normal: *const f32,
    distance: f32,
    life_time: i32,
    color: *const f32,
    user_data: *mut c_void,
);
pub type CbtReportErrorWarningCallback = unsafe extern "C" fn(message: *const c_char, user_data: *mut c_void);

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CbtDebugDrawCallbacks {
    pub draw_line: Option<CbtDrawLineCallback>,
    pub draw_contact_point: Option<CbtDrawContactPointCallback>,
    pub report_error_warning: Option<CbtReportErrorWarningCallback>,
    pub user_data: *mut c_void,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CbtRayCastResult {
    pub hit_normal_world: CbtVector3,
    pub hit_point_world: CbtVector3,
    pub hit_fraction: f32,
    pub body: CbtBodyHandle,
}

/// Forwards debug primitives to C function pointers
struct CallbackDebugDraw {
    callbacks: CbtDebugDrawCallbacks,
}

impl DebugDraw for CallbackDebugDraw {
    fn draw_line(&mut self, from: Vector3, to: Vector3, color: Vector3) {
        if let Some(draw_line) = self.callbacks.draw_line {
            let (p0, p1, color): (CbtVector3, CbtVector3, CbtVector3) = (from.into(), to.into(), color.into());
            unsafe { draw_line(p0.as_ptr(), p1.as_ptr(), color.as_ptr(), self.callbacks.user_data) }
        }
    }

    fn draw_contact_point(&mut self, point: Vector3, normal: Vector3, distance: f32, life_time: i32, color: Vector3) {
        if let Some(draw_contact_point) = self.callbacks.draw_contact_point {
            let (point, normal, color): (CbtVector3, CbtVector3, CbtVector3) = (point.into(), normal.into(), color.into());
            unsafe {
                draw_contact_point(
                    point.as_ptr(),
                    normal.as_ptr(),
                    distance,
                    life_time,
                    color.as_ptr(),
                    self.callbacks.user_data,
                )
            }
        }
    }

    fn report_error_warning(&mut self, warning: &str) {
        if let Some(report) = self.callbacks.report_error_warning {
            if let Ok(message) = CString::new(warning.replace('\0', " ")) {
                unsafe { report(message.as_ptr(), self.callbacks.user_data) }
            }
        }
    }
}

unsafe fn read_vector(ptr: *const f32) -> Option<Vector3> {
    if ptr.is_null() {
        return None;
    }
    let v = &*(ptr as *const CbtVector3);
    Some(Vector3::from(*v))
}

unsafe fn write_vector(ptr: *mut f32, value: Vector3) {
    if !ptr.is_null() {
        *(ptr as *mut CbtVector3) = value.into();
    }
}

unsafe fn world_mut<'a>(handle: CbtWorldHandle, call: &str) -> Option<&'a mut CbtWorld> {
    let world = handle.as_mut();
    if world.is_none() {
        log::warn!("{}: null world handle", call);
    }
    world
}

unsafe fn with_body<R>(handle: CbtBodyHandle, call: &str, default: R, f: impl FnOnce(&mut RigidBody) -> R) -> R {
    let Some(record) = handle.as_ref().copied() else {
        log::warn!("{}: null body handle", call);
        return default;
    };
    let Some(world) = record.world.as_mut() else {
        log::warn!("{}: body handle without a world", call);
        return default;
    };
    match world.world.get_body_mut(record.handle) {
        Ok(body) => f(body),
        Err(error) => {
            log::warn!("{}: {}", call, error);
            default
        }
    }
}

unsafe fn with_body_vector(handle: CbtBodyHandle, out: *mut f32, call: &str, f: impl FnOnce(&RigidBody) -> Vector3) {
    let value = with_body(handle, call, Vector3::zero(), |body| f(body));
    write_vector(out, value);
}

unsafe fn set_body_vector(
    handle: CbtBodyHandle,
    value: *const f32,
    call: &str,
    f: impl FnOnce(&mut RigidBody, Vector3) -> Result<()>,
) {
    let Some(value) = read_vector(value) else {
        log::warn!("{}: null vector argument", call);
        return;
    };
    with_body(handle, call, (), |body| report(call, f(body, value)));
}

fn report(call: &str, result: Result<()>) {
    if let Err(error) = result {
        log::warn!("{}: {}", call, error);
    }
}

fn share_shape(call: &str, shape: Result<Shape>) -> CbtShapeHandle {
    match shape {
        Ok(shape) => Arc::into_raw(Arc::new(shape)),
        Err(error) => {
            log::warn!("{}: {}", call, error);
            ptr::null()
        }
    }
}

/// Borrows a shape handle as a new strong reference
unsafe fn clone_shape(handle: CbtShapeHandle) -> Option<Arc<Shape>> {
    if handle.is_null() {
        return None;
    }
    Arc::increment_strong_count(handle);
    Some(Arc::from_raw(handle))
}

//
// World
//

#[no_mangle]
pub extern "C" fn cbtWorldCreate() -> CbtWorldHandle {
    Box::into_raw(Box::new(CbtWorld {
        world: PhysicsWorld::new(),
        records: Vec::new(),
    }))
}

#[no_mangle]
pub unsafe extern "C" fn cbtWorldDestroy(handle: CbtWorldHandle) {
    if handle.is_null() {
        log::warn!("cbtWorldDestroy: null world handle");
        return;
    }
    drop(Box::from_raw(handle));
}

#[no_mangle]
pub unsafe extern "C" fn cbtWorldSetGravity(handle: CbtWorldHandle, gravity: *const f32) {
    let Some(world) = world_mut(handle, "cbtWorldSetGravity") else {
        return;
    };
    match read_vector(gravity) {
        Some(gravity) => report("cbtWorldSetGravity", world.world.set_gravity(gravity)),
        None => log::warn!("cbtWorldSetGravity: null vector argument"),
    }
}

#[no_mangle]
pub unsafe extern "C" fn cbtWorldGetGravity(handle: CbtWorldHandle, gravity: *mut f32) {
    if let Some(world) = world_mut(handle, "cbtWorldGetGravity") {
        write_vector(gravity, world.world.get_gravity());
    }
}

/// Returns the number of sub-steps executed, or 0 when the call is rejected
#[no_mangle]
pub unsafe extern "C" fn cbtWorldStepSimulation(
    handle: CbtWorldHandle,
    time_step: f32,
    max_sub_steps: i32,
    fixed_time_step: f32,
) -> i32 {
    let Some(world) = world_mut(handle, "cbtWorldStepSimulation") else {
        return 0;
    };
    let Ok(max_sub_steps) = u32::try_from(max_sub_steps) else {
        log::warn!("cbtWorldStepSimulation: negative sub-step cap {}", max_sub_steps);
        return 0;
    };

    match world.world.step_simulation(time_step, max_sub_steps, fixed_time_step) {
        Ok(steps) => steps.min(i32::MAX as u32) as i32,
        Err(error) => {
            log::warn!("cbtWorldStepSimulation: {}", error);
            0
        }
    }
}

/// Fills `result` with the closest hit and returns whether there was one.
/// Without a hit the body is null and the fraction is 1.
#[no_mangle]
pub unsafe extern "C" fn cbtRayTestClosest(
    handle: CbtWorldHandle,
    ray_from_world: *const f32,
    ray_to_world: *const f32,
    collision_filter_group: i32,
    collision_filter_mask: i32,
    flags: u32,
    result: *mut CbtRayCastResult,
) -> bool {
    let Some(world) = world_mut(handle, "cbtRayTestClosest") else {
        return false;
    };
    let (Some(from), Some(to)) = (read_vector(ray_from_world), read_vector(ray_to_world)) else {
        log::warn!("cbtRayTestClosest: null ray end point");
        return false;
    };

    let hit = world.world.ray_test_closest(
        from,
        to,
        CollisionFilterGroups::from_bits_retain(collision_filter_group),
        CollisionFilterGroups::from_bits_retain(collision_filter_mask),
        RayCastFlags::from_bits_truncate(flags),
    );

    let out = match hit {
        Some(hit) => CbtRayCastResult {
            hit_normal_world: hit.hit_normal_world.into(),
            hit_point_world: hit.hit_point_world.into(),
            hit_fraction: hit.hit_fraction,
            body: world.record_of(hit.body),
        },
        None => CbtRayCastResult {
            hit_normal_world: [0.0; 3],
            hit_point_world: to.into(),
            hit_fraction: 1.0,
            body: ptr::null_mut(),
        },
    };
    if let Some(result) = result.as_mut() {
        *result = out;
    }
    hit.is_some()
}

/// Installs C callbacks as the world's debug drawer; null removes it
#[no_mangle]
pub unsafe extern "C" fn cbtWorldDebugSetCallbacks(handle: CbtWorldHandle, callbacks: *const CbtDebugDrawCallbacks) {
    let Some(world) = world_mut(handle, "cbtWorldDebugSetCallbacks") else {
        return;
    };
    let drawer = callbacks
        .as_ref()
        .map(|callbacks| Box::new(CallbackDebugDraw { callbacks: *callbacks }) as Box<dyn DebugDraw>);
    world.world.set_debug_drawer(drawer);
}

#[no_mangle]
pub unsafe extern "C" fn cbtWorldDebugDraw(handle: CbtWorldHandle) {
    if let Some(world) = world_mut(handle, "cbtWorldDebugDraw") {
        world.world.debug_draw();
    }
}

#[no_mangle]
pub unsafe extern "C" fn cbtWorldDebugDrawLine(
    handle: CbtWorldHandle,
    p0: *const f32,
    p1: *const f32,
    color: *const f32,
) {
    let Some(world) = world_mut(handle, "cbtWorldDebugDrawLine") else {
        return;
    };
    if let (Some(p0), Some(p1), Some(color)) = (read_vector(p0), read_vector(p1), read_vector(color)) {
        world.world.debug_draw_line(p0, p1, color);
    }
}

#[no_mangle]
pub unsafe extern "C" fn cbtWorldDebugDrawSphere(
    handle: CbtWorldHandle,
    position: *const f32,
    radius: f32,
    color: *const f32,
) {
    let Some(world) = world_mut(handle, "cbtWorldDebugDrawSphere") else {
        return;
    };
    if let (Some(position), Some(color)) = (read_vector(position), read_vector(color)) {
        world.world.debug_draw_sphere(position, radius, color);
    }
}

//
// Shape
//

#[no_mangle]
pub unsafe extern "C" fn cbtShapeCreateBox(half_extents: *const f32) -> CbtShapeHandle {
    match read_vector(half_extents) {
        Some(half_extents) => share_shape("cbtShapeCreateBox", Shape::new_box(half_extents)),
        None => {
            log::warn!("cbtShapeCreateBox: null vector argument");
            ptr::null()
        }
    }
}

#[no_mangle]
pub extern "C" fn cbtShapeCreateBox2d(x_half_extent: f32, y_half_extent: f32) -> CbtShapeHandle {
    share_shape("cbtShapeCreateBox2d", Shape::new_box_2d(x_half_extent, y_half_extent))
}

#[no_mangle]
pub extern "C" fn cbtShapeCreateSphere(radius: f32) -> CbtShapeHandle {
    share_shape("cbtShapeCreateSphere", Shape::new_sphere(radius))
}

#[no_mangle]
pub unsafe extern "C" fn cbtShapeCreatePlane(normal: *const f32, distance: f32) -> CbtShapeHandle {
    match read_vector(normal) {
        Some(normal) => share_shape("cbtShapeCreatePlane", Shape::new_plane(normal, distance)),
        None => {
            log::warn!("cbtShapeCreatePlane: null vector argument");
            ptr::null()
        }
    }
}

#[no_mangle]
pub extern "C" fn cbtShapeCreateCapsuleX(radius: f32, height: f32) -> CbtShapeHandle {
    share_shape("cbtShapeCreateCapsuleX", Shape::new_capsule(Axis::X, radius, height))
}

#[no_mangle]
pub extern "C" fn cbtShapeCreateCapsuleY(radius: f32, height: f32) -> CbtShapeHandle {
    share_shape("cbtShapeCreateCapsuleY", Shape::new_capsule(Axis::Y, radius, height))
}

#[no_mangle]
pub extern "C" fn cbtShapeCreateCapsuleZ(radius: f32, height: f32) -> CbtShapeHandle {
    share_shape("cbtShapeCreateCapsuleZ", Shape::new_capsule(Axis::Z, radius, height))
}

unsafe fn create_cylinder(call: &str, axis: Axis, half_extents: *const f32) -> CbtShapeHandle {
    match read_vector(half_extents) {
        Some(half_extents) => share_shape(call, Shape::new_cylinder(axis, half_extents)),
        None => {
            log::warn!("{}: null vector argument", call);
            ptr::null()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn cbtShapeCreateCylinderX(half_extents: *const f32) -> CbtShapeHandle {
    create_cylinder("cbtShapeCreateCylinderX", Axis::X, half_extents)
}

#[no_mangle]
pub unsafe extern "C" fn cbtShapeCreateCylinderY(half_extents: *const f32) -> CbtShapeHandle {
    create_cylinder("cbtShapeCreateCylinderY", Axis::Y, half_extents)
}

#[no_mangle]
pub unsafe extern "C" fn cbtShapeCreateCylinderZ(half_extents: *const f32) -> CbtShapeHandle {
    create_cylinder("cbtShapeCreateCylinderZ", Axis::Z, half_extents)
}

#[no_mangle]
pub extern "C" fn cbtShapeCreateConeX(radius: f32, height: f32) -> CbtShapeHandle {
    share_shape("cbtShapeCreateConeX", Shape::new_cone(Axis::X, radius, height))
}

#[no_mangle]
pub extern "C" fn cbtShapeCreateConeY(radius: f32, height: f32) -> CbtShapeHandle {
    share_shape("cbtShapeCreateConeY", Shape::new_cone(Axis::Y, radius, height))
}

#[no_mangle]
pub extern "C" fn cbtShapeCreateConeZ(radius: f32, height: f32) -> CbtShapeHandle {
    share_shape("cbtShapeCreateConeZ", Shape::new_cone(Axis::Z, radius, height))
}

#[no_mangle]
pub unsafe extern "C" fn cbtShapeSetUserPointer(handle: CbtShapeHandle, user_pointer: *mut c_void) {
    match handle.as_ref() {
        Some(shape) => shape.set_user_pointer(user_pointer),
        None => log::warn!("cbtShapeSetUserPointer: null shape handle"),
    }
}

#[no_mangle]
pub unsafe extern "C" fn cbtShapeSetUserIndex(handle: CbtShapeHandle, user_index: i32) {
    match handle.as_ref() {
        Some(shape) => shape.set_user_index(user_index),
        None => log::warn!("cbtShapeSetUserIndex: null shape handle"),
    }
}

#[no_mangle]
pub unsafe extern "C" fn cbtShapeGetUserPointer(handle: CbtShapeHandle) -> *mut c_void {
    handle.as_ref().map_or(ptr::null_mut(), Shape::get_user_pointer)
}

#[no_mangle]
pub unsafe extern "C" fn cbtShapeGetUserIndex(handle: CbtShapeHandle) -> i32 {
    handle.as_ref().map_or(0, Shape::get_user_index)
}

/// Releases the caller's reference; bodies using the shape keep it alive
#[no_mangle]
pub unsafe extern "C" fn cbtShapeDestroy(handle: CbtShapeHandle) {
    if handle.is_null() {
        log::warn!("cbtShapeDestroy: null shape handle");
        return;
    }
    drop(Arc::from_raw(handle));
}

/// Returns one of the `CBT_SHAPE_TYPE_*` values, or -1 for a null handle
#[no_mangle]
pub unsafe extern "C" fn cbtShapeGetType(handle: CbtShapeHandle) -> i32 {
    handle.as_ref().map_or(-1, |shape| shape.shape_type().as_raw())
}

//
// Body
//

#[no_mangle]
pub unsafe extern "C" fn cbtBodyCreate(
    world_handle: CbtWorldHandle,
    mass: f32,
    transform: *const CbtVector3,
    shape_handle: CbtShapeHandle,
) -> CbtBodyHandle {
    let Some(world) = world_mut(world_handle, "cbtBodyCreate") else {
        return ptr::null_mut();
    };
    if transform.is_null() {
        log::warn!("cbtBodyCreate: null transform");
        return ptr::null_mut();
    }
    let Some(shape) = clone_shape(shape_handle) else {
        log::warn!("cbtBodyCreate: null shape handle");
        return ptr::null_mut();
    };

    let basis = std::slice::from_raw_parts(transform, 4);
    let transform = Transform::from_basis(&[
        Vector3::from(basis[0]),
        Vector3::from(basis[1]),
        Vector3::from(basis[2]),
        Vector3::from(basis[3]),
    ]);

    match world.world.create_body(mass, transform, shape) {
        Ok(handle) => world.bind_record(world_handle, handle),
        Err(error) => {
            log::warn!("cbtBodyCreate: {}", error);
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyDestroy(world_handle: CbtWorldHandle, body_handle: CbtBodyHandle) {
    let Some(world) = world_mut(world_handle, "cbtBodyDestroy") else {
        return;
    };
    let Some(record) = body_handle.as_ref().copied() else {
        log::warn!("cbtBodyDestroy: null body handle");
        return;
    };
    if record.world != world_handle {
        log::warn!("cbtBodyDestroy: body belongs to another world");
        return;
    }

    if let Err(error) = world.world.destroy_body(record.handle) {
        log::warn!("cbtBodyDestroy: {}", error);
    }
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetShape(body_handle: CbtBodyHandle, shape_handle: CbtShapeHandle) {
    let Some(shape) = clone_shape(shape_handle) else {
        log::warn!("cbtBodySetShape: null shape handle");
        return;
    };
    with_body(body_handle, "cbtBodySetShape", (), |body| body.set_shape(shape));
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetShape(handle: CbtBodyHandle) -> CbtShapeHandle {
    with_body(handle, "cbtBodyGetShape", ptr::null(), |body| Arc::as_ptr(body.get_shape()))
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetRestitution(handle: CbtBodyHandle, restitution: f32) {
    with_body(handle, "cbtBodySetRestitution", (), |body| {
        report("cbtBodySetRestitution", body.set_restitution(restitution))
    });
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetFriction(handle: CbtBodyHandle, friction: f32) {
    with_body(handle, "cbtBodySetFriction", (), |body| {
        report("cbtBodySetFriction", body.set_friction(friction))
    });
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetRollingFriction(handle: CbtBodyHandle, friction: f32) {
    with_body(handle, "cbtBodySetRollingFriction", (), |body| {
        report("cbtBodySetRollingFriction", body.set_rolling_friction(friction))
    });
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetSpinningFriction(handle: CbtBodyHandle, friction: f32) {
    with_body(handle, "cbtBodySetSpinningFriction", (), |body| {
        report("cbtBodySetSpinningFriction", body.set_spinning_friction(friction))
    });
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetAnisotropicFriction(handle: CbtBodyHandle, friction: *const f32, mode: i32) {
    let Some(mode) = AnisotropicFrictionMode::from_raw(mode) else {
        log::warn!("cbtBodySetAnisotropicFriction: unknown mode {}", mode);
        return;
    };
    set_body_vector(handle, friction, "cbtBodySetAnisotropicFriction", |body, friction| {
        body.set_anisotropic_friction(friction, mode)
    });
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetContactStiffnessAndDamping(handle: CbtBodyHandle, stiffness: f32, damping: f32) {
    with_body(handle, "cbtBodySetContactStiffnessAndDamping", (), |body| {
        report(
            "cbtBodySetContactStiffnessAndDamping",
            body.set_contact_stiffness_and_damping(stiffness, damping),
        )
    });
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetMassProps(handle: CbtBodyHandle, mass: f32, inertia: *const f32) {
    set_body_vector(handle, inertia, "cbtBodySetMassProps", |body, inertia| {
        body.set_mass_props(mass, inertia)
    });
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetDamping(handle: CbtBodyHandle, linear: f32, angular: f32) {
    with_body(handle, "cbtBodySetDamping", (), |body| {
        report("cbtBodySetDamping", body.set_damping(linear, angular))
    });
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetLinearVelocity(handle: CbtBodyHandle, velocity: *const f32) {
    set_body_vector(handle, velocity, "cbtBodySetLinearVelocity", RigidBody::set_linear_velocity);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetAngularVelocity(handle: CbtBodyHandle, velocity: *const f32) {
    set_body_vector(handle, velocity, "cbtBodySetAngularVelocity", RigidBody::set_angular_velocity);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetPushVelocity(handle: CbtBodyHandle, velocity: *const f32) {
    set_body_vector(handle, velocity, "cbtBodySetPushVelocity", RigidBody::set_push_velocity);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodySetTurnVelocity(handle: CbtBodyHandle, velocity: *const f32) {
    set_body_vector(handle, velocity, "cbtBodySetTurnVelocity", RigidBody::set_turn_velocity);
}

/// Applies a force-like vector through `apply`, which never fails
unsafe fn apply_body_vector(handle: CbtBodyHandle, value: *const f32, call: &str, apply: impl FnOnce(&mut RigidBody, Vector3)) {
    set_body_vector(handle, value, call, |body, value| {
        apply(body, value);
        Ok(())
    });
}

/// Like [`apply_body_vector`] with an extra relative position
unsafe fn apply_body_vector_at(
    handle: CbtBodyHandle,
    value: *const f32,
    rel_pos: *const f32,
    call: &str,
    apply: impl FnOnce(&mut RigidBody, Vector3, Vector3),
) {
    let Some(rel_pos) = read_vector(rel_pos) else {
        log::warn!("{}: null relative position", call);
        return;
    };
    apply_body_vector(handle, value, call, |body, value| apply(body, value, rel_pos));
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyApplyCentralForce(handle: CbtBodyHandle, force: *const f32) {
    apply_body_vector(handle, force, "cbtBodyApplyCentralForce", RigidBody::apply_central_force);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyApplyCentralImpulse(handle: CbtBodyHandle, impulse: *const f32) {
    apply_body_vector(handle, impulse, "cbtBodyApplyCentralImpulse", RigidBody::apply_central_impulse);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyApplyCentralPushImpulse(handle: CbtBodyHandle, impulse: *const f32) {
    apply_body_vector(handle, impulse, "cbtBodyApplyCentralPushImpulse", RigidBody::apply_central_push_impulse);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyApplyForce(handle: CbtBodyHandle, force: *const f32, rel_pos: *const f32) {
    apply_body_vector_at(handle, force, rel_pos, "cbtBodyApplyForce", RigidBody::apply_force);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyClearForces(handle: CbtBodyHandle) {
    with_body(handle, "cbtBodyClearForces", (), RigidBody::clear_forces);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyApplyImpulse(handle: CbtBodyHandle, impulse: *const f32, rel_pos: *const f32) {
    apply_body_vector_at(handle, impulse, rel_pos, "cbtBodyApplyImpulse", RigidBody::apply_impulse);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyApplyPushImpulse(handle: CbtBodyHandle, impulse: *const f32, rel_pos: *const f32) {
    apply_body_vector_at(handle, impulse, rel_pos, "cbtBodyApplyPushImpulse", RigidBody::apply_push_impulse);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyApplyTorque(handle: CbtBodyHandle, torque: *const f32) {
    apply_body_vector(handle, torque, "cbtBodyApplyTorque", RigidBody::apply_torque);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyApplyTorqueImpulse(handle: CbtBodyHandle, impulse: *const f32) {
    apply_body_vector(handle, impulse, "cbtBodyApplyTorqueImpulse", RigidBody::apply_torque_impulse);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyApplyTorqueTurnImpulse(handle: CbtBodyHandle, impulse: *const f32) {
    apply_body_vector(handle, impulse, "cbtBodyApplyTorqueTurnImpulse", RigidBody::apply_torque_turn_impulse);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetRestitution(handle: CbtBodyHandle) -> f32 {
    with_body(handle, "cbtBodyGetRestitution", 0.0, |body| body.get_restitution())
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetFriction(handle: CbtBodyHandle) -> f32 {
    with_body(handle, "cbtBodyGetFriction", 0.0, |body| body.get_friction())
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetRollingFriction(handle: CbtBodyHandle) -> f32 {
    with_body(handle, "cbtBodyGetRollingFriction", 0.0, |body| body.get_rolling_friction())
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetSpinningFriction(handle: CbtBodyHandle) -> f32 {
    with_body(handle, "cbtBodyGetSpinningFriction", 0.0, |body| body.get_spinning_friction())
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetAnisotropicFriction(handle: CbtBodyHandle, friction: *mut f32) {
    with_body_vector(handle, friction, "cbtBodyGetAnisotropicFriction", RigidBody::get_anisotropic_friction);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetContactStiffness(handle: CbtBodyHandle) -> f32 {
    with_body(handle, "cbtBodyGetContactStiffness", 0.0, |body| body.get_contact_stiffness())
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetContactDamping(handle: CbtBodyHandle) -> f32 {
    with_body(handle, "cbtBodyGetContactDamping", 0.0, |body| body.get_contact_damping())
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetMass(handle: CbtBodyHandle) -> f32 {
    with_body(handle, "cbtBodyGetMass", 0.0, |body| body.get_mass())
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetLinearDamping(handle: CbtBodyHandle) -> f32 {
    with_body(handle, "cbtBodyGetLinearDamping", 0.0, |body| body.get_linear_damping())
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetAngularDamping(handle: CbtBodyHandle) -> f32 {
    with_body(handle, "cbtBodyGetAngularDamping", 0.0, |body| body.get_angular_damping())
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetLinearVelocity(handle: CbtBodyHandle, velocity: *mut f32) {
    with_body_vector(handle, velocity, "cbtBodyGetLinearVelocity", RigidBody::get_linear_velocity);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetAngularVelocity(handle: CbtBodyHandle, velocity: *mut f32) {
    with_body_vector(handle, velocity, "cbtBodyGetAngularVelocity", RigidBody::get_angular_velocity);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetPushVelocity(handle: CbtBodyHandle, velocity: *mut f32) {
    with_body_vector(handle, velocity, "cbtBodyGetPushVelocity", RigidBody::get_push_velocity);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetTurnVelocity(handle: CbtBodyHandle, velocity: *mut f32) {
    with_body_vector(handle, velocity, "cbtBodyGetTurnVelocity", RigidBody::get_turn_velocity);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetTotalForce(handle: CbtBodyHandle, force: *mut f32) {
    with_body_vector(handle, force, "cbtBodyGetTotalForce", RigidBody::get_total_force);
}

#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetTotalTorque(handle: CbtBodyHandle, torque: *mut f32) {
    with_body_vector(handle, torque, "cbtBodyGetTotalTorque", RigidBody::get_total_torque);
}

/// Writes the interpolated transform as three basis vectors and a translation
#[no_mangle]
pub unsafe extern "C" fn cbtBodyGetGraphicsTransform(handle: CbtBodyHandle, transform: *mut CbtVector3) {
    if transform.is_null() {
        log::warn!("cbtBodyGetGraphicsTransform: null transform");
        return;
    }
    let basis = with_body(handle, "cbtBodyGetGraphicsTransform", Transform::identity().to_basis(), |body| {
        body.get_graphics_transform().to_basis()
    });
    let out = std::slice::from_raw_parts_mut(transform, 4);
    for (slot, vector) in out.iter_mut().zip(basis) {
        *slot = vector.into();
    }
}
