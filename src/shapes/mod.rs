mod shape;
mod box_shape;
pub(crate) mod sphere;
mod capsule;
mod cylinder;
mod cone;
mod plane;

pub use shape::{Shape, SharedShape, ShapeGeometry, ShapeType, ShapeRayHit, Axis, LARGE_EXTENT};
pub use box_shape::{BoxShape, Box2dShape, BOX_2D_HALF_THICKNESS};
pub use sphere::Sphere;
pub use capsule::Capsule;
pub use cylinder::Cylinder;
pub use cone::Cone;
pub use plane::Plane;
