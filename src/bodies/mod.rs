mod rigid_body;
mod material;
mod body_type;

pub use self::rigid_body::RigidBody;
pub use self::material::{Material, AnisotropicFrictionMode};
pub use self::body_type::RigidBodyType;

/// Flags for controlling body behavior
pub mod body_flags {
    use bitflags::bitflags;

    bitflags! {
        /// Per-body state bits
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
        pub struct BodyFlags: u32 {
            /// Zero mass; the body never moves
            const STATIC_OBJECT = 0x01;

            /// Contacts use the body's stiffness and damping instead of rigid constraints
            const HAS_CONTACT_STIFFNESS_DAMPING = 0x80;
        }
    }
}
