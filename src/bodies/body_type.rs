/// Type of rigid body, derived from its mass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidBodyType {
    /// Positive mass: moved by forces, impulses and contacts
    Dynamic,

    /// Zero mass: never moves and ignores forces
    Static,
}

impl RigidBodyType {
    pub fn from_mass(mass: f32) -> Self {
        if mass > 0.0 {
            RigidBodyType::Dynamic
        } else {
            RigidBodyType::Static
        }
    }
}
