use crate::math::Vector3;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// How the anisotropic friction vector is applied to a body's contacts.
/// The numeric values match the C constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[repr(i32)]
pub enum AnisotropicFrictionMode {
    /// Friction is isotropic
    #[default]
    Disabled = 0,

    /// Sliding friction directions are scaled per local axis
    Friction = 1,

    /// Rolling friction axes are scaled per local axis
    RollingFriction = 2,
}

impl AnisotropicFrictionMode {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Disabled),
            1 => Some(Self::Friction),
            2 => Some(Self::RollingFriction),
            _ => None,
        }
    }
}

/// Surface response properties of a body
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Material {
    /// Coulomb friction coefficient; pairs combine by multiplication
    pub friction: f32,

    /// Resistance to rolling about the contact tangents
    pub rolling_friction: f32,

    /// Resistance to spinning about the contact normal
    pub spinning_friction: f32,

    /// Per-local-axis friction scale, only used when `anisotropic_mode` is not `Disabled`
    pub anisotropic_friction: Vector3,

    pub anisotropic_mode: AnisotropicFrictionMode,

    /// Coefficient of restitution; pairs combine by multiplication
    pub restitution: f32,

    /// Spring stiffness of soft contacts
    pub contact_stiffness: f32,

    /// Damping of soft contacts
    pub contact_damping: f32,
}

impl Material {
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
            ..Self::default()
        }
    }

    /// Friction directions scaled by the anisotropic vector, if enabled for `mode`
    pub fn anisotropic_scale(&self, mode: AnisotropicFrictionMode) -> Option<Vector3> {
        (self.anisotropic_mode == mode && mode != AnisotropicFrictionMode::Disabled)
            .then_some(self.anisotropic_friction)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.5,
            rolling_friction: 0.0,
            spinning_friction: 0.0,
            anisotropic_friction: Vector3::splat(1.0),
            anisotropic_mode: AnisotropicFrictionMode::Disabled,
            restitution: 0.0,
            contact_stiffness: 1.0e18,
            contact_damping: 0.1,
        }
    }
}
