//! Light component
//!
//! Pure data. Direction and position come from the owning entity's
//! transform: lights shine along the transform's local `-Z` axis.

use crate::ecs::Component;
use crate::foundation::math::Vec3;
use bitflags::bitflags;

/// Kind of light source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Parallel rays (sunlight)
    Directional,
    /// Radiates in all directions from a position
    Point,
    /// Cone of light from a position
    Spot,
}

bitflags! {
    /// Shadow participation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShadowFlags: u8 {
        /// Light renders a shadow map
        const CAST = 1 << 0;
        /// Shadow edges are filtered
        const SOFT = 1 << 1;
        /// Static geometry only
        const STATIC_ONLY = 1 << 2;
    }
}

/// Light source attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct LightComponent {
    /// The type of light
    pub light_type: LightType,
    /// Linear RGB color in `0.0..=1.0`
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Attenuation range for point and spot lights
    pub range: f32,
    /// Outer cone angle in degrees (spot only)
    pub spot_angle: f32,
    /// Inner cone angle in degrees (spot only)
    pub inner_spot_angle: f32,
    /// Shadow participation
    pub shadows: ShadowFlags,
    /// Depth bias applied when sampling the shadow map
    pub shadow_bias: f32,
    /// Shadow map resolution in texels
    pub shadow_map_size: u32,
}

impl Component for LightComponent {}

impl Default for LightComponent {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            range: 10.0,
            spot_angle: 30.0,
            inner_spot_angle: 20.0,
            shadows: ShadowFlags::empty(),
            shadow_bias: 0.005,
            shadow_map_size: 1024,
        }
    }
}

impl LightComponent {
    /// Directional light
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            color,
            intensity,
            ..Default::default()
        }
    }

    /// Point light
    pub fn point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            color,
            intensity,
            range,
            ..Default::default()
        }
    }

    /// Spot light; the inner angle is clamped to the outer angle
    pub fn spot(color: Vec3, intensity: f32, range: f32, inner_angle: f32, outer_angle: f32) -> Self {
        Self {
            light_type: LightType::Spot,
            color,
            intensity,
            range,
            spot_angle: outer_angle,
            inner_spot_angle: inner_angle.min(outer_angle),
            ..Default::default()
        }
    }

    /// Builder pattern: Set shadow flags
    pub fn with_shadows(mut self, shadows: ShadowFlags) -> Self {
        self.shadows = shadows;
        self
    }

    /// Whether this light renders a shadow map
    pub fn casts_shadows(&self) -> bool {
        self.shadows.contains(ShadowFlags::CAST)
    }

    /// Color scaled by intensity
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }
}
