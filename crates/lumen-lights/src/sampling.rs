//! Sampling the dynamic light level at a block, for mesh builders that
//! blend it into the static light map.

use glam::{DVec3, IVec3};

use crate::driver::DynamicLights;
use crate::host::WorldId;
use crate::policy::MAX_LUMINANCE;

/// Distance, in blocks, at which a source's contribution reaches zero.
pub const MAX_RADIUS: f64 = 7.75;

const MAX_RADIUS_SQUARED: f64 = MAX_RADIUS * MAX_RADIUS;

/// Light a source at `anchor` with `luminance` casts on the centre of `block`.
///
/// Falls off linearly with distance and is zero beyond [`MAX_RADIUS`].
pub fn source_contribution(block: IVec3, anchor: DVec3, luminance: u8) -> f64 {
    if luminance == 0 {
        return 0.0;
    }
    let offset = block.as_dvec3() + DVec3::splat(0.5) - anchor;
    let distance_squared = offset.length_squared();
    if distance_squared > MAX_RADIUS_SQUARED {
        return 0.0;
    }
    (1.0 - distance_squared.sqrt() / MAX_RADIUS) * f64::from(luminance)
}

/// Merges a sampled dynamic level into a packed light word
/// (`sky << 20 | block << 4`).
///
/// The block channel is replaced by the dynamic level, with four bits of
/// fraction, whenever the dynamic level is brighter.
pub fn packed_light_with_dynamic(packed: u32, dynamic: f64) -> u32 {
    if dynamic <= 0.0 {
        return packed;
    }
    let block_level = (packed >> 4) & 0xFFFF;
    if dynamic <= f64::from(block_level) {
        return packed;
    }
    let fixed_point = (dynamic * 16.0) as u32;
    (packed & 0xFFF0_0000) | (fixed_point & 0x000F_FFFF)
}

impl DynamicLights {
    /// Brightest dynamic light reaching `block` in `world`, in `[0, 15]`.
    ///
    /// Returns 0 while dynamic lighting is switched off.
    pub fn light_level_at(&self, world: WorldId, block: IVec3) -> f64 {
        if !self.config().quality.is_enabled() {
            return 0.0;
        }
        self.sources()
            .filter(|source| source.world() == Some(world))
            .map(|source| source_contribution(block, source.anchor(), source.luminance()))
            .fold(0.0, f64::max)
            .clamp(0.0, f64::from(MAX_LUMINANCE))
    }
}
