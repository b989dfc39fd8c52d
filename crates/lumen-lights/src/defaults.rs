//! Built-in light policies seeded at startup.

use crate::host::{Category, EmitterDetail, EmitterSnapshot, WorldQuery};
use crate::policy::{LightPolicy, PolicyRegistry};

/// Category keys of the built-in policies.
pub mod categories {
    use crate::host::Category;

    pub const BLAZE: Category = Category::from_static("blaze");
    pub const CREEPER: Category = Category::from_static("creeper");
    pub const ENDERMAN: Category = Category::from_static("enderman");
    pub const ITEM: Category = Category::from_static("item");
    pub const ITEM_FRAME: Category = Category::from_static("item_frame");
    pub const GLOW_ITEM_FRAME: Category = Category::from_static("glow_item_frame");
    pub const MAGMA_CUBE: Category = Category::from_static("magma_cube");
    pub const SPECTRAL_ARROW: Category = Category::from_static("spectral_arrow");
}

/// Floor applied to glowing item frames.
const GLOW_FRAME_MIN_LUMINANCE: u8 = 14;

/// Squish factor above which a magma cube counts as agitated.
const AGITATED_SQUISH: f32 = 0.6;

/// Registers every built-in policy into `registry`.
pub fn register_default_policies(registry: &mut PolicyRegistry) {
    registry.register(categories::BLAZE, LightPolicy::constant(10));
    registry.register(categories::CREEPER, LightPolicy::new(fuse_luminance));
    registry.register(
        categories::ENDERMAN,
        LightPolicy::new(|snapshot, world| match snapshot.detail {
            EmitterDetail::Carrying { block: Some(block) } => world.block_luminance(block),
            _ => 0,
        }),
    );
    registry.register(
        categories::ITEM,
        LightPolicy::new(held_item_luminance).water_sensitive(),
    );
    registry.register(
        categories::ITEM_FRAME,
        LightPolicy::new(held_item_luminance).water_sensitive(),
    );
    registry.register(
        categories::GLOW_ITEM_FRAME,
        LightPolicy::new(|snapshot, world| {
            held_item_luminance(snapshot, world).max(GLOW_FRAME_MIN_LUMINANCE)
        })
        .water_sensitive(),
    );
    registry.register(
        categories::MAGMA_CUBE,
        LightPolicy::new(|snapshot, _| match snapshot.detail {
            EmitterDetail::Squish { squish } if squish > AGITATED_SQUISH => 11,
            _ => 8,
        }),
    );
    registry.register(categories::SPECTRAL_ARROW, LightPolicy::constant(8));

    tracing::debug!(count = registry.len(), "registered default light policies");
}

/// Brightens linearly with fuse progress, dark while idle.
fn fuse_luminance(snapshot: &EmitterSnapshot, _world: &dyn WorldQuery) -> u8 {
    match snapshot.detail {
        EmitterDetail::Fuse { swelling } if swelling > 0.001 => {
            (swelling.clamp(0.0, 1.0) * 10.0) as u8
        }
        _ => 0,
    }
}

/// Luminance of the contained item stack, dimmed when the object's own block
/// holds fluid.
fn held_item_luminance(snapshot: &EmitterSnapshot, world: &dyn WorldQuery) -> u8 {
    let EmitterDetail::Item { stack } = snapshot.detail else {
        return 0;
    };
    let submerged = snapshot
        .world
        .is_some_and(|id| world.is_submerged(id, snapshot.block_position()));
    world.item_luminance(&stack, submerged)
}

/// Every built-in category, in registration order.
pub fn default_categories() -> [Category; 8] {
    [
        categories::BLAZE,
        categories::CREEPER,
        categories::ENDERMAN,
        categories::ITEM,
        categories::ITEM_FRAME,
        categories::GLOW_ITEM_FRAME,
        categories::MAGMA_CUBE,
        categories::SPECTRAL_ARROW,
    ]
}
