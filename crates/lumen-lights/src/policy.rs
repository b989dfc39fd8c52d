//! Luminance policies and the per-category policy registry.
//!
//! A [`LightPolicy`] turns an [`EmitterSnapshot`] into a light level and
//! says whether the object goes dark underwater. The [`PolicyRegistry`]
//! holds at most one effective policy per [`Category`]; registering a
//! second policy for the same category composes the two.

use lumen_config::LightingConfig;
use rustc_hash::FxHashMap;

use crate::host::{Category, EmitterKind, EmitterSnapshot, WorldQuery};

/// Highest light level an emitter may produce.
pub const MAX_LUMINANCE: u8 = 15;

/// Luminance callback of a policy.
pub type LuminanceFn = dyn Fn(&EmitterSnapshot, &dyn WorldQuery) -> u8 + Send + Sync;

/// Water-sensitivity callback of a policy.
pub type WaterSensitivityFn = dyn Fn(&EmitterSnapshot) -> bool + Send + Sync;

/// Rule computing the light emitted by objects of one category.
pub struct LightPolicy {
    luminance: Box<LuminanceFn>,
    water_sensitive: Box<WaterSensitivityFn>,
}

impl LightPolicy {
    /// Policy with the given luminance rule that keeps shining underwater.
    pub fn new(
        luminance: impl Fn(&EmitterSnapshot, &dyn WorldQuery) -> u8 + Send + Sync + 'static,
    ) -> Self {
        Self {
            luminance: Box::new(luminance),
            water_sensitive: Box::new(|_: &EmitterSnapshot| false),
        }
    }

    /// Policy that always emits `level`.
    pub fn constant(level: u8) -> Self {
        Self::new(move |_, _| level)
    }

    /// Makes the policy go dark whenever the object is submerged.
    pub fn water_sensitive(self) -> Self {
        self.with_water_sensitivity(|_| true)
    }

    /// Replaces the water-sensitivity rule.
    pub fn with_water_sensitivity(
        mut self,
        rule: impl Fn(&EmitterSnapshot) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.water_sensitive = Box::new(rule);
        self
    }

    /// Raw luminance for `snapshot`, before any gating or clamping.
    pub fn luminance(&self, snapshot: &EmitterSnapshot, world: &dyn WorldQuery) -> u8 {
        (self.luminance)(snapshot, world)
    }

    /// Whether `snapshot` goes dark when submerged.
    pub fn is_water_sensitive(&self, snapshot: &EmitterSnapshot) -> bool {
        (self.water_sensitive)(snapshot)
    }

    /// Composes `self` (registered first) with `later`.
    ///
    /// Luminance is the maximum of both; water sensitivity is taken from
    /// `later` alone.
    fn combine(self, later: LightPolicy) -> LightPolicy {
        let earlier = self.luminance;
        let newer = later.luminance;
        LightPolicy {
            luminance: Box::new(move |snapshot: &EmitterSnapshot, world: &dyn WorldQuery| {
                earlier(snapshot, world).max(newer(snapshot, world))
            }),
            water_sensitive: later.water_sensitive,
        }
    }
}

impl std::fmt::Debug for LightPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightPolicy").finish_non_exhaustive()
    }
}

/// Whether lighting for this object's kind is switched on and the object
/// is attached to a world.
pub fn can_light_up(snapshot: &EmitterSnapshot, config: &LightingConfig) -> bool {
    let kind_enabled = match snapshot.kind {
        EmitterKind::Entity => config.entity_lighting,
        EmitterKind::BlockEntity => config.block_entity_lighting,
    };
    kind_enabled && snapshot.world.is_some()
}

/// Maps categories to their effective [`LightPolicy`].
///
/// Populated at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    policies: FxHashMap<Category, LightPolicy>,
}

impl PolicyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `policy` for `category`, composing with any existing policy.
    pub fn register(&mut self, category: Category, policy: LightPolicy) {
        let effective = match self.policies.remove(&category) {
            Some(existing) => {
                tracing::debug!(%category, "composing light policy with existing registration");
                existing.combine(policy)
            }
            None => policy,
        };
        self.policies.insert(category, effective);
    }

    /// Effective policy for `category`.
    pub fn lookup(&self, category: &Category) -> Option<&LightPolicy> {
        self.policies.get(category)
    }

    /// Returns `true` if a policy exists for `category`.
    pub fn contains(&self, category: &Category) -> bool {
        self.policies.contains_key(category)
    }

    /// Number of categories with a policy.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Light level the registry assigns to `snapshot`, in `[0, 15]`.
    ///
    /// Returns 0 when lighting for the object's kind is disabled, when the
    /// object has no world, when no policy covers its category, or when a
    /// water-sensitive policy finds the object's eye block submerged.
    /// Burning is not considered here.
    pub fn resolve(
        &self,
        snapshot: &EmitterSnapshot,
        config: &LightingConfig,
        world: &dyn WorldQuery,
    ) -> u8 {
        if !can_light_up(snapshot, config) {
            return 0;
        }
        let Some(policy) = self.lookup(&snapshot.category) else {
            return 0;
        };
        let Some(world_id) = snapshot.world else {
            return 0;
        };
        if policy.is_water_sensitive(snapshot)
            && world.is_submerged(world_id, snapshot.eye_block_position())
        {
            return 0;
        }

        let luminance = policy.luminance(snapshot, world);
        if luminance > MAX_LUMINANCE {
            tracing::warn!(
                category = %snapshot.category,
                luminance,
                "light policy exceeded maximum luminance, clamping"
            );
            return MAX_LUMINANCE;
        }
        luminance
    }
}
