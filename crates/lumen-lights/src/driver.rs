//! Frame driver: the side table of tracked sources and the tick/frame
//! callbacks the host engine calls into.
//!
//! The host subscribes [`DynamicLights::on_tick`] to its simulation tick and
//! [`DynamicLights::on_render_frame`] to its render loop. Both run on the
//! same thread; nothing here blocks or spawns.

use lumen_config::LightingConfig;
use rustc_hash::FxHashMap;

use crate::cadence::{CadenceGate, Clock, MonotonicClock};
use crate::host::{
    EmitterIndex, EmitterSnapshot, RebuildScheduler, SourceId, WorldId, WorldQuery,
};
use crate::policy::{MAX_LUMINANCE, PolicyRegistry, can_light_up};
use crate::section::ChunkSectionPos;
use crate::source::TrackedLightSource;

/// What one render frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Sources whose lit sections were recomputed.
    pub updated: usize,
    /// Sources released (removed, detached, or off-world) and dropped.
    pub released: usize,
    /// Sources still tracked after the frame.
    pub tracked: usize,
}

/// Owns every tracked light source, the policy registry, and the cadence gate.
pub struct DynamicLights {
    registry: PolicyRegistry,
    config: LightingConfig,
    cadence: CadenceGate,
    sources: FxHashMap<SourceId, TrackedLightSource>,
    /// World rendered by the most recent frame; `None` before the first one.
    rendered_world: Option<Option<WorldId>>,
}

impl DynamicLights {
    /// Driver timed by a [`MonotonicClock`].
    pub fn new(registry: PolicyRegistry, config: &LightingConfig) -> Self {
        Self::with_clock(registry, config, Box::new(MonotonicClock::new()))
    }

    /// Driver timed by the given clock.
    pub fn with_clock(
        registry: PolicyRegistry,
        config: &LightingConfig,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            config: config.clone(),
            cadence: CadenceGate::new(config.quality, clock),
            sources: FxHashMap::default(),
            rendered_world: None,
        }
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    pub fn cadence(&self) -> &CadenceGate {
        &self.cadence
    }

    /// Applies changed lighting settings. Tracked state is kept; sources
    /// that lost their lighting switch go dark on the next tick.
    pub fn apply_config(&mut self, config: &LightingConfig) {
        if *config == self.config {
            return;
        }
        tracing::info!(
            quality = ?config.quality,
            entity_lighting = config.entity_lighting,
            block_entity_lighting = config.block_entity_lighting,
            "applying dynamic lighting config"
        );
        self.cadence.set_quality(config.quality);
        self.config = config.clone();
    }

    /// Luminance of `snapshot` for this tick: 15 while burning, otherwise
    /// whatever the policy registry resolves, and 0 when the object cannot
    /// light up at all.
    pub fn compute_luminance(&self, snapshot: &EmitterSnapshot, world: &dyn WorldQuery) -> u8 {
        if !can_light_up(snapshot, &self.config) {
            return 0;
        }
        let burning = if snapshot.on_fire { MAX_LUMINANCE } else { 0 };
        burning.max(self.registry.resolve(snapshot, &self.config, world))
    }

    /// Simulation-tick callback: refreshes every emitter's luminance.
    ///
    /// Objects that start emitting become tracked unless the last frame
    /// rendered a different world; removed objects are flagged so the next
    /// frame releases them.
    pub fn on_tick<'a>(
        &mut self,
        emitters: impl IntoIterator<Item = &'a EmitterSnapshot>,
        world: &dyn WorldQuery,
    ) {
        for snapshot in emitters {
            if snapshot.removed {
                if let Some(source) = self.sources.get_mut(&snapshot.id) {
                    source.mark_removed();
                }
                continue;
            }

            let luminance = self.compute_luminance(snapshot, world);
            let rendered = self.is_rendered(snapshot.world);
            match self.sources.get_mut(&snapshot.id) {
                Some(source) => {
                    source.observe(snapshot);
                    source.set_luminance(luminance);
                }
                None if luminance > 0 && rendered => {
                    tracing::debug!(
                        source = snapshot.id.0,
                        category = %snapshot.category,
                        luminance,
                        "tracking dynamic light source"
                    );
                    let mut source = TrackedLightSource::new(snapshot);
                    source.set_luminance(luminance);
                    self.sources.insert(snapshot.id, source);
                }
                None => {}
            }
        }
    }

    /// Render-frame callback: propagates every tracked source through the
    /// cadence gate, and releases sources that were removed, detached, or
    /// are not in the rendered world.
    pub fn on_render_frame<I>(
        &mut self,
        index: &I,
        scheduler: &mut dyn RebuildScheduler,
    ) -> FrameStats
    where
        I: EmitterIndex + ?Sized,
    {
        let active = scheduler.active_world();
        self.rendered_world = Some(active);
        let mut stats = FrameStats::default();
        let Self {
            sources, cadence, ..
        } = self;

        sources.retain(|id, source| {
            let present = match index.emitter(*id) {
                Some(snapshot) => {
                    source.observe(snapshot);
                    source.is_alive() && source.world().is_some() && source.world() == active
                }
                None => false,
            };

            if !present {
                let released = source.release(scheduler);
                tracing::debug!(source = id.0, released, "released dynamic light source");
                stats.released += 1;
                return false;
            }

            if source.update_dynamic_light(cadence, scheduler) {
                stats.updated += 1;
            }
            if source.is_idle() {
                tracing::debug!(source = id.0, "dynamic light source went dark");
                return false;
            }
            true
        });

        stats.tracked = sources.len();
        stats
    }

    /// Whether a source in `world` would survive the next frame. Before any
    /// frame has run every world counts as rendered.
    fn is_rendered(&self, world: Option<WorldId>) -> bool {
        match self.rendered_world {
            Some(active) => world.is_some() && world == active,
            None => true,
        }
    }

    /// Releases and drops one source right away, e.g. when the host
    /// removes the object between frames.
    ///
    /// Returns `false` if the source was not tracked.
    pub fn remove_source(&mut self, id: SourceId, scheduler: &mut dyn RebuildScheduler) -> bool {
        match self.sources.remove(&id) {
            Some(mut source) => {
                source.release(scheduler);
                true
            }
            None => false,
        }
    }

    /// Releases and drops every tracked source.
    pub fn clear_sources(&mut self, scheduler: &mut dyn RebuildScheduler) {
        for (_, mut source) in self.sources.drain() {
            source.release(scheduler);
        }
    }

    /// Number of tracked sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn is_tracked(&self, id: SourceId) -> bool {
        self.sources.contains_key(&id)
    }

    /// Current luminance of a tracked source.
    pub fn luminance_of(&self, id: SourceId) -> Option<u8> {
        self.sources.get(&id).map(TrackedLightSource::luminance)
    }

    /// Sections currently lit on behalf of a tracked source.
    pub fn tracked_sections(&self, id: SourceId) -> Option<Vec<ChunkSectionPos>> {
        self.sources.get(&id).map(|source| source.lit_sections().collect())
    }

    /// Iterates over all tracked sources.
    pub fn sources(&self) -> impl Iterator<Item = &TrackedLightSource> {
        self.sources.values()
    }
}

impl std::fmt::Debug for DynamicLights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicLights")
            .field("config", &self.config)
            .field("cadence", &self.cadence)
            .field("sources", &self.sources.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cadence::ManualClock;
    use crate::host::{Category, WorldId};
    use crate::policy::LightPolicy;
    use crate::propagation::CLUSTER_SIZE;
    use crate::test_support::{RecordingScheduler, TestWorld, entity, index_of};
    use glam::DVec3;
    use lumen_config::QualityMode;
    use rustc_hash::FxHashSet;

    const LAMP: Category = Category::from_static("lamp");
    const ZOMBIE: Category = Category::from_static("zombie");

    struct Harness {
        lights: DynamicLights,
        clock: ManualClock,
        world: TestWorld,
        scheduler: RecordingScheduler,
    }

    impl Harness {
        fn new(quality: QualityMode) -> Self {
            let mut registry = PolicyRegistry::new();
            registry.register(LAMP, LightPolicy::constant(10));
            let config = LightingConfig {
                quality,
                ..LightingConfig::default()
            };
            let clock = ManualClock::starting_at(1_000);
            Self {
                lights: DynamicLights::with_clock(registry, &config, Box::new(clock.clone())),
                clock,
                world: TestWorld::default(),
                scheduler: RecordingScheduler::new(WorldId(0)),
            }
        }

        fn step(&mut self, emitters: &[EmitterSnapshot]) -> FrameStats {
            self.lights.on_tick(emitters, &self.world);
            self.lights.on_render_frame(&index_of(emitters), &mut self.scheduler)
        }
    }

    #[test]
    fn test_dark_object_is_never_tracked() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let mut zombie = entity(1, ZOMBIE, DVec3::new(0.0, 64.0, 0.0));
        h.step(std::slice::from_ref(&zombie));
        zombie.position.x += 5.0;
        let stats = h.step(std::slice::from_ref(&zombie));

        assert!(h.scheduler.requests.is_empty());
        assert!(!h.lights.is_tracked(zombie.id));
        assert_eq!(stats, FrameStats::default());
    }

    #[test]
    fn test_lighting_up_marks_eight_sections() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let lamp = entity(1, LAMP, DVec3::new(5.0, 64.0, 5.0));
        let stats = h.step(std::slice::from_ref(&lamp));

        assert_eq!(stats.updated, 1);
        assert_eq!(stats.tracked, 1);
        assert_eq!(h.scheduler.requests.len(), CLUSTER_SIZE);
        assert_eq!(h.lights.tracked_sections(lamp.id).unwrap().len(), CLUSTER_SIZE);
        assert_eq!(h.lights.luminance_of(lamp.id), Some(10));
    }

    #[test]
    fn test_same_frame_repeat_is_idempotent() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let lamp = [entity(1, LAMP, DVec3::new(5.0, 64.0, 5.0))];
        h.step(&lamp);
        h.scheduler.requests.clear();

        let stats = h.lights.on_render_frame(&index_of(&lamp), &mut h.scheduler);
        assert_eq!(stats.updated, 0);
        assert!(h.scheduler.requests.is_empty());
    }

    #[test]
    fn test_removed_source_clears_its_sections() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let mut lamp = entity(1, LAMP, DVec3::new(5.0, 64.0, 5.0));
        h.step(std::slice::from_ref(&lamp));
        let lit: FxHashSet<_> = h.lights.tracked_sections(lamp.id).unwrap().into_iter().collect();
        h.scheduler.requests.clear();

        lamp.removed = true;
        let stats = h.step(std::slice::from_ref(&lamp));

        let cleared: FxHashSet<_> = h.scheduler.requests.iter().copied().collect();
        assert_eq!(h.scheduler.requests.len(), CLUSTER_SIZE);
        assert_eq!(cleared, lit);
        assert_eq!(stats.released, 1);
        assert!(!h.lights.is_tracked(lamp.id));
    }

    #[test]
    fn test_vanished_source_is_released() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let lamp = entity(1, LAMP, DVec3::new(5.0, 64.0, 5.0));
        h.step(std::slice::from_ref(&lamp));
        h.scheduler.requests.clear();

        let stats = h.step(&[]);
        assert_eq!(stats.released, 1);
        assert_eq!(h.scheduler.requests.len(), CLUSTER_SIZE);
        assert_eq!(h.lights.source_count(), 0);
    }

    #[test]
    fn test_source_changing_world_is_dropped_silently() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let mut lamp = entity(1, LAMP, DVec3::new(5.0, 64.0, 5.0));
        h.step(std::slice::from_ref(&lamp));
        h.scheduler.requests.clear();

        lamp.world = Some(WorldId(9));
        let stats = h.step(std::slice::from_ref(&lamp));
        assert_eq!(stats.released, 1);
        assert!(h.scheduler.requests.is_empty());
        assert!(!h.lights.is_tracked(lamp.id));
    }

    #[test]
    fn test_burning_without_policy_is_full_bright() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let zombie = entity(1, ZOMBIE, DVec3::new(0.0, 64.0, 0.0)).with_fire(true);
        h.step(std::slice::from_ref(&zombie));
        assert_eq!(h.lights.luminance_of(zombie.id), Some(15));
        assert_eq!(h.scheduler.requests.len(), CLUSTER_SIZE);
    }

    #[test]
    fn test_burning_lamp_takes_max() {
        let h = Harness::new(QualityMode::Unrestricted);
        let lamp = entity(1, LAMP, DVec3::ZERO);
        assert_eq!(h.lights.compute_luminance(&lamp, &h.world), 10);
        let burning = lamp.with_fire(true);
        assert_eq!(h.lights.compute_luminance(&burning, &h.world), 15);
    }

    #[test]
    fn test_disabled_entity_lighting_darkens_burning_entities() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let zombie = entity(1, ZOMBIE, DVec3::ZERO).with_fire(true);
        h.lights.apply_config(&LightingConfig {
            entity_lighting: false,
            ..LightingConfig::default()
        });
        assert_eq!(h.lights.compute_luminance(&zombie, &h.world), 0);
    }

    #[test]
    fn test_extinguished_source_clears_and_leaves() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let mut zombie = entity(1, ZOMBIE, DVec3::new(0.0, 64.0, 0.0)).with_fire(true);
        h.step(std::slice::from_ref(&zombie));
        h.scheduler.requests.clear();

        zombie.on_fire = false;
        let stats = h.step(std::slice::from_ref(&zombie));
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.tracked, 0);
        assert_eq!(h.scheduler.requests.len(), CLUSTER_SIZE);
        assert!(!h.lights.is_tracked(zombie.id));
    }

    #[test]
    fn test_slow_quality_throttles_across_sources() {
        let mut h = Harness::new(QualityMode::Slow);
        let lamps = [
            entity(1, LAMP, DVec3::new(5.0, 64.0, 5.0)),
            entity(2, LAMP, DVec3::new(100.0, 64.0, 100.0)),
        ];

        let stats = h.step(&lamps);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.tracked, 2);

        let lit = h.lights.sources().filter(|s| s.lit_section_count() > 0).count();
        assert_eq!(lit, 1);

        h.clock.advance(100);
        assert_eq!(h.step(&lamps).updated, 0);

        // The single token may go to either source; never to both.
        h.clock.advance(500);
        assert!(h.step(&lamps).updated <= 1);
        assert_eq!(h.lights.cadence().last_update(), Some(1_600));
    }

    #[test]
    fn test_quality_off_keeps_state_without_propagating() {
        let mut h = Harness::new(QualityMode::Off);
        let lamp = entity(1, LAMP, DVec3::new(5.0, 64.0, 5.0));
        let stats = h.step(std::slice::from_ref(&lamp));
        assert_eq!(stats.updated, 0);
        assert!(h.lights.is_tracked(lamp.id));
        assert!(h.scheduler.requests.is_empty());

        h.lights.apply_config(&LightingConfig::default());
        assert_eq!(h.step(std::slice::from_ref(&lamp)).updated, 1);
    }

    #[test]
    fn test_remove_source_releases_immediately() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let lamp = entity(1, LAMP, DVec3::new(5.0, 64.0, 5.0));
        h.step(std::slice::from_ref(&lamp));
        h.scheduler.requests.clear();

        assert!(h.lights.remove_source(lamp.id, &mut h.scheduler));
        assert_eq!(h.scheduler.requests.len(), CLUSTER_SIZE);
        assert!(!h.lights.remove_source(lamp.id, &mut h.scheduler));
    }

    #[test]
    fn test_clear_sources_releases_everything() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let lamps = [
            entity(1, LAMP, DVec3::new(5.0, 64.0, 5.0)),
            entity(2, LAMP, DVec3::new(100.0, 64.0, 100.0)),
        ];
        h.step(&lamps);
        h.scheduler.requests.clear();

        h.lights.clear_sources(&mut h.scheduler);
        assert_eq!(h.scheduler.requests.len(), 2 * CLUSTER_SIZE);
        assert_eq!(h.lights.source_count(), 0);
    }

    #[test]
    fn test_off_world_sources_are_not_retracked_every_tick() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let lamp = entity(1, LAMP, DVec3::new(5.0, 64.0, 5.0));
        h.step(std::slice::from_ref(&lamp));

        h.scheduler.active = Some(WorldId(1));
        assert_eq!(h.step(std::slice::from_ref(&lamp)).released, 1);

        // Still emitting in world 0 while world 1 is rendered: no churn.
        for _ in 0..3 {
            let stats = h.step(std::slice::from_ref(&lamp));
            assert_eq!(stats, FrameStats::default());
            assert!(!h.lights.is_tracked(lamp.id));
        }

        h.scheduler.active = Some(WorldId(0));
        h.scheduler.requests.clear();
        h.step(std::slice::from_ref(&lamp));
        let stats = h.step(std::slice::from_ref(&lamp));
        assert_eq!(stats.updated, 1);
        assert_eq!(h.scheduler.requests.len(), CLUSTER_SIZE);
    }

    #[test]
    fn test_large_population_frame_with_keyed_index() {
        let mut h = Harness::new(QualityMode::Unrestricted);
        let lamps: Vec<_> = (0..5_000u64)
            .map(|id| entity(id, LAMP, DVec3::new(id as f64 * 3.0, 64.0, 0.0)))
            .collect();
        let index = index_of(&lamps);

        h.lights.on_tick(&lamps, &h.world);
        let first = h.lights.on_render_frame(&index, &mut h.scheduler);
        assert_eq!(first.updated, lamps.len());
        h.scheduler.requests.clear();

        let second = h.lights.on_render_frame(&index, &mut h.scheduler);
        assert_eq!(second.updated, 0);
        assert_eq!(second.tracked, lamps.len());
        assert!(h.scheduler.requests.is_empty());
    }
}
