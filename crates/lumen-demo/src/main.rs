//! Headless demo that drives the dynamic light core through a simulated world.
//!
//! A seeded population of glowing mobs, items and block entities wanders
//! around a small flooded world. Ticks run at 20 Hz and render frames at
//! 60 Hz; every rebuild request is counted and summarized at the end.
//!
//! Run with `cargo run -p lumen-demo -- --quality slow` to see throttling.

use clap::Parser;
use glam::{DVec3, IVec3};
use std::path::PathBuf;

use lumen_config::{CliArgs, Config, ConfigError, default_config_dir};
use lumen_lights::{
    BlockId, Category, ChunkSectionPos, ContentLuminance, DynamicLights, EmitterDetail,
    EmitterKind, EmitterSnapshot, FluidQuery, FrameStats, ItemId, ItemStack, LightPolicy,
    ManualClock, PolicyRegistry, RebuildScheduler, SourceId, WorldId, default_categories,
    packed_light_with_dynamic, register_default_policies,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

const OVERWORLD: WorldId = WorldId(0);
const NETHER: WorldId = WorldId(1);

const GLOWSTONE: BlockId = BlockId(1);
const TORCH: ItemId = ItemId(1);
const LANTERN: ItemId = ItemId(2);

const BRAZIER: Category = Category::from_static("brazier");
const ZOMBIE: Category = Category::from_static("zombie");

const FRAME_MILLIS: u64 = 16;
const FRAMES_PER_TICK: u32 = 3;
const TOTAL_FRAMES: u32 = 600;
/// Frames during which the player visits the other world.
const AWAY_FRAMES: std::ops::Range<u32> = 300..360;
const SPAWNS_PER_CATEGORY: u64 = 4;
const SEA_LEVEL: i32 = 62;

/// Content table and fluid layout of the simulated world.
struct DemoWorld {
    sea_level: i32,
}

impl ContentLuminance for DemoWorld {
    fn block_luminance(&self, block: BlockId) -> u8 {
        if block == GLOWSTONE { 15 } else { 0 }
    }

    fn item_luminance(&self, stack: &ItemStack, submerged: bool) -> u8 {
        match stack.item {
            TORCH if submerged => 0,
            TORCH => 14,
            LANTERN => 15,
            _ => 0,
        }
    }
}

impl FluidQuery for DemoWorld {
    fn is_submerged(&self, world: WorldId, block: IVec3) -> bool {
        world == OVERWORLD && block.y < self.sea_level
    }
}

/// Rebuild queue that only counts what it is asked to do.
struct CountingScheduler {
    active: Option<WorldId>,
    requests: usize,
    distinct: FxHashSet<ChunkSectionPos>,
}

impl CountingScheduler {
    fn new(active: WorldId) -> Self {
        Self {
            active: Some(active),
            requests: 0,
            distinct: FxHashSet::default(),
        }
    }
}

impl RebuildScheduler for CountingScheduler {
    fn active_world(&self) -> Option<WorldId> {
        self.active
    }

    fn request_rebuild(&mut self, section: ChunkSectionPos) {
        self.requests += 1;
        self.distinct.insert(section);
    }
}

/// Simulated objects keyed by handle, with their per-tick velocities.
struct Population {
    snapshots: FxHashMap<SourceId, EmitterSnapshot>,
    velocities: FxHashMap<SourceId, DVec3>,
    removed: usize,
}

impl Population {
    fn spawn(rng: &mut Xoshiro256StarStar) -> Self {
        let mut snapshots = FxHashMap::default();
        let mut velocities = FxHashMap::default();
        let mut next_id = 0u64;

        let spawned = default_categories().into_iter().chain([ZOMBIE, BRAZIER]);
        for category in spawned {
            for _ in 0..SPAWNS_PER_CATEGORY {
                next_id += 1;
                let position = DVec3::new(
                    rng.gen_range(-24.0..24.0),
                    rng.gen_range(58.0..70.0),
                    rng.gen_range(-24.0..24.0),
                );
                let id = SourceId(next_id);
                let (snapshot, velocity) = spawn_one(rng, id, category.clone(), position);
                snapshots.insert(id, snapshot);
                velocities.insert(id, velocity);
            }
        }

        info!(count = snapshots.len(), "spawned demo population");
        Self {
            snapshots,
            velocities,
            removed: 0,
        }
    }

    /// Advances every object by one tick and despawns a few at random.
    fn step(&mut self, rng: &mut Xoshiro256StarStar) {
        // Objects flagged last tick are gone now.
        let before = self.snapshots.len();
        self.snapshots.retain(|_, snapshot| !snapshot.removed);
        self.removed += before - self.snapshots.len();
        let snapshots = &self.snapshots;
        self.velocities.retain(|id, _| snapshots.contains_key(id));

        for (id, snapshot) in self.snapshots.iter_mut() {
            if let Some(velocity) = self.velocities.get(id) {
                snapshot.position += *velocity;
            }
            match &mut snapshot.detail {
                EmitterDetail::Fuse { swelling } => {
                    *swelling = if *swelling >= 1.0 { 0.0 } else { *swelling + 0.05 };
                }
                EmitterDetail::Squish { squish } => *squish = rng.gen_range(0.0..1.0),
                _ => {}
            }
            if snapshot.category == ZOMBIE && rng.gen_bool(0.02) {
                snapshot.on_fire = !snapshot.on_fire;
            }
            if rng.gen_bool(0.002) {
                snapshot.removed = true;
            }
        }
    }
}

fn spawn_one(
    rng: &mut Xoshiro256StarStar,
    id: SourceId,
    category: Category,
    position: DVec3,
) -> (EmitterSnapshot, DVec3) {
    let wander = DVec3::new(rng.gen_range(-0.3..0.3), 0.0, rng.gen_range(-0.3..0.3));
    let held = |rng: &mut Xoshiro256StarStar| EmitterDetail::Item {
        stack: ItemStack {
            item: if rng.gen_bool(0.5) { TORCH } else { LANTERN },
            count: 1,
        },
    };

    let (kind, eye_height, detail, velocity) = match category.as_str() {
        "blaze" => (EmitterKind::Entity, 1.53, EmitterDetail::None, wander),
        "creeper" => (
            EmitterKind::Entity,
            1.445,
            EmitterDetail::Fuse {
                swelling: rng.gen_range(0.0..1.0),
            },
            wander,
        ),
        "enderman" => (
            EmitterKind::Entity,
            2.55,
            EmitterDetail::Carrying {
                block: rng.gen_bool(0.5).then_some(GLOWSTONE),
            },
            wander,
        ),
        "item" => (EmitterKind::Entity, 0.2125, held(rng), wander * 0.2),
        "item_frame" | "glow_item_frame" => (EmitterKind::Entity, 0.0, held(rng), DVec3::ZERO),
        "magma_cube" => (
            EmitterKind::Entity,
            0.5,
            EmitterDetail::Squish { squish: 0.0 },
            wander,
        ),
        "spectral_arrow" => (EmitterKind::Entity, 0.13, EmitterDetail::None, wander * 4.0),
        "brazier" => (EmitterKind::BlockEntity, 0.5, EmitterDetail::None, DVec3::ZERO),
        _ => (EmitterKind::Entity, 1.74, EmitterDetail::None, wander),
    };

    let snapshot = EmitterSnapshot::new(id, kind, category, OVERWORLD, position)
        .with_eye_height(eye_height)
        .with_detail(detail);
    (snapshot, velocity)
}

#[derive(Default)]
struct Totals {
    ticks: u32,
    updated: usize,
    released: usize,
    peak_tracked: usize,
}

impl Totals {
    fn record(&mut self, stats: FrameStats) {
        self.updated += stats.updated;
        self.released += stats.released;
        self.peak_tracked = self.peak_tracked.max(stats.tracked);
    }
}

/// Resolves the config directory, loads (or creates) the config there and
/// applies CLI overrides. A load failure falls back to defaults and is
/// handed back so it can be logged once logging is up.
fn load_config(args: &CliArgs) -> (PathBuf, Config, Option<ConfigError>) {
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let (mut config, error) = match Config::load_or_create(&config_dir) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_cli_overrides(args);
    (config_dir, config, error)
}

fn main() {
    let args = CliArgs::parse();
    let (config_dir, config, load_error) = load_config(&args);

    let log_dir = config_dir.join("logs");
    lumen_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match load_error {
        Some(e) => warn!(error = %e, "failed to load config, using defaults"),
        None => info!(config_dir = %config_dir.display(), "loaded config"),
    }

    info!(
        quality = ?config.lighting.quality,
        entity_lighting = config.lighting.entity_lighting,
        block_entity_lighting = config.lighting.block_entity_lighting,
        "starting dynamic lights demo"
    );

    let mut registry = PolicyRegistry::new();
    register_default_policies(&mut registry);
    registry.register(BRAZIER, LightPolicy::constant(12).water_sensitive());

    let clock = ManualClock::starting_at(0);
    let mut lights = DynamicLights::with_clock(registry, &config.lighting, Box::new(clock.clone()));

    let world = DemoWorld {
        sea_level: SEA_LEVEL,
    };
    let mut scheduler = CountingScheduler::new(OVERWORLD);
    let mut rng = Xoshiro256StarStar::seed_from_u64(42); // Fixed seed for reproducible demo
    let mut population = Population::spawn(&mut rng);
    let mut totals = Totals::default();

    for frame in 0..TOTAL_FRAMES {
        if frame % FRAMES_PER_TICK == 0 {
            population.step(&mut rng);
            lights.on_tick(population.snapshots.values(), &world);
            totals.ticks += 1;
        }

        let active = if AWAY_FRAMES.contains(&frame) {
            NETHER
        } else {
            OVERWORLD
        };
        if scheduler.active != Some(active) {
            info!(frame, world = active.0, "player changed world");
            scheduler.active = Some(active);
        }

        let stats = lights.on_render_frame(&population.snapshots, &mut scheduler);
        totals.record(stats);
        clock.advance(FRAME_MILLIS);
    }

    info!(
        frames = TOTAL_FRAMES,
        ticks = totals.ticks,
        updated = totals.updated,
        released = totals.released,
        peak_tracked = totals.peak_tracked,
        tracked = lights.source_count(),
        despawned = population.removed,
        "simulation finished"
    );
    info!(
        requests = scheduler.requests,
        distinct_sections = scheduler.distinct.len(),
        "rebuild requests issued"
    );

    demonstrate_sampling(&lights);

    lights.clear_sources(&mut scheduler);
    info!(
        requests = scheduler.requests,
        tracked = lights.source_count(),
        "cleared all dynamic lights"
    );
}

/// Samples the light around the brightest tracked source and merges it into
/// a dark packed light word.
fn demonstrate_sampling(lights: &DynamicLights) {
    let Some(brightest) = lights.sources().max_by_key(|source| source.luminance()) else {
        info!("no dynamic lights left to sample");
        return;
    };
    let Some(world) = brightest.world() else {
        return;
    };

    let anchor = brightest.anchor().floor().as_ivec3();
    for distance in [0, 2, 4, 8] {
        let block = anchor + IVec3::new(distance, 0, 0);
        let level = lights.light_level_at(world, block);
        let packed = packed_light_with_dynamic(15 << 20, level);
        info!(
            source = brightest.id().0,
            distance,
            level = %format!("{level:.2}"),
            packed = %format!("{packed:#010x}"),
            "sampled dynamic light"
        );
    }

    let lit = lights
        .sources()
        .filter(|source| source.luminance() > 0)
        .count();
    info!(lit, "lit sources at end of run");
}
