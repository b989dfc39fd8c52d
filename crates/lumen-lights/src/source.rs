//! Per-object dynamic light state, kept in the frame driver's side table.

use glam::DVec3;
use rustc_hash::FxHashSet;

use crate::host::{EmitterSnapshot, SourceId, WorldId};
use crate::policy::MAX_LUMINANCE;
use crate::section::ChunkSectionPos;

/// Light state of one tracked object.
///
/// `lit_sections` holds exactly the sections dirtied by the last applied
/// change; it is what gets cleared when the source moves, darkens, or
/// disappears.
#[derive(Debug, Clone)]
pub struct TrackedLightSource {
    pub(crate) id: SourceId,
    pub(crate) world: Option<WorldId>,
    pub(crate) position: DVec3,
    pub(crate) eye_height: f64,
    pub(crate) luminance: u8,
    pub(crate) last_luminance: u8,
    pub(crate) applied_position: DVec3,
    pub(crate) lit_sections: FxHashSet<i64>,
    pub(crate) alive: bool,
}

impl TrackedLightSource {
    /// Starts tracking the object described by `snapshot`, dark and with
    /// nothing applied yet.
    pub fn new(snapshot: &EmitterSnapshot) -> Self {
        Self {
            id: snapshot.id,
            world: snapshot.world,
            position: snapshot.position,
            eye_height: snapshot.eye_height,
            luminance: 0,
            last_luminance: 0,
            applied_position: snapshot.position,
            lit_sections: FxHashSet::default(),
            alive: !snapshot.removed,
        }
    }

    /// Copies world, position and liveness from a fresh snapshot.
    pub fn observe(&mut self, snapshot: &EmitterSnapshot) {
        self.world = snapshot.world;
        self.position = snapshot.position;
        self.eye_height = snapshot.eye_height;
        if snapshot.removed {
            self.alive = false;
        }
    }

    /// Sets the current luminance, clamped to `[0, 15]`.
    pub fn set_luminance(&mut self, luminance: u8) {
        self.luminance = luminance.min(MAX_LUMINANCE);
    }

    /// Flags the object as removed; the next frame releases it.
    pub fn mark_removed(&mut self) {
        self.alive = false;
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn world(&self) -> Option<WorldId> {
        self.world
    }

    pub fn luminance(&self) -> u8 {
        self.luminance
    }

    /// Luminance at the last applied propagation.
    pub fn last_luminance(&self) -> u8 {
        self.last_luminance
    }

    /// Feet position at the last applied propagation.
    pub fn applied_position(&self) -> DVec3 {
        self.applied_position
    }

    /// Latest feet position.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Latest light anchor (position raised to eye height).
    pub fn anchor(&self) -> DVec3 {
        self.position + DVec3::new(0.0, self.eye_height, 0.0)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Number of sections currently lit on behalf of this source.
    pub fn lit_section_count(&self) -> usize {
        self.lit_sections.len()
    }

    /// Sections currently lit on behalf of this source, in no particular order.
    pub fn lit_sections(&self) -> impl Iterator<Item = ChunkSectionPos> + '_ {
        self.lit_sections.iter().copied().map(ChunkSectionPos::from_packed)
    }

    /// Returns `true` while the source has nothing lit and emits nothing,
    /// i.e. it can leave the side table without further work.
    pub fn is_idle(&self) -> bool {
        self.luminance == 0 && self.lit_sections.is_empty()
    }
}
