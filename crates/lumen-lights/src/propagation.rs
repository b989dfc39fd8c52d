//! Chunk dirty-set propagation: turns a source's move or brightness change
//! into the sections that must be re-meshed.
//!
//! A lit source marks its own section plus a 2×2×2 cluster leaning toward
//! the half of the section it sits in, which covers light bleeding over the
//! nearest section borders. Only the delta against the previously lit set
//! is cleared.

use glam::DVec3;
use rustc_hash::FxHashSet;

use crate::cadence::CadenceGate;
use crate::host::RebuildScheduler;
use crate::section::{ChunkSectionPos, Direction, SECTION_MASK, SECTION_SIZE};
use crate::source::TrackedLightSource;

/// Movement at or below this distance on every axis is ignored.
pub const MOVE_THRESHOLD: f64 = 0.1;

/// Number of sections marked for a lit source.
pub const CLUSTER_SIZE: usize = 8;

/// Sections lit by a source whose feet are at `position` and whose light
/// anchor sits at height `anchor_y`.
///
/// The first entry is the anchor section. The walk then visits X, XZ, Z,
/// and the same four one section up or down, each axis leaning toward the
/// nearer half of the current section.
pub fn affected_sections(position: DVec3, anchor_y: f64) -> [ChunkSectionPos; CLUSTER_SIZE] {
    let block = position.floor().as_ivec3();
    let anchor_block_y = anchor_y.floor() as i32;

    let origin = ChunkSectionPos::new(
        ChunkSectionPos::block_to_section_coord(block.x),
        ChunkSectionPos::block_to_section_coord(anchor_block_y),
        ChunkSectionPos::block_to_section_coord(block.z),
    );

    let half = SECTION_SIZE / 2;
    let dir_x = if (block.x & SECTION_MASK) >= half {
        Direction::East
    } else {
        Direction::West
    };
    let dir_y = if (anchor_block_y & SECTION_MASK) >= half {
        Direction::Up
    } else {
        Direction::Down
    };
    let dir_z = if (block.z & SECTION_MASK) >= half {
        Direction::South
    } else {
        Direction::North
    };

    let mut sections = [origin; CLUSTER_SIZE];
    let mut cursor = origin;
    for (step, slot) in sections.iter_mut().skip(1).enumerate() {
        cursor = match step % 4 {
            0 => cursor.offset(dir_x),
            1 => cursor.offset(dir_z),
            2 => cursor.offset(dir_x.opposite()),
            _ => cursor.offset(dir_z.opposite()).offset(dir_y),
        };
        *slot = cursor;
    }
    sections
}

impl TrackedLightSource {
    /// Whether rebuild requests for this source reach the renderer: only
    /// when the source's world is the one being rendered.
    fn emits_to(&self, scheduler: &dyn RebuildScheduler) -> bool {
        self.world.is_some() && self.world == scheduler.active_world()
    }

    /// Returns `true` if the source moved past [`MOVE_THRESHOLD`] or changed
    /// luminance since the last applied propagation.
    pub fn has_pending_change(&self) -> bool {
        let delta = (self.position - self.applied_position).abs();
        delta.max_element() > MOVE_THRESHOLD || self.luminance != self.last_luminance
    }

    /// Recomputes the lit sections if the cadence gate allows it and the
    /// source changed, requesting rebuilds for entered and left sections.
    ///
    /// Returns `true` when a propagation was applied.
    pub fn update_dynamic_light(
        &mut self,
        gate: &mut CadenceGate,
        scheduler: &mut dyn RebuildScheduler,
    ) -> bool {
        if !gate.should_update() {
            return false;
        }
        if !self.has_pending_change() {
            return false;
        }

        self.applied_position = self.position;
        self.last_luminance = self.luminance;

        let emit = self.emits_to(scheduler);
        let mut lit = FxHashSet::default();

        if self.luminance > 0 {
            for section in affected_sections(self.position, self.anchor().y) {
                let key = section.as_packed();
                if emit {
                    scheduler.request_rebuild(section);
                }
                lit.insert(key);
                self.lit_sections.remove(&key);
            }
        }

        // Whatever is left was lit before and is not anymore.
        if emit {
            for &key in &self.lit_sections {
                scheduler.request_rebuild(ChunkSectionPos::from_packed(key));
            }
        }
        self.lit_sections = lit;

        tracing::trace!(
            source = self.id.0,
            luminance = self.luminance,
            lit = self.lit_sections.len(),
            "propagated dynamic light"
        );
        true
    }

    /// Clears every section lit on behalf of this source, requesting their
    /// rebuild, and resets the applied luminance.
    ///
    /// Returns the number of sections released.
    pub fn release(&mut self, scheduler: &mut dyn RebuildScheduler) -> usize {
        let released = self.lit_sections.len();
        if self.emits_to(scheduler) {
            for &key in &self.lit_sections {
                scheduler.request_rebuild(ChunkSectionPos::from_packed(key));
            }
        }
        self.lit_sections.clear();
        self.last_luminance = 0;
        released
    }
}
