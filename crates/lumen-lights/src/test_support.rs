//! Test doubles for the host-side traits.

use glam::{DVec3, IVec3};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::host::{
    BlockId, Category, ContentLuminance, EmitterKind, EmitterSnapshot, FluidQuery, ItemId,
    ItemStack, RebuildScheduler, SourceId, WorldId,
};
use crate::section::ChunkSectionPos;

/// World 0 entity snapshot.
pub(crate) fn entity(id: u64, category: Category, position: DVec3) -> EmitterSnapshot {
    EmitterSnapshot::new(SourceId(id), EmitterKind::Entity, category, WorldId(0), position)
}

/// Keyed index over `emitters`, as the frame driver expects from a host.
pub(crate) fn index_of(emitters: &[EmitterSnapshot]) -> FxHashMap<SourceId, EmitterSnapshot> {
    emitters
        .iter()
        .map(|snapshot| (snapshot.id, snapshot.clone()))
        .collect()
}

/// Scheduler that records every request.
pub(crate) struct RecordingScheduler {
    pub active: Option<WorldId>,
    pub requests: Vec<ChunkSectionPos>,
}

impl RecordingScheduler {
    pub fn new(active: WorldId) -> Self {
        Self {
            active: Some(active),
            requests: Vec::new(),
        }
    }
}

impl RebuildScheduler for RecordingScheduler {
    fn active_world(&self) -> Option<WorldId> {
        self.active
    }

    fn request_rebuild(&mut self, section: ChunkSectionPos) {
        self.requests.push(section);
    }
}

/// Content and fluid data for one world.
#[derive(Default)]
pub(crate) struct TestWorld {
    pub water: FxHashSet<IVec3>,
    pub blocks: FxHashMap<BlockId, u8>,
    pub items: FxHashMap<ItemId, u8>,
}

impl TestWorld {
    pub fn flood(&mut self, block: IVec3) {
        self.water.insert(block);
    }
}

impl ContentLuminance for TestWorld {
    fn block_luminance(&self, block: BlockId) -> u8 {
        self.blocks.get(&block).copied().unwrap_or(0)
    }

    fn item_luminance(&self, stack: &ItemStack, submerged: bool) -> u8 {
        if stack.is_empty() {
            return 0;
        }
        let level = self.items.get(&stack.item).copied().unwrap_or(0);
        if submerged { level / 2 } else { level }
    }
}

impl FluidQuery for TestWorld {
    fn is_submerged(&self, _world: WorldId, block: IVec3) -> bool {
        self.water.contains(&block)
    }
}
