//! The host engine as seen by the lighting core.
//!
//! The core never owns world objects. Each tick and frame the host hands
//! over [`EmitterSnapshot`]s and answers content, fluid, and rebuild queries
//! through the traits below.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;

use glam::{DVec3, IVec3};

use crate::section::ChunkSectionPos;

/// Stable handle of a host object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

/// Identifies a loaded world/level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldId(pub u32);

/// Host block type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

/// Host item type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemId(pub u32);

/// A stack of items held or displayed by an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemStack {
    /// Item type.
    pub item: ItemId,
    /// Number of items; zero means empty.
    pub count: u32,
}

impl ItemStack {
    /// Returns `true` when the stack holds nothing.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Broad class of a host object. Each class has its own lighting switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmitterKind {
    /// A moving entity (mob, item, projectile...).
    Entity,
    /// A block-anchored object with its own state.
    BlockEntity,
}

/// Key naming the category an object belongs to (e.g. `"blaze"`).
///
/// Policies are registered and resolved per category.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(Cow<'static, str>);

impl Category {
    /// Category from a static name, usable in constants.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Category from an owned or borrowed name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The category name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category-specific state a policy may read.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum EmitterDetail {
    /// Nothing beyond the common snapshot fields.
    #[default]
    None,
    /// Explosive countdown; `swelling` goes from 0 (idle) to 1 (detonation).
    Fuse {
        /// Fuse progress in `[0, 1]`.
        swelling: f32,
    },
    /// A mob carrying a block.
    Carrying {
        /// The carried block, if any.
        block: Option<BlockId>,
    },
    /// A dropped or displayed item.
    Item {
        /// The contained stack.
        stack: ItemStack,
    },
    /// A squishy mob; `squish` above 0.6 marks its agitated phase.
    Squish {
        /// Current squish factor.
        squish: f32,
    },
}

/// Per-tick view of a host object that may emit dynamic light.
#[derive(Clone, Debug, PartialEq)]
pub struct EmitterSnapshot {
    /// Stable handle.
    pub id: SourceId,
    /// Entity or block entity.
    pub kind: EmitterKind,
    /// Category used for policy lookup.
    pub category: Category,
    /// World the object lives in; `None` means it is detached.
    pub world: Option<WorldId>,
    /// Feet/base position in world space.
    pub position: DVec3,
    /// Height of the eye/light anchor above `position`.
    pub eye_height: f64,
    /// Whether the object is burning.
    pub on_fire: bool,
    /// Whether the host has removed the object.
    pub removed: bool,
    /// Category-specific state.
    pub detail: EmitterDetail,
}

impl EmitterSnapshot {
    /// Creates a live, non-burning snapshot with no category detail.
    pub fn new(
        id: SourceId,
        kind: EmitterKind,
        category: Category,
        world: WorldId,
        position: DVec3,
    ) -> Self {
        Self {
            id,
            kind,
            category,
            world: Some(world),
            position,
            eye_height: 0.0,
            on_fire: false,
            removed: false,
            detail: EmitterDetail::None,
        }
    }

    /// Sets the eye height.
    pub fn with_eye_height(mut self, eye_height: f64) -> Self {
        self.eye_height = eye_height;
        self
    }

    /// Sets the category detail.
    pub fn with_detail(mut self, detail: EmitterDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Sets the burning flag.
    pub fn with_fire(mut self, on_fire: bool) -> Self {
        self.on_fire = on_fire;
        self
    }

    /// World-space light anchor: the position raised to eye height.
    pub fn anchor(&self) -> DVec3 {
        self.position + DVec3::new(0.0, self.eye_height, 0.0)
    }

    /// Block containing the feet position.
    pub fn block_position(&self) -> IVec3 {
        self.position.floor().as_ivec3()
    }

    /// Block checked for submersion: the feet block raised by the whole
    /// part of the eye height.
    pub fn eye_block_position(&self) -> IVec3 {
        self.block_position() + IVec3::new(0, self.eye_height as i32, 0)
    }
}

/// Light emission data from the host content database.
pub trait ContentLuminance {
    /// Light emitted by a placed block (0–15).
    fn block_luminance(&self, block: BlockId) -> u8;

    /// Light emitted by an item stack (0–15), possibly reduced underwater.
    fn item_luminance(&self, stack: &ItemStack, submerged: bool) -> u8;
}

/// Fluid state queries.
pub trait FluidQuery {
    /// Returns `true` if the block at `block` holds any fluid.
    fn is_submerged(&self, world: WorldId, block: IVec3) -> bool;
}

/// Everything policies may ask of the host world.
pub trait WorldQuery: ContentLuminance + FluidQuery {}

impl<T: ContentLuminance + FluidQuery + ?Sized> WorldQuery for T {}

/// The renderer's chunk rebuild queue.
///
/// Requests are fire-and-forget; duplicates within a frame must be tolerated.
pub trait RebuildScheduler {
    /// The world currently being rendered, if any.
    fn active_world(&self) -> Option<WorldId>;

    /// Marks a chunk section as needing a mesh rebuild.
    fn request_rebuild(&mut self, section: ChunkSectionPos);
}

/// Looks up the current snapshot of a tracked object.
///
/// The frame driver does one lookup per tracked source every frame, so
/// implementations must answer in constant time; a keyed map is the
/// expected shape.
pub trait EmitterIndex {
    /// Returns `None` when the host no longer knows the object.
    fn emitter(&self, id: SourceId) -> Option<&EmitterSnapshot>;
}

impl<S: BuildHasher> EmitterIndex for HashMap<SourceId, EmitterSnapshot, S> {
    fn emitter(&self, id: SourceId) -> Option<&EmitterSnapshot> {
        self.get(&id)
    }
}
