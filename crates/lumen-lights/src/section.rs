//! Chunk-section coordinates and the six axis directions.
//!
//! A chunk section is a 16×16×16 block cube. Sections are identified by
//! [`ChunkSectionPos`] and stored in hash sets as packed `i64` keys.

use glam::{DVec3, IVec3};

/// Edge length of a chunk section, in blocks.
pub const SECTION_SIZE: i32 = 16;

/// log2 of [`SECTION_SIZE`].
const SECTION_SHIFT: i32 = 4;

/// Bit mask for a block coordinate local to its section.
pub const SECTION_MASK: i32 = SECTION_SIZE - 1;

const PACKED_XZ_BITS: u32 = 22;
const PACKED_Y_BITS: u32 = 20;
const PACKED_X_SHIFT: u32 = PACKED_Y_BITS + PACKED_XZ_BITS;
const PACKED_Z_SHIFT: u32 = PACKED_Y_BITS;
const PACKED_XZ_MASK: i64 = (1 << PACKED_XZ_BITS) - 1;
const PACKED_Y_MASK: i64 = (1 << PACKED_Y_BITS) - 1;

/// Position of a chunk section in section-grid units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkSectionPos {
    /// Section-grid X coordinate.
    pub x: i32,
    /// Section-grid Y coordinate.
    pub y: i32,
    /// Section-grid Z coordinate.
    pub z: i32,
}

impl ChunkSectionPos {
    /// Creates a section position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Section coordinate containing the given block coordinate.
    pub const fn block_to_section_coord(block: i32) -> i32 {
        block >> SECTION_SHIFT
    }

    /// Section containing the given block position.
    pub fn from_block(block: IVec3) -> Self {
        Self::new(
            Self::block_to_section_coord(block.x),
            Self::block_to_section_coord(block.y),
            Self::block_to_section_coord(block.z),
        )
    }

    /// Section containing the given world-space point.
    pub fn containing(point: DVec3) -> Self {
        Self::from_block(point.floor().as_ivec3())
    }

    /// Returns the neighboring section one step in `direction`.
    pub fn offset(self, direction: Direction) -> Self {
        let step = direction.normal();
        Self::new(self.x + step.x, self.y + step.y, self.z + step.z)
    }

    /// Packs this position into a single `i64` key.
    ///
    /// X and Z keep their low 22 bits, Y its low 20 bits.
    pub fn as_packed(self) -> i64 {
        ((self.x as i64 & PACKED_XZ_MASK) << PACKED_X_SHIFT)
            | ((self.z as i64 & PACKED_XZ_MASK) << PACKED_Z_SHIFT)
            | (self.y as i64 & PACKED_Y_MASK)
    }

    /// Inverse of [`as_packed`](Self::as_packed).
    pub fn from_packed(packed: i64) -> Self {
        let x = packed >> PACKED_X_SHIFT;
        let z = (packed << (64 - PACKED_X_SHIFT)) >> (64 - PACKED_XZ_BITS);
        let y = (packed << (64 - PACKED_Y_BITS)) >> (64 - PACKED_Y_BITS);
        Self::new(x as i32, y as i32, z as i32)
    }
}

/// The six axis-aligned directions, named after their world orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// −Y
    Down,
    /// +Y
    Up,
    /// −Z
    North,
    /// +Z
    South,
    /// −X
    West,
    /// +X
    East,
}

impl Direction {
    /// Unit step along this direction.
    pub fn normal(self) -> IVec3 {
        match self {
            Direction::Down => IVec3::NEG_Y,
            Direction::Up => IVec3::Y,
            Direction::North => IVec3::NEG_Z,
            Direction::South => IVec3::Z,
            Direction::West => IVec3::NEG_X,
            Direction::East => IVec3::X,
        }
    }

    /// Returns the opposite direction.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }
}
