//! Dynamic lights for moving objects: per-category light policies, section
//! tracking around each source, throttled rebuild requests, and light
//! sampling for mesh builders.

pub mod cadence;
pub mod defaults;
mod driver;
pub mod host;
mod policy;
mod propagation;
mod sampling;
pub mod section;
mod source;

#[cfg(test)]
mod test_support;

pub use cadence::{CadenceGate, Clock, ManualClock, MonotonicClock};
pub use defaults::{categories, default_categories, register_default_policies};
pub use driver::{DynamicLights, FrameStats};
pub use host::{
    BlockId, Category, ContentLuminance, EmitterDetail, EmitterIndex, EmitterKind,
    EmitterSnapshot, FluidQuery, ItemId, ItemStack, RebuildScheduler, SourceId, WorldId,
    WorldQuery,
};
pub use policy::{
    LightPolicy, LuminanceFn, MAX_LUMINANCE, PolicyRegistry, WaterSensitivityFn, can_light_up,
};
pub use propagation::{CLUSTER_SIZE, MOVE_THRESHOLD, affected_sections};
pub use sampling::{MAX_RADIUS, packed_light_with_dynamic, source_contribution};
pub use section::{ChunkSectionPos, Direction, SECTION_MASK, SECTION_SIZE};
pub use source::TrackedLightSource;
