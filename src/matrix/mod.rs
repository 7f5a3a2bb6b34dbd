//! @ai:module:intent Task table parsing into per-stage overrides
//! @ai:module:layer domain
//! @ai:module:public_api TaskMatrix, Task, TaskOverride, HeaderSchema, ColumnBinding, OverrideKind

pub mod binding;
pub mod loader;
pub mod task;

pub use binding::{ColumnBinding, HeaderSchema, OverrideKind};
pub use loader::TaskMatrix;
pub use task::{Task, TaskOverride};
