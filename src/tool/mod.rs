//! @ai:module:intent Toolchain stage model: defaults, argument rendering, metric extraction
//! @ai:module:layer domain
//! @ai:module:public_api ToolSpec, ArgValue, EnvValue, FieldExtractor, render_args

pub mod extractor;
pub mod spec;

pub use extractor::FieldExtractor;
pub use spec::{render_args, ArgValue, EnvValue, ToolSpec};
