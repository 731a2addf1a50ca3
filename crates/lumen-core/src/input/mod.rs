//! Input handling: descriptor construction, options and incremental sources.
//!
//! - **options**: typed and untyped input parameters
//! - **descriptor**: validation into a canonical [`InputDescriptor`]
//! - **source**: frame accumulation and the completion latch shared by clones

pub mod descriptor;
pub mod options;
pub mod source;

pub use descriptor::{
    FinishedInput, Input, InputContext, InputDescriptor, RawSpec, ResolvedSource, Source,
    SourceKind, MAX_DENSITY,
};
pub use options::{InputOptions, RawOptions};
pub use source::{Frame, Lifecycle, SharedSource};
