//! Deferred, composable image pipelines.
//!
//! A [`Pipeline`] holds an input descriptor and a set of operations. Nothing
//! touches the image until a query ([`Pipeline::metadata`] or
//! [`Pipeline::to_buffer`]) runs; for stream input the query waits until
//! the stream completes.
//!
//! - **lifecycle**: construction, cloning and the stream sink
//! - **options**: chainable setters for limits, read mode and operations
//! - **query**: metadata and render dispatch to the engine
//! - **operations**: the opaque operation map

mod lifecycle;
mod operations;
mod options;
mod query;

pub use lifecycle::Pipeline;
pub use operations::Operations;
pub use options::PixelLimit;
