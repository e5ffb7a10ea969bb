// Application layer - report use cases on top of an aggregation source.
// Storage-specific code lives in `storage`; the CLI only talks to this layer
// and to the warehouse loader.

pub mod cache;
pub mod error;
pub mod reporting;
pub mod service;
pub mod source;

pub use cache::*;
pub use error::*;
pub use reporting::*;
pub use service::*;
pub use source::*;
