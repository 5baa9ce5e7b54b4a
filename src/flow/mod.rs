pub mod artifact;
pub mod conversion;
pub mod document;
pub mod model;

pub use conversion::*;
pub use document::*;
pub use model::*;
