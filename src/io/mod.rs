//! Model serialization.
//!
//! - [`dump`]: XGBoost text dump (`Booster.dump_model`), the model source format
//! - [`json`]: raw node arrays as JSON, validated when read back

pub mod dump;
pub mod json;

pub use dump::{DumpNode, TreeDump};
pub use json::{LayoutSchema, TreeSchema};
