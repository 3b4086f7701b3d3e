/*!
 * Memory Module
 * Memory regions, providers, and pool object layout
 */

pub mod heap;
pub mod layout;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use heap::HeapProvider;
pub use layout::{calc_obj_size, ObjLayout};
pub use traits::*;
pub use types::*;
