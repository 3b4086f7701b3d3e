/*!
 * Ring Module
 * Lock-free multi-producer / multi-consumer ring
 */

mod cursor;
#[allow(clippy::module_inception)]
mod ring;
pub mod types;

pub use ring::Ring;
pub(crate) use ring::check_name;
pub use types::{Behavior, RingFlags, RingInfo};
