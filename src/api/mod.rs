// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod generated;

// Re-export API modules
pub use generated::common;
pub use generated::machine;
pub use generated::version;
