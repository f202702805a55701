// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration: ambient control-plane policy ([`CoreConfig`]) plus
//! talosctl config file parsing ([`TalosConfig`]) for the underlying client.

mod core;
mod talosconfig;

pub use core::{CoreConfig, CoreConfigBuilder, JoinTokensMode};
pub use talosconfig::{TalosConfig, TalosContext};
