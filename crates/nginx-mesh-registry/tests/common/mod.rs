//! Common test infrastructure for nginx-mesh-registry tests
//!
//! # Modules
//!
//! - `constants`: Release tags, chart versions, addresses
//! - `fakes`: In-process release feed, chart resolver and registration sink
//! - `mock_server`: Wiremock setup helpers for the HTTP collaborators

// Each test binary uses a different subset of the helpers
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod constants;
pub mod fakes;
pub mod mock_server;

pub use constants::*;
pub use fakes::*;
pub use mock_server::*;
