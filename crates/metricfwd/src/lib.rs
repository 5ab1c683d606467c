//! Top-level facade crate for metricfwd.
//!
//! Re-exports the registry and the forwarding agent so users can depend on a single crate.

pub mod core {
    pub use metricfwd_core::*;
}

pub mod agent {
    pub use metricfwd_agent::*;
}
