//! External API integrations

pub mod phasing;

pub use phasing::PhasingClient;
