//! Core service layer modules

pub mod access;
pub mod package;
pub mod principal;
pub mod registry;
pub mod service;

// Re-export main types for convenience
pub use access::{AccessDecision, Permission};
pub use package::{
    PackageHash, PackageName, PackageRecord, PackageRef, PackageVersion, PushOutcome,
};
pub use principal::{Principal, PUBLIC};
pub use registry::{PackageRegistry, PushResult};
pub use service::*;
