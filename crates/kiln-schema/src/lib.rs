//! Package descriptor, settings vector, and binary identity for kiln.
//!
//! This crate defines the schema layer: `kiln.toml` descriptor parsing
//! (`Descriptor`) and its validated form (`NormalizedDescriptor`), dependency
//! references, the settings vector and profile files (`Settings`), the binary
//! identity policy (`compute_identity`), and the binary info record written
//! into package folders (`BinaryInfo`).

pub mod descriptor;
pub mod identity;
pub mod info;
pub mod normalize;
pub mod reference;
pub mod settings;
pub mod types;

pub use descriptor::{
    parse_descriptor_file, parse_descriptor_str, Descriptor, DescriptorError, PackageInfoSection,
    PackageSection, DESCRIPTOR_FILE,
};
pub use identity::{
    compute_identity, IdentityError, IdentityFacts, IdentityPolicy, PackageIdentity, RequiresMode,
};
pub use info::{BinaryInfo, InfoError, INFO_FILE};
pub use normalize::NormalizedDescriptor;
pub use reference::{Channel, DependencyRef, ReferenceError};
pub use settings::{
    parse_profile_file, parse_profile_str, Arch, BuildType, Compiler, CompilerSettings, Os,
    ProfileError, Settings,
};
pub use types::{PackageId, ShortId, Version};
