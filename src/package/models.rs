// src/package/models.rs
use serde::Deserialize;
use std::path::PathBuf;

/// The bits of `package.json` we care about
#[derive(Debug, Deserialize)]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// The bits of `Cargo.toml` we care about
#[derive(Debug, Deserialize)]
pub struct CargoManifest {
    pub package: Option<CargoPackage>,
    pub workspace: Option<CargoWorkspace>,
}

#[derive(Debug, Deserialize)]
pub struct CargoPackage {
    pub name: Option<String>,
    pub version: Option<CargoVersion>,
}

/// `version = "1.2.3"` or `version.workspace = true`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CargoVersion {
    Literal(String),
    Inherited { workspace: bool },
}

#[derive(Debug, Deserialize)]
pub struct CargoWorkspace {
    pub package: Option<WorkspacePackage>,
}

#[derive(Debug, Deserialize)]
pub struct WorkspacePackage {
    pub version: Option<String>,
}

impl CargoManifest {
    pub fn workspace_version(&self) -> Option<&str> {
        self.workspace
            .as_ref()
            .and_then(|w| w.package.as_ref())
            .and_then(|p| p.version.as_deref())
    }
}

/// Which kind of descriptor a project was identified by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    PackageJson,
    CargoToml,
}

impl DescriptorKind {
    pub fn file_name(self) -> &'static str {
        match self {
            DescriptorKind::PackageJson => "package.json",
            DescriptorKind::CargoToml => "Cargo.toml",
        }
    }
}

/// Version and location of the nearest package descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: Option<String>,
    pub version: String,
    pub path: PathBuf,
    pub kind: DescriptorKind,
}
