// src/package/mod.rs
pub mod models;

use std::path::{Path, PathBuf};

use crate::utils::error::MetadataError;
pub use models::{DescriptorKind, PackageMetadata};
use models::{CargoManifest, CargoVersion, PackageJson};

// Checked in this order within each directory
const DESCRIPTORS: [DescriptorKind; 2] = [DescriptorKind::PackageJson, DescriptorKind::CargoToml];

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

async fn read_text(path: &Path) -> Result<String, MetadataError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Finds the nearest package descriptor at or above `start` and reads its version.
///
/// `start` may be a directory or a file inside the project (a descriptor path works).
pub async fn resolve(start: impl AsRef<Path>) -> Result<PackageMetadata, MetadataError> {
    let start = start.as_ref();
    let absolute = tokio::fs::canonicalize(start)
        .await
        .map_err(|source| MetadataError::Io {
            path: start.to_path_buf(),
            source,
        })?;

    let first_dir = if is_file(&absolute).await {
        absolute.parent().map(Path::to_path_buf).unwrap_or_else(|| absolute.clone())
    } else {
        absolute.clone()
    };

    resolve_within(first_dir.ancestors(), &absolute).await
}

// Nearest directory first; the first descriptor found is the one read
async fn resolve_within<'a>(
    dirs: impl IntoIterator<Item = &'a Path>,
    start: &Path,
) -> Result<PackageMetadata, MetadataError> {
    for dir in dirs {
        for kind in DESCRIPTORS {
            let candidate = dir.join(kind.file_name());
            if !is_file(&candidate).await {
                continue;
            }
            tracing::debug!("Found package descriptor: {}", candidate.display());
            return match kind {
                DescriptorKind::PackageJson => read_package_json(candidate).await,
                DescriptorKind::CargoToml => read_cargo_toml(candidate).await,
            };
        }
    }

    Err(MetadataError::NotFound {
        start: start.to_path_buf(),
    })
}

async fn read_package_json(path: PathBuf) -> Result<PackageMetadata, MetadataError> {
    let content = read_text(&path).await?;
    let package: PackageJson = serde_json::from_str(&content).map_err(|e| MetadataError::Malformed {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let version = package
        .version
        .ok_or_else(|| MetadataError::MissingVersion { path: path.clone() })?;

    Ok(PackageMetadata {
        name: package.name,
        version,
        path,
        kind: DescriptorKind::PackageJson,
    })
}

async fn parse_manifest(path: &Path) -> Result<CargoManifest, MetadataError> {
    let content = read_text(path).await?;
    toml::from_str(&content).map_err(|e| MetadataError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

async fn read_cargo_toml(path: PathBuf) -> Result<PackageMetadata, MetadataError> {
    let manifest = parse_manifest(&path).await?;
    let package = manifest.package.as_ref();
    let name = package.and_then(|p| p.name.clone());

    let version = match package.and_then(|p| p.version.as_ref()) {
        Some(CargoVersion::Literal(version)) => version.clone(),
        Some(CargoVersion::Inherited { workspace: true }) => inherited_version(&path, &manifest).await?,
        // A bare workspace root can still carry `[workspace.package].version`
        _ => manifest
            .workspace_version()
            .map(str::to_string)
            .ok_or_else(|| MetadataError::MissingVersion { path: path.clone() })?,
    };

    Ok(PackageMetadata {
        name,
        version,
        path,
        kind: DescriptorKind::CargoToml,
    })
}

/// Resolves `version.workspace = true` against the closest workspace root.
async fn inherited_version(member: &Path, manifest: &CargoManifest) -> Result<String, MetadataError> {
    if let Some(version) = manifest.workspace_version() {
        return Ok(version.to_string());
    }

    let mut dir = member.parent().and_then(Path::parent);
    while let Some(current) = dir {
        let candidate = current.join(DescriptorKind::CargoToml.file_name());
        if is_file(&candidate).await {
            let root = parse_manifest(&candidate).await?;
            if root.workspace.is_some() {
                tracing::debug!("Inheriting version from workspace root {}", candidate.display());
                return root
                    .workspace_version()
                    .map(str::to_string)
                    .ok_or(MetadataError::MissingVersion { path: candidate });
            }
        }
        dir = current.parent();
    }

    Err(MetadataError::MissingVersion {
        path: member.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_package_json_in_start_dir() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", r#"{"name": "demo", "version": "2.0.0"}"#);

        let meta = tokio_test::block_on(resolve(tmp.path())).unwrap();
        assert_eq!(meta.version, "2.0.0");
        assert_eq!(meta.name.as_deref(), Some("demo"));
        assert_eq!(meta.kind, DescriptorKind::PackageJson);
        assert!(meta.path.ends_with("package.json"));
    }

    #[test]
    fn test_walks_up_from_nested_dir_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", r#"{"version": "1.0.0"}"#);
        let nested = write(tmp.path(), "src/lib/index.js", "");

        let from_dir = tokio_test::block_on(resolve(nested.parent().unwrap())).unwrap();
        assert_eq!(from_dir.version, "1.0.0");
        let from_file = tokio_test::block_on(resolve(&nested)).unwrap();
        assert_eq!(from_file.path, from_dir.path);
    }

    #[test]
    fn test_package_json_preferred_over_cargo_toml() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", r#"{"version": "1.0.0"}"#);
        write(tmp.path(), "Cargo.toml", "[package]\nname = \"x\"\nversion = \"9.9.9\"\n");

        let meta = tokio_test::block_on(resolve(tmp.path())).unwrap();
        assert_eq!(meta.version, "1.0.0");
    }

    #[test]
    fn test_cargo_toml_literal_version() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Cargo.toml", "[package]\nname = \"crate-x\"\nversion = \"0.3.1\"\n");

        let meta = tokio_test::block_on(resolve(tmp.path())).unwrap();
        assert_eq!(meta.version, "0.3.1");
        assert_eq!(meta.kind, DescriptorKind::CargoToml);
    }

    #[test]
    fn test_cargo_toml_workspace_inherited_version() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "Cargo.toml",
            "[workspace]\nmembers = [\"member\"]\n\n[workspace.package]\nversion = \"4.5.6\"\n",
        );
        let member = write(
            tmp.path(),
            "member/Cargo.toml",
            "[package]\nname = \"member\"\nversion.workspace = true\n",
        );

        let meta = tokio_test::block_on(resolve(member.parent().unwrap())).unwrap();
        assert_eq!(meta.version, "4.5.6");
        assert!(meta.path.ends_with("member/Cargo.toml"));
    }

    #[test]
    fn test_malformed_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", "{ not json");

        let err = tokio_test::block_on(resolve(tmp.path())).unwrap_err();
        assert!(matches!(err, MetadataError::Malformed { .. }), "got {:?}", err);
    }

    #[test]
    fn test_missing_version() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", r#"{"name": "no-version"}"#);

        let err = tokio_test::block_on(resolve(tmp.path())).unwrap_err();
        assert!(matches!(err, MetadataError::MissingVersion { .. }), "got {:?}", err);
    }

    #[test]
    fn test_no_descriptor_in_any_directory() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", r#"{"version": "1.0.0"}"#);
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        // Stop before reaching the directory that holds package.json
        let dirs = nested.ancestors().take(2);
        let err = tokio_test::block_on(resolve_within(dirs, &nested)).unwrap_err();
        match err {
            MetadataError::NotFound { start } => assert_eq!(start, nested),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_nonexistent_start_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = tokio_test::block_on(resolve(tmp.path().join("missing"))).unwrap_err();
        assert!(matches!(err, MetadataError::Io { .. }), "got {:?}", err);
    }
}
