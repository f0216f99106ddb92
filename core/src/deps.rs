use std::{collections::BTreeMap, fs, io, path::Path};

use serde::Deserialize;
use serde_json::Value;

use crate::error::FinishError;

/// The parts of `package.json` the audit reads.
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, Value>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyAudit {
    pub manifest_present: bool,
    pub found: Vec<String>,
    pub missing: Vec<String>,
}

/// Compare `required` against the regular and development dependencies
/// declared in `manifest`.
///
/// An absent manifest is not an error: there is nothing to compare against, so
/// the audit reports nothing missing.
pub fn audit_dependencies<P: AsRef<Path>, S: AsRef<str>>(
    manifest: P,
    required: &[S],
) -> Result<DependencyAudit, FinishError> {
    let manifest = manifest.as_ref();
    let bytes = match fs::read(manifest) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DependencyAudit::default()),
        Err(e) => return Err(FinishError::io(manifest, e)),
    };
    let parsed: PackageManifest =
        serde_json::from_slice(&bytes).map_err(|source| FinishError::MalformedManifest {
            path: manifest.to_path_buf(),
            source,
        })?;

    let mut declared = parsed.dependencies;
    declared.extend(parsed.dev_dependencies);

    let mut audit = DependencyAudit {
        manifest_present: true,
        ..Default::default()
    };
    for name in required {
        let name = name.as_ref();
        if declared.contains_key(name) {
            audit.found.push(name.to_string());
        } else {
            audit.missing.push(name.to_string());
        }
    }
    Ok(audit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::REQUIRED_PACKAGES;
    use std::collections::HashSet;

    fn manifest(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("package.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_is_complement_of_declared() {
        let tmp = tempfile::tempdir().unwrap();
        let all: HashSet<&str> = REQUIRED_PACKAGES.iter().copied().collect();
        for declared in [vec![], vec!["xlsx"], vec!["multer", "sqlite3"], vec!["xlsx", "multer", "sqlite3"]] {
            let deps: serde_json::Map<String, Value> = declared
                .iter()
                .map(|n| (n.to_string(), Value::from("^1.0.0")))
                .collect();
            let path = manifest(
                tmp.path(),
                &serde_json::json!({ "dependencies": deps }).to_string(),
            );
            let audit = audit_dependencies(&path, REQUIRED_PACKAGES).unwrap();
            let missing: HashSet<&str> = audit.missing.iter().map(String::as_str).collect();
            let expected: HashSet<&str> =
                all.difference(&declared.iter().copied().collect()).copied().collect();
            assert_eq!(missing, expected, "declared {declared:?}");
        }
    }

    #[test]
    fn dev_dependencies_count() {
        let tmp = tempfile::tempdir().unwrap();
        let path = manifest(
            tmp.path(),
            r#"{"dependencies":{"multer":"^1.4.5"},"devDependencies":{"sqlite3":"^5.1.6"}}"#,
        );
        let audit = audit_dependencies(&path, REQUIRED_PACKAGES).unwrap();
        assert!(audit.manifest_present);
        assert_eq!(audit.found, vec!["multer", "sqlite3"]);
        assert_eq!(audit.missing, vec!["xlsx"]);
    }

    #[test]
    fn absent_manifest_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let audit =
            audit_dependencies(tmp.path().join("package.json"), REQUIRED_PACKAGES).unwrap();
        assert_eq!(audit, DependencyAudit::default());
    }

    #[test]
    fn malformed_manifest_is_distinct() {
        let tmp = tempfile::tempdir().unwrap();
        let path = manifest(tmp.path(), "{ \"dependencies\": ");
        let err = audit_dependencies(&path, REQUIRED_PACKAGES).unwrap_err();
        assert!(matches!(err, FinishError::MalformedManifest { .. }));
    }

    #[test]
    fn manifest_without_dependency_sections() {
        let tmp = tempfile::tempdir().unwrap();
        let path = manifest(tmp.path(), r#"{"name":"rds-viewer","version":"3.0.0"}"#);
        let audit = audit_dependencies(&path, REQUIRED_PACKAGES).unwrap();
        assert_eq!(audit.missing.len(), 3);
    }
}
