use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteCheck {
    pub found: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

impl RouteCheck {
    pub fn all_present(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Probe each expected route module on disk.
pub fn verify_route_files<P: AsRef<Path>>(paths: &[P]) -> RouteCheck {
    let mut check = RouteCheck::default();
    for path in paths {
        let path = path.as_ref();
        if path.is_file() {
            check.found.push(path.to_path_buf());
        } else {
            check.missing.push(path.to_path_buf());
        }
    }
    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ROUTE_FILES;
    use std::fs;

    #[test]
    fn each_missing_file_flips_the_result() {
        let tmp = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = ROUTE_FILES.iter().map(|p| tmp.path().join(p)).collect();
        fs::create_dir_all(paths[0].parent().unwrap()).unwrap();
        for p in &paths {
            fs::write(p, "module.exports = router;").unwrap();
        }
        assert!(verify_route_files(&paths).all_present());

        for p in &paths {
            fs::remove_file(p).unwrap();
            let check = verify_route_files(&paths);
            assert!(!check.all_present());
            assert_eq!(check.missing, vec![p.clone()]);
            fs::write(p, "module.exports = router;").unwrap();
        }
        assert!(verify_route_files(&paths).all_present());
    }

    #[test]
    fn empty_tree_reports_all_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = ROUTE_FILES.iter().map(|p| tmp.path().join(p)).collect();
        let check = verify_route_files(&paths);
        assert!(check.found.is_empty());
        assert_eq!(check.missing.len(), 3);
    }
}
