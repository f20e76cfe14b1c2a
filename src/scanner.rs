use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A GEDCOM file discovered under the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GedcomFile {
    pub path: PathBuf,
    /// Path relative to the scan root, for reports
    pub relative: String,
}

/// Walk `root` and collect every `*.ged` file, sorted by path.
///
/// Hidden files and directories (".git", ".cache", …) are skipped, and so
/// is `skip_dir` when it lies under the root, so earlier output never feeds
/// back into a scan.
pub fn scan_corpus(root: &Path, skip_dir: Option<&Path>) -> Vec<GedcomFile> {
    let skip = skip_dir.and_then(|d| d.canonicalize().ok());

    let mut results: Vec<GedcomFile> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() > 0 && is_hidden(e) {
                return false;
            }
            match &skip {
                Some(s) => e.path().canonicalize().map(|p| &p != s).unwrap_or(true),
                None => true,
            }
        })
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_gedcom(e.path()))
        .map(|e| {
            let path = e.path().to_path_buf();
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .display()
                .to_string();
            GedcomFile { path, relative }
        })
        .collect();

    results.sort_by(|a, b| a.path.cmp(&b.path));
    results
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn is_gedcom(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ged"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "0 HEAD\n0 TRLR\n").unwrap();
    }

    #[test]
    fn test_finds_ged_files_recursively() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "smith.ged");
        touch(tmp.path(), "family/jones.GED");
        touch(tmp.path(), "family/notes.txt");

        let found: Vec<String> = scan_corpus(tmp.path(), None)
            .into_iter()
            .map(|f| f.relative.replace('\\', "/"))
            .collect();
        assert_eq!(found, vec!["family/jones.GED", "smith.ged"]);
    }

    #[test]
    fn test_skips_hidden_and_output_dirs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.ged");
        touch(tmp.path(), ".git/b.ged");
        touch(tmp.path(), "output/c.ged");

        let output = tmp.path().join("output");
        let found: Vec<String> = scan_corpus(tmp.path(), Some(&output))
            .into_iter()
            .map(|f| f.relative)
            .collect();
        assert_eq!(found, vec!["a.ged"]);
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(scan_corpus(&tmp.path().join("nope"), None).is_empty());
    }
}
