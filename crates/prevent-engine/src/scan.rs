//! File Discovery
//!
//! Expands the caller-supplied paths into the concrete, deterministic file
//! list the indexer consumes: directories are walked recursively, the
//! extension allow-list and exclude globs are applied, and the result is
//! sorted so repeated runs see identical input order.

use std::path::PathBuf;

use walkdir::WalkDir;

use crate::Result;
use crate::config::EngineConfig;

/// Collect source files under the given paths
pub fn collect_files(paths: &[PathBuf], config: &EngineConfig) -> Result<Vec<PathBuf>> {
    let exclude = config.files.exclude_set()?;
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if config.files.allows_extension(path) && !exclude.is_match(path) {
                files.push(path.clone());
            }
            continue;
        }

        for entry in WalkDir::new(path)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let candidate = entry.path();
            if config.files.allows_extension(candidate) && !exclude.is_match(candidate) {
                files.push(candidate.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn walks_directories_and_filters_extensions() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "src/a.rs", "fn a() {}");
        write_file(&dir, "src/b.py", "def b(): pass");
        write_file(&dir, "README.md", "# readme");

        let files =
            collect_files(&[dir.path().to_path_buf()], &EngineConfig::default()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() != "md"));
    }

    #[test]
    fn excluded_globs_are_skipped() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "src/keep.rs", "fn k() {}");
        write_file(&dir, "target/debug/build.rs", "fn skip() {}");

        let files =
            collect_files(&[dir.path().to_path_buf()], &EngineConfig::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/keep.rs"));
    }

    #[test]
    fn output_is_sorted_and_deduplicated() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.rs", "fn a() {}");
        let b = write_file(&dir, "b.rs", "fn b() {}");

        let files = collect_files(
            &[b.clone(), a.clone(), a.clone()],
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(files, vec![a, b]);
    }
}
