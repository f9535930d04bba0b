use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::error;
use walkdir::WalkDir;

/// Compile ignore globs, logging and dropping any that don't parse.
pub fn compile_ignore_patterns(ignore_globs: &[String]) -> Vec<Pattern> {
    ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

/// Lazily enumerate every regular file under `root`.
///
/// Symlinks are never followed and symlinked files are skipped, so directory
/// cycles can't occur. Entries matching an ignore pattern are pruned along
/// with everything beneath them. Unreadable directories are logged and
/// skipped rather than ending the walk.
pub fn regular_files<'a>(
    root: &Path,
    ignore_patterns: &'a [Pattern],
) -> impl Iterator<Item = PathBuf> + Send + 'a {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(move |entry| !is_ignored(entry.path(), ignore_patterns))
        .filter_map(|entry_result| match entry_result {
            Ok(entry) => Some(entry),
            Err(err) => {
                let location = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                error!("Error reading directory entry {}: {}", location, err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
}

fn is_ignored(path: &Path, ignore_patterns: &[Pattern]) -> bool {
    ignore_patterns
        .iter()
        .any(|pattern| pattern.matches_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn names(root: &Path, patterns: &[Pattern]) -> Vec<String> {
        let mut names: Vec<String> = regular_files(root, patterns)
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_walks_nested_files_only() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("top.txt"), "1").unwrap();
        fs::write(root.join("a/mid.txt"), "2").unwrap();
        fs::write(root.join("a/b/deep.txt"), "3").unwrap();
        fs::write(root.join("a/b/zero.bin"), "").unwrap();

        assert_eq!(
            names(root, &[]),
            vec!["a/b/deep.txt", "a/b/zero.bin", "a/mid.txt", "top.txt"]
        );
    }

    #[test]
    fn test_ignore_patterns_prune_dirs_and_files() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("skip/inner")).unwrap();
        fs::write(root.join("skip/inner/hidden.txt"), "x").unwrap();
        fs::write(root.join("keep.txt"), "x").unwrap();
        fs::write(root.join("noise.log"), "x").unwrap();

        let patterns =
            compile_ignore_patterns(&["*/skip".to_string(), "*.log".to_string()]);
        assert_eq!(names(root, &patterns), vec!["keep.txt"]);
    }

    #[test]
    fn test_invalid_pattern_is_dropped() {
        let patterns = compile_ignore_patterns(&["[".to_string(), "*.tmp".to_string()]);
        assert_eq!(patterns.len(), 1);
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let tmp = tempdir().unwrap();
        assert!(names(&tmp.path().join("absent"), &[]).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed() {
        use std::os::unix::fs::symlink;

        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("real")).unwrap();
        fs::write(root.join("real/file.txt"), "x").unwrap();
        symlink(root.join("real/file.txt"), root.join("link.txt")).unwrap();
        symlink(root, root.join("real/loop")).unwrap();

        assert_eq!(names(root, &[]), vec!["real/file.txt"]);
    }
}
