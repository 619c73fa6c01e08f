use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants::AUDIO_EXTENSIONS;
use crate::shared::error::{AugmentError, Result};

/// Returns true if the path has a recognized audio extension, ignoring case.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Resolves files and directories into a sorted list of audio files.
///
/// Directories are walked recursively, following symlinks; a directory
/// reached twice through links is only walked once. Fails when nothing is
/// found, so operators can reject an empty corpus at construction.
pub fn find_audio_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();

    for path in paths {
        let path = path.as_ref();
        let resolved = fs::canonicalize(path).map_err(|e| {
            AugmentError::config(format!("cannot resolve sound path {}: {e}", path.display()))
        })?;
        if resolved.is_dir() {
            walk(&resolved, &mut found, &mut visited)?;
        } else if is_audio_file(&resolved) {
            found.push(resolved);
        } else {
            log::warn!(
                "Ignoring {}: not a recognized audio file extension",
                path.display()
            );
        }
    }

    found.sort();
    found.dedup();

    if found.is_empty() {
        let listed: Vec<String> = paths
            .iter()
            .map(|p| p.as_ref().display().to_string())
            .collect();
        return Err(AugmentError::config(format!(
            "no audio files found in [{}]",
            listed.join(", ")
        )));
    }
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>, visited: &mut HashSet<PathBuf>) -> Result<()> {
    if !visited.insert(fs::canonicalize(dir)?) {
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        // fs::metadata follows symlinks; dangling links are skipped.
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                continue;
            }
        };
        if metadata.is_dir() {
            walk(&path, found, visited)?;
        } else if metadata.is_file() && is_audio_file(&path) {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[rstest]
    #[case::lower("rain.wav", true)]
    #[case::upper("RAIN.WAV", true)]
    #[case::mixed("hum.FlAc", true)]
    #[case::opus("voice.opus", true)]
    #[case::text("notes.txt", false)]
    #[case::no_extension("README", false)]
    fn test_is_audio_file(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_audio_file(Path::new(name)), expected);
    }

    #[test]
    fn test_walks_directories_recursively() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.wav"));
        touch(&dir.path().join("nested/deeper/b.MP3"));
        touch(&dir.path().join("nested/readme.md"));

        let files = find_audio_files(&[dir.path()]).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.is_absolute()));
        assert!(files.iter().any(|f| f.ends_with("nested/deeper/b.MP3")));
    }

    #[test]
    fn test_accepts_individual_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("one.ogg");
        touch(&file);
        let files = find_audio_files(&[&file]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_result_is_sorted_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.wav"));
        touch(&dir.path().join("a.wav"));
        let files = find_audio_files(&[dir.path(), dir.path().join("a.wav").as_path()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0] < files[1]);
    }

    #[test]
    fn test_empty_result_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("notes.txt"));
        let result = find_audio_files(&[dir.path()]);
        assert!(matches!(result, Err(AugmentError::Configuration(_))));
    }

    #[test]
    fn test_missing_path_is_configuration_error() {
        let result = find_audio_files(&[Path::new("/nonexistent/noises")]);
        assert!(matches!(result, Err(AugmentError::Configuration(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_follows_symlinks_without_looping() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        touch(&corpus.join("x.wav"));
        let linked = dir.path().join("root");
        fs::create_dir_all(&linked).unwrap();
        std::os::unix::fs::symlink(&corpus, linked.join("corpus_link")).unwrap();
        std::os::unix::fs::symlink(&linked, linked.join("loop")).unwrap();

        let files = find_audio_files(&[&linked]).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("corpus_link/x.wav"));
    }
}
