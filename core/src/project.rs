use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, RubyTestError};

/// Folders that make up the project containing `file_path`.
///
/// Explicit folders (the editor's open folders) win. Without them, the work
/// directory of the enclosing git repository is used, then the file's own
/// folder.
pub fn project_folders(file_path: &Path, explicit: &[PathBuf]) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }

    let parent = file_path.parent().unwrap_or(Path::new("/"));
    match Repository::discover(parent) {
        Ok(repo) => {
            if let Some(workdir) = repo.workdir() {
                // git2 reports the work directory with a trailing separator
                let workdir: PathBuf = workdir.components().collect();
                debug!(folder = %workdir.display(), "using git work directory as project folder");
                return vec![workdir];
            }
            vec![parent.to_path_buf()]
        }
        Err(e) => {
            debug!(error = %e, "no git repository around file");
            vec![parent.to_path_buf()]
        }
    }
}

fn is_ignored(entry: &walkdir::DirEntry, ignored: &[String]) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| ignored.iter().any(|i| i == name))
}

/// Walk `folders` for files whose name is one of `candidates`, skipping
/// directories named in `ignored`. Returns sorted, deduplicated paths.
pub fn find_files_named(
    folders: &[PathBuf],
    candidates: &[String],
    ignored: &[String],
) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();

    for folder in folders {
        let walker = WalkDir::new(folder)
            .into_iter()
            .filter_entry(|entry| !is_ignored(entry, ignored));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| candidates.iter().any(|c| c == name));
            if matches {
                found.insert(entry.into_path());
            }
        }
    }

    found.into_iter().collect()
}

/// Like [`find_files_named`], but finding nothing is an error that carries the
/// candidate names.
pub fn find_alternate_files(
    folders: &[PathBuf],
    candidates: &[String],
    ignored: &[String],
) -> Result<Vec<PathBuf>> {
    if candidates.is_empty() {
        return Err(RubyTestError::NoAlternateFileFound {
            candidates: Vec::new(),
        });
    }
    let found = find_files_named(folders, candidates, ignored);
    if found.is_empty() {
        return Err(RubyTestError::NoAlternateFileFound {
            candidates: candidates.to_vec(),
        });
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_finds_candidates_anywhere_in_tree() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("app/models")).unwrap();
        fs::create_dir_all(tmp.path().join("test/models")).unwrap();
        fs::write(tmp.path().join("app/models/user.rb"), "class User; end").unwrap();
        fs::write(tmp.path().join("test/models/user_test.rb"), "").unwrap();

        let found = find_files_named(
            &[tmp.path().to_path_buf()],
            &names(&["user_test.rb", "user_spec.rb"]),
            &names(&[".git"]),
        );
        assert_eq!(found, vec![tmp.path().join("test/models/user_test.rb")]);
    }

    #[test]
    fn test_skips_ignored_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("vendor/gems")).unwrap();
        fs::create_dir_all(tmp.path().join("spec")).unwrap();
        fs::write(tmp.path().join("vendor/gems/user_spec.rb"), "").unwrap();
        fs::write(tmp.path().join("spec/user_spec.rb"), "").unwrap();

        let found = find_files_named(
            &[tmp.path().to_path_buf()],
            &names(&["user_spec.rb"]),
            &names(&["vendor"]),
        );
        assert_eq!(found, vec![tmp.path().join("spec/user_spec.rb")]);
    }

    #[test]
    fn test_ignored_name_on_root_folder_still_walks() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("vendor");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("user_spec.rb"), "").unwrap();

        let found = find_files_named(&[root.clone()], &names(&["user_spec.rb"]), &names(&["vendor"]));
        assert_eq!(found, vec![root.join("user_spec.rb")]);
    }

    #[test]
    fn test_deduplicates_overlapping_folders() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("lib")).unwrap();
        fs::write(tmp.path().join("lib/user.rb"), "").unwrap();

        let found = find_files_named(
            &[tmp.path().to_path_buf(), tmp.path().join("lib")],
            &names(&["user.rb"]),
            &[],
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_no_alternate_reports_candidates() {
        let tmp = TempDir::new().unwrap();
        let err = find_alternate_files(
            &[tmp.path().to_path_buf()],
            &names(&["user_test.rb"]),
            &[],
        )
        .unwrap_err();
        match err {
            RubyTestError::NoAlternateFileFound { candidates } => {
                assert_eq!(candidates, vec!["user_test.rb"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_explicit_project_folders_win() {
        let explicit = vec![PathBuf::from("/work/shop")];
        assert_eq!(
            project_folders(Path::new("/elsewhere/a_test.rb"), &explicit),
            explicit
        );
    }

    #[test]
    fn test_project_folder_from_git_repository() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        fs::create_dir_all(tmp.path().join("test/models")).unwrap();
        let file = tmp.path().join("test/models/user_test.rb");
        fs::write(&file, "").unwrap();

        let folders = project_folders(&file, &[]);
        assert_eq!(folders.len(), 1);
        assert_eq!(
            folders[0].canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }
}
