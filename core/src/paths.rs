use std::path::{MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path};

use serde::Serialize;
use tracing::debug;

use crate::file_kind::FileKind;
use crate::settings::Settings;

/// Where a file sits relative to the test root that its runner expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPaths {
    pub absolute_path: String,
    pub folder_name: String,
    pub file_name: String,
    pub partition_folder: String,
    pub project_root: String,
    pub relative_path: String,
    /// The partition folder was not in the path; root and relative path are
    /// the containing folder and bare file name.
    pub degraded: bool,
}

fn split_file(absolute_path: &str) -> (String, String) {
    let path = Path::new(absolute_path);
    let folder = path
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| absolute_path.to_string());
    (folder, file)
}

/// Split `absolute_path` at the first `/<partition_folder>/`.
///
/// `/home/u/proj/test/models/foo_test.rb` with `test` gives root
/// `/home/u/proj` and relative path `test/models/foo_test.rb`.
pub fn resolve(absolute_path: &str, partition_folder: &str) -> ProjectPaths {
    let (folder_name, file_name) = split_file(absolute_path);

    let needle = format!("{MAIN_SEPARATOR}{partition_folder}{MAIN_SEPARATOR}");
    let split = if partition_folder.is_empty() {
        None
    } else {
        absolute_path.split_once(needle.as_str())
    };

    match split {
        Some((root, rest)) => {
            let project_root = if root.is_empty() {
                MAIN_SEPARATOR_STR.to_string()
            } else {
                root.to_string()
            };
            ProjectPaths {
                absolute_path: absolute_path.to_string(),
                folder_name,
                file_name,
                partition_folder: partition_folder.to_string(),
                project_root,
                relative_path: format!("{partition_folder}{MAIN_SEPARATOR}{rest}"),
                degraded: false,
            }
        }
        None => {
            debug!(
                path = absolute_path,
                partition = partition_folder,
                "partition folder not in path, using containing folder"
            );
            ProjectPaths {
                absolute_path: absolute_path.to_string(),
                project_root: folder_name.clone(),
                relative_path: file_name.clone(),
                folder_name,
                file_name,
                partition_folder: partition_folder.to_string(),
                degraded: true,
            }
        }
    }
}

/// Pick the partition folder from the open project folders: the first path
/// segment below the most specific folder containing `absolute_path`.
///
/// Returns `None` when no folder contains the path or the file sits directly
/// in the folder.
pub fn partition_folder_for<P: AsRef<Path>>(
    absolute_path: &str,
    project_folders: &[P],
) -> Option<String> {
    let path = Path::new(absolute_path);

    project_folders
        .iter()
        .filter_map(|folder| {
            let folder = folder.as_ref();
            let rest = path.strip_prefix(folder).ok()?;
            let mut components = rest.components();
            let first = components.next()?;
            // a file directly under the root has no partition segment
            components.next()?;
            Some((folder.components().count(), first))
        })
        .max_by_key(|(depth, _)| *depth)
        .map(|(_, segment)| segment.as_os_str().to_string_lossy().to_string())
}

/// Resolve with the project-derived partition folder, falling back to the
/// folder configured for `kind`.
pub fn resolve_for_kind<P: AsRef<Path>>(
    kind: FileKind,
    absolute_path: &str,
    project_folders: &[P],
    settings: &Settings,
) -> ProjectPaths {
    let configured = settings.partition_folder(kind);
    let partition = partition_folder_for(absolute_path, project_folders)
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_default();
    debug!(?kind, partition = %partition, "resolving project paths");
    resolve(absolute_path, &partition)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_root_and_relative_path() {
        let paths = resolve("/home/u/proj/test/models/foo_test.rb", "test");
        assert_eq!(paths.project_root, "/home/u/proj");
        assert_eq!(paths.relative_path, "test/models/foo_test.rb");
        assert_eq!(paths.folder_name, "/home/u/proj/test/models");
        assert_eq!(paths.file_name, "foo_test.rb");
        assert!(!paths.degraded);
    }

    #[test]
    fn test_splits_at_first_occurrence() {
        let paths = resolve("/srv/app/spec/lib/spec/helper_spec.rb", "spec");
        assert_eq!(paths.project_root, "/srv/app");
        assert_eq!(paths.relative_path, "spec/lib/spec/helper_spec.rb");
    }

    #[test]
    fn test_partition_must_be_a_whole_segment() {
        let paths = resolve("/home/u/contest/foo_test.rb", "test");
        assert!(paths.degraded);
        assert_eq!(paths.project_root, "/home/u/contest");
    }

    #[test]
    fn test_missing_partition_degrades_to_parent() {
        let paths = resolve("/home/u/proj/lib/foo.rb", "spec");
        assert_eq!(paths.project_root, "/home/u/proj/lib");
        assert_eq!(paths.relative_path, "foo.rb");
        assert!(paths.degraded);
    }

    #[test]
    fn test_empty_partition_degrades_to_parent() {
        let paths = resolve("/home/u/proj/lib/foo.rb", "");
        assert_eq!(paths.project_root, "/home/u/proj/lib");
        assert_eq!(paths.relative_path, "foo.rb");
    }

    #[test]
    fn test_partition_at_filesystem_root() {
        let paths = resolve("/test/foo_test.rb", "test");
        assert_eq!(paths.project_root, "/");
        assert_eq!(paths.relative_path, "test/foo_test.rb");
    }

    #[test]
    fn test_partition_folder_for_open_folders() {
        let folders = ["/work/shop", "/work/blog"];
        assert_eq!(
            partition_folder_for("/work/blog/spec/models/post_spec.rb", &folders),
            Some("spec".to_string())
        );
        assert_eq!(
            partition_folder_for("/work/shop/test/unit/cart_test.rb", &folders),
            Some("test".to_string())
        );
    }

    #[test]
    fn test_partition_folder_for_prefers_deepest_folder() {
        let folders = ["/work", "/work/shop"];
        assert_eq!(
            partition_folder_for("/work/shop/test/cart_test.rb", &folders),
            Some("test".to_string())
        );
    }

    #[test]
    fn test_partition_folder_for_requires_segment_boundary() {
        let folders = ["/work/shop"];
        assert_eq!(partition_folder_for("/work/shopping/test/a_test.rb", &folders), None);
    }

    #[test]
    fn test_partition_folder_for_file_at_root() {
        let folders = ["/work/shop"];
        assert_eq!(partition_folder_for("/work/shop/Rakefile.rb", &folders), None);
        assert_eq!(partition_folder_for("/elsewhere/a_test.rb", &folders), None);
    }

    #[test]
    fn test_resolve_for_kind_falls_back_to_configured_folder() {
        let settings = Settings::default();
        let no_folders: [&str; 0] = [];
        let paths = resolve_for_kind(
            FileKind::RSpec,
            "/work/shop/spec/models/cart_spec.rb",
            &no_folders,
            &settings,
        );
        assert_eq!(paths.project_root, "/work/shop");
        assert_eq!(paths.relative_path, "spec/models/cart_spec.rb");
    }

    #[test]
    fn test_resolve_for_kind_uses_project_layout() {
        let settings = Settings::default();
        let paths = resolve_for_kind(
            FileKind::UnitTest,
            "/work/engine/tests/cart_test.rb",
            &["/work/engine"],
            &settings,
        );
        assert_eq!(paths.project_root, "/work/engine");
        assert_eq!(paths.relative_path, "tests/cart_test.rb");
    }

    #[test]
    fn test_resolve_for_source_kind_degrades() {
        let settings = Settings::default();
        let no_folders: [&str; 0] = [];
        let paths = resolve_for_kind(
            FileKind::RubySource,
            "/work/shop/app/cart.rb",
            &no_folders,
            &settings,
        );
        assert_eq!(paths.project_root, "/work/shop/app");
        assert_eq!(paths.relative_path, "cart.rb");
    }
}
