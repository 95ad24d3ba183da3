use std::collections::HashSet;

use crate::file_kind::{FileKind, file_name_of};

/// Candidate names for the test/code counterpart of `file_name`.
///
/// Pure naming convention: the result is deduplicated, keeps insertion
/// order and never contains the input name. Whether any candidate exists is
/// decided by [`crate::project::find_alternate_files`].
pub fn alternates(kind: FileKind, file_name: &str) -> Vec<String> {
    let name = file_name_of(file_name);
    let mut candidates: Vec<String> = Vec::new();

    match kind {
        FileKind::UnitTest => {
            if let Some(stem) = name.strip_suffix("_test.rb") {
                candidates.push(format!("{stem}.rb"));
            }
            if let Some(rest) = name.strip_prefix("test_") {
                candidates.push(rest.to_string());
            }
        }
        FileKind::RSpec => {
            if let Some(stem) = name.strip_suffix("_spec.rb") {
                candidates.push(format!("{stem}.rb"));
                // view specs: show.html.erb_spec.rb -> show.html.erb
                if stem.ends_with(".erb") || stem.ends_with(".haml") {
                    candidates.push(stem.to_string());
                }
            }
        }
        FileKind::CucumberFeature => {
            if let Some(stem) = name.strip_suffix(".feature") {
                candidates.push(format!("{stem}.rb"));
                candidates.push(format!("{stem}_steps.rb"));
            }
        }
        FileKind::CucumberSteps => {
            if let Some(stem) = name.strip_suffix("_steps.rb") {
                candidates.push(format!("{stem}.feature"));
            }
        }
        FileKind::RubySource => {
            if let Some(stem) = name.strip_suffix(".rb") {
                candidates.push(format!("{stem}_spec.rb"));
                candidates.push(format!("{stem}_test.rb"));
                candidates.push(format!("{stem}.feature"));
                candidates.push(format!("test_{stem}.rb"));
            }
        }
        FileKind::Template(_) => {
            candidates.push(format!("{name}_spec.rb"));
        }
        FileKind::Unclassified => {}
    }

    let mut seen = HashSet::new();
    candidates.retain(|c| c != name && seen.insert(c.clone()));
    candidates
}
