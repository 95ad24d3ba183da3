use std::fmt;
use std::path::Path;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Erb,
    Haml,
}

/// What a file is, judged only by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    RubySource,
    UnitTest,
    #[serde(rename = "rspec")]
    RSpec,
    CucumberFeature,
    CucumberSteps,
    Template(TemplateKind),
    Unclassified,
}

/// Editor commands a file kind can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    RunTest,
    VerifySyntax,
    SwitchToTest,
    RailsGenerate,
    ExtractVariable,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::RunTest => "run_test",
            Capability::VerifySyntax => "verify_syntax",
            Capability::SwitchToTest => "switch_to_test",
            Capability::RailsGenerate => "rails_generate",
            Capability::ExtractVariable => "extract_variable",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const RUBY_CAPABILITIES: &[Capability] = &[
    Capability::VerifySyntax,
    Capability::SwitchToTest,
    Capability::RailsGenerate,
    Capability::ExtractVariable,
];

const RUBY_TEST_CAPABILITIES: &[Capability] = &[
    Capability::VerifySyntax,
    Capability::SwitchToTest,
    Capability::RailsGenerate,
    Capability::ExtractVariable,
    Capability::RunTest,
];

impl FileKind {
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            FileKind::RubySource | FileKind::CucumberSteps => RUBY_CAPABILITIES,
            FileKind::UnitTest | FileKind::RSpec => RUBY_TEST_CAPABILITIES,
            FileKind::CucumberFeature => &[Capability::RunTest, Capability::SwitchToTest],
            FileKind::Template(_) => &[Capability::VerifySyntax, Capability::SwitchToTest],
            FileKind::Unclassified => &[],
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Last path component, or the whole string if it has none.
pub fn file_name_of(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(path)
}

/// `name` ends with `suffix` and has at least one character before it.
fn has_suffix(name: &str, suffix: &str) -> bool {
    name.strip_suffix(suffix).is_some_and(|stem| !stem.is_empty())
}

/// Classify a file by name. First rule wins, most specific first.
pub fn classify(file_name: &str) -> FileKind {
    let name = file_name_of(file_name);

    if has_suffix(name, "_test.rb")
        || name
            .strip_prefix("test_")
            .is_some_and(|rest| has_suffix(rest, ".rb"))
    {
        FileKind::UnitTest
    } else if has_suffix(name, "_spec.rb") {
        FileKind::RSpec
    } else if has_suffix(name, ".feature") {
        FileKind::CucumberFeature
    } else if has_suffix(name, "_steps.rb") {
        FileKind::CucumberSteps
    } else if has_suffix(name, ".rb") {
        FileKind::RubySource
    } else if has_suffix(name, ".erb") {
        FileKind::Template(TemplateKind::Erb)
    } else if has_suffix(name, ".haml") {
        FileKind::Template(TemplateKind::Haml)
    } else {
        FileKind::Unclassified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_unit_tests() {
        assert_eq!(classify("user_test.rb"), FileKind::UnitTest);
        assert_eq!(classify("test_user.rb"), FileKind::UnitTest);
        assert_eq!(classify("/app/test/models/user_test.rb"), FileKind::UnitTest);
    }

    #[test]
    fn test_classifies_specs_and_features() {
        assert_eq!(classify("spec/models/user_spec.rb"), FileKind::RSpec);
        assert_eq!(classify("features/signup.feature"), FileKind::CucumberFeature);
        assert_eq!(
            classify("features/step_definitions/signup_steps.rb"),
            FileKind::CucumberSteps
        );
    }

    #[test]
    fn test_classifies_sources_and_templates() {
        assert_eq!(classify("app/models/user.rb"), FileKind::RubySource);
        assert_eq!(
            classify("app/views/users/show.html.erb"),
            FileKind::Template(TemplateKind::Erb)
        );
        assert_eq!(
            classify("app/views/users/show.html.haml"),
            FileKind::Template(TemplateKind::Haml)
        );
    }

    #[test]
    fn test_rejects_other_files() {
        assert_eq!(classify("README.md"), FileKind::Unclassified);
        assert_eq!(classify("Gemfile"), FileKind::Unclassified);
        assert_eq!(classify(""), FileKind::Unclassified);
    }

    #[test]
    fn test_requires_a_stem() {
        assert_eq!(classify("_test.rb"), FileKind::RubySource);
        assert_eq!(classify("_spec.rb"), FileKind::RubySource);
        assert_eq!(classify(".rb"), FileKind::Unclassified);
    }

    #[test]
    fn test_directory_names_do_not_classify() {
        assert_eq!(classify("/work/user_test.rb/notes.txt"), FileKind::Unclassified);
    }

    #[test]
    fn test_unit_rule_wins_over_spec_rule() {
        assert_eq!(classify("test_user_spec.rb"), FileKind::UnitTest);
    }

    #[test]
    fn test_capabilities() {
        assert!(FileKind::UnitTest.supports(Capability::RunTest));
        assert!(FileKind::RSpec.supports(Capability::RunTest));
        assert!(FileKind::CucumberFeature.supports(Capability::RunTest));
        assert!(!FileKind::RubySource.supports(Capability::RunTest));
        assert!(!FileKind::CucumberSteps.supports(Capability::RunTest));
        assert!(FileKind::Template(TemplateKind::Erb).supports(Capability::VerifySyntax));
        assert!(!FileKind::CucumberFeature.supports(Capability::VerifySyntax));
        assert!(FileKind::Unclassified.capabilities().is_empty());
    }
}
