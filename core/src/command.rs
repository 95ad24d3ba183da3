use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RubyTestError};
use crate::file_kind::{Capability, FileKind};
use crate::matcher::TestName;
use crate::paths::ProjectPaths;
use crate::settings::Settings;

/// A shell line and the directory to run it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub shell_text: String,
    pub working_directory: String,
}

/// Which test to select when running a single test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestSelector {
    /// test-unit `-n` name or Shoulda `/regex/`.
    Name(TestName),
    /// 1-based line for RSpec/Cucumber `-l`.
    Line(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    AllTests,
    SingleTest(TestSelector),
    VerifySyntax,
}

/// Fill `{key}` placeholders. Unknown placeholders are left as written.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

pub struct CommandBuilder<'a> {
    settings: &'a Settings,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    pub fn build(
        &self,
        kind: FileKind,
        paths: &ProjectPaths,
        invocation: Invocation,
    ) -> Result<CommandSpec> {
        let unsupported = |capability: Capability| RubyTestError::UnsupportedFileKind {
            file_name: paths.file_name.clone(),
            capability,
        };

        let spec = match invocation {
            Invocation::VerifySyntax => {
                let template = self
                    .settings
                    .verify_template(kind)
                    .ok_or_else(|| unsupported(Capability::VerifySyntax))?;
                CommandSpec {
                    shell_text: render(template, &[("file_name", paths.file_name.as_str())]),
                    working_directory: paths.folder_name.clone(),
                }
            }
            Invocation::AllTests => {
                let template = self
                    .all_tests_template(kind)
                    .ok_or_else(|| unsupported(Capability::RunTest))?;
                CommandSpec {
                    shell_text: render(
                        template,
                        &[("relative_path", paths.relative_path.as_str())],
                    ),
                    working_directory: paths.project_root.clone(),
                }
            }
            Invocation::SingleTest(selector) => {
                let shell_text = match (kind, &selector) {
                    (FileKind::UnitTest, TestSelector::Name(name)) => render(
                        &self.settings.run_single_ruby_unit_command,
                        &[
                            ("relative_path", paths.relative_path.as_str()),
                            ("test_name", name.as_str()),
                        ],
                    ),
                    (FileKind::RSpec, TestSelector::Line(line)) => render(
                        &self.settings.run_single_rspec_command,
                        &[
                            ("relative_path", paths.relative_path.as_str()),
                            ("line_number", line.to_string().as_str()),
                        ],
                    ),
                    (FileKind::CucumberFeature, TestSelector::Line(line)) => render(
                        &self.settings.run_single_cucumber_command,
                        &[
                            ("relative_path", paths.relative_path.as_str()),
                            ("line_number", line.to_string().as_str()),
                        ],
                    ),
                    _ => return Err(unsupported(Capability::RunTest)),
                };
                CommandSpec {
                    shell_text,
                    working_directory: paths.project_root.clone(),
                }
            }
        };

        debug!(command = %spec.shell_text, cwd = %spec.working_directory, "built command");
        Ok(spec)
    }

    fn all_tests_template(&self, kind: FileKind) -> Option<&'a str> {
        match kind {
            FileKind::UnitTest => Some(&self.settings.run_ruby_unit_command),
            FileKind::RSpec => Some(&self.settings.run_rspec_command),
            FileKind::CucumberFeature => Some(&self.settings.run_cucumber_command),
            _ => None,
        }
    }

    /// `rails generate <argument>` in the project folder.
    pub fn rails_generate(&self, argument: &str, project_folder: &Path) -> CommandSpec {
        CommandSpec {
            shell_text: format!("rails generate {}", argument.trim()),
            working_directory: project_folder.to_string_lossy().to_string(),
        }
    }
}

/// The line actually handed to the shell: `[prefix] command [; after]`.
pub fn compose(spec: &CommandSpec, prefix: Option<&str>, after_callback: Option<&str>) -> CommandSpec {
    let mut shell_text = match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix} {}", spec.shell_text),
        None => spec.shell_text.clone(),
    };
    if let Some(after) = after_callback.map(str::trim).filter(|a| !a.is_empty()) {
        shell_text.push_str(" ; ");
        shell_text.push_str(after);
    }
    CommandSpec {
        shell_text,
        working_directory: spec.working_directory.clone(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::paths::resolve;
    use crate::window::make_window;
    use crate::matcher::find_test_name;

    fn unit_name(name: &str) -> TestName {
        let source = format!("def {name}\n  x\nend\n");
        let offset = source.find("  x").unwrap();
        find_test_name(&make_window(&source, offset, 2000)).unwrap()
    }

    #[test]
    fn test_single_unit_test() {
        let settings = Settings::default();
        let paths = resolve("/home/u/proj/test/models/foo_test.rb", "test");
        let spec = CommandBuilder::new(&settings)
            .build(
                FileKind::UnitTest,
                &paths,
                Invocation::SingleTest(TestSelector::Name(unit_name("test_addition"))),
            )
            .unwrap();
        assert_eq!(
            spec.shell_text,
            "ruby -Itest test/models/foo_test.rb -n 'test_addition'"
        );
        assert_eq!(spec.working_directory, "/home/u/proj");
    }

    #[test]
    fn test_single_quote_in_name_is_backslash_escaped() {
        let source = "test \"it's ok\" do\n  x\nend\n";
        let name = find_test_name(&make_window(source, source.find("  x").unwrap(), 2000)).unwrap();
        let paths = resolve("/srv/app/test/foo_test.rb", "test");
        let spec = CommandBuilder::new(&Settings::default())
            .build(
                FileKind::UnitTest,
                &paths,
                Invocation::SingleTest(TestSelector::Name(name)),
            )
            .unwrap();
        // the shell sees an unterminated quote; pinned as current behavior
        assert_eq!(spec.shell_text, "ruby -Itest test/foo_test.rb -n 'test_it\\'s_ok'");
    }

    #[test]
    fn test_single_spec_uses_line() {
        let settings = Settings::default();
        let paths = resolve("/srv/app/spec/models/foo_spec.rb", "spec");
        let spec = CommandBuilder::new(&settings)
            .build(
                FileKind::RSpec,
                &paths,
                Invocation::SingleTest(TestSelector::Line(12)),
            )
            .unwrap();
        assert_eq!(spec.shell_text, "rspec spec/models/foo_spec.rb -l 12");
        assert_eq!(spec.working_directory, "/srv/app");
    }

    #[test]
    fn test_single_feature_uses_line() {
        let settings = Settings::default();
        let paths = resolve("/srv/app/features/signup.feature", "features");
        let spec = CommandBuilder::new(&settings)
            .build(
                FileKind::CucumberFeature,
                &paths,
                Invocation::SingleTest(TestSelector::Line(3)),
            )
            .unwrap();
        assert_eq!(spec.shell_text, "cucumber features/signup.feature -l 3");
    }

    #[test]
    fn test_all_tests() {
        let settings = Settings::default();
        let paths = resolve("/srv/app/spec/models/foo_spec.rb", "spec");
        let spec = CommandBuilder::new(&settings)
            .build(FileKind::RSpec, &paths, Invocation::AllTests)
            .unwrap();
        assert_eq!(spec.shell_text, "rspec spec/models/foo_spec.rb");
    }

    #[test]
    fn test_verify_runs_in_file_folder() {
        let settings = Settings::default();
        let paths = resolve("/srv/app/app/views/show.html.erb", "");
        let spec = CommandBuilder::new(&settings)
            .build(
                FileKind::Template(crate::file_kind::TemplateKind::Erb),
                &paths,
                Invocation::VerifySyntax,
            )
            .unwrap();
        assert_eq!(spec.shell_text, "erb -xT - show.html.erb | ruby -c");
        assert_eq!(spec.working_directory, "/srv/app/app/views");
    }

    #[test]
    fn test_run_on_source_file_is_unsupported() {
        let settings = Settings::default();
        let paths = resolve("/srv/app/lib/foo.rb", "");
        let err = CommandBuilder::new(&settings)
            .build(FileKind::RubySource, &paths, Invocation::AllTests)
            .unwrap_err();
        assert!(matches!(
            err,
            RubyTestError::UnsupportedFileKind {
                capability: Capability::RunTest,
                ..
            }
        ));
    }

    #[test]
    fn test_selector_must_fit_the_framework() {
        let settings = Settings::default();
        let paths = resolve("/srv/app/test/foo_test.rb", "test");
        let err = CommandBuilder::new(&settings)
            .build(
                FileKind::UnitTest,
                &paths,
                Invocation::SingleTest(TestSelector::Line(4)),
            )
            .unwrap_err();
        assert!(matches!(err, RubyTestError::UnsupportedFileKind { .. }));
    }

    #[test]
    fn test_custom_template() {
        let settings = Settings {
            run_single_ruby_unit_command: "bin/rails test {relative_path} --name={test_name}"
                .to_string(),
            ..Settings::default()
        };
        let paths = resolve("/srv/app/test/foo_test.rb", "test");
        let spec = CommandBuilder::new(&settings)
            .build(
                FileKind::UnitTest,
                &paths,
                Invocation::SingleTest(TestSelector::Name(unit_name("test_it"))),
            )
            .unwrap();
        assert_eq!(spec.shell_text, "bin/rails test test/foo_test.rb --name=test_it");
    }

    #[test]
    fn test_compose_prefix_and_after_callback() {
        let spec = CommandSpec {
            shell_text: "rspec spec/a_spec.rb".to_string(),
            working_directory: "/srv/app".to_string(),
        };
        let composed = compose(&spec, Some("bundle exec"), Some("say done"));
        assert_eq!(composed.shell_text, "bundle exec rspec spec/a_spec.rb ; say done");
        assert_eq!(composed.working_directory, "/srv/app");

        assert_eq!(compose(&spec, None, Some("  ")).shell_text, "rspec spec/a_spec.rb");
    }

    #[test]
    fn test_rails_generate() {
        let settings = Settings::default();
        let spec = CommandBuilder::new(&settings)
            .rails_generate(" migration AddNameToUsers ", Path::new("/srv/app"));
        assert_eq!(spec.shell_text, "rails generate migration AddNameToUsers");
        assert_eq!(spec.working_directory, "/srv/app");
    }
}
