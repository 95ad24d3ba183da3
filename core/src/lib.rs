pub mod alternates;
pub mod cli;
pub mod command;
pub mod error;
pub mod file_kind;
pub mod history;
pub mod matcher;
pub mod paths;
pub mod persistence;
pub mod project;
pub mod refactor;
pub mod runner;
pub mod settings;
pub mod types;
pub mod window;

use std::path::{Path, PathBuf};

use command::{CommandBuilder, CommandSpec, Invocation, TestSelector};
use error::{Result, RubyTestError};
use file_kind::{Capability, FileKind, classify, file_name_of};
use matcher::Matcher;
use persistence::Database;
use runner::{OutputSink, RunOptions, RunOutcome};
use settings::Settings;
use types::{AlternatesResponse, ClassifyResponse, PlannedRun, RunKind, TestNameResponse};

/// Open (creating if needed) the run database in `state_dir`.
pub fn open_db(state_dir: &Path) -> Result<Database> {
    std::fs::create_dir_all(state_dir)?;
    Ok(Database::open(&state_dir.join("rubytest.db"))?)
}

/// Text to search: the unsaved buffer if the editor passed one, else the file.
pub fn read_source(file_path: &Path, buffer: Option<&Path>) -> Result<String> {
    Ok(std::fs::read_to_string(buffer.unwrap_or(file_path))?)
}

fn path_text(file_path: &Path) -> String {
    file_path.to_string_lossy().to_string()
}

/// `path` joined onto the current directory when relative, so
/// `test/models/user_test.rb` still splits at its test root.
fn absolute_path(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

fn absolute_folders(folders: &[PathBuf]) -> Result<Vec<PathBuf>> {
    folders.iter().map(|f| absolute_path(f)).collect()
}

struct SourceFile {
    path: PathBuf,
    absolute: String,
    file_name: String,
    kind: FileKind,
}

fn classify_path(file_path: &Path) -> Result<SourceFile> {
    let path = absolute_path(file_path)?;
    let absolute = path_text(&path);
    let file_name = file_name_of(&absolute).to_string();
    let kind = classify(&file_name);
    Ok(SourceFile {
        path,
        absolute,
        file_name,
        kind,
    })
}

fn require(kind: FileKind, file_name: &str, capability: Capability) -> Result<()> {
    if kind.supports(capability) {
        Ok(())
    } else {
        Err(RubyTestError::UnsupportedFileKind {
            file_name: file_name.to_string(),
            capability,
        })
    }
}

fn plan(kind: RunKind, file_path: Option<String>, spec: &CommandSpec, settings: &Settings) -> PlannedRun {
    PlannedRun {
        kind,
        file_path,
        before_callback: settings.before_callback.clone(),
        save_on_run: settings.save_on_run,
        command: command::compose(
            spec,
            settings.command_prefix.as_deref(),
            settings.after_callback.as_deref(),
        ),
    }
}

pub fn classify_file(file_path: &Path) -> Result<ClassifyResponse> {
    let SourceFile {
        absolute,
        file_name,
        kind,
        ..
    } = classify_path(file_path)?;
    Ok(ClassifyResponse {
        alternates: alternates::alternates(kind, &file_name),
        capabilities: kind.capabilities().to_vec(),
        file_kind: kind,
        file_path: absolute,
    })
}

/// Selector for the test under the cursor: a parsed name for test-unit
/// files, the cursor line for RSpec and Cucumber.
fn test_selector(
    kind: FileKind,
    file_name: &str,
    text: &str,
    offset: usize,
    settings: &Settings,
) -> Result<(TestSelector, Option<Matcher>)> {
    match kind {
        FileKind::UnitTest => {
            let window = window::make_window(text, offset, settings.window_size);
            let found = matcher::find_test_match(&window).ok_or(RubyTestError::NoTestNameFound)?;
            Ok((TestSelector::Name(found.test_name), Some(found.matcher)))
        }
        FileKind::RSpec | FileKind::CucumberFeature => {
            Ok((TestSelector::Line(window::line_number_at(text, offset)), None))
        }
        _ => Err(RubyTestError::UnsupportedFileKind {
            file_name: file_name.to_string(),
            capability: Capability::RunTest,
        }),
    }
}

pub fn test_name_at(
    file_path: &Path,
    text: &str,
    offset: usize,
    settings: &Settings,
) -> Result<TestNameResponse> {
    let SourceFile {
        absolute,
        file_name,
        kind,
        ..
    } = classify_path(file_path)?;
    require(kind, &file_name, Capability::RunTest)?;

    let (selector, matcher) = test_selector(kind, &file_name, text, offset, settings)?;
    let test_name = match selector {
        TestSelector::Name(name) => Some(name),
        TestSelector::Line(_) => None,
    };
    Ok(TestNameResponse {
        file_path: absolute,
        file_kind: kind,
        test_name,
        matcher,
        line_number: window::line_number_at(text, offset),
    })
}

pub fn plan_single_test(
    file_path: &Path,
    text: &str,
    offset: usize,
    folders: &[PathBuf],
    settings: &Settings,
) -> Result<PlannedRun> {
    let SourceFile {
        path,
        absolute,
        file_name,
        kind,
    } = classify_path(file_path)?;
    require(kind, &file_name, Capability::RunTest)?;

    let (selector, _) = test_selector(kind, &file_name, text, offset, settings)?;
    let folders = project::project_folders(&path, &absolute_folders(folders)?);
    let paths = paths::resolve_for_kind(kind, &absolute, &folders, settings);
    let spec = CommandBuilder::new(settings).build(kind, &paths, Invocation::SingleTest(selector))?;
    Ok(plan(RunKind::SingleTest, Some(absolute), &spec, settings))
}

pub fn plan_all_tests(file_path: &Path, folders: &[PathBuf], settings: &Settings) -> Result<PlannedRun> {
    let SourceFile {
        path,
        absolute,
        file_name,
        kind,
    } = classify_path(file_path)?;
    require(kind, &file_name, Capability::RunTest)?;

    let folders = project::project_folders(&path, &absolute_folders(folders)?);
    let paths = paths::resolve_for_kind(kind, &absolute, &folders, settings);
    let spec = CommandBuilder::new(settings).build(kind, &paths, Invocation::AllTests)?;
    Ok(plan(RunKind::AllTests, Some(absolute), &spec, settings))
}

pub fn plan_verify(file_path: &Path, settings: &Settings) -> Result<PlannedRun> {
    let SourceFile {
        absolute,
        file_name,
        kind,
        ..
    } = classify_path(file_path)?;
    require(kind, &file_name, Capability::VerifySyntax)?;

    let paths = paths::resolve(&absolute, "");
    let spec = CommandBuilder::new(settings).build(kind, &paths, Invocation::VerifySyntax)?;
    Ok(plan(RunKind::VerifySyntax, Some(absolute), &spec, settings))
}

/// `rails generate` in the first project folder, or the current directory.
pub fn plan_rails_generate(argument: &str, folders: &[PathBuf], settings: &Settings) -> Result<PlannedRun> {
    if argument.trim().is_empty() {
        return Err(RubyTestError::InvalidSelection(
            "generator argument is empty".to_string(),
        ));
    }
    let folder = match folders.first() {
        Some(folder) => absolute_path(folder)?,
        None => std::env::current_dir()?,
    };
    let spec = CommandBuilder::new(settings).rails_generate(argument, &folder);
    Ok(plan(RunKind::RailsGenerate, None, &spec, settings))
}

/// The recorded last run, replayed as stored.
pub fn plan_last_run(db: &Database, settings: &Settings) -> Result<PlannedRun> {
    let command = db.last_run()?.ok_or(RubyTestError::NoLastRun)?;
    Ok(PlannedRun {
        kind: RunKind::LastTest,
        file_path: None,
        before_callback: settings.before_callback.clone(),
        save_on_run: settings.save_on_run,
        command,
    })
}

/// Existing files in the project that are conventional counterparts of
/// `file_path`.
pub fn find_alternates(
    file_path: &Path,
    folders: &[PathBuf],
    settings: &Settings,
) -> Result<AlternatesResponse> {
    let SourceFile {
        path,
        absolute,
        file_name,
        kind,
    } = classify_path(file_path)?;
    require(kind, &file_name, Capability::SwitchToTest)?;

    let candidates = alternates::alternates(kind, &file_name);
    let folders = project::project_folders(&path, &absolute_folders(folders)?);
    let found = project::find_alternate_files(&folders, &candidates, &settings.ignored_directories)?;
    Ok(AlternatesResponse {
        file_path: absolute,
        candidates,
        found: found.iter().map(|p| path_text(p)).collect(),
    })
}

pub fn extract_variable(
    file_path: &Path,
    text: &str,
    start: usize,
    end: usize,
    name: &str,
) -> Result<String> {
    let SourceFile {
        file_name, kind, ..
    } = classify_path(file_path)?;
    require(kind, &file_name, Capability::ExtractVariable)?;
    refactor::extract_variable(text, start, end, name)
}

/// Run a planned command and record it as the last run and in the history.
pub fn execute(
    db: &Database,
    planned: &PlannedRun,
    settings: &Settings,
    sink: &mut dyn OutputSink,
) -> Result<RunOutcome> {
    let options = RunOptions {
        before_callback: planned.before_callback.clone(),
        show_progress: settings.show_progress,
    };
    let outcome = runner::run(&planned.command, &options, sink)?;
    history::record_run(
        db,
        planned.kind,
        planned.file_path.as_deref(),
        &planned.command,
        &outcome,
    )?;
    Ok(outcome)
}
