use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::window::SourceWindow;

// All patterns are written against reversed text: `tset` is `test`, `fed` is
// `def`, `dluohs` is `should`. Leftmost match = nearest opener above the cursor.

// def test_name
static METHOD_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s?([a-zA-Z_0-9]+tset)\s+fed").unwrap()
});

// test "name" / test 'name'
static STRING_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s?["']([a-zA-Z_0-9"'\s\-.#=?!:/]+)["']\s+tset"#).unwrap()
});

// should "name" / should 'name'
static SHOULD_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s?(("[^"]*"|'[^']*')\s+dluohs)"#).unwrap()
});

/// A test-unit name or Shoulda selector, ready for `-n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TestName(String);

impl TestName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Test-definition syntaxes, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// `def test_something`
    MethodStyle,
    /// `test "does something" do`
    StringStyle,
    /// Shoulda: `should "do something" do`
    ShouldStyle,
}

impl Matcher {
    /// Method definitions win over quoted forms, and `test "..."` wins over
    /// `should "..."`: the string-style pattern would also accept a should
    /// block's quoted text.
    pub const PRIORITY: [Matcher; 3] = [
        Matcher::MethodStyle,
        Matcher::StringStyle,
        Matcher::ShouldStyle,
    ];

    fn regex(self) -> &'static Regex {
        match self {
            Matcher::MethodStyle => &METHOD_STYLE_RE,
            Matcher::StringStyle => &STRING_STYLE_RE,
            Matcher::ShouldStyle => &SHOULD_STYLE_RE,
        }
    }

    /// Run this matcher alone against a reversed window.
    pub fn find(self, window: &SourceWindow) -> Option<TestName> {
        let caps = self.regex().captures(window.as_str())?;
        let captured: String = caps.get(1)?.as_str().chars().rev().collect();

        let name = match self {
            Matcher::MethodStyle => captured,
            Matcher::StringStyle => format!("test_{}", escape_test_description(&captured)),
            Matcher::ShouldStyle => should_selector(&captured),
        };
        Some(TestName(name))
    }
}

/// `adds "two" numbers` -> `adds_\"two\"_numbers`
///
/// `'` becomes `\'`, which does not survive the default single-quoted
/// `-n '{test_name}'` template. Kept as is; custom templates can quote
/// differently.
fn escape_test_description(description: &str) -> String {
    description
        .replace('"', "\\\"")
        .replace(' ', "_")
        .replace('\'', "\\'")
}

/// `should "return true"` -> `/return true/`.
///
/// Every occurrence of `should` is removed, including ones inside the
/// description.
fn should_selector(captured: &str) -> String {
    let stripped = captured.replace("should", "");
    let trimmed = stripped.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);
    format!("/{}/", unquoted.trim())
}

/// Result of a successful search, with the matcher that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestMatch {
    pub matcher: Matcher,
    pub test_name: TestName,
}

/// Try every matcher in priority order and return the first hit.
pub fn find_test_match(window: &SourceWindow) -> Option<TestMatch> {
    for matcher in Matcher::PRIORITY {
        if let Some(test_name) = matcher.find(window) {
            debug!(?matcher, test_name = %test_name, "test name matched");
            return Some(TestMatch { matcher, test_name });
        }
    }
    debug!(window_len = window.as_str().len(), "no test definition in window");
    None
}

pub fn find_test_name(window: &SourceWindow) -> Option<TestName> {
    find_test_match(window).map(|m| m.test_name)
}
