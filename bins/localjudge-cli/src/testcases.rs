//! Testcase fixture enumeration and natural ordering.

use localjudge_common::error::HarnessError;
use localjudge_common::types::{TestCase, TestcaseSelector};
use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;

/// Fixture files are named `<identifier>.test`.
pub const TESTCASE_EXTENSION: &str = "test";

/// Enumerates and resolves the fixture files of one problem.
pub struct TestCaseRepository {
    dir: PathBuf,
}

impl TestCaseRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// All testcases in the directory, in natural order, ordinals assigned.
    pub fn list(&self) -> Result<Vec<TestCase>, HarnessError> {
        let mut found: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(TESTCASE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                found.push((stem.to_string(), path.clone()));
            }
        }

        found.sort_by(|a, b| natural_cmp(&a.0, &b.0));

        Ok(found
            .into_iter()
            .enumerate()
            .map(|(ordinal, (id, fixture_path))| TestCase {
                id,
                ordinal,
                fixture_path,
            })
            .collect())
    }

    /// Resolve one named testcase; NotFound when its fixture is absent.
    pub fn resolve(&self, name: &str) -> Result<TestCase, HarnessError> {
        let fixture_path = self.dir.join(format!("{name}.{TESTCASE_EXTENSION}"));
        if !fixture_path.is_file() {
            return Err(HarnessError::TestcaseNotFound {
                name: name.to_string(),
                dir: self.dir.clone(),
            });
        }
        Ok(TestCase {
            id: name.to_string(),
            ordinal: 0,
            fixture_path,
        })
    }

    pub fn select(&self, selector: &TestcaseSelector) -> Result<Vec<TestCase>, HarnessError> {
        match selector {
            TestcaseSelector::All => self.list(),
            TestcaseSelector::Named(name) => Ok(vec![self.resolve(name)?]),
        }
    }
}

/// One run of a name under natural tokenization.
///
/// Digit runs carry their digits with leading zeros stripped, so numeric
/// comparison of arbitrary length is length-then-lexicographic. Text runs
/// are lowercased. A digit run sorts before a text run at the same
/// position, which keeps the order total.
#[derive(Debug, PartialEq, Eq)]
enum NaturalToken {
    Number(String),
    Text(String),
}

impl Ord for NaturalToken {
    fn cmp(&self, other: &Self) -> Ordering {
        use NaturalToken::*;
        match (self, other) {
            (Number(a), Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Text(a), Text(b)) => a.cmp(b),
            (Number(_), Text(_)) => Ordering::Less,
            (Text(_), Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for NaturalToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn natural_key(name: &str) -> Vec<NaturalToken> {
    let mut tokens = Vec::new();
    let mut chars = name.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            let trimmed = digits.trim_start_matches('0');
            let value = if trimmed.is_empty() { "0" } else { trimmed };
            tokens.push(NaturalToken::Number(value.to_string()));
        } else {
            let mut text = String::new();
            while let Some(&t) = chars.peek() {
                if t.is_ascii_digit() {
                    break;
                }
                text.extend(t.to_lowercase());
                chars.next();
            }
            tokens.push(NaturalToken::Text(text));
        }
    }
    tokens
}

/// Natural order: numeric substrings compare as integers, text runs
/// case-insensitively; the full name breaks ties so the order is
/// deterministic regardless of directory read order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a)
        .cmp(&natural_key(b))
        .then_with(|| a.cmp(b))
}
