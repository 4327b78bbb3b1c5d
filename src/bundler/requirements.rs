//! Requirement marker resolution.
//!
//! Classifies a flat list of declared dependencies by whether they apply to
//! the environment the standalone is being built in. Each requirement may
//! carry an environment marker (`requests; sys_platform == "win32"`); only the
//! first atomic comparison of a marker is evaluated. Conjunctions,
//! disjunctions and `extra == ...` guards past that first term are not
//! decomposed.
//!
//! ```
//! use standalone_bundler::bundler::requirements::{parse_requirements, resolve, LanguageVersion};
//!
//! let reqs = parse_requirements(&[
//!     "click",
//!     "pywin32; platform_system == 'Windows'",
//!     "importlib-metadata; python_version < '3.8'",
//! ])?;
//! let buckets = resolve(&reqs, "linux", &LanguageVersion::parse("3.11")?);
//! assert_eq!(buckets.base, vec!["click"]);
//! assert_eq!(buckets.other.len(), 2);
//! # Ok::<(), standalone_bundler::bundler::Error>(())
//! ```

use crate::bundler::error::{Error, Result};
use pep508_rs::{MarkerExpression, MarkerTree, Requirement as PepRequirement};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// What a marker compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerSubject {
    /// `platform_system` or `sys_platform`.
    PlatformName,
    /// `python_version` (major.minor) or `python_full_version`.
    LanguageVersion {
        /// Whether the full version (with patch level) is compared.
        full: bool,
    },
    /// Any other marker variable. Requirements guarded by one are kept in `base`.
    Unrecognized(String),
}

impl MarkerSubject {
    fn from_variable(name: &str) -> Self {
        match name {
            "platform_system" | "sys_platform" => MarkerSubject::PlatformName,
            "python_version" => MarkerSubject::LanguageVersion { full: false },
            "python_full_version" => MarkerSubject::LanguageVersion { full: true },
            other => MarkerSubject::Unrecognized(other.to_string()),
        }
    }
}

/// Marker comparison operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Valid marker syntax the resolver does not evaluate (`~=`, `===`, `in`, `not in`).
    Unsupported(String),
}

impl Comparator {
    fn from_token(op: &str) -> Option<Self> {
        let cmp = match op {
            "==" => Comparator::Eq,
            "!=" => Comparator::Ne,
            "<" => Comparator::Lt,
            "<=" => Comparator::Le,
            ">" => Comparator::Gt,
            ">=" => Comparator::Ge,
            "~=" | "===" | "in" | "not in" => Comparator::Unsupported(op.to_string()),
            _ => return None,
        };
        Some(cmp)
    }

    /// Operator to use when the operands are written the other way round
    /// (`'3.8' > python_version`).
    fn flipped(self) -> Self {
        match self {
            Comparator::Lt => Comparator::Gt,
            Comparator::Le => Comparator::Ge,
            Comparator::Gt => Comparator::Lt,
            Comparator::Ge => Comparator::Le,
            other => other,
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Le => ordering != Ordering::Greater,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Ge => ordering != Ordering::Less,
            Comparator::Unsupported(_) => false,
        }
    }
}

/// The first atomic comparison of an environment marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub subject: MarkerSubject,
    pub comparator: Comparator,
    pub value: String,
}

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Package identifier as declared.
    pub name: String,
    /// Environment condition, if any.
    pub marker: Option<Marker>,
}

impl Requirement {
    /// Parses a PEP 508 requirement string.
    ///
    /// The declared spelling of the package name is kept. Only the first
    /// atomic comparison of the marker is retained.
    pub fn parse(raw: &str) -> Result<Self> {
        let cleaned = strip_wrapping_quotes(raw.trim());
        let parsed = cleaned
            .parse::<PepRequirement>()
            .map_err(|err| Error::MalformedRequirement {
                requirement: raw.to_string(),
                reason: err.to_string().lines().next().unwrap_or_default().to_string(),
            })?;

        let marker = parsed
            .marker
            .as_ref()
            .and_then(first_expression)
            .map(|expression| Marker::from_expression(&expression.to_string()));

        Ok(Self {
            name: declared_name(cleaned).to_string(),
            marker,
        })
    }

    /// Case-insensitive comparison key for the package identifier.
    pub fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }
}

impl FromStr for Requirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parses every requirement, failing on the first malformed one.
pub fn parse_requirements<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Requirement>> {
    raw.iter().map(|r| Requirement::parse(r.as_ref())).collect()
}

/// Version of the language runtime the standalone is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageVersion {
    parts: Vec<u64>,
}

impl LanguageVersion {
    pub fn parse(raw: &str) -> Result<Self> {
        let parts = parse_release(raw.trim()).ok_or_else(|| {
            Error::GenericError(format!("invalid language version `{raw}`"))
        })?;
        Ok(Self { parts })
    }

    /// Major and minor components only, as `python_version` reports it.
    pub fn short(&self) -> Self {
        Self {
            parts: self.parts.iter().copied().take(2).collect(),
        }
    }

    fn compare(&self, other: &[u64]) -> Ordering {
        let len = self.parts.len().max(other.len());
        for idx in 0..len {
            let a = self.parts.get(idx).copied().unwrap_or(0);
            let b = other.get(idx).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }

    fn starts_with(&self, prefix: &[u64]) -> bool {
        prefix
            .iter()
            .enumerate()
            .all(|(idx, part)| self.parts.get(idx).copied().unwrap_or(0) == *part)
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .parts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&joined)
    }
}

fn parse_release(raw: &str) -> Option<Vec<u64>> {
    if raw.is_empty() {
        return None;
    }
    raw.split('.').map(|part| part.parse().ok()).collect()
}

/// Requirements classified by applicability.
///
/// Every input requirement lands in exactly one bucket; order inside a bucket
/// follows input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    pub base: Vec<String>,
    pub this_os: Vec<String>,
    pub this_version: Vec<String>,
    /// Guarded requirements whose condition does not hold. Never bundled.
    pub other: Vec<String>,
}

impl Buckets {
    /// `base`, then `this_os`, then `this_version`.
    pub fn required(&self) -> Vec<String> {
        self.base
            .iter()
            .chain(&self.this_os)
            .chain(&self.this_version)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.this_os.len() + self.this_version.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classifies `requirements` for the given platform and language version.
///
/// `platform` is compared case-insensitively against `platform_system` /
/// `sys_platform` values. Only `==` is meaningful for a platform marker.
pub fn resolve(
    requirements: &[Requirement],
    platform: &str,
    language_version: &LanguageVersion,
) -> Buckets {
    let mut buckets = Buckets::default();

    for req in requirements {
        let name = req.name.clone();
        let Some(marker) = &req.marker else {
            buckets.base.push(name);
            continue;
        };

        match &marker.subject {
            MarkerSubject::PlatformName => {
                let value = normalize_platform(&marker.value);
                if marker.comparator == Comparator::Eq && value.eq_ignore_ascii_case(platform) {
                    buckets.this_os.push(name);
                } else {
                    buckets.other.push(name);
                }
            }
            MarkerSubject::LanguageVersion { full } => {
                let running = if *full {
                    language_version.clone()
                } else {
                    language_version.short()
                };
                if version_matches(&running, &marker.comparator, &marker.value) {
                    buckets.this_version.push(name);
                } else {
                    buckets.other.push(name);
                }
            }
            MarkerSubject::Unrecognized(variable) => {
                log::debug!(
                    "Unrecognized marker variable `{}` on {}; treating as required",
                    variable,
                    req.name
                );
                buckets.base.push(name);
            }
        }
    }

    buckets
}

fn normalize_platform(value: &str) -> &str {
    match value {
        "win32" => "windows",
        other => other,
    }
}

fn version_matches(running: &LanguageVersion, comparator: &Comparator, value: &str) -> bool {
    if let Some(prefix) = value.strip_suffix(".*") {
        let Some(prefix) = parse_release(prefix) else {
            return false;
        };
        return match comparator {
            Comparator::Eq => running.starts_with(&prefix),
            Comparator::Ne => !running.starts_with(&prefix),
            _ => false,
        };
    }
    match parse_release(value) {
        Some(parts) => comparator.holds(running.compare(&parts)),
        None => false,
    }
}

/// Leftmost atomic expression of a marker tree.
fn first_expression(tree: &MarkerTree) -> Option<&MarkerExpression> {
    match tree {
        MarkerTree::Expression(expression) => Some(expression),
        MarkerTree::And(trees) | MarkerTree::Or(trees) => trees.first().and_then(first_expression),
    }
}

/// Package name as written, before any normalization.
fn declared_name(requirement: &str) -> &str {
    let end = requirement
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-')))
        .unwrap_or(requirement.len());
    &requirement[..end]
}

// longest first so `<=` is not read as `<`
const OPERATORS: [&str; 10] = ["===", "==", "!=", "<=", ">=", "~=", "<", ">", "not in", "in"];

/// Splits a leading operand, quoted or bare, from the rest of a term.
fn split_operand(text: &str) -> Option<(&str, &str)> {
    let quote = text.chars().next().filter(|ch| matches!(ch, '\'' | '"'));
    let end = match quote {
        Some(quote) => text[1..].find(quote)? + 2,
        None => text.find(char::is_whitespace).unwrap_or(text.len()),
    };
    Some((&text[..end], text[end..].trim_start()))
}

fn is_quoted(operand: &str) -> bool {
    operand.starts_with(['\'', '"'])
}

impl Marker {
    /// Reads a single `<variable> <op> '<value>'` comparison, in either
    /// operand order. Anything else is kept as an unrecognized subject.
    fn from_expression(text: &str) -> Self {
        Self::parse_term(text.trim()).unwrap_or_else(|| Marker {
            subject: MarkerSubject::Unrecognized(text.to_string()),
            comparator: Comparator::Unsupported(String::new()),
            value: String::new(),
        })
    }

    fn parse_term(text: &str) -> Option<Self> {
        let (lhs, rest) = split_operand(text)?;
        let (op, rhs) = OPERATORS
            .iter()
            .find_map(|op| rest.strip_prefix(op).map(|rhs| (*op, rhs.trim())))?;
        let comparator = Comparator::from_token(op)?;

        let (variable, value, comparator) = match (is_quoted(lhs), is_quoted(rhs)) {
            (false, true) => (lhs, rhs, comparator),
            (true, false) => (rhs, lhs, comparator.flipped()),
            _ => return None,
        };

        Some(Marker {
            subject: MarkerSubject::from_variable(variable),
            comparator,
            value: strip_wrapping_quotes(value).to_string(),
        })
    }
}

fn strip_wrapping_quotes(input: &str) -> &str {
    if input.len() >= 2 {
        let bytes = input.as_bytes();
        let first = bytes[0];
        let last = bytes[input.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &input[1..input.len() - 1];
        }
    }
    input
}
