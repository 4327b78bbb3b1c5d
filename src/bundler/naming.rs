//! Naming templates for produced artifacts.
//!
//! Templates use `{placeholder}` fields: `{an}` app name, `{v}` version,
//! `{os}` operating system label and `{m}` machine label. Label templates
//! also accept `{ft}` (file type) and `{An}` (title-cased app name).
//! `{{` and `}}` produce literal braces.
//!
//! Templates are parsed once when the build context is created, so an
//! unknown placeholder is reported before any build work starts.

use crate::bundler::error::{Error, Result};

/// Token substituted for `{v}` when naming the `latest` alias.
pub const LATEST: &str = "latest";

/// Which placeholder vocabulary a template may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Standalone executable name.
    Standalone,
    /// Hash manifest file name.
    Sha,
    /// Human readable label in the files document.
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    AppName,
    AppNameTitle,
    Version,
    Os,
    Machine,
    FileType,
}

impl Placeholder {
    fn lookup(name: &str, kind: TemplateKind) -> Option<Self> {
        let placeholder = match name {
            "an" => Placeholder::AppName,
            "v" => Placeholder::Version,
            "os" => Placeholder::Os,
            "m" => Placeholder::Machine,
            "An" if kind == TemplateKind::Label => Placeholder::AppNameTitle,
            "ft" if kind == TemplateKind::Label => Placeholder::FileType,
            _ => return None,
        };
        Some(placeholder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Placeholder),
}

/// Values substituted into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFields {
    pub app_name: String,
    pub version: String,
    pub os: String,
    pub machine: String,
    /// Only meaningful for label templates.
    pub file_type: String,
}

impl NameFields {
    pub fn new(
        app_name: impl Into<String>,
        version: impl Into<String>,
        os: impl Into<String>,
        machine: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            version: version.into(),
            os: os.into(),
            machine: machine.into(),
            file_type: String::new(),
        }
    }

    /// Same fields with `{v}` replaced by [`LATEST`].
    pub fn latest(&self) -> Self {
        Self {
            version: LATEST.to_string(),
            ..self.clone()
        }
    }

    pub fn with_file_type(&self, file_type: impl Into<String>) -> Self {
        Self {
            file_type: file_type.into(),
            ..self.clone()
        }
    }
}

/// A validated naming template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    source: String,
    kind: TemplateKind,
    segments: Vec<Segment>,
}

impl NameTemplate {
    /// Parses and validates `template` against the vocabulary for `kind`.
    pub fn parse(kind: TemplateKind, template: &str) -> Result<Self> {
        let invalid = |reason: String| Error::NamingTemplate {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(invalid("unterminated `{` placeholder".into()));
                    }
                    let placeholder = Placeholder::lookup(&name, kind)
                        .ok_or_else(|| invalid(format!("unknown placeholder `{{{name}}}`")))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(placeholder));
                }
                '}' => return Err(invalid("single `}` outside a placeholder".into())),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            kind,
            segments,
        })
    }

    pub fn render(&self, fields: &NameFields) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Placeholder::AppName) => out.push_str(&fields.app_name),
                Segment::Field(Placeholder::AppNameTitle) => {
                    out.push_str(&title_case(&fields.app_name))
                }
                Segment::Field(Placeholder::Version) => out.push_str(&fields.version),
                Segment::Field(Placeholder::Os) => out.push_str(&fields.os),
                Segment::Field(Placeholder::Machine) => out.push_str(&fields.machine),
                Segment::Field(Placeholder::FileType) => out.push_str(&fields.file_type),
            }
        }
        out
    }

    /// Renders for the `latest` alias.
    pub fn render_latest(&self, fields: &NameFields) -> String {
        self.render(&fields.latest())
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }
}

/// Parses and renders in one step.
pub fn format(kind: TemplateKind, template: &str, fields: &NameFields) -> Result<String> {
    Ok(NameTemplate::parse(kind, template)?.render(fields))
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> NameFields {
        NameFields::new("app", "1.0", "linux", "x86_64")
    }

    #[test]
    fn test_default_standalone_format() {
        let name = format(
            TemplateKind::Standalone,
            "{an}-{v}-standalone-{os}-{m}",
            &fields(),
        )
        .unwrap();
        assert_eq!(name, "app-1.0-standalone-linux-x86_64");
    }

    #[test]
    fn test_latest_overrides_version() {
        let template =
            NameTemplate::parse(TemplateKind::Sha, "{an}-{v}-sha256-{os}-{m}.json").unwrap();
        assert_eq!(
            template.render_latest(&fields()),
            "app-latest-sha256-linux-x86_64.json"
        );
        assert_eq!(
            template.render(&fields()),
            "app-1.0-sha256-linux-x86_64.json"
        );
    }

    #[test]
    fn test_label_vocabulary() {
        let template =
            NameTemplate::parse(TemplateKind::Label, "{An} {v} {ft} for {os} [build]").unwrap();
        let rendered = template.render(
            &NameFields::new("my_app", "2.1", "Linux", "x86_64")
                .with_file_type("Standalone Executable"),
        );
        assert_eq!(rendered, "My_App 2.1 Standalone Executable for Linux [build]");
    }

    #[test]
    fn test_label_only_placeholders_rejected_elsewhere() {
        for template in ["{An}-{v}", "{an}-{ft}"] {
            let err = NameTemplate::parse(TemplateKind::Standalone, template).unwrap_err();
            assert!(matches!(err, Error::NamingTemplate { .. }));
        }
    }

    #[test]
    fn test_malformed_templates() {
        for template in ["{an}-{version}", "{an", "an}", "{an:>5}"] {
            assert!(
                NameTemplate::parse(TemplateKind::Standalone, template).is_err(),
                "{template} should be rejected"
            );
        }
    }

    #[test]
    fn test_escaped_braces() {
        let name = format(TemplateKind::Standalone, "{{{an}}}", &fields()).unwrap();
        assert_eq!(name, "{app}");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("demotestapp"), "Demotestapp");
        assert_eq!(title_case("hello-wORLD 2go"), "Hello-World 2Go");
    }
}
