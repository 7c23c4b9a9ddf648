use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Named values captured from a document path, keyed by template parameter name.
pub type PathParams = BTreeMap<String, String>;

/// Errors raised while parsing or rendering a [`PathTemplate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template must not be empty")]
    Empty,
    #[error("Invalid template segment: {0}")]
    InvalidSegment(String),
    #[error("Duplicate template parameter: {0}")]
    DuplicateParam(String),
    #[error("Missing value for template parameter: {0}")]
    MissingParam(String),
    #[error("Route root must be a single literal segment: {0:?}")]
    InvalidRoot(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A hierarchical document path with named wildcard segments,
/// e.g. `likes_daily/{date}/{item_key}/votes/{user_id}`.
///
/// Templates are matched segment by segment: a path matches when it has the same
/// number of `/`-separated segments, every literal is equal and every parameter
/// captures the corresponding segment verbatim (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        if source.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut seen = Vec::new();
        for raw in source.split('/') {
            let segment = match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        return Err(TemplateError::InvalidSegment(raw.to_string()));
                    }
                    if seen.iter().any(|s| s == name) {
                        return Err(TemplateError::DuplicateParam(name.to_string()));
                    }
                    seen.push(name.to_string());
                    Segment::Param(name.to_string())
                }
                None => {
                    if raw.is_empty() || raw.contains('{') || raw.contains('}') {
                        return Err(TemplateError::InvalidSegment(raw.to_string()));
                    }
                    Segment::Literal(raw.to_string())
                }
            };
            segments.push(segment);
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Returns the captured parameters when `path` matches this template.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }

    /// Renders the template, substituting every parameter from `params`.
    pub fn render(&self, params: &PathParams) -> Result<String, TemplateError> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => parts.push(literal.as_str()),
                Segment::Param(name) => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingParam(name.clone()))?;
                    parts.push(value.as_str());
                }
            }
        }
        Ok(parts.join("/"))
    }

    /// Whether the template declares a parameter called `name`.
    pub fn has_param(&self, name: &str) -> bool {
        self.params().any(|p| p == name)
    }

    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for PathTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
