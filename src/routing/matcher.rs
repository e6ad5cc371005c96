//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile `/literal/{param}/...` patterns once
//! - Match request paths segment by segment (case-sensitive)
//! - Capture named, percent-decoded parameters
//!
//! # Design Decisions
//! - Parameters never match an empty segment
//! - Segment counts must agree; no wildcards, no trailing-slash folding
//! - No regex to guarantee O(n) matching

use percent_encoding::percent_decode_str;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Param(&'static str),
}

/// A compiled path pattern such as `/stats/{service}/{user}/count.svg`.
#[derive(Debug, Clone)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn new(raw: &'static str) -> Self {
        let segments = raw
            .trim_start_matches('/')
            .split('/')
            .map(|segment| {
                match segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                {
                    Some(name) => Segment::Param(name),
                    None => Segment::Literal(segment),
                }
            })
            .collect();

        Self { segments }
    }

    /// Match `path`, returning the captured parameters on success.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let path = path.strip_prefix('/')?;
        let mut parts = path.split('/');
        let mut params = Params::default();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if part != *literal {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = percent_decode_str(part).decode_utf8().ok()?;
                    if value.is_empty() {
                        return None;
                    }
                    params.values.push((*name, value.into_owned()));
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// Named values captured from a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<(&'static str, String)>,
}

impl Params {
    /// Remove and return a parameter by name.
    pub fn take(&mut self, name: &str) -> Option<String> {
        let index = self.values.iter().position(|(key, _)| *key == name)?;
        Some(self.values.swap_remove(index).1)
    }
}
