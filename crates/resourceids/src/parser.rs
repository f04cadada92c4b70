//! Segment-based resource ID parser.

use std::collections::HashMap;

use miette::Diagnostic;
use thiserror::Error;

use crate::segments::Segment;

/// Errors produced while parsing a resource ID.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ParseError {
    /// The input was empty.
    #[error("parsing an empty string as {kind} is not supported")]
    #[diagnostic(code(azurerm_resourceids::empty))]
    Empty {
        /// Kind of ID being parsed
        kind: &'static str,
    },

    /// The number of segments didn't match the expected shape.
    #[error("parsing {input:?} as {kind}: expected {expected} segments but got {actual}")]
    #[diagnostic(
        code(azurerm_resourceids::segment_count),
        help("expected an ID in the format {example}")
    )]
    SegmentCount {
        /// Kind of ID being parsed
        kind: &'static str,
        /// Raw input
        input: String,
        /// Expected number of segments
        expected: usize,
        /// Number of segments found
        actual: usize,
        /// Example of a valid ID
        example: String,
    },

    /// A fixed segment had an unexpected value.
    #[error("parsing {input:?} as {kind}: expected the segment {segment:?} to be {expected:?} but got {actual:?}")]
    #[diagnostic(
        code(azurerm_resourceids::invalid_segment),
        help("expected an ID in the format {example}")
    )]
    InvalidSegment {
        /// Kind of ID being parsed
        kind: &'static str,
        /// Raw input
        input: String,
        /// Segment name
        segment: &'static str,
        /// Expected literal
        expected: &'static str,
        /// Value found in the input
        actual: String,
        /// Example of a valid ID
        example: String,
    },

    /// A segment value was empty or absent.
    #[error("parsing {input:?}: the segment {segment:?} was not specified")]
    #[diagnostic(code(azurerm_resourceids::missing_segment))]
    MissingSegment {
        /// Raw input
        input: String,
        /// Segment name
        segment: &'static str,
    },

    /// A Key Vault nested item ID was malformed.
    #[error("parsing {input:?} as a Key Vault nested item: {reason}")]
    #[diagnostic(code(azurerm_resourceids::invalid_nested_item))]
    InvalidNestedItem {
        /// Raw input
        input: String,
        /// What was wrong
        reason: String,
    },
}

/// The values extracted from a successfully parsed ID, keyed by segment name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    input: String,
    parsed: HashMap<&'static str, String>,
    order: Vec<&'static str>,
}

impl ParseResult {
    /// The raw input that was parsed.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Looks up a parsed segment value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.parsed.get(name).map(String::as_str)
    }

    /// Looks up a parsed segment value, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingSegment`] if the segment was not parsed.
    pub fn require(&self, name: &'static str) -> Result<String, ParseError> {
        self.get(name)
            .map(str::to_string)
            .ok_or_else(|| ParseError::MissingSegment {
                input: self.input.clone(),
                segment: name,
            })
    }

    /// Iterates over parsed segment values in ID order.
    pub fn segments(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.order
            .iter()
            .filter_map(|name| self.parsed.get(name).map(|v| (*name, v.as_str())))
    }
}

/// Parses raw strings against a list of [`Segment`]s.
#[derive(Debug, Clone)]
pub struct Parser {
    kind: &'static str,
    segments: Vec<Segment>,
}

impl Parser {
    /// Creates a parser for the given ID kind and shape.
    #[must_use]
    pub fn new(kind: &'static str, segments: Vec<Segment>) -> Self {
        Self { kind, segments }
    }

    /// Renders an example ID of this shape, used in error help text.
    #[must_use]
    pub fn example(&self) -> String {
        self.segments.iter().fold(String::new(), |mut out, segment| {
            out.push('/');
            out.push_str(segment.example_value());
            out
        })
    }

    /// Parses `input`.
    ///
    /// When `insensitively` is set, fixed segments (`resourceGroups`,
    /// `Microsoft.Databricks`, ...) match regardless of casing. User values
    /// are always returned exactly as written.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the input does not match the shape.
    pub fn parse(&self, input: &str, insensitively: bool) -> Result<ParseResult, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty { kind: self.kind });
        }

        let trimmed = input.strip_prefix('/').unwrap_or(input);
        let parts: Vec<&str> = trimmed.split('/').collect();

        if parts.len() != self.segments.len() {
            return Err(ParseError::SegmentCount {
                kind: self.kind,
                input: input.to_string(),
                expected: self.segments.len(),
                actual: parts.len(),
                example: self.example(),
            });
        }

        let mut parsed = HashMap::with_capacity(self.segments.len());
        let mut order = Vec::with_capacity(self.segments.len());

        for (segment, part) in self.segments.iter().zip(parts) {
            if let Some(expected) = segment.fixed_value() {
                let matches = if insensitively {
                    part.eq_ignore_ascii_case(expected)
                } else {
                    part == expected
                };
                if !matches {
                    return Err(ParseError::InvalidSegment {
                        kind: self.kind,
                        input: input.to_string(),
                        segment: segment.name(),
                        expected,
                        actual: part.to_string(),
                        example: self.example(),
                    });
                }
                continue;
            }

            if part.is_empty() {
                return Err(ParseError::MissingSegment {
                    input: input.to_string(),
                    segment: segment.name(),
                });
            }

            parsed.insert(segment.name(), part.to_string());
            order.push(segment.name());
        }

        Ok(ParseResult {
            input: input.to_string(),
            parsed,
            order,
        })
    }
}
