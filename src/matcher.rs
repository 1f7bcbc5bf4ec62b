use regex::Regex;

use crate::error::Result;
use crate::reference::ReferenceTable;

/// Optional colon/whitespace, then an unsigned integer or decimal.
const VALUE_PATTERN: &str = r"[:\s]*([0-9]*\.?[0-9]+)";

/// A numeric value found next to a parameter name, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub parameter: String,
    pub value: f64,
}

struct ParameterPattern {
    name: String,
    regex: Regex,
}

/// Finds parameter values in report text.
///
/// Patterns are compiled once per table. Each name is searched literally,
/// so `vitamin_b12` and `vitamin b12` are different parameters.
pub struct ParameterMatcher {
    patterns: Vec<ParameterPattern>,
}

impl ParameterMatcher {
    pub fn new(table: &ReferenceTable) -> Result<Self> {
        let patterns = table
            .iter()
            .map(|range| {
                let regex = Regex::new(&format!("{}{}", regex::escape(&range.name), VALUE_PATTERN))?;
                Ok(ParameterPattern {
                    name: range.name.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// At most one value per parameter, in table order. Only the first
    /// occurrence in the text counts.
    pub fn match_text(&self, text: &str) -> Vec<RawReading> {
        self.patterns
            .iter()
            .filter_map(|pattern| {
                let token = pattern.regex.captures(text)?.get(1)?.as_str();
                match token.parse::<f64>() {
                    Ok(value) => Some(RawReading {
                        parameter: pattern.name.clone(),
                        value,
                    }),
                    Err(e) => {
                        tracing::debug!(parameter = %pattern.name, token, error = %e, "skipping unparsable value");
                        None
                    }
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
