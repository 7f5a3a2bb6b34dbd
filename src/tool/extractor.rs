//! @ai:module:intent Compile field patterns and extract metric values from tool output
//! @ai:module:layer domain
//! @ai:module:public_api FieldExtractor
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::ordered::OrderedMap;
use regex::Regex;

/// @ai:intent Ordered set of named patterns, each with exactly one capturing group
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    patterns: Vec<(String, Regex)>,
}

impl FieldExtractor {
    /// @ai:intent Compile every field pattern, rejecting invalid ones up front
    /// @ai:effects pure
    pub fn compile(greps: &OrderedMap<String>) -> Result<Self> {
        let mut patterns = Vec::with_capacity(greps.len());

        for (name, pattern) in greps.iter() {
            let regex = Regex::new(pattern).map_err(|e| {
                Error::config(format!("field '{name}': invalid pattern '{pattern}': {e}"))
            })?;

            // captures_len counts the implicit whole-match group
            let groups = regex.captures_len() - 1;
            if groups != 1 {
                return Err(Error::config(format!(
                    "field '{name}': pattern '{pattern}' must contain exactly one capturing group, found {groups}"
                )));
            }

            patterns.push((name.to_string(), regex));
        }

        Ok(Self { patterns })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// @ai:intent Apply every pattern to the text; each must match exactly once
    /// @ai:effects pure
    pub fn extract(&self, text: &str) -> Result<OrderedMap<String>> {
        let mut values = OrderedMap::new();

        for (name, regex) in &self.patterns {
            let mut matches = regex.captures_iter(text);
            let first = matches.next();
            let found = usize::from(first.is_some()) + matches.count();

            let captures = match first {
                Some(captures) if found == 1 => captures,
                _ => {
                    return Err(Error::Extraction {
                        field: name.clone(),
                        pattern: regex.as_str().to_string(),
                        matches: found,
                    })
                }
            };

            let value = captures.get(1).ok_or_else(|| Error::UnmatchedGroup {
                field: name.clone(),
                pattern: regex.as_str().to_string(),
            })?;

            values.insert(name.clone(), value.as_str().to_string());
        }

        Ok(values)
    }
}
