use regex::Regex;
use tracing::debug;

use crate::domain::{AccessionPattern, IdentifierSet, IdentifierToken};
use crate::error::ResolverError;

/// Expands comma-separated accession lists such as
/// `ERS005741-ERS005788,ERS011783` into concrete accessions.
#[derive(Debug, Clone)]
pub struct RangeExpander {
    pattern: AccessionPattern,
    single: Regex,
    range: Regex,
}

impl RangeExpander {
    pub fn new(pattern: AccessionPattern) -> Result<Self, ResolverError> {
        pattern.validate()?;
        let prefix = regex::escape(&pattern.prefix);
        let width = pattern.width;
        let single = Regex::new(&format!(r"^{prefix}([0-9]{{{width}}})$"))
            .map_err(|err| ResolverError::InvalidConfig(err.to_string()))?;
        let range = Regex::new(&format!(r"^{prefix}([0-9]{{{width}}})-{prefix}([0-9]{{{width}}})$"))
            .map_err(|err| ResolverError::InvalidConfig(err.to_string()))?;
        Ok(Self {
            pattern,
            single,
            range,
        })
    }

    pub fn parse_token(&self, token: &str) -> Result<IdentifierToken, ResolverError> {
        let token = token.trim();
        if self.single.is_match(token) {
            return Ok(IdentifierToken::Single(token.to_string()));
        }
        let captures = self
            .range
            .captures(token)
            .ok_or_else(|| ResolverError::InvalidIdentifierToken(token.to_string()))?;
        let start = parse_number(token, &captures[1])?;
        let end = parse_number(token, &captures[2])?;
        if start > end {
            return Err(ResolverError::InvalidIdentifierToken(token.to_string()));
        }
        Ok(IdentifierToken::Range { start, end })
    }

    pub fn expand(&self, text: &str) -> Result<IdentifierSet, ResolverError> {
        let mut set = IdentifierSet::new();
        for token in text.split(',') {
            match self.parse_token(token)? {
                IdentifierToken::Single(id) => {
                    set.insert(id);
                }
                IdentifierToken::Range { start, end } => {
                    for number in start..=end {
                        set.insert(self.pattern.render(number));
                    }
                }
            }
        }
        debug!(input = text, expanded = set.len(), "expanded identifier list");
        Ok(set)
    }
}

pub fn expand(text: &str, pattern: &AccessionPattern) -> Result<IdentifierSet, ResolverError> {
    RangeExpander::new(pattern.clone())?.expand(text)
}

fn parse_number(token: &str, digits: &str) -> Result<u64, ResolverError> {
    digits
        .parse()
        .map_err(|_| ResolverError::InvalidIdentifierToken(token.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_single_and_range_tokens() {
        let expander = RangeExpander::new(AccessionPattern::default()).unwrap();
        assert_eq!(
            expander.parse_token(" ERS000007 ").unwrap(),
            IdentifierToken::Single("ERS000007".to_string())
        );
        assert_eq!(
            expander.parse_token("ERS000010-ERS000012").unwrap(),
            IdentifierToken::Range { start: 10, end: 12 }
        );
    }

    #[test]
    fn reversed_range_is_rejected() {
        let expander = RangeExpander::new(AccessionPattern::default()).unwrap();
        let err = expander.parse_token("ERS000012-ERS000010").unwrap_err();
        assert_matches!(err, ResolverError::InvalidIdentifierToken(_));
    }

    #[test]
    fn prefix_is_matched_literally() {
        let expander = RangeExpander::new(AccessionPattern::new("S.", 2)).unwrap();
        assert!(expander.parse_token("S.01").is_ok());
        assert!(expander.parse_token("SX01").is_err());
    }

    #[test]
    fn only_ascii_digits_are_accepted() {
        let expander = RangeExpander::new(AccessionPattern::default()).unwrap();
        let err = expander.parse_token("ERS١٢٣٤٥٦").unwrap_err();
        assert_matches!(err, ResolverError::InvalidIdentifierToken(_));
        let err = expander.parse_token("ERS０００００１-ERS０００００２").unwrap_err();
        assert_matches!(err, ResolverError::InvalidIdentifierToken(_));
    }
}
