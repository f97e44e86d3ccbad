//! Resolver types.

use std::str::FromStr;

use kgwizard_core::{Error, Result};
use kgwizard_schema::Schema;
use serde::{Deserialize, Serialize};

/// One `token:Label` pair: fill `{token}` with the names of `Label` vertices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubstitutionRequest {
    pub token: String,
    pub label: String,
}

impl FromStr for SubstitutionRequest {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(token), Some(label), None) if !token.is_empty() && !label.is_empty() => {
                Ok(Self {
                    token: token.to_string(),
                    label: label.to_string(),
                })
            }
            _ => Err(format!("expected token:Label, got '{}'", s)),
        }
    }
}

impl std::fmt::Display for SubstitutionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.token, self.label)
    }
}

/// Reject requests whose label the schema does not declare as a vertex.
pub fn validate_requests(schema: &Schema, requests: &[SubstitutionRequest]) -> Result<()> {
    for request in requests {
        if schema.vertex_type(&request.label).is_none() {
            return Err(Error::Config(format!(
                "substitution '{}' names vertex label '{}', which schema '{}' does not declare",
                request,
                request.label,
                schema.name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let r: SubstitutionRequest = "compounds:Compound".parse().unwrap();
        assert_eq!(r.token, "compounds");
        assert_eq!(r.label, "Compound");
        assert_eq!(r.to_string(), "compounds:Compound");

        for bad in ["compounds", "a:b:c", ":Compound", "compounds:", ""] {
            assert!(bad.parse::<SubstitutionRequest>().is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_validate_against_schema() {
        let schema = Schema::load("echem").unwrap();
        let ok = vec!["c:Compound".parse().unwrap(), "m:Material".parse().unwrap()];
        assert!(validate_requests(&schema, &ok).is_ok());

        let bad = vec!["e:HasReactant".parse().unwrap()];
        assert!(validate_requests(&schema, &bad).is_err());
    }
}
