//! `{{ field }}` templates
//!
//! Placeholders are `{{` + field name + `}}`, whitespace around the name is
//! ignored. There is no escaping, no filters and no control flow.

use std::collections::{BTreeSet, HashMap};

use contracts::ContractError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// Parsed template
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `source`; `name` identifies the template in errors
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, ContractError> {
        let name = name.into();
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(open) = rest.find(OPEN) {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after_open = &rest[open + OPEN.len()..];
            let close = after_open.find(CLOSE).ok_or_else(|| {
                ContractError::template(&name, format!("unterminated '{{{{' at byte {}", offset + open))
            })?;

            let field = after_open[..close].trim();
            if field.is_empty()
                || !field
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
            {
                return Err(ContractError::template(
                    &name,
                    format!("invalid placeholder '{{{{{}}}}}'", &after_open[..close]),
                ));
            }
            segments.push(Segment::Field(field.to_string()));

            let consumed = open + OPEN.len() + close + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distinct placeholder names
    pub fn fields(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Field(f) => Some(f.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute every placeholder from `context`
    pub fn render(&self, context: &HashMap<String, String>) -> Result<String, ContractError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => {
                    let value =
                        context
                            .get(field)
                            .ok_or_else(|| ContractError::MissingTemplateField {
                                template: self.name.clone(),
                                field: field.clone(),
                            })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render() {
        let t = Template::parse("t", "Name: {{ full_name }}\nMail: {{email}}!").unwrap();
        let out = t
            .render(&ctx(&[("full_name", "Emily Smith"), ("email", "e@x.com")]))
            .unwrap();
        assert_eq!(out, "Name: Emily Smith\nMail: e@x.com!");
        assert_eq!(t.fields().into_iter().collect::<Vec<_>>(), vec!["email", "full_name"]);
    }

    #[test]
    fn test_missing_field() {
        let t = Template::parse("swe", "{{ experience }}").unwrap();
        let err = t.render(&ctx(&[])).unwrap_err();
        assert!(matches!(
            err,
            ContractError::MissingTemplateField { ref field, .. } if field == "experience"
        ));
    }

    #[test]
    fn test_unterminated_placeholder() {
        let err = Template::parse("hr", "Hello {{ name").unwrap_err();
        assert!(err.to_string().contains("unterminated"), "got: {err}");
    }

    #[test]
    fn test_invalid_placeholder() {
        assert!(Template::parse("hr", "{{ }}").is_err());
        assert!(Template::parse("hr", "{{ a b }}").is_err());
    }

    #[test]
    fn test_plain_text() {
        let t = Template::parse("t", "no placeholders, only } braces {").unwrap();
        assert_eq!(t.render(&ctx(&[])).unwrap(), "no placeholders, only } braces {");
    }
}
