//! Blueprint validation
//!
//! Field-level rules come from the `validator` derives on the contracts.
//! Cross-field rules checked here:
//! - attribute names unique and not reserved
//! - attribute values unique, reference and marginalized values in the pool
//! - persona count is a positive multiple of batch_size
//! - shortlist_size < batch_size
//! - at least one role, no duplicates

use std::collections::HashSet;

use contracts::{AuditBlueprint, ContractError, MARGINALIZED_ATTRIBUTE, UNSPECIFIED};
use validator::Validate;

/// Validate an AuditBlueprint
///
/// Returns the first error encountered.
pub fn validate(blueprint: &AuditBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_attributes(blueprint)?;
    validate_batch_design(blueprint)?;
    validate_roles(blueprint)?;
    Ok(())
}

fn validate_fields(blueprint: &AuditBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

fn validate_attributes(blueprint: &AuditBlueprint) -> Result<(), ContractError> {
    let mut names = HashSet::new();
    for attr in &blueprint.personas.attributes {
        if !names.insert(attr.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("personas.attributes[name={}]", attr.name),
                "duplicate attribute name",
            ));
        }
        if attr.name == MARGINALIZED_ATTRIBUTE {
            return Err(ContractError::config_validation(
                format!("personas.attributes[name={}]", attr.name),
                "attribute name is reserved for the derived flag",
            ));
        }

        let mut values = HashSet::new();
        for value in &attr.values {
            if value == UNSPECIFIED {
                return Err(ContractError::config_validation(
                    format!("personas.attributes[{}].values", attr.name),
                    format!("'{UNSPECIFIED}' is reserved for neutral personas"),
                ));
            }
            if !values.insert(value.as_str()) {
                return Err(ContractError::config_validation(
                    format!("personas.attributes[{}].values", attr.name),
                    format!("duplicate value '{value}'"),
                ));
            }
        }

        if !values.contains(attr.reference.as_str()) {
            return Err(ContractError::config_validation(
                format!("personas.attributes[{}].reference", attr.name),
                format!("reference '{}' not found in values", attr.reference),
            ));
        }

        if let Some(extra) = attr
            .marginalized
            .iter()
            .find(|m| !values.contains(m.as_str()))
        {
            return Err(ContractError::config_validation(
                format!("personas.attributes[{}].marginalized", attr.name),
                format!("marginalized value '{extra}' not found in values"),
            ));
        }
    }
    Ok(())
}

fn validate_batch_design(blueprint: &AuditBlueprint) -> Result<(), ContractError> {
    let personas = blueprint.personas.persona_count();
    let batch_size = blueprint.batches.batch_size;

    if personas < batch_size || personas % batch_size != 0 {
        return Err(ContractError::config_validation(
            "batches.batch_size",
            format!(
                "persona count ({personas}) must be a positive multiple of batch_size ({batch_size})"
            ),
        ));
    }

    if blueprint.prompts.shortlist_size >= batch_size {
        return Err(ContractError::config_validation(
            "prompts.shortlist_size",
            format!(
                "shortlist_size ({}) must be < batch_size ({batch_size})",
                blueprint.prompts.shortlist_size
            ),
        ));
    }
    Ok(())
}

fn validate_roles(blueprint: &AuditBlueprint) -> Result<(), ContractError> {
    let roles = &blueprint.resumes.roles;
    if roles.is_empty() {
        return Err(ContractError::config_validation(
            "resumes.roles",
            "at least one role is required",
        ));
    }
    let unique: HashSet<_> = roles.iter().collect();
    if unique.len() != roles.len() {
        return Err(ContractError::config_validation(
            "resumes.roles",
            "duplicate role",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::AttributeSpec;

    fn minimal_blueprint() -> AuditBlueprint {
        let mut bp = AuditBlueprint::default();
        bp.personas.attributes = vec![AttributeSpec::new(
            "group",
            &["reference", "minority"],
            "reference",
            &["minority"],
        )];
        bp.personas.neutral_count = 2;
        bp.batches.batch_size = 4;
        bp.prompts.shortlist_size = 2;
        bp
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_blueprint()).is_ok());
        assert!(validate(&AuditBlueprint::default()).is_ok());
    }

    #[test]
    fn test_duplicate_attribute_name() {
        let mut bp = minimal_blueprint();
        bp.personas.attributes.push(bp.personas.attributes[0].clone());
        bp.personas.neutral_count = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate attribute name"), "got: {err}");
    }

    #[test]
    fn test_reserved_attribute_name() {
        let mut bp = minimal_blueprint();
        bp.personas.attributes[0].name = MARGINALIZED_ATTRIBUTE.to_string();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("reserved"), "got: {err}");
    }

    #[test]
    fn test_reference_not_in_values() {
        let mut bp = minimal_blueprint();
        bp.personas.attributes[0].reference = "majority".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("not found in values"), "got: {err}");
    }

    #[test]
    fn test_marginalized_not_in_values() {
        let mut bp = minimal_blueprint();
        bp.personas.attributes[0].marginalized = vec!["other".into()];
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("marginalized value 'other'"), "got: {err}");
    }

    #[test]
    fn test_duplicate_value() {
        let mut bp = minimal_blueprint();
        bp.personas.attributes[0].values.push("minority".into());
        bp.personas.neutral_count = 1;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate value"), "got: {err}");
    }

    #[test]
    fn test_persona_count_not_multiple_of_batch() {
        let mut bp = minimal_blueprint();
        bp.personas.neutral_count = 3;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("multiple of batch_size"), "got: {err}");
    }

    #[test]
    fn test_shortlist_must_be_smaller_than_batch() {
        let mut bp = minimal_blueprint();
        bp.prompts.shortlist_size = 4;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("shortlist_size"), "got: {err}");
    }

    #[test]
    fn test_field_rule_violation() {
        let mut bp = minimal_blueprint();
        bp.model.max_retries = 0;
        assert!(matches!(
            validate(&bp),
            Err(ContractError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_empty_roles() {
        let mut bp = minimal_blueprint();
        bp.resumes.roles.clear();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("at least one role"), "got: {err}");
    }
}
