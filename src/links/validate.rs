use crate::definition::{FieldLink, FieldType, ModuleLibrary, Workspace};
use crate::error::{FormulaError, LinkRejection};
use crate::units::UnitCategory;
use tracing::debug;

/// Checks whether `source_instance_id.source_field` may take its value from
/// `target_instance_id.target_name`, where `target_name` is a field or an
/// `out.<name>` computed output.
///
/// Cycles are checked one step deep here; longer cycles introduced later are
/// caught when links are resolved.
pub fn can_link_fields(
    workspace: &Workspace,
    library: &ModuleLibrary,
    source_instance_id: &str,
    source_field: &str,
    target_instance_id: &str,
    target_name: &str,
) -> Result<(), LinkRejection> {
    let unknown_source = || LinkRejection::UnknownSourceField {
        field: source_field.to_string(),
    };
    let source = workspace
        .instance(source_instance_id)
        .and_then(|instance| library.get(&instance.module_id))
        .and_then(|module| module.field(source_field))
        .ok_or_else(unknown_source)?;
    if source.field_type.is_catalog() {
        return Err(LinkRejection::CatalogFieldSource {
            field: source_field.to_string(),
        });
    }
    if source_instance_id == target_instance_id && source_field == target_name {
        return Err(LinkRejection::SelfLink);
    }

    let target_instance =
        workspace
            .instance(target_instance_id)
            .ok_or_else(|| LinkRejection::UnknownTargetInstance {
                instance_id: target_instance_id.to_string(),
            })?;
    let unknown_target = || LinkRejection::UnknownTarget {
        instance_id: target_instance_id.to_string(),
        name: target_name.to_string(),
    };
    let target_module = library
        .get(&target_instance.module_id)
        .ok_or_else(unknown_target)?;

    let (target_type, target_category): (FieldType, Option<UnitCategory>) =
        if target_name.starts_with(crate::definition::OUTPUT_PREFIX) {
            let output = target_module
                .computed_output(target_name)
                .ok_or_else(unknown_target)?;
            (FieldType::Number, output.unit_category())
        } else {
            let target = target_module
                .field(target_name)
                .ok_or_else(unknown_target)?;
            if target.field_type.is_catalog() {
                return Err(LinkRejection::CatalogFieldTarget {
                    field: target_name.to_string(),
                });
            }
            (target.field_type, target.unit_category())
        };

    if source.field_type != target_type {
        return Err(LinkRejection::TypeMismatch {
            source: source.field_type.to_string(),
            target: target_type.to_string(),
        });
    }
    if let (Some(source_category), Some(target_category)) =
        (source.unit_category(), target_category)
    {
        if source_category != target_category {
            return Err(LinkRejection::UnitCategoryMismatch {
                source: source_category.to_string(),
                target: target_category.to_string(),
            });
        }
    }

    let links_back = target_instance.link(target_name).is_some_and(|link| {
        link.target_instance_id == source_instance_id && link.target_variable_name == source_field
    });
    if links_back {
        return Err(LinkRejection::WouldCreateCycle);
    }
    Ok(())
}

/// Validates and stores a link. Any previous link on the field is replaced.
pub fn link_field(
    workspace: &mut Workspace,
    library: &ModuleLibrary,
    source_instance_id: &str,
    source_field: &str,
    link: FieldLink,
) -> Result<(), FormulaError> {
    can_link_fields(
        workspace,
        library,
        source_instance_id,
        source_field,
        &link.target_instance_id,
        &link.target_variable_name,
    )
    .map_err(FormulaError::IncompatibleLink)?;

    debug!(
        instance = source_instance_id,
        field = source_field,
        target = %link.target_instance_id,
        target_field = %link.target_variable_name,
        "linked field"
    );
    if let Some(instance) = workspace.instance_mut(source_instance_id) {
        instance
            .field_links
            .insert(source_field.to_string(), link);
    }
    Ok(())
}
