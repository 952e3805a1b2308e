//! Synthetic resolve-info construction.
//!
//! A resolve-info is the execution context a GraphQL field resolver
//! receives: the field's name, its requested sub-selection, its return
//! type, the schema, and the operation kind. Delegating a root field to
//! another schema without an incoming client query means synthesizing
//! that context from scratch, subject to GraphQL's selection-validity
//! rules. This module builds it from one of four selection sources; see
//! [`SelectionSource`].

use std::collections::HashMap;
use std::sync::Arc;

use apollo_compiler::ast;
use apollo_compiler::executable::{self, Selection, SelectionSet};
use apollo_compiler::schema::{Component, ExtendedType};
use apollo_compiler::validation::Valid;
use apollo_compiler::{Name, Node, Schema};
use serde_json::Value;

use crate::error::{BindingError, Result};
use crate::fragments::parse_fragment;
use crate::types::{FieldSelection, JsonObject, Operation, SelectionSource};

/// The synthesized execution context for one delegated field.
///
/// Created per delegation call, handed to the delegation capability once,
/// then discarded. `field_nodes` is a singleton list whose entry carries
/// the synthesized or merged selection set.
#[derive(Debug, Clone)]
pub struct ResolveInfo {
    pub field_name: Name,
    pub field_nodes: Vec<Node<executable::Field>>,
    pub return_type: ast::Type,
    /// The operation root type the field was resolved on.
    pub parent_type: Name,
    pub schema: Arc<Valid<Schema>>,
    pub operation: Operation,
    pub fragments: HashMap<Name, Node<executable::Fragment>>,
    /// Empty: the synthetic field is always at the response root.
    pub path: Vec<String>,
    /// Empty: call sites supply already-resolved argument values, not
    /// variable references.
    pub variable_values: JsonObject,
    pub root_value: Value,
}

/// Builds a resolve-info for `field_name`, taking the selection from
/// `source`. This is the single entry point the delegation façade uses;
/// every case produces the same [`ResolveInfo`] shape.
pub fn build_info(
    field_name: &str,
    operation: Operation,
    schema: &Arc<Valid<Schema>>,
    source: SelectionSource,
) -> Result<ResolveInfo> {
    match source {
        SelectionSource::AllScalars => build_info_for_all_scalars(field_name, schema, operation),
        SelectionSource::Info(prev) => build_info_from_info(field_name, schema, operation, &prev),
        SelectionSource::Fragment(fragment) => {
            build_info_from_fragment(field_name, schema, operation, &fragment)
        }
        SelectionSource::FieldSelection(selection) => {
            build_info_from_selection(field_name, schema, operation, &selection)
        }
    }
}

/// Builds a resolve-info whose selection covers every leaf-typed field of
/// the delegated field's return type, one level deep.
///
/// Object- and interface-typed sub-fields are excluded; there is no
/// recursion. A field that directly returns a leaf type carries no
/// selection set at all. Field order matches the return type's own
/// declaration order.
pub fn build_info_for_all_scalars(
    field_name: &str,
    schema: &Arc<Valid<Schema>>,
    operation: Operation,
) -> Result<ResolveInfo> {
    let (parent_type, field_def) = root_field(schema, operation, field_name)?;
    let return_type_name = field_def.ty.inner_named_type();

    let mut field = executable::Field::new(field_def.name.clone(), field_def.node.clone());
    match schema.types.get(return_type_name) {
        Some(ExtendedType::Object(object)) => {
            push_leaf_fields(&mut field.selection_set, &object.fields, schema);
        }
        Some(ExtendedType::Interface(interface)) => {
            push_leaf_fields(&mut field.selection_set, &interface.fields, schema);
        }
        // Leaf and union return types carry no nested selection.
        _ => {}
    }

    tracing::debug!(
        field = field_name,
        selections = field.selection_set.selections.len(),
        "synthesized all-scalars selection"
    );

    Ok(assemble(
        field_def.name.clone(),
        field,
        field_def.ty.clone(),
        parent_type,
        schema,
        operation,
    ))
}

/// Builds a resolve-info whose selection comes from a fragment source:
/// either `fragment F on T { ... }` or a bare `{ ... }` block, parsed and
/// checked against the schema.
pub fn build_info_from_fragment(
    field_name: &str,
    schema: &Arc<Valid<Schema>>,
    operation: Operation,
    fragment_source: &str,
) -> Result<ResolveInfo> {
    let (parent_type, field_def) = root_field(schema, operation, field_name)?;
    let return_type_name = field_def.ty.inner_named_type().clone();

    let fragment = parse_fragment(schema, &return_type_name, fragment_source)?;

    let mut field = executable::Field::new(field_def.name.clone(), field_def.node.clone());
    field.selection_set = SelectionSet {
        ty: return_type_name,
        selections: fragment.selection_set.selections.clone(),
    };

    Ok(assemble(
        field_def.name.clone(),
        field,
        field_def.ty.clone(),
        parent_type,
        schema,
        operation,
    ))
}

/// Reuses an existing resolve-info verbatim, retargeting field name,
/// return type, schema, and operation. No selection synthesis happens;
/// field nodes, fragments, variable values, and root value carry over
/// untouched.
pub fn build_info_from_info(
    field_name: &str,
    schema: &Arc<Valid<Schema>>,
    operation: Operation,
    prev: &ResolveInfo,
) -> Result<ResolveInfo> {
    let (parent_type, field_def) = root_field(schema, operation, field_name)?;

    Ok(ResolveInfo {
        field_name: field_def.name.clone(),
        field_nodes: prev.field_nodes.clone(),
        return_type: field_def.ty.clone(),
        parent_type,
        schema: Arc::clone(schema),
        operation,
        fragments: prev.fragments.clone(),
        path: prev.path.clone(),
        variable_values: prev.variable_values.clone(),
        root_value: prev.root_value.clone(),
    })
}

/// Builds a resolve-info around one field's sub-selection read out of an
/// existing info, optionally merged with a required selection.
///
/// `selection.field` is looked up one level down inside `info`'s first
/// field node; absence there is not an error and yields an empty base.
/// The merged selection is typed at the field's own return type, resolved
/// on the outer field's return type.
pub fn build_info_from_selection(
    field_name: &str,
    schema: &Arc<Valid<Schema>>,
    operation: Operation,
    selection: &FieldSelection,
) -> Result<ResolveInfo> {
    let (parent_type, field_def) = root_field(schema, operation, field_name)?;
    let outer_return = field_def.ty.inner_named_type();

    let sub_field_def =
        schema
            .type_field(outer_return, &selection.field)
            .map_err(|_| BindingError::FieldNotFound {
                field: selection.field.clone(),
                type_name: outer_return.to_string(),
            })?;
    let target_type = sub_field_def.ty.inner_named_type().clone();

    let base = selection
        .info
        .field_nodes
        .first()
        .and_then(|node| find_field(&node.selection_set, &selection.field))
        .map_or_else(
            || SelectionSet::new(target_type.clone()),
            |found| found.selection_set.clone(),
        );

    let merged = match &selection.required {
        Some(required) => merge_required(&base, required, schema, &target_type)?,
        None => base,
    };

    let mut field = executable::Field::new(field_def.name.clone(), field_def.node.clone());
    field.selection_set = SelectionSet {
        ty: target_type,
        selections: merged.selections,
    };

    Ok(assemble(
        field_def.name.clone(),
        field,
        sub_field_def.ty.clone(),
        parent_type,
        schema,
        operation,
    ))
}

/// Concatenates a base selection set with a required selection parsed
/// from source, base first.
///
/// Duplicate field names across the two sources are retained, never
/// deduplicated: GraphQL execution merges duplicate field selections at
/// the same level itself, so this stays a plain concatenation.
pub(crate) fn merge_required(
    base: &SelectionSet,
    required_source: &str,
    schema: &Valid<Schema>,
    type_name: &Name,
) -> Result<SelectionSet> {
    let required = parse_fragment(schema, type_name, required_source)?;

    let mut merged = SelectionSet::new(type_name.clone());
    merged.selections.extend(base.selections.iter().cloned());
    merged
        .selections
        .extend(required.selection_set.selections.iter().cloned());
    Ok(merged)
}

fn root_field<'a>(
    schema: &'a Valid<Schema>,
    operation: Operation,
    field_name: &str,
) -> Result<(Name, &'a Component<ast::FieldDefinition>)> {
    let root_type = schema
        .root_operation(operation.ast())
        .ok_or(BindingError::MissingRootType(operation))?;
    let field = schema
        .type_field(root_type, field_name)
        .map_err(|_| BindingError::FieldNotFound {
            field: field_name.to_string(),
            type_name: root_type.to_string(),
        })?;
    Ok((root_type.clone(), field))
}

fn push_leaf_fields(
    selection_set: &mut SelectionSet,
    fields: &apollo_compiler::collections::IndexMap<Name, Component<ast::FieldDefinition>>,
    schema: &Schema,
) {
    for (name, sub_field) in fields {
        if is_leaf(schema, sub_field.ty.inner_named_type()) {
            let node = executable::Field::new(name.clone(), sub_field.node.clone());
            selection_set.push(Selection::Field(Node::new(node)));
        }
    }
}

fn is_leaf(schema: &Schema, type_name: &str) -> bool {
    matches!(
        schema.types.get(type_name),
        Some(ExtendedType::Scalar(_) | ExtendedType::Enum(_))
    )
}

fn find_field<'a>(
    selection_set: &'a SelectionSet,
    name: &str,
) -> Option<&'a Node<executable::Field>> {
    selection_set.selections.iter().find_map(|s| match s {
        Selection::Field(field) if field.name.as_str() == name => Some(field),
        _ => None,
    })
}

fn assemble(
    field_name: Name,
    field: executable::Field,
    return_type: ast::Type,
    parent_type: Name,
    schema: &Arc<Valid<Schema>>,
    operation: Operation,
) -> ResolveInfo {
    ResolveInfo {
        field_name,
        field_nodes: vec![Node::new(field)],
        return_type,
        parent_type,
        schema: Arc::clone(schema),
        operation,
        fragments: HashMap::new(),
        path: Vec::new(),
        variable_values: JsonObject::new(),
        root_value: Value::Null,
    }
}
