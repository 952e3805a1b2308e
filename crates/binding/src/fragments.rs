//! Fragment parsing and the fragment replacement table.
//!
//! Resolver configurations may declare a `fragment` string naming
//! sub-selections a field needs whenever it is delegated (typically an
//! identifier used to re-fetch the entity). This module parses those
//! strings into inline fragments, groups them by type condition, and
//! provides the document transform that splices them into outgoing
//! selections right before delegation.

use std::collections::HashMap;
use std::sync::Arc;

use apollo_compiler::executable::{self, ExecutableDocument, Selection, SelectionSet};
use apollo_compiler::validation::Valid;
use apollo_compiler::{Node, Schema};

use crate::error::{BindingError, Result};
use crate::executor::DocumentTransform;
use crate::types::{FieldResolver, ResolverMap};

/// Name given to bare `{ ... }` selection blocks when they are wrapped
/// into a full fragment definition for parsing.
const WRAPPER_FRAGMENT_NAME: &str = "SelectionBlock";

/// Type name -> field name -> inline fragment to splice in when that
/// field is delegated. Built once at binding time, read-only after.
pub type FragmentReplacements = HashMap<String, HashMap<String, Node<executable::InlineFragment>>>;

/// Parses a fragment source into an inline fragment.
///
/// Accepts either a full `fragment F on T { ... }` document or a bare
/// `{ ... }` selection block; bare blocks are wrapped into a synthetic
/// fragment on `type_condition` first. The source is parsed against
/// `schema`, so selections of undefined fields fail here rather than
/// producing a silently empty selection.
pub(crate) fn parse_fragment(
    schema: &Valid<Schema>,
    type_condition: &str,
    source: &str,
) -> Result<Node<executable::InlineFragment>> {
    let trimmed = source.trim();
    let wrapped;
    let document_source = if trimmed.starts_with("fragment") {
        trimmed
    } else {
        wrapped = format!("fragment {WRAPPER_FRAGMENT_NAME} on {type_condition} {trimmed}");
        &wrapped
    };

    let document = ExecutableDocument::parse(schema, document_source, "fragment.graphql")
        .map_err(|invalid| BindingError::Parse(invalid.errors.to_string()))?;

    // The first fragment definition wins; additional definitions are
    // ignored.
    let fragment = document
        .fragments
        .values()
        .next()
        .ok_or_else(|| BindingError::Parse("no fragment definition in source".to_string()))?;

    Ok(Node::new(executable::InlineFragment {
        type_condition: Some(fragment.type_condition().clone()),
        directives: Default::default(),
        selection_set: fragment.selection_set.clone(),
    }))
}

/// Builds the fragment replacement table from a resolver map.
///
/// Every field configuration carrying a `fragment` string is parsed and
/// recorded under the fragment's *own* type condition, not the type being
/// iterated: a fragment declared under type `A` may describe required
/// sub-selections for a field that, at the point of use, is reached via
/// `A`'s return type. Bare selection blocks default their condition to
/// the iterated type name. Fields without fragments are ignored.
pub(crate) fn extract_fragment_replacements(
    resolvers: &ResolverMap,
    schema: &Valid<Schema>,
) -> Result<FragmentReplacements> {
    let mut replacements = FragmentReplacements::new();

    for (type_name, type_resolvers) in resolvers {
        for (field_name, resolver) in &type_resolvers.fields {
            let FieldResolver::Config(config) = resolver else {
                continue;
            };
            let Some(fragment_source) = &config.fragment else {
                continue;
            };

            let fragment = parse_fragment(schema, type_name, fragment_source)?;
            let condition = fragment
                .type_condition
                .as_ref()
                .map_or_else(|| type_name.clone(), ToString::to_string);
            replacements
                .entry(condition)
                .or_default()
                .insert(field_name.clone(), fragment);
        }
    }

    Ok(replacements)
}

/// Document transform that splices registered required-fragments into an
/// outgoing selection set.
///
/// For every field selection whose parent type and name have an entry in
/// the replacement table, the registered inline fragment is added
/// alongside the field at the same level. Appended by
/// [`Delegate`](crate::Delegate) after any caller-supplied transforms.
pub struct ReplaceFieldsWithFragments {
    replacements: Arc<FragmentReplacements>,
}

impl ReplaceFieldsWithFragments {
    #[must_use]
    pub fn new(replacements: Arc<FragmentReplacements>) -> Self {
        Self { replacements }
    }

    fn splice(&self, selection_set: &mut SelectionSet) {
        let parent_type = selection_set.ty.to_string();
        let mut additions = Vec::new();

        for selection in &mut selection_set.selections {
            match selection {
                Selection::Field(field) => {
                    if let Some(fragment) = self
                        .replacements
                        .get(&parent_type)
                        .and_then(|fields| fields.get(field.name.as_str()))
                    {
                        additions.push(Selection::InlineFragment(fragment.clone()));
                    }
                    self.splice(&mut field.make_mut().selection_set);
                }
                Selection::InlineFragment(inline) => {
                    self.splice(&mut inline.make_mut().selection_set);
                }
                Selection::FragmentSpread(_) => {}
            }
        }

        selection_set.selections.extend(additions);
    }
}

impl DocumentTransform for ReplaceFieldsWithFragments {
    fn transform(&self, selection_set: &mut SelectionSet) -> Result<()> {
        self.splice(selection_set);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResolverConfig, TypeResolvers};

    fn test_schema(sdl: &str) -> Valid<Schema> {
        Schema::parse_and_validate(sdl, "schema.graphql").expect("valid test schema")
    }

    const BOOK_SCHEMA: &str = "
    type Query {
        book: Book
    }

    type Book {
        id: ID!
        title: String
        author: Author
    }

    type Author {
        id: ID!
        name: String
    }
    ";

    fn resolver_with_fragment(
        type_name: &str,
        field_name: &str,
        fragment: &str,
    ) -> ResolverMap {
        let mut fields = HashMap::new();
        fields.insert(
            field_name.to_string(),
            FieldResolver::Config(ResolverConfig {
                fragment: Some(fragment.to_string()),
                resolve: None,
            }),
        );
        let mut map = ResolverMap::new();
        map.insert(
            type_name.to_string(),
            TypeResolvers {
                fields,
                resolve_type: None,
            },
        );
        map
    }

    #[test]
    fn parse_named_fragment() {
        let schema = test_schema(BOOK_SCHEMA);
        let fragment =
            parse_fragment(&schema, "Book", "fragment BookFields on Book { title }").unwrap();

        assert_eq!(fragment.type_condition.as_ref().unwrap().as_str(), "Book");
        assert_eq!(
            fragment.selection_set.serialize().no_indent().to_string(),
            "{ title }"
        );
    }

    #[test]
    fn parse_bare_selection_block() {
        let schema = test_schema(BOOK_SCHEMA);
        let fragment = parse_fragment(&schema, "Book", "{ id title }").unwrap();

        assert_eq!(fragment.type_condition.as_ref().unwrap().as_str(), "Book");
        assert_eq!(
            fragment.selection_set.serialize().no_indent().to_string(),
            "{ id title }"
        );
    }

    #[test]
    fn parse_rejects_invalid_syntax() {
        let schema = test_schema(BOOK_SCHEMA);
        let result = parse_fragment(&schema, "Book", "{ title");
        assert!(matches!(result, Err(BindingError::Parse(_))));
    }

    #[test]
    fn parse_rejects_undefined_field() {
        let schema = test_schema(BOOK_SCHEMA);
        let result = parse_fragment(&schema, "Book", "{ xxx }");
        assert!(matches!(result, Err(BindingError::Parse(_))));
    }

    #[test]
    fn extraction_groups_by_fragment_type_condition() {
        let schema = test_schema(BOOK_SCHEMA);
        // Declared under Query, but the fragment targets Book: the table
        // key is the fragment's own condition.
        let resolvers =
            resolver_with_fragment("Query", "book", "fragment BookId on Book { id }");

        let table = extract_fragment_replacements(&resolvers, &schema).unwrap();
        assert!(table.contains_key("Book"));
        assert!(table["Book"].contains_key("book"));
        assert!(!table.contains_key("Query"));
    }

    #[test]
    fn extraction_defaults_bare_blocks_to_outer_type() {
        let schema = test_schema(BOOK_SCHEMA);
        let resolvers = resolver_with_fragment("Book", "author", "{ id }");

        let table = extract_fragment_replacements(&resolvers, &schema).unwrap();
        assert!(table.contains_key("Book"));
        assert!(table["Book"].contains_key("author"));
    }

    #[test]
    fn extraction_ignores_plain_resolvers() {
        let schema = test_schema(BOOK_SCHEMA);
        let mut fields = HashMap::new();
        fields.insert(
            "book".to_string(),
            FieldResolver::Function(Arc::new(|_, _| serde_json::Value::Null)),
        );
        let mut resolvers = ResolverMap::new();
        resolvers.insert(
            "Query".to_string(),
            TypeResolvers {
                fields,
                resolve_type: None,
            },
        );

        let table = extract_fragment_replacements(&resolvers, &schema).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn extraction_propagates_parse_failures() {
        let schema = test_schema(BOOK_SCHEMA);
        let resolvers = resolver_with_fragment("Book", "author", "{ nope }");

        let result = extract_fragment_replacements(&resolvers, &schema);
        assert!(matches!(result, Err(BindingError::Parse(_))));
    }

    #[test]
    fn replacement_transform_splices_fragment_alongside_field() {
        let schema = test_schema(BOOK_SCHEMA);
        let resolvers =
            resolver_with_fragment("Book", "author", "fragment AuthorId on Book { id }");
        let table = Arc::new(extract_fragment_replacements(&resolvers, &schema).unwrap());

        // A Book-typed selection requesting `author` picks up the fragment.
        let base = parse_fragment(&schema, "Book", "{ title author { name } }").unwrap();
        let mut selection_set = base.selection_set.clone();

        let transform = ReplaceFieldsWithFragments::new(table);
        transform.transform(&mut selection_set).unwrap();

        let serialized = selection_set.serialize().no_indent().to_string();
        assert!(
            serialized.contains("... on Book { id }"),
            "fragment not spliced: {serialized}"
        );
        // The original field selection is retained.
        assert!(serialized.contains("author { name }"));
    }

    #[test]
    fn replacement_transform_leaves_unrelated_selections_alone() {
        let schema = test_schema(BOOK_SCHEMA);
        let table = Arc::new(FragmentReplacements::new());

        let base = parse_fragment(&schema, "Book", "{ title }").unwrap();
        let mut selection_set = base.selection_set.clone();
        ReplaceFieldsWithFragments::new(table)
            .transform(&mut selection_set)
            .unwrap();

        assert_eq!(
            selection_set.serialize().no_indent().to_string(),
            "{ title }"
        );
    }
}
