//! Schema binding and delegation for GraphQL.
//!
//! This crate synthesizes a valid, schema-conformant execution context (a
//! "resolve info") on demand, without an incoming client query, so that a
//! root field of one schema can be transparently delegated to and
//! resolved against another schema. It performs selection-set synthesis,
//! fragment parsing and merging, and required-field injection directly
//! against [`apollo_compiler`] AST nodes and type metadata.
//!
//! Execution itself stays external: a [`Delegate`] is constructed with an
//! implementation of [`SchemaExecutor`], the capability that takes a
//! synthesized info object and produces a result.
//!
//! # Examples
//!
//! Synthesizing a default selection for a root field:
//!
//! ```
//! use std::sync::Arc;
//!
//! use apollo_compiler::Schema;
//! use graphql_binding::{build_info, Operation, SelectionSource};
//!
//! # fn main() -> graphql_binding::Result<()> {
//! let schema = Schema::parse_and_validate(
//!     "
//!     type Query { book: Book }
//!     type Book { title: String author: Author }
//!     type Author { name: String }
//!     ",
//!     "schema.graphql",
//! )
//! .expect("valid schema");
//!
//! let info = build_info(
//!     "book",
//!     Operation::Query,
//!     &Arc::new(schema),
//!     SelectionSource::AllScalars,
//! )?;
//!
//! // One level of leaf-typed fields; `author` is object-typed and excluded.
//! assert_eq!(
//!     info.field_nodes[0].selection_set.serialize().no_indent().to_string(),
//!     "{ title }"
//! );
//! # Ok(())
//! # }
//! ```

mod delegate;
mod error;
mod executor;
mod fragments;
mod info;
mod types;

pub use delegate::{BeforeHook, Delegate, SchemaFilter, SubscriptionIterator};
pub use error::{BindingError, Result};
pub use executor::{DelegationRequest, DocumentTransform, SchemaExecutor, SubscriptionSource};
pub use fragments::{FragmentReplacements, ReplaceFieldsWithFragments};
pub use info::{
    build_info, build_info_for_all_scalars, build_info_from_fragment, build_info_from_info,
    build_info_from_selection, ResolveInfo,
};
pub use types::{
    AbstractResolverMap, DelegateOptions, ExecutionResult, FieldResolver, FieldSelection,
    JsonObject, Operation, ResolverConfig, ResolverFn, ResolverMap, SelectionSource,
    TypeResolverFn, TypeResolvers,
};
