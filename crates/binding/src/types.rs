//! Shared types for schema binding: operation kinds, selection sources,
//! resolver maps, and execution results.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use apollo_compiler::ast;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::executor::DocumentTransform;
use crate::info::ResolveInfo;

/// A JSON object, as used for field arguments and variable values.
pub type JsonObject = serde_json::Map<String, Value>;

/// The three GraphQL operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Query,
    Mutation,
    Subscription,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }

    pub(crate) const fn ast(self) -> ast::OperationType {
        match self {
            Self::Query => ast::OperationType::Query,
            Self::Mutation => ast::OperationType::Mutation,
            Self::Subscription => ast::OperationType::Subscription,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the selection set of a synthetic resolve-info comes from.
///
/// Dispatched explicitly by [`build_info`](crate::build_info); each case
/// converges on the same [`ResolveInfo`] shape.
#[derive(Default)]
pub enum SelectionSource {
    /// No selection supplied: synthesize a one-level selection of every
    /// leaf-typed field of the delegated field's return type.
    #[default]
    AllScalars,
    /// Reuse an already-built info verbatim, retargeting only the field
    /// name, return type, schema, and operation.
    Info(ResolveInfo),
    /// A raw fragment source: either `fragment F on T { ... }` or a bare
    /// `{ ... }` selection block.
    Fragment(String),
    /// A nested field selection read out of an existing info, optionally
    /// augmented with required fields.
    FieldSelection(FieldSelection),
}

/// Selects one field's sub-selection out of an existing resolve-info.
pub struct FieldSelection {
    /// The info whose selection set the field is read from.
    pub info: ResolveInfo,
    /// The field whose current sub-selection becomes the base selection.
    /// Its absence from `info` is not an error; the base is then empty.
    pub field: String,
    /// A selection that must be present regardless of what the caller
    /// originally asked for, merged after the base without deduplication.
    pub required: Option<String>,
}

/// A field resolver as declared when binding a schema: either a plain
/// function or a configuration object that may carry a required fragment.
pub enum FieldResolver {
    Function(ResolverFn),
    Config(ResolverConfig),
}

/// Resolver configuration carrying delegation metadata.
pub struct ResolverConfig {
    /// Fragment source describing sub-selections this field needs when
    /// delegated, e.g. `fragment BookId on Book { id }`.
    pub fragment: Option<String>,
    pub resolve: Option<ResolverFn>,
}

/// Resolvers declared for a single type.
#[derive(Default)]
pub struct TypeResolvers {
    pub fields: HashMap<String, FieldResolver>,
    /// Type-resolution function for union/interface types, re-exported by
    /// [`Delegate::get_abstract_resolvers`](crate::Delegate::get_abstract_resolvers).
    pub resolve_type: Option<TypeResolverFn>,
}

/// Mapping from type name to its declared resolvers.
pub type ResolverMap = HashMap<String, TypeResolvers>;

/// An opaque field resolver function: `(source, args) -> value`.
pub type ResolverFn = Arc<dyn Fn(&Value, &JsonObject) -> Value + Send + Sync>;

/// Resolves the concrete type name of a union/interface value.
pub type TypeResolverFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// `__resolveType` entries for every abstract type, consumable by any
/// GraphQL execution engine as interface/union type resolution.
pub type AbstractResolverMap = HashMap<String, TypeResolverFn>;

/// The result of executing or delegating a GraphQL operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Value>,
}

/// Per-call delegation configuration.
#[derive(Default, Clone)]
pub struct DelegateOptions {
    /// Opaque context value passed through to the target schema.
    pub context: Value,
    /// Document transforms applied around delegation, in order. The core
    /// appends its fragment-replacement transform after these.
    pub transforms: Vec<Arc<dyn DocumentTransform>>,
}
