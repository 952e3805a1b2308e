//! The delegation façade.
//!
//! A [`Delegate`] binds one immutable schema, the fragment replacement
//! table extracted from its resolvers, and an external execution
//! capability. Each public operation runs the optional before hook,
//! synthesizes a resolve-info for the requested root field, and hands it
//! to the executor. Calls share no mutable state and may run
//! concurrently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use apollo_compiler::{Name, Schema};
use serde_json::Value;

use crate::error::{BindingError, Result};
use crate::executor::{DelegationRequest, SchemaExecutor, SubscriptionSource};
use crate::fragments::{
    extract_fragment_replacements, FragmentReplacements, ReplaceFieldsWithFragments,
};
use crate::info::build_info;
use crate::types::{
    AbstractResolverMap, DelegateOptions, ExecutionResult, JsonObject, Operation, ResolverMap,
    SelectionSource, TypeResolverFn,
};

/// Side-effecting callback run before every public operation (cache
/// warm-up, auth checks). A failure aborts the enclosing call.
pub type BeforeHook = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// An optional restriction of [`Delegate::get_abstract_resolvers`] to the
/// types present in a second schema.
pub enum SchemaFilter {
    Schema(Arc<Valid<Schema>>),
    /// Path to a `.graphql` schema file, loaded and parsed on use.
    Path(PathBuf),
}

/// Binds a schema to an external execution capability and delegates root
/// fields to it.
pub struct Delegate {
    schema: Arc<Valid<Schema>>,
    executor: Arc<dyn SchemaExecutor>,
    fragment_replacements: Arc<FragmentReplacements>,
    type_resolvers: HashMap<String, TypeResolverFn>,
    before: Option<BeforeHook>,
}

impl Delegate {
    #[must_use]
    pub fn new(schema: Arc<Valid<Schema>>, executor: Arc<dyn SchemaExecutor>) -> Self {
        Self {
            schema,
            executor,
            fragment_replacements: Arc::new(FragmentReplacements::new()),
            type_resolvers: HashMap::new(),
            before: None,
        }
    }

    /// Registers a resolver map, extracting the fragment replacement
    /// table and the `__resolveType` registry from it.
    ///
    /// Fails if any declared fragment does not parse against the bound
    /// schema.
    pub fn with_resolvers(mut self, resolvers: &ResolverMap) -> Result<Self> {
        self.fragment_replacements =
            Arc::new(extract_fragment_replacements(resolvers, &self.schema)?);
        self.type_resolvers = resolvers
            .iter()
            .filter_map(|(name, type_resolvers)| {
                type_resolvers
                    .resolve_type
                    .clone()
                    .map(|resolve| (name.clone(), resolve))
            })
            .collect();
        Ok(self)
    }

    #[must_use]
    pub fn with_before_hook(mut self, hook: BeforeHook) -> Self {
        self.before = Some(hook);
        self
    }

    /// Executes a full query document against the bound schema.
    pub async fn request(&self, query: &str, variables: JsonObject) -> Result<ExecutionResult> {
        self.run_before()?;
        tracing::debug!("executing request document");
        self.executor.execute(&self.schema, query, variables).await
    }

    /// Delegates one root field to the bound schema's executor, returning
    /// only the result.
    pub async fn delegate(
        &self,
        operation: Operation,
        field_name: &str,
        args: JsonObject,
        selection: SelectionSource,
        options: DelegateOptions,
    ) -> Result<ExecutionResult> {
        self.run_before()?;
        let request = self.build_request(operation, field_name, args, selection, options)?;
        self.executor.delegate(request).await
    }

    /// Delegates a subscription root field, wrapping the executor's
    /// source so each event is re-keyed from the target schema's field
    /// name to the synthetic info's field name.
    pub async fn delegate_subscription(
        &self,
        field_name: &str,
        args: JsonObject,
        selection: SelectionSource,
        options: DelegateOptions,
    ) -> Result<SubscriptionIterator> {
        self.run_before()?;
        let request =
            self.build_request(Operation::Subscription, field_name, args, selection, options)?;
        let local_field = request.info.field_name.to_string();
        let remote_field = request.field_name.to_string();
        let source = self.executor.subscribe(request).await?;

        Ok(SubscriptionIterator::new(source, local_field, remote_field))
    }

    /// Emits a `__resolveType` entry for every union/interface type that
    /// is present in the bound schema, registered in the resolver map,
    /// and (when a filter is given) present in the filter schema.
    pub fn get_abstract_resolvers(
        &self,
        filter: Option<SchemaFilter>,
    ) -> Result<AbstractResolverMap> {
        let filter_schema = match filter {
            Some(SchemaFilter::Schema(schema)) => Some(schema),
            Some(SchemaFilter::Path(path)) => load_filter_schema(&path)?,
            None => None,
        };

        let mut resolvers = AbstractResolverMap::new();
        for (name, ty) in &self.schema.types {
            if !matches!(ty, ExtendedType::Union(_) | ExtendedType::Interface(_)) {
                continue;
            }
            if let Some(filter) = &filter_schema {
                if !filter.types.contains_key(name.as_str()) {
                    continue;
                }
            }
            if let Some(resolve_type) = self.type_resolvers.get(name.as_str()) {
                resolvers.insert(name.to_string(), Arc::clone(resolve_type));
            }
        }
        Ok(resolvers)
    }

    fn build_request(
        &self,
        operation: Operation,
        field_name: &str,
        args: JsonObject,
        selection: SelectionSource,
        options: DelegateOptions,
    ) -> Result<DelegationRequest> {
        let info = build_info(field_name, operation, &self.schema, selection)?;
        let field_name = Name::new(field_name)
            .map_err(|invalid| BindingError::Parse(invalid.to_string()))?;

        // Caller transforms first, fragment replacement last.
        let mut transforms = options.transforms;
        transforms.push(Arc::new(ReplaceFieldsWithFragments::new(Arc::clone(
            &self.fragment_replacements,
        ))));

        tracing::debug!(field = %field_name, %operation, "delegating root field");
        Ok(DelegationRequest {
            schema: Arc::clone(&self.schema),
            operation,
            field_name,
            args,
            context: options.context,
            info,
            transforms,
        })
    }

    fn run_before(&self) -> Result<()> {
        if let Some(hook) = &self.before {
            hook()?;
        }
        Ok(())
    }
}

/// Wraps a delegated subscription, re-keying each event from the remote
/// field name to the local one.
///
/// Call [`stop`](Self::stop) to cancel: it forwards cancellation to the
/// delegated source so the upstream subscription is released. Dropping
/// the iterator without stopping does not forward cancellation; tests
/// document this asymmetry.
pub struct SubscriptionIterator {
    source: Box<dyn SubscriptionSource>,
    local_field: String,
    remote_field: String,
}

impl SubscriptionIterator {
    /// Wraps an already-open delegated subscription. `remote_field` is
    /// the root field resolved on the target schema; `local_field` is the
    /// name events are re-keyed under.
    #[must_use]
    pub fn new(
        source: Box<dyn SubscriptionSource>,
        local_field: impl Into<String>,
        remote_field: impl Into<String>,
    ) -> Self {
        Self {
            source,
            local_field: local_field.into(),
            remote_field: remote_field.into(),
        }
    }

    /// The next event, with its payload moved from the remote field name
    /// to the local one. `None` once the underlying source ends.
    pub async fn next(&mut self) -> Result<Option<JsonObject>> {
        let Some(result) = self.source.next().await? else {
            return Ok(None);
        };

        let value = match result.data {
            Value::Object(mut data) => data.remove(&self.remote_field).unwrap_or(Value::Null),
            _ => Value::Null,
        };

        tracing::debug!(field = %self.local_field, "subscription event");
        let mut data = JsonObject::new();
        data.insert(self.local_field.clone(), value);
        Ok(Some(data))
    }

    /// Cancels the subscription, forwarding to the delegated source.
    pub async fn stop(mut self) -> Result<()> {
        self.source.stop().await
    }
}

fn load_filter_schema(path: &Path) -> Result<Option<Arc<Valid<Schema>>>> {
    // Only recognized schema-file extensions are loaded; anything else
    // leaves the result unfiltered, matching the binding's historical
    // behavior.
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("graphql" | "gql") => {}
        _ => return Ok(None),
    }

    if !path.exists() {
        return Err(BindingError::SchemaNotFound(path.to_path_buf()));
    }

    let sdl = std::fs::read_to_string(path).map_err(|io| {
        BindingError::Parse(format!(
            "failed to read schema file {}: {io}",
            path.display()
        ))
    })?;
    let schema = Schema::parse_and_validate(&sdl, path)
        .map_err(|invalid| BindingError::Parse(invalid.errors.to_string()))?;
    Ok(Some(Arc::new(schema)))
}
