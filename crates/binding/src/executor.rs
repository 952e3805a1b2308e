//! Seams to the external collaborators: query execution, schema
//! delegation, subscription sources, and document transforms.
//!
//! The binding core never executes GraphQL itself. Everything that
//! crosses the delegation boundary goes through [`SchemaExecutor`], an
//! async capability supplied at construction time.

use std::sync::Arc;

use apollo_compiler::executable::SelectionSet;
use apollo_compiler::validation::Valid;
use apollo_compiler::{Name, Schema};
use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::info::ResolveInfo;
use crate::types::{ExecutionResult, JsonObject, Operation};

/// A rewrite applied to the outgoing selection set before the executor
/// builds its request document.
///
/// Caller-supplied transforms run in the order given; the
/// fragment-replacement transform appended by the façade always runs
/// last.
pub trait DocumentTransform: Send + Sync {
    fn transform(&self, selection_set: &mut SelectionSet) -> Result<()>;
}

/// Everything the external delegation capability needs to resolve one
/// root field against the target schema.
pub struct DelegationRequest {
    pub schema: Arc<Valid<Schema>>,
    pub operation: Operation,
    /// The root field to resolve on the target schema.
    pub field_name: Name,
    /// Already-resolved argument values; no variable references.
    pub args: JsonObject,
    /// Opaque caller context, passed through unmodified.
    pub context: Value,
    /// The synthesized execution context, including the selection set the
    /// transforms apply to.
    pub info: ResolveInfo,
    pub transforms: Vec<Arc<dyn DocumentTransform>>,
}

impl DelegationRequest {
    /// Runs every transform, in order, over the request's root selection
    /// set. Executors call this before building their document.
    pub fn apply_transforms(&mut self) -> Result<()> {
        let Some(node) = self.info.field_nodes.first_mut() else {
            return Ok(());
        };
        let selection_set = &mut node.make_mut().selection_set;
        for transform in &self.transforms {
            transform.transform(selection_set)?;
        }
        Ok(())
    }
}

/// The external execution capability: full-document execution, single
/// root-field delegation, and subscription delegation.
///
/// Failures are passed through unmodified as
/// [`BindingError::Delegate`](crate::BindingError::Delegate); the core
/// adds no retry, backoff, or partial-result suppression.
#[async_trait]
pub trait SchemaExecutor: Send + Sync {
    /// Executes a full query document against the schema.
    async fn execute(
        &self,
        schema: &Valid<Schema>,
        query: &str,
        variables: JsonObject,
    ) -> Result<ExecutionResult>;

    /// Resolves one root field against the target schema.
    async fn delegate(&self, request: DelegationRequest) -> Result<ExecutionResult>;

    /// Opens a delegated subscription, yielding one execution result per
    /// event.
    async fn subscribe(&self, request: DelegationRequest) -> Result<Box<dyn SubscriptionSource>>;
}

/// A live delegated subscription.
#[async_trait]
pub trait SubscriptionSource: Send {
    /// The next event, or `None` once the subscription ends.
    async fn next(&mut self) -> Result<Option<ExecutionResult>>;

    /// Cancels the subscription, releasing upstream resources.
    async fn stop(&mut self) -> Result<()>;
}
