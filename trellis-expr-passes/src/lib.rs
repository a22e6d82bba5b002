//! Analysis and rewrite passes over trellis expression trees.
//!
//! The analyses ([`is_unique`], [`is_nullable`]) are pure functions consulted
//! during planning; the rewrites run as [`TransformerStage`]s composed into a
//! [`TransformerPipeline`] that a query builder drives before handing the
//! query to execution. Neither may change what a query means, only what the
//! planner knows about it and how it is spelled.

mod infer_nullability;
mod infer_uniqueness;
mod inline_alias;
mod util;

use std::collections::HashSet;

use tracing::{trace, trace_span};
use trellis_errors::TrellisResult;
use trellis_expr::ast::SelectQuery;

pub use crate::infer_nullability::is_nullable;
pub use crate::infer_uniqueness::is_unique;
pub use crate::inline_alias::{replace_in_query, replace_subexpression, AliasInlineStage};

/// One step of query preparation.
///
/// Stages run in the order they were added, each seeing the previous stage's
/// output. `after_all` hooks fire once the whole pipeline has been applied,
/// for work that must observe the final query shape.
pub trait TransformerStage {
    /// Name used in trace output.
    fn name(&self) -> &'static str;

    /// Applies the stage to `query` in place.
    fn apply(&mut self, query: &mut SelectQuery) -> TrellisResult<()>;

    /// Fired once after every stage has been applied.
    fn after_all(&mut self) -> TrellisResult<()> {
        Ok(())
    }

    /// Rendered expressions the query must be grouped by for this stage's
    /// output to be well-defined.
    fn required_group_by(&self) -> HashSet<String> {
        HashSet::new()
    }

    /// Rendered expressions this stage can exploit if the query happens to be
    /// grouped by them.
    fn optional_group_by(&self) -> HashSet<String> {
        HashSet::new()
    }
}

/// Ordered sequence of [`TransformerStage`]s applied to a query before
/// execution.
#[derive(Default)]
pub struct TransformerPipeline {
    stages: Vec<Box<dyn TransformerStage>>,
}

impl TransformerPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: impl TransformerStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Runs every stage in order, then fires the `after_all` hooks in the
    /// same order.
    pub fn run(&mut self, query: &mut SelectQuery) -> TrellisResult<()> {
        let span = trace_span!("transformer_pipeline").entered();
        trace!(query_pre = %query, "transforming query");

        for stage in &mut self.stages {
            stage.apply(query)?;
            trace!(parent: &span, stage = stage.name(), query = %query);
        }
        for stage in &mut self.stages {
            stage.after_all()?;
        }

        trace!(query_post = %query, "query transformed");
        Ok(())
    }

    /// Union of the group-by expressions the stages require.
    pub fn required_group_by(&self) -> HashSet<String> {
        self.stages
            .iter()
            .flat_map(|stage| stage.required_group_by())
            .collect()
    }

    /// Union of the group-by expressions the stages can exploit.
    pub fn optional_group_by(&self) -> HashSet<String> {
        self.stages
            .iter()
            .flat_map(|stage| stage.optional_group_by())
            .collect()
    }
}
