use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{AggregateRow, AggregationRequest};

/// Executes read-only aggregations against the warehouse.
///
/// Implementations return one row per group (or a single row when the
/// request is not grouped). Any error is treated by callers as the data
/// source being unavailable.
#[async_trait]
pub trait AggregationSource: Send + Sync {
    async fn aggregate(&self, request: &AggregationRequest) -> Result<Vec<AggregateRow>>;
}

#[async_trait]
impl<S: AggregationSource + ?Sized> AggregationSource for std::sync::Arc<S> {
    async fn aggregate(&self, request: &AggregationRequest) -> Result<Vec<AggregateRow>> {
        (**self).aggregate(request).await
    }
}
