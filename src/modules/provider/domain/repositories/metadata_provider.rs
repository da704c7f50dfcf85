use async_trait::async_trait;

use crate::modules::catalog::domain::value_objects::{EntityKind, MalId};
use crate::modules::provider::domain::{entities::ForeignPayload, value_objects::UpstreamSearch};
use crate::shared::errors::UpstreamResult;

/// Third-party catalog the resolver falls back to.
///
/// Implementations must report a verified absence as
/// [`UpstreamError::NotFound`](crate::shared::errors::UpstreamError::NotFound)
/// and everything else as one of the transient variants.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn get_entity(&self, kind: EntityKind, id: MalId) -> UpstreamResult<ForeignPayload>;

    async fn search(
        &self,
        kind: EntityKind,
        search: &UpstreamSearch,
    ) -> UpstreamResult<Vec<ForeignPayload>>;

    fn name(&self) -> &str {
        "upstream"
    }
}
