use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::graph::SchemaGraph;
use crate::config::BranchConfig;
use crate::error::{Error, Result};
use crate::types::{LineageId, SchemaId};

/// Publication state of one schema version.
///
/// A version leaves `Draft` once. `Withdrawn` is a published version that a later
/// publish switched off; it stays read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Draft,
    Published,
    Withdrawn,
}

/// One versioned snapshot of a process graph.
#[derive(Debug, Clone)]
pub struct Schema {
    id: SchemaId,
    lineage: LineageId,
    name: String,
    version: u32,
    version_label: Option<String>,
    status: VersionStatus,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
    graph: SchemaGraph,
}

/// Listing row for a schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    pub id: SchemaId,
    pub lineage: LineageId,
    pub name: String,
    pub version: u32,
    pub version_label: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Schema {
    /// First version of a new lineage.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_branches(name, BranchConfig::default())
    }

    pub fn with_branches(name: impl Into<String>, branches: BranchConfig) -> Self {
        let id = SchemaId::new();
        Self {
            id,
            lineage: LineageId::new(),
            name: name.into(),
            version: 1,
            version_label: None,
            status: VersionStatus::Draft,
            created_at: Utc::now(),
            published_at: None,
            graph: SchemaGraph::with_branches(id, branches),
        }
    }

    /// Next draft of the same lineage, owning an already rehomed graph.
    pub(crate) fn next_version(&self, graph: SchemaGraph) -> Self {
        Self {
            id: graph.schema_id(),
            lineage: self.lineage,
            name: self.name.clone(),
            version: self.version + 1,
            version_label: None,
            status: VersionStatus::Draft,
            created_at: Utc::now(),
            published_at: None,
            graph,
        }
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn lineage(&self) -> LineageId {
        self.lineage
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn version_label(&self) -> Option<&str> {
        self.version_label.as_deref()
    }

    pub fn status(&self) -> VersionStatus {
        self.status
    }

    pub fn is_published(&self) -> bool {
        self.status == VersionStatus::Published
    }

    pub fn is_draft(&self) -> bool {
        self.status == VersionStatus::Draft
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    /// Mutable graph access; only drafts can be edited in place.
    pub fn graph_mut(&mut self) -> Result<&mut SchemaGraph> {
        if !self.is_draft() {
            return Err(Error::VersionImmutable(self.id));
        }
        Ok(&mut self.graph)
    }

    pub fn set_version_label<T: Into<String>>(&mut self, label: Option<T>) -> Result<()> {
        if !self.is_draft() {
            return Err(Error::VersionImmutable(self.id));
        }
        self.version_label = label.map(Into::into);
        Ok(())
    }

    pub fn summary(&self) -> SchemaSummary {
        SchemaSummary {
            id: self.id,
            lineage: self.lineage,
            name: self.name.clone(),
            version: self.version,
            version_label: self.version_label.clone(),
            is_published: self.is_published(),
            created_at: self.created_at,
            published_at: self.published_at,
        }
    }

    pub(crate) fn mark_published(&mut self, at: DateTime<Utc>) {
        self.status = VersionStatus::Published;
        self.published_at = Some(at);
    }

    pub(crate) fn mark_withdrawn(&mut self) {
        if self.status == VersionStatus::Published {
            self.status = VersionStatus::Withdrawn;
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Schema, VersionStatus};
    use crate::error::Error;

    #[test]
    fn new_schema_is_first_draft() {
        let schema = Schema::new("Onboarding");
        assert_eq!(schema.version(), 1);
        assert_eq!(schema.status(), VersionStatus::Draft);
        assert_eq!(schema.graph().schema_id(), schema.id());
        assert!(!schema.summary().is_published);
    }

    #[test]
    fn published_schema_rejects_edits() {
        let mut schema = Schema::new("Onboarding");
        schema.mark_published(Utc::now());
        assert!(matches!(schema.graph_mut(), Err(Error::VersionImmutable(_))));
        assert!(schema.set_version_label(Some("v1")).is_err());

        schema.mark_withdrawn();
        assert_eq!(schema.status(), VersionStatus::Withdrawn);
        assert!(schema.graph_mut().is_err());
    }
}
