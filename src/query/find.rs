// Direct reads - find with sort, limit, reference expansion and field selection

use futures::future::try_join_all;
use serde_json::Value;
use std::collections::HashMap;

use crate::core::document::{compare_values, get_path};
use crate::core::{Document, EntityKind, ObjectId, ID_FIELD};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::query::pipeline::SortOrder;
use crate::query::selection::Selection;

/// Replace the identifier stored at `path` with the referenced document,
/// optionally narrowed by `select`.
#[derive(Debug, Clone)]
pub struct Populate {
    pub path: String,
    pub select: Option<Selection>,
}

/// Builder for a read over one kind. Stages apply in a fixed order:
/// sort, limit, populate, then select. Sort ties are broken by `_id` in the
/// same direction.
#[derive(Debug, Clone)]
pub struct FindQuery {
    kind: EntityKind,
    sort: Option<(String, SortOrder)>,
    limit: Option<usize>,
    populate: Vec<Populate>,
    select: Option<Selection>,
}

impl FindQuery {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            sort: None,
            limit: None,
            populate: Vec::new(),
            select: None,
        }
    }

    pub fn populate(mut self, path: &str) -> Self {
        self.populate.push(Populate {
            path: path.to_string(),
            select: None,
        });
        self
    }

    pub fn populate_select(mut self, path: &str, select: Selection) -> Self {
        self.populate.push(Populate {
            path: path.to_string(),
            select: Some(select),
        });
        self
    }

    pub fn select(mut self, select: Selection) -> Self {
        self.select = Some(select);
        self
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = Some((field.to_string(), order));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub async fn exec(&self, db: &dyn DatabaseInterface) -> AppResult<Vec<Document>> {
        let mut docs = db.find_all(self.kind).await?;

        if let Some((field, order)) = &self.sort {
            // Equal keys fall back to `_id`, which follows creation order
            docs.sort_by(|a, b| {
                let ord = compare_values(get_path(a, field), get_path(b, field))
                    .then_with(|| compare_values(a.get(ID_FIELD), b.get(ID_FIELD)));
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }

        if let Some(n) = self.limit {
            docs.truncate(n);
        }

        if !self.populate.is_empty() {
            let lookups = try_join_all(
                self.populate
                    .iter()
                    .map(|spec| self.resolve_targets(db, spec, &docs)),
            )
            .await?;

            for (spec, targets) in self.populate.iter().zip(lookups) {
                for doc in &mut docs {
                    expand(doc, &spec.path, &targets);
                }
            }
        }

        if let Some(selection) = &self.select {
            docs = docs.into_iter().map(|doc| selection.apply(doc)).collect();
        }

        Ok(docs)
    }

    /// Fetches every document referenced through `spec.path`, keyed by its hex id.
    async fn resolve_targets(
        &self,
        db: &dyn DatabaseInterface,
        spec: &Populate,
        docs: &[Document],
    ) -> AppResult<HashMap<String, Document>> {
        let target = db
            .schemas()
            .get(self.kind)?
            .reference_target(&spec.path)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Cannot populate path `{}` because it is not a reference on {}",
                    spec.path, self.kind
                ))
            })?;

        let mut ids: Vec<ObjectId> = docs
            .iter()
            .filter_map(|doc| doc.get(&spec.path)?.as_str()?.parse().ok())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let found = db.get_many(target, &ids).await?;
        Ok(found
            .into_iter()
            .filter_map(|doc| {
                let id = doc.get(ID_FIELD)?.as_str()?.to_string();
                let doc = match &spec.select {
                    Some(selection) => selection.apply(doc),
                    None => doc,
                };
                Some((id, doc))
            })
            .collect())
    }
}

// A present reference becomes the target document, or null when the target is gone.
fn expand(doc: &mut Document, path: &str, targets: &HashMap<String, Document>) {
    let Some(current) = doc.get(path) else {
        return;
    };
    let replacement = current
        .as_str()
        .and_then(|id| targets.get(id))
        .map(|found| Value::Object(found.clone()))
        .unwrap_or(Value::Null);
    doc.insert(path.to_string(), replacement);
}

/// Every document of `kind` with `reference_field` expanded, optionally narrowed to
/// `projection` on the referenced side.
pub async fn find_with_reference_expansion(
    db: &dyn DatabaseInterface,
    kind: EntityKind,
    reference_field: &str,
    projection: Option<Selection>,
) -> AppResult<Vec<Document>> {
    let query = match projection {
        Some(selection) => FindQuery::new(kind).populate_select(reference_field, selection),
        None => FindQuery::new(kind).populate(reference_field),
    };
    query.exec(db).await
}
