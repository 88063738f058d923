// Aggregation pipeline - ordered group/lookup/match/project/sort/limit stages over documents

use serde_json::{Number, Value};
use std::collections::{HashMap, HashSet};

use crate::core::document::{compare_values, get_path};
use crate::core::{Document, EntityKind, ObjectId, ID_FIELD};
use crate::error::AppResult;
use crate::infrastructure::database::DatabaseInterface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Value at path equals the given value exactly
    Eq(String, Value),
    /// Value at path is a number >= the bound
    Gte(String, f64),
}

impl Predicate {
    fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::Eq(path, expected) => get_path(doc, path) == Some(expected),
            Predicate::Gte(path, bound) => get_path(doc, path)
                .and_then(Value::as_f64)
                .map(|n| n >= *bound)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Arithmetic mean of the numeric values at path; null when there are none
    Avg(String),
    /// Number of documents in the group
    Count,
    /// Value at path in the first document of the group
    First(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Include(String),
    /// Output `field` takes the value found at `from`
    Rename { field: String, from: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Vec<Predicate>),
    Group {
        key: String,
        accumulators: Vec<(String, Accumulator)>,
    },
    /// Joins documents of `from` whose `_id` equals the value at `local_field`,
    /// storing the matches as an array under `as_field`.
    Lookup {
        from: EntityKind,
        local_field: String,
        as_field: String,
    },
    Unwind(String),
    Project {
        fields: Vec<Projection>,
        exclude_id: bool,
    },
    Sort {
        field: String,
        order: SortOrder,
    },
    Limit(usize),
}

/// A pipeline reads every document of its source kind and feeds them through the stages in order.
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: EntityKind,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn on(source: EntityKind) -> Self {
        Self {
            source,
            stages: Vec::new(),
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn matching(self, predicates: Vec<Predicate>) -> Self {
        self.stage(Stage::Match(predicates))
    }

    pub fn group(self, key: &str, accumulators: Vec<(&str, Accumulator)>) -> Self {
        self.stage(Stage::Group {
            key: key.to_string(),
            accumulators: accumulators
                .into_iter()
                .map(|(name, acc)| (name.to_string(), acc))
                .collect(),
        })
    }

    pub fn lookup(self, from: EntityKind, local_field: &str, as_field: &str) -> Self {
        self.stage(Stage::Lookup {
            from,
            local_field: local_field.to_string(),
            as_field: as_field.to_string(),
        })
    }

    pub fn unwind(self, field: &str) -> Self {
        self.stage(Stage::Unwind(field.to_string()))
    }

    pub fn project(self, fields: Vec<Projection>, exclude_id: bool) -> Self {
        self.stage(Stage::Project { fields, exclude_id })
    }

    pub fn sort(self, field: &str, order: SortOrder) -> Self {
        self.stage(Stage::Sort {
            field: field.to_string(),
            order,
        })
    }

    pub fn limit(self, n: usize) -> Self {
        self.stage(Stage::Limit(n))
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub async fn run(&self, db: &dyn DatabaseInterface) -> AppResult<Vec<Document>> {
        let mut docs = db.find_all(self.source).await?;
        let input = docs.len();

        for stage in &self.stages {
            docs = match stage {
                Stage::Match(predicates) => docs
                    .into_iter()
                    .filter(|doc| predicates.iter().all(|p| p.matches(doc)))
                    .collect(),
                Stage::Group { key, accumulators } => group(docs, key, accumulators),
                Stage::Lookup {
                    from,
                    local_field,
                    as_field,
                } => lookup(db, docs, *from, local_field, as_field).await?,
                Stage::Unwind(field) => unwind(docs, field),
                Stage::Project { fields, exclude_id } => docs
                    .into_iter()
                    .map(|doc| project(&doc, fields, *exclude_id))
                    .collect(),
                Stage::Sort { field, order } => {
                    docs.sort_by(|a, b| {
                        let ord = compare_values(get_path(a, field), get_path(b, field));
                        match order {
                            SortOrder::Ascending => ord,
                            SortOrder::Descending => ord.reverse(),
                        }
                    });
                    docs
                }
                Stage::Limit(n) => {
                    docs.truncate(*n);
                    docs
                }
            };
        }

        tracing::debug!(
            source = %self.source,
            stages = self.stages.len(),
            input,
            output = docs.len(),
            "pipeline finished"
        );
        Ok(docs)
    }
}

struct GroupState {
    key: Value,
    count: i64,
    sums: Vec<(f64, i64)>,
    firsts: Vec<Value>,
}

// Groups come out in the order their key was first seen.
fn group(docs: Vec<Document>, key: &str, accumulators: &[(String, Accumulator)]) -> Vec<Document> {
    let mut order: Vec<GroupState> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for doc in &docs {
        let key_value = get_path(doc, key).cloned().unwrap_or(Value::Null);
        let slot = *index.entry(key_value.to_string()).or_insert_with(|| {
            order.push(GroupState {
                key: key_value.clone(),
                count: 0,
                sums: vec![(0.0, 0); accumulators.len()],
                firsts: accumulators
                    .iter()
                    .map(|(_, acc)| match acc {
                        Accumulator::First(path) => {
                            get_path(doc, path).cloned().unwrap_or(Value::Null)
                        }
                        _ => Value::Null,
                    })
                    .collect(),
            });
            order.len() - 1
        });

        let state = &mut order[slot];
        state.count += 1;
        for (i, (_, acc)) in accumulators.iter().enumerate() {
            if let Accumulator::Avg(path) = acc {
                if let Some(n) = get_path(doc, path).and_then(Value::as_f64) {
                    state.sums[i].0 += n;
                    state.sums[i].1 += 1;
                }
            }
        }
    }

    order
        .into_iter()
        .map(|state| {
            let mut out = Document::new();
            out.insert(ID_FIELD.to_string(), state.key);
            for (i, (name, acc)) in accumulators.iter().enumerate() {
                let value = match acc {
                    Accumulator::Avg(_) => {
                        let (sum, n) = state.sums[i];
                        if n == 0 {
                            Value::Null
                        } else {
                            Number::from_f64(sum / n as f64)
                                .map(Value::Number)
                                .unwrap_or(Value::Null)
                        }
                    }
                    Accumulator::Count => Value::Number(Number::from(state.count)),
                    Accumulator::First(_) => state.firsts[i].clone(),
                };
                out.insert(name.clone(), value);
            }
            out
        })
        .collect()
}

async fn lookup(
    db: &dyn DatabaseInterface,
    mut docs: Vec<Document>,
    from: EntityKind,
    local_field: &str,
    as_field: &str,
) -> AppResult<Vec<Document>> {
    let mut seen = HashSet::new();
    let ids: Vec<ObjectId> = docs
        .iter()
        .filter_map(|doc| get_path(doc, local_field)?.as_str()?.parse::<ObjectId>().ok())
        .filter(|id| seen.insert(*id))
        .collect();

    let foreign: HashMap<String, Document> = db
        .get_many(from, &ids)
        .await?
        .into_iter()
        .filter_map(|doc| {
            let id = doc.get(ID_FIELD)?.as_str()?.to_string();
            Some((id, doc))
        })
        .collect();

    for doc in &mut docs {
        // Only an identical identifier string joins; numbers never match a string id
        let matched: Vec<Value> = get_path(doc, local_field)
            .and_then(Value::as_str)
            .and_then(|id| foreign.get(id))
            .map(|found| vec![Value::Object(found.clone())])
            .unwrap_or_default();
        doc.insert(as_field.to_string(), Value::Array(matched));
    }

    Ok(docs)
}

// Missing, null and empty-array values drop the document.
fn unwind(docs: Vec<Document>, field: &str) -> Vec<Document> {
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        let items = match doc.get(field) {
            Some(Value::Array(items)) => items.clone(),
            None | Some(Value::Null) => continue,
            Some(_) => {
                out.push(doc);
                continue;
            }
        };
        for item in items {
            let mut copy = doc.clone();
            copy.insert(field.to_string(), item);
            out.push(copy);
        }
    }
    out
}

fn project(doc: &Document, fields: &[Projection], exclude_id: bool) -> Document {
    let mut out = Document::new();
    if !exclude_id {
        if let Some(id) = doc.get(ID_FIELD) {
            out.insert(ID_FIELD.to_string(), id.clone());
        }
    }
    for projection in fields {
        match projection {
            Projection::Include(field) => {
                if let Some(value) = get_path(doc, field) {
                    out.insert(field.clone(), value.clone());
                }
            }
            Projection::Rename { field, from } => {
                if let Some(value) = get_path(doc, from) {
                    out.insert(field.clone(), value.clone());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_group_keeps_first_seen_order_and_computes_mean() {
        let docs = vec![
            doc(json!({"movieId": "b", "rating": 5})),
            doc(json!({"movieId": "a", "rating": 4})),
            doc(json!({"movieId": "b", "rating": 2})),
            doc(json!({"movieId": "a", "rating": 2})),
        ];
        let grouped = group(
            docs,
            "movieId",
            &[
                ("avg".to_string(), Accumulator::Avg("rating".to_string())),
                ("count".to_string(), Accumulator::Count),
            ],
        );

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0]["_id"], json!("b"));
        assert_eq!(grouped[0]["avg"], json!(3.5));
        assert_eq!(grouped[1]["_id"], json!("a"));
        assert_eq!(grouped[1]["avg"], json!(3.0));
        assert_eq!(grouped[1]["count"], json!(2));
    }

    #[test]
    fn test_group_missing_key_forms_null_group() {
        let docs = vec![doc(json!({"rating": 1})), doc(json!({"movieId": null, "rating": 3}))];
        let grouped = group(docs, "movieId", &[("n".to_string(), Accumulator::Count)]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0]["_id"], Value::Null);
        assert_eq!(grouped[0]["n"], json!(2));
    }

    #[test]
    fn test_group_first_takes_first_document() {
        let docs = vec![
            doc(json!({"k": 1, "m": {"title": "Dune"}})),
            doc(json!({"k": 1, "m": {"title": "Other"}})),
        ];
        let grouped = group(
            docs,
            "k",
            &[("title".to_string(), Accumulator::First("m.title".to_string()))],
        );
        assert_eq!(grouped[0]["title"], json!("Dune"));
    }

    #[test]
    fn test_avg_without_numbers_is_null() {
        let docs = vec![doc(json!({"k": 1, "rating": "n/a"}))];
        let grouped = group(
            docs,
            "k",
            &[("avg".to_string(), Accumulator::Avg("rating".to_string()))],
        );
        assert_eq!(grouped[0]["avg"], Value::Null);
    }

    #[test]
    fn test_unwind_drops_empty_and_missing() {
        let docs = vec![
            doc(json!({"id": 1, "m": [{"t": "x"}]})),
            doc(json!({"id": 2, "m": []})),
            doc(json!({"id": 3})),
            doc(json!({"id": 4, "m": [{"t": "y"}, {"t": "z"}]})),
        ];
        let out = unwind(docs, "m");
        let ids: Vec<_> = out.iter().map(|d| d["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(4), json!(4)]);
        assert_eq!(out[0]["m"], json!({"t": "x"}));
    }

    #[test]
    fn test_predicates() {
        let d = doc(json!({"rating": 3, "movieData": {"genre": "Sci-Fi"}}));
        assert!(Predicate::Eq("movieData.genre".into(), json!("Sci-Fi")).matches(&d));
        assert!(!Predicate::Eq("movieData.genre".into(), json!("sci-fi")).matches(&d));
        assert!(Predicate::Gte("rating".into(), 3.0).matches(&d));
        assert!(!Predicate::Gte("rating".into(), 3.5).matches(&d));
        assert!(!Predicate::Gte("missing".into(), 0.0).matches(&d));
    }

    #[test]
    fn test_project_renames_and_drops_id() {
        let d = doc(json!({"_id": "x", "avg": 2.5, "movieData": {"title": "Alien"}}));
        let out = project(
            &d,
            &[
                Projection::Rename {
                    field: "title".into(),
                    from: "movieData.title".into(),
                },
                Projection::Include("avg".into()),
                Projection::Include("missing".into()),
            ],
            true,
        );
        assert_eq!(Value::Object(out), json!({"title": "Alien", "avg": 2.5}));
    }
}
