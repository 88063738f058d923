// Ent Schema - declarative field definitions, casting and validation for stored documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::HashMap;

use crate::core::{format_timestamp, Document, EntityKind, ObjectId, CREATED_AT, UPDATED_AT};
use crate::error::{AppError, AppResult};

/// Schema definition trait implemented once per entity kind
pub trait EntSchema: Send + Sync {
    /// Entity kind this schema defines
    fn kind() -> EntityKind
    where
        Self: Sized;

    /// Define fields for this entity
    fn fields() -> Vec<FieldDefinition>
    where
        Self: Sized;

    /// Which timestamps the store maintains for this entity
    fn timestamps() -> Timestamps
    where
        Self: Sized,
    {
        Timestamps::None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub optional: bool,
    pub unique: bool,
    pub validators: Vec<FieldValidator>,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            optional: false,
            unique: false,
            validators: Vec::new(),
        }
    }

    /// Weak reference to another entity kind. References are always optional.
    pub fn reference(name: &str, target: EntityKind) -> Self {
        Self::new(name, FieldType::Reference(target)).optional()
    }

    /// Mark field as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark field as unique across all documents of the kind
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Add field validator
    pub fn validate(mut self, validator: FieldValidator) -> Self {
        self.validators.push(validator);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Int,
    Reference(EntityKind),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldValidator {
    /// Inclusive bounds for integer fields
    Range(i64, i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timestamps {
    None,
    CreatedOnly,
    CreatedAndUpdated,
}

/// Resolved schema for one kind
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub fields: Vec<FieldDefinition>,
    pub timestamps: Timestamps,
}

/// A cast and validated document ready for insertion, without its `_id`.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub document: Document,
    /// (field, value) pairs that must be unique within the kind
    pub unique_keys: Vec<(String, String)>,
}

impl EntitySchema {
    pub fn of<S: EntSchema>() -> Self {
        Self {
            kind: S::kind(),
            fields: S::fields(),
            timestamps: S::timestamps(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Target kind of a reference field, if `name` is one
    pub fn reference_target(&self, name: &str) -> Option<EntityKind> {
        match self.field(name)?.field_type {
            FieldType::Reference(target) => Some(target),
            _ => None,
        }
    }

    /// Casts `input` to the declared field types, drops undeclared fields, applies
    /// required/range validation and stamps the configured timestamps.
    /// All field errors are reported together.
    pub fn prepare(&self, input: &Document, now: DateTime<Utc>) -> AppResult<PreparedDocument> {
        let mut document = Document::new();
        let mut unique_keys = Vec::new();
        let mut errors = Vec::new();

        for field in &self.fields {
            let raw = match input.get(&field.name) {
                None | Some(Value::Null) => {
                    if !field.optional {
                        errors.push(format!(
                            "{}: Path `{}` is required.",
                            field.name, field.name
                        ));
                    }
                    continue;
                }
                Some(raw) => raw,
            };

            let value = match cast_value(field, raw) {
                Ok(value) => value,
                Err(message) => {
                    errors.push(format!("{}: {}", field.name, message));
                    continue;
                }
            };

            if let Some(message) = check_validators(field, &value) {
                errors.push(format!("{}: {}", field.name, message));
                continue;
            }

            if field.unique {
                let key = match &value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                unique_keys.push((field.name.clone(), key));
            }
            document.insert(field.name.clone(), value);
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(format!(
                "{} validation failed: {}",
                model_name(self.kind),
                errors.join(", ")
            )));
        }

        let stamp = Value::String(format_timestamp(now));
        match self.timestamps {
            Timestamps::None => {}
            Timestamps::CreatedOnly => {
                document.insert(CREATED_AT.to_string(), stamp);
            }
            Timestamps::CreatedAndUpdated => {
                document.insert(CREATED_AT.to_string(), stamp.clone());
                document.insert(UPDATED_AT.to_string(), stamp);
            }
        }

        Ok(PreparedDocument {
            document,
            unique_keys,
        })
    }
}

fn model_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "User",
        EntityKind::Movie => "Movie",
        EntityKind::Post => "Post",
        EntityKind::Review => "Review",
    }
}

fn cast_value(field: &FieldDefinition, raw: &Value) -> Result<Value, String> {
    match field.field_type {
        FieldType::String => match raw {
            Value::String(_) => Ok(raw.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(format!(
                "Cast to string failed for value {} at path \"{}\"",
                other, field.name
            )),
        },
        FieldType::Int => {
            let cast = match raw {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            cast.map(|i| Value::Number(Number::from(i))).ok_or_else(|| {
                format!(
                    "Cast to Number failed for value {} at path \"{}\"",
                    raw, field.name
                )
            })
        }
        FieldType::Reference(_) => match raw {
            Value::String(s) => s
                .parse::<ObjectId>()
                .map(|id| Value::String(id.to_hex()))
                .map_err(|_| {
                    format!(
                        "Cast to ObjectId failed for value {} at path \"{}\"",
                        raw, field.name
                    )
                }),
            other => Err(format!(
                "Cast to ObjectId failed for value {} at path \"{}\"",
                other, field.name
            )),
        },
    }
}

fn check_validators(field: &FieldDefinition, value: &Value) -> Option<String> {
    for validator in &field.validators {
        match validator {
            FieldValidator::Range(min, max) => {
                let n = value.as_i64()?;
                if n < *min {
                    return Some(format!(
                        "Path `{}` ({}) is less than minimum allowed value ({}).",
                        field.name, n, min
                    ));
                }
                if n > *max {
                    return Some(format!(
                        "Path `{}` ({}) is more than maximum allowed value ({}).",
                        field.name, n, max
                    ));
                }
            }
        }
    }
    None
}

/// Schema registry - holds all defined schemas
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<EntityKind, EntitySchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: EntSchema + 'static>(&mut self) {
        let schema = EntitySchema::of::<T>();
        self.schemas.insert(schema.kind, schema);
    }

    pub fn get(&self, kind: EntityKind) -> AppResult<&EntitySchema> {
        self.schemas
            .get(&kind)
            .ok_or_else(|| AppError::Internal(format!("No schema registered for {}", kind)))
    }

    /// Validate schema consistency
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (kind, schema) in &self.schemas {
            for field in &schema.fields {
                if let FieldType::Reference(target) = field.field_type {
                    if !self.schemas.contains_key(&target) {
                        errors.push(format!(
                            "Entity {} has reference '{}' pointing to undefined entity {}",
                            kind, field.name, target
                        ));
                    }
                    if field.unique {
                        errors.push(format!(
                            "Reference '{}' on {} cannot be unique",
                            field.name, kind
                        ));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
