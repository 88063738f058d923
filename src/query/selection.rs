// Field selection - `"title content user -_id"` style projections for direct reads

use std::str::FromStr;

use crate::core::{Document, ID_FIELD};
use crate::error::AppError;

/// Names are inclusions, `-name` are exclusions. Inclusions and exclusions only mix
/// when the exclusion is `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Selection {
    fn excludes_field(&self, field: &str) -> bool {
        self.exclude.iter().any(|f| f == field)
    }

    /// Keeps document order. `_id` survives an inclusion projection unless excluded.
    pub fn apply(&self, doc: Document) -> Document {
        if self.include.is_empty() {
            return doc
                .into_iter()
                .filter(|(key, _)| !self.excludes_field(key))
                .collect();
        }

        doc.into_iter()
            .filter(|(key, _)| {
                if key == ID_FIELD {
                    !self.excludes_field(ID_FIELD)
                } else {
                    self.include.iter().any(|f| f == key)
                }
            })
            .collect()
    }
}

impl FromStr for Selection {
    type Err = AppError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut selection = Selection::default();
        for token in spec.split_whitespace() {
            match token.strip_prefix('-') {
                Some("") => {
                    return Err(AppError::Validation(format!(
                        "Invalid field selection: {:?}",
                        spec
                    )))
                }
                Some(field) => selection.exclude.push(field.to_string()),
                None => selection.include.push(token.to_string()),
            }
        }

        let mixes = !selection.include.is_empty()
            && selection.exclude.iter().any(|f| f != ID_FIELD);
        if mixes {
            return Err(AppError::Validation(
                "Projection cannot have a mix of inclusion and exclusion.".to_string(),
            ));
        }

        Ok(selection)
    }
}
