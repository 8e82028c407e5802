//! Extraction templates for xtract
//!
//! A template maps a key such as `soap_en` to an ordered list of fields, each with the
//! natural-language instructions handed to the extraction prompt. The built-in table is
//! assembled once per process and never mutated.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use xtract_utils::error::XtractError;

/// Key under which the request identifier is echoed in every response
pub const RESERVED_FIELD: &str = "request_id";

/// Built-in template definitions: `(template key, [(field, instructions)])`
const BUILTIN_TEMPLATES: &[(&str, &[(&str, &str)])] = &[(
    "soap_en",
    &[
        (
            "complain",
            "Patient complains. A summary of patient's health complains, issues or disturbing \
             health conditions experienced by the patient.",
        ),
        (
            "prescription",
            "Doctor prescription. A summary of treatments or procedures or medications \
             prescribed by the doctor to address the patient complaints.",
        ),
    ],
)];

static BUILTIN: Lazy<TemplateRegistry> = Lazy::new(|| {
    TemplateRegistry::from_definitions(BUILTIN_TEMPLATES)
        .expect("built-in template table is statically valid")
});

/// Errors raised while assembling a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template '{template}' declares reserved field name '{field}'")]
    ReservedField { template: String, field: String },

    #[error("template '{template}' declares field '{field}' more than once")]
    DuplicateField { template: String, field: String },

    #[error("template '{template}' declares no fields")]
    Empty { template: String },

    #[error("template '{template}' is defined more than once")]
    DuplicateTemplate { template: String },
}

/// One extractable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub instructions: &'static str,
}

/// A named, ordered set of fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl Template {
    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }
}

/// Read-only lookup from template key to [`Template`]
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<&'static str, Template>,
}

impl TemplateRegistry {
    /// The process-wide built-in registry
    #[must_use]
    pub fn builtin() -> &'static TemplateRegistry {
        &BUILTIN
    }

    /// Build a registry from static definitions.
    ///
    /// # Errors
    ///
    /// Rejects templates without fields, duplicate template keys, duplicate field names
    /// and any field named [`RESERVED_FIELD`].
    pub fn from_definitions(
        definitions: &[(&'static str, &'static [(&'static str, &'static str)])],
    ) -> Result<Self, TemplateError> {
        let mut templates = BTreeMap::new();

        for &(name, fields) in definitions {
            if fields.is_empty() {
                return Err(TemplateError::Empty {
                    template: name.to_string(),
                });
            }

            let mut specs: Vec<FieldSpec> = Vec::with_capacity(fields.len());
            for &(field, instructions) in fields {
                if field == RESERVED_FIELD {
                    return Err(TemplateError::ReservedField {
                        template: name.to_string(),
                        field: field.to_string(),
                    });
                }
                if specs.iter().any(|spec| spec.name == field) {
                    return Err(TemplateError::DuplicateField {
                        template: name.to_string(),
                        field: field.to_string(),
                    });
                }
                specs.push(FieldSpec { name: field, instructions });
            }

            let template = Template { name, fields: specs };
            if templates.insert(name, template).is_some() {
                return Err(TemplateError::DuplicateTemplate {
                    template: name.to_string(),
                });
            }
        }

        Ok(Self { templates })
    }

    /// Look up a template by key.
    ///
    /// # Errors
    ///
    /// Returns `XtractError::UnknownTemplate` listing the registered keys.
    pub fn get(&self, name: &str) -> Result<&Template, XtractError> {
        self.templates
            .get(name)
            .ok_or_else(|| XtractError::UnknownTemplate {
                template: name.to_string(),
                available: self.names().into_iter().map(str::to_string).collect(),
            })
    }

    /// Registered template keys in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.templates.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }
}
