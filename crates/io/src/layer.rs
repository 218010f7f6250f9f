//! Named fields stored together in one file.

use delta_field::Field;

/// A named field, optionally belonging to one model.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Layer name, for instance `change` or `stippling`.
    pub name: String,
    /// Model the layer belongs to; `None` for ensemble-wide layers.
    pub model: Option<String>,
    /// The values.
    pub field: Field,
}

impl Layer {
    /// Creates an ensemble-wide layer.
    pub fn ensemble(name: impl Into<String>, field: Field) -> Self {
        Self {
            name: name.into(),
            model: None,
            field,
        }
    }

    /// Creates a layer for one model.
    pub fn per_model(name: impl Into<String>, model: impl Into<String>, field: Field) -> Self {
        Self {
            name: name.into(),
            model: Some(model.into()),
            field,
        }
    }
}
