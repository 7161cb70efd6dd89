//! Model table: resolves model names to their converters.
use indexmap::IndexMap;
use tracing::debug;

use crate::conversion::{Conversion, FieldDecl, ModelOf};
use crate::error::SchemaError;

/// Every model a [`Conversion`] can resolve, in registration order.
///
/// Models may refer to one another (and to themselves) by name before the
/// target is registered; [`Registry::validate`] checks the references once
/// the table is complete.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    models: IndexMap<String, ModelOf>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the model's properties and add it to the table.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDecl>,
    ) -> Result<&ModelOf, SchemaError> {
        let name = name.into();
        if self.models.contains_key(&name) {
            return Err(SchemaError::DuplicateModel(name));
        }
        let model = ModelOf::new(name.clone(), fields)?;
        debug!(model = %name, properties = model.properties().len(), "registered model");
        let (index, _) = self.models.insert_full(name, model);
        Ok(&self.models[index])
    }

    pub fn get(&self, name: &str) -> Option<&ModelOf> {
        self.models.get(name)
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelOf> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn conversion(&self) -> Conversion<'_> {
        Conversion::new(self)
    }

    /// Every model reference inside a property type must name a registered
    /// model.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut refs = Vec::new();
        for model in self.models.values() {
            for (field, info) in model.properties() {
                refs.clear();
                info.ty.model_refs(&mut refs);
                if let Some(target) = refs.iter().find(|r| !self.models.contains_key(**r)) {
                    return Err(SchemaError::UnknownModel {
                        model: model.name().to_string(),
                        field: field.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
