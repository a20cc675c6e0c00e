use std::collections::HashMap;
use crate::analysis::analyzer::Analyzer;
use crate::core::config::{Config, FieldConfig};
use crate::core::types::FieldId;

/// A field known to one built index
pub struct FieldEntry {
    pub id: FieldId,
    pub name: String,
    pub config: FieldConfig,
    pub analyzer: Analyzer,
}

/// Per-field analyzer dispatch table.
///
/// Field names are resolved to a dense `FieldId` once per build; indexing then
/// dispatches on the id instead of looking analyzers up by name.
pub struct Schema {
    fields: Vec<FieldEntry>,
    by_name: HashMap<String, FieldId>,
    default_config: FieldConfig,
    default_analyzer: Analyzer,
}

impl Schema {
    /// Configured fields get ids first, in name order
    pub fn from_config(config: &Config) -> Self {
        let mut schema = Schema {
            fields: Vec::new(),
            by_name: HashMap::new(),
            default_config: config.default_field.clone(),
            default_analyzer: Analyzer::from_config(&config.default_field),
        };
        for (name, field) in &config.fields {
            if schema.insert(name, field.clone()).is_none() {
                break;
            }
        }
        schema
    }

    /// `None` once every `FieldId` is taken
    fn insert(&mut self, name: &str, config: FieldConfig) -> Option<FieldId> {
        let id = FieldId(u32::try_from(self.fields.len()).ok()?);
        self.fields.push(FieldEntry {
            id,
            name: name.to_string(),
            analyzer: Analyzer::from_config(&config),
            config,
        });
        self.by_name.insert(name.to_string(), id);
        Some(id)
    }

    /// Look up a field, registering it with the default configuration when unseen.
    /// `None` when the schema has no id left for a new field.
    pub fn resolve_or_insert(&mut self, name: &str) -> Option<FieldId> {
        match self.by_name.get(name) {
            Some(id) => Some(*id),
            None => {
                let config = self.default_config.clone();
                self.insert(name, config)
            }
        }
    }

    pub fn resolve(&self, name: &str) -> Option<FieldId> {
        self.by_name.get(name).copied()
    }

    pub fn field(&self, id: FieldId) -> &FieldEntry {
        &self.fields[id.index()]
    }

    pub fn field_name(&self, id: FieldId) -> &str {
        &self.fields[id.index()].name
    }

    pub fn analyzer(&self, id: FieldId) -> &Analyzer {
        &self.fields[id.index()].analyzer
    }

    /// Analyzer for a field name, falling back to the default for unknown fields
    pub fn analyzer_for(&self, name: &str) -> &Analyzer {
        match self.resolve(name) {
            Some(id) => self.analyzer(id),
            None => &self.default_analyzer,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldEntry> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_fields_resolve_in_name_order() {
        let config = Config::default()
            .with_field("titolo", FieldConfig::whitespace())
            .with_field("contenuto", FieldConfig::standard().with_stopwords(["dei"]));
        let mut schema = Schema::from_config(&config);

        assert_eq!(schema.resolve("contenuto"), Some(FieldId(0)));
        assert_eq!(schema.resolve("titolo"), Some(FieldId(1)));
        assert_eq!(schema.resolve("data"), None);

        let data = schema.resolve_or_insert("data").unwrap();
        assert_eq!(data, FieldId(2));
        assert_eq!(schema.resolve_or_insert("data"), Some(data));
        assert_eq!(schema.field_name(data), "data");
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn unknown_fields_use_default_analyzer() {
        let schema = Schema::from_config(&Config::default());
        assert_eq!(schema.analyzer_for("anything").terms("Data Scientist"), vec!["data", "scientist"]);
    }
}
