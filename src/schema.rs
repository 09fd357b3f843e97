//! Per-property fee vocabularies.
//!
//! Each property's bill CSV uses its own category names. A [`PropertySchema`]
//! records that vocabulary, the default selection the dashboard opens with,
//! and how the property's categories map onto another property's when the
//! two are compared.

use crate::error::BillError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Short key used on the command line.
    pub id: String,
    /// Display name used in titles.
    pub name: String,
    /// Inserted into series labels in cross-property mode.
    pub tag: String,
    /// CSV file name, resolved against the data directory.
    pub source: String,
    pub vocabulary: Vec<String>,
    #[serde(default)]
    pub default_categories: Vec<String>,
    /// Own category -> equivalent category of the compared property.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl PropertySchema {
    pub fn has_category(&self, category: &str) -> bool {
        self.vocabulary.iter().any(|c| c == category)
    }

    /// Default categories, or the whole vocabulary when none are configured.
    pub fn default_selection(&self) -> Vec<String> {
        if self.default_categories.is_empty() {
            self.vocabulary.clone()
        } else {
            self.default_categories.clone()
        }
    }

    pub fn validate(&self) -> Result<(), BillError> {
        let invalid = |reason: String| BillError::InvalidSchema {
            property: self.id.clone(),
            reason,
        };
        if self.id.trim().is_empty() || self.tag.trim().is_empty() {
            return Err(invalid("id and tag must not be empty".to_string()));
        }
        if self.vocabulary.is_empty() {
            return Err(invalid("vocabulary is empty".to_string()));
        }
        let mut seen = BTreeSet::new();
        for c in &self.vocabulary {
            if !seen.insert(c.as_str()) {
                return Err(invalid(format!("category `{}` listed twice", c)));
            }
        }
        if let Some(c) = self.default_categories.iter().find(|c| !self.has_category(c)) {
            return Err(invalid(format!("default category `{}` not in vocabulary", c)));
        }
        if let Some(c) = self.aliases.keys().find(|c| !self.has_category(c)) {
            return Err(invalid(format!("alias source `{}` not in vocabulary", c)));
        }
        Ok(())
    }
}

/// The set of properties a run knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    pub properties: Vec<PropertySchema>,
}

impl SchemaRegistry {
    pub fn get(&self, id: &str) -> Result<&PropertySchema, BillError> {
        self.properties
            .iter()
            .find(|p| p.id == id || p.name == id)
            .ok_or_else(|| BillError::UnknownProperty(id.to_string()))
    }

    pub fn validate(&self) -> Result<(), BillError> {
        let mut ids = BTreeSet::new();
        for p in &self.properties {
            p.validate()?;
            if !ids.insert(p.id.as_str()) {
                return Err(BillError::InvalidSchema {
                    property: p.id.clone(),
                    reason: "duplicate property id".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Read a registry from a JSON file of the form `{"properties": [...]}`.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path)?;
        let registry: SchemaRegistry = serde_json::from_str(&text)?;
        registry.validate()?;
        Ok(registry)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

static BUILTIN: Lazy<SchemaRegistry> = Lazy::new(|| SchemaRegistry {
    properties: vec![
        PropertySchema {
            id: "綠園".to_string(),
            name: "民生綠園".to_string(),
            tag: "綠園".to_string(),
            source: "綠園帳單.csv".to_string(),
            vocabulary: strings(&["電費", "水費", "瓦斯費"]),
            default_categories: Vec::new(),
            aliases: BTreeMap::from([("電費".to_string(), "純住宅電費".to_string())]),
        },
        PropertySchema {
            id: "奧斯卡".to_string(),
            name: "展昇奧斯卡".to_string(),
            tag: "奧斯卡".to_string(),
            source: "奧斯卡帳單.csv".to_string(),
            vocabulary: strings(&["總電費", "用電度數", "公共電費", "純住宅電費", "水費", "瓦斯費"]),
            default_categories: strings(&["總電費", "水費", "瓦斯費"]),
            aliases: BTreeMap::from([("純住宅電費".to_string(), "電費".to_string())]),
        },
    ],
});

/// The two properties the household tracks.
pub fn builtin() -> &'static SchemaRegistry {
    &BUILTIN
}
