//! Static script catalog with search

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::errors::StorageError;

/// One distributed script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    pub game: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub key_required: bool,
    #[serde(default)]
    pub loader: String,
}

pub struct ScriptCatalog {
    scripts: Vec<Script>,
}

impl ScriptCatalog {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self { scripts }
    }

    /// Load the catalog from a JSON file. Missing file means empty catalog.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("Script catalog {} not found, starting empty", path.display());
            return Ok(Self::new(Vec::new()));
        }
        let content = std::fs::read_to_string(path)?;
        let scripts = serde_json::from_str(&content)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self::new(scripts))
    }

    /// Case-insensitive substring search over title and game
    pub fn search(&self, query: &str) -> Vec<Script> {
        if query.is_empty() {
            return self.scripts.clone();
        }
        let query = query.to_lowercase();
        self.scripts
            .iter()
            .filter(|s| {
                s.title.to_lowercase().contains(&query) || s.game.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ScriptCatalog {
        ScriptCatalog::new(vec![
            Script {
                title: "Auto Farm".to_string(),
                game: "Blade Ball".to_string(),
                description: String::new(),
                key_required: true,
                loader: String::new(),
            },
            Script {
                title: "Aimbot".to_string(),
                game: "Arsenal".to_string(),
                description: String::new(),
                key_required: false,
                loader: String::new(),
            },
        ])
    }

    #[test]
    fn empty_query_returns_everything() {
        assert_eq!(catalog().search("").len(), 2);
    }

    #[test]
    fn search_matches_title_or_game_case_insensitive() {
        let catalog = catalog();
        assert_eq!(catalog.search("blade").len(), 1);
        assert_eq!(catalog.search("AIM").len(), 1);
        assert_eq!(catalog.search("nothing").len(), 0);
    }
}
