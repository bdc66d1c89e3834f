use chrono::Utc;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

const MAX_NAME_LEN: usize = 25;
const MAX_AUTHOR_LEN: usize = 20;
const MAX_DESCRIPTION_LEN: usize = 200;

static AUTHOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

/// A community bypass plugin: named sections of chat-filter bypass strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plugin {
    pub id: String,
    pub name: String,
    pub author: String,
    pub description: String,
    pub icon: String,
    // Insertion-ordered so sections render in the order the author wrote them
    pub sections: IndexMap<String, Vec<String>>,
    pub created_at: String,
    pub updated_at: String,
    pub uses: u64,
}

/// Client-supplied fields for creating or updating a plugin
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginDraft {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub sections: Option<IndexMap<String, Vec<String>>>,
}

impl PluginDraft {
    /// Normalize the author field: default, truncate, validate character class
    pub fn author_name(&self) -> Result<String, String> {
        let author: String = self
            .author
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or("Anonymous")
            .chars()
            .take(MAX_AUTHOR_LEN)
            .collect();

        if author != "Anonymous" && !AUTHOR_RE.is_match(&author) {
            return Err("Author name can only contain letters and numbers".to_string());
        }
        Ok(author)
    }
}

impl Plugin {
    /// Build a new plugin from a draft. Requires name and sections.
    pub fn from_draft(draft: &PluginDraft) -> Result<Self, String> {
        let name = draft.name.as_deref().unwrap_or_default();
        let sections = draft.sections.clone().unwrap_or_default();
        if name.is_empty() || sections.is_empty() {
            return Err("Missing required fields".to_string());
        }

        let now = Utc::now().to_rfc3339();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: truncate(name, MAX_NAME_LEN),
            author: draft.author_name()?,
            description: truncate(draft.description.as_deref().unwrap_or_default(), MAX_DESCRIPTION_LEN),
            icon: draft.icon.clone().unwrap_or_default(),
            sections,
            created_at: now.clone(),
            updated_at: now,
            uses: 0,
        })
    }

    /// Apply a draft to an existing plugin, keeping fields the draft omits
    pub fn apply_draft(&mut self, draft: &PluginDraft) -> Result<(), String> {
        self.author = draft.author_name()?;
        if let Some(ref name) = draft.name {
            self.name = truncate(name, MAX_NAME_LEN);
        }
        self.description = truncate(draft.description.as_deref().unwrap_or_default(), MAX_DESCRIPTION_LEN);
        self.icon = draft.icon.clone().unwrap_or_default();
        if let Some(ref sections) = draft.sections {
            self.sections = sections.clone();
        }
        self.updated_at = Utc::now().to_rfc3339();
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, author: Option<&str>) -> PluginDraft {
        let mut sections = IndexMap::new();
        sections.insert("General".to_string(), vec!["test".to_string()]);
        PluginDraft {
            name: Some(name.to_string()),
            author: author.map(|a| a.to_string()),
            description: None,
            icon: None,
            sections: Some(sections),
        }
    }

    #[test]
    fn create_requires_name_and_sections() {
        let empty = PluginDraft::default();
        assert!(Plugin::from_draft(&empty).is_err());

        let plugin = Plugin::from_draft(&draft("My Plugin", None)).unwrap();
        assert_eq!(plugin.author, "Anonymous");
        assert_eq!(plugin.uses, 0);
    }

    #[test]
    fn name_is_truncated() {
        let plugin = Plugin::from_draft(&draft("a very long plugin name that keeps going", None)).unwrap();
        assert_eq!(plugin.name.chars().count(), 25);
    }

    #[test]
    fn author_must_be_alphanumeric() {
        assert!(Plugin::from_draft(&draft("x", Some("good123"))).is_ok());
        assert!(Plugin::from_draft(&draft("x", Some("bad name!"))).is_err());
    }

    #[test]
    fn sections_keep_authoring_order() {
        let mut sections = IndexMap::new();
        sections.insert("Zeta".to_string(), vec!["z".to_string()]);
        sections.insert("Alpha".to_string(), vec!["a".to_string()]);
        let plugin = Plugin::from_draft(&PluginDraft {
            name: Some("ordered".to_string()),
            sections: Some(sections),
            ..Default::default()
        })
        .unwrap();

        let json = serde_json::to_string(&plugin).unwrap();
        let restored: Plugin = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = restored.sections.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn update_bumps_timestamp_only() {
        let mut plugin = Plugin::from_draft(&draft("x", None)).unwrap();
        let created = plugin.created_at.clone();
        plugin.apply_draft(&draft("renamed", Some("author1"))).unwrap();
        assert_eq!(plugin.name, "renamed");
        assert_eq!(plugin.author, "author1");
        assert_eq!(plugin.created_at, created);
    }
}
