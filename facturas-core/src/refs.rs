//! Project and category reference data.
//!
//! The maps are a snapshot: rebuilt wholesale whenever the reference
//! collections are reloaded, passed by reference into the normalizer, and
//! never mutated in between.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A project as served by the reference backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// An expense category as served by the reference backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub name: String,
}

/// Immutable id → name lookups used during normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceMaps {
    projects: HashMap<String, String>,
    categories: HashMap<String, String>,
}

impl ReferenceMaps {
    pub fn build(projects: &[Project], categories: &[Category]) -> Self {
        Self {
            projects: projects
                .iter()
                .map(|p| (p.id.clone(), p.name.clone()))
                .collect(),
            categories: categories
                .iter()
                .map(|c| (c.key.clone(), c.name.clone()))
                .collect(),
        }
    }

    pub fn project_name(&self, id: &str) -> Option<&str> {
        self.projects.get(id).map(String::as_str)
    }

    pub fn category_name(&self, key: &str) -> Option<&str> {
        self.categories.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_lookup() {
        let projects = vec![Project {
            id: "p-1".to_string(),
            name: "Obra Central".to_string(),
        }];
        let categories = vec![Category {
            key: "alimentacion".to_string(),
            name: "Alimentación".to_string(),
        }];
        let maps = ReferenceMaps::build(&projects, &categories);

        assert_eq!(maps.project_name("p-1"), Some("Obra Central"));
        assert_eq!(maps.category_name("alimentacion"), Some("Alimentación"));
        assert_eq!(maps.project_name("missing"), None);
        assert!(!maps.is_empty());
    }

    #[test]
    fn test_rebuild_replaces_snapshot() {
        let v1 = ReferenceMaps::build(
            &[Project { id: "p-1".to_string(), name: "Antiguo".to_string() }],
            &[],
        );
        let v2 = ReferenceMaps::build(
            &[Project { id: "p-1".to_string(), name: "Nuevo".to_string() }],
            &[],
        );
        assert_eq!(v1.project_name("p-1"), Some("Antiguo"));
        assert_eq!(v2.project_name("p-1"), Some("Nuevo"));
    }
}
