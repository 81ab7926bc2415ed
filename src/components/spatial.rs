use serde::{Deserialize, Serialize};

use crate::core::types::GridPos;

/// Presence means "placed in the world". Items in hands or containers
/// carry no position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn grid(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }
}

impl From<GridPos> for Position {
    fn from(pos: GridPos) -> Self {
        Self { x: pos.x, y: pos.y }
    }
}

/// Display name plus extra words a player can use to refer to the entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub keywords: Vec<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keywords: Vec::new(),
        }
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
        self
    }

    /// True if `word` is a prefix of any word in the name or a keyword
    pub fn matches(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        if word.is_empty() {
            return false;
        }
        self.name
            .to_lowercase()
            .split_whitespace()
            .chain(self.keywords.iter().map(String::as_str))
            .any(|candidate| candidate.starts_with(&word))
    }
}

/// A fixed exit that moves whoever enters it to another room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    pub name: String,
    pub destination: GridPos,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_matches_name_prefix() {
        let id = Identity::new("a scarred goblin");
        assert!(id.matches("gob"));
        assert!(id.matches("Scarred"));
        assert!(!id.matches("orc"));
        assert!(!id.matches(""));
    }

    #[test]
    fn test_identity_matches_keywords() {
        let id = Identity::new("Grizzled Raider").with_keywords(&["Bandit"]);
        assert!(id.matches("bandit"));
    }
}
