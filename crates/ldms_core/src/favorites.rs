//! Favoritos do usuário (`users/{uid}/favorites`).

use serde_json::Value;
use std::collections::BTreeSet;

/// Escrita a ser feita no backend após um toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteChange {
    /// Gravar `true` em `favorites/{name}`
    Add(String),
    /// Remover `favorites/{name}`
    Remove(String),
}

/// Conjunto de nós favoritos de um usuário.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Favorites {
    names: BTreeSet<String>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrói a partir do documento `favorites` (nome → bool).
    ///
    /// Toda chave presente conta como favorito, qualquer que seja o valor.
    pub fn from_document(doc: &Value) -> Self {
        let names = match doc {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => BTreeSet::new(),
        };
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Decide a escrita de um toggle. O conjunto local não muda: o backend
    /// continua sendo a fonte da verdade.
    pub fn toggle(&self, name: &str) -> FavoriteChange {
        if self.contains(name) {
            FavoriteChange::Remove(name.to_string())
        } else {
            FavoriteChange::Add(name.to_string())
        }
    }

    /// Aplica localmente uma escrita já confirmada.
    pub fn apply(&mut self, change: &FavoriteChange) {
        match change {
            FavoriteChange::Add(name) => {
                self.names.insert(name.clone());
            }
            FavoriteChange::Remove(name) => {
                self.names.remove(name);
            }
        }
    }
}

impl FromIterator<String> for Favorites {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_present_are_favorites() {
        let favs = Favorites::from_document(&json!({"node_1": true, "node_3": false}));
        assert!(favs.contains("node_1"));
        assert!(favs.contains("node_3"));
        assert!(!favs.contains("node_2"));
        assert_eq!(favs.len(), 2);
    }

    #[test]
    fn null_document_is_empty() {
        assert!(Favorites::from_document(&Value::Null).is_empty());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut favs = Favorites::new();
        let change = favs.toggle("node_7");
        assert_eq!(change, FavoriteChange::Add("node_7".into()));
        favs.apply(&change);
        assert!(favs.contains("node_7"));

        let change = favs.toggle("node_7");
        assert_eq!(change, FavoriteChange::Remove("node_7".into()));
        favs.apply(&change);
        assert!(favs.is_empty());
    }
}
