//! Verificação do layout de dados no backend.
//!
//! Confere se os nós `node_*` do documento raiz carregam os campos que o
//! dashboard usa e se a árvore `users` existe.

use crate::repository::NODE_KEY_PREFIX;
use crate::types::SensorData;
use serde_json::Value;
use std::fmt;

/// Campos exigidos em cada nó (nomes do backend).
pub const REQUIRED_FIELDS: [&str; 6] = [
    "nodeName",
    "latitude",
    "longitude",
    "tilt",
    "rain",
    "soilMoisture",
];

/// Resultado da verificação de um nó.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCheck {
    pub key: String,
    /// Campos ausentes
    pub missing: Vec<&'static str>,
    /// Erro de decodificação, se houver
    pub error: Option<String>,
}

impl NodeCheck {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.error.is_none()
    }
}

/// Relatório de uma verificação completa.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub nodes: Vec<NodeCheck>,
    pub users_present: bool,
}

impl ValidationReport {
    /// Ao menos um nó e todos válidos.
    pub fn passed(&self) -> bool {
        !self.nodes.is_empty() && self.nodes.iter().all(NodeCheck::is_valid)
    }

    pub fn valid_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_valid()).count()
    }
}

/// Verifica um único nó. `None` = nó inexistente.
pub fn validate_node(key: &str, value: Option<&Value>) -> NodeCheck {
    let mut check = NodeCheck {
        key: key.to_string(),
        missing: Vec::new(),
        error: None,
    };

    let Some(value) = value.filter(|v| !v.is_null()) else {
        check.error = Some("nó não encontrado".into());
        return check;
    };

    if let Err(e) = serde_json::from_value::<SensorData>(value.clone()) {
        check.error = Some(e.to_string());
        return check;
    }

    check.missing = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| value.get(*field).is_none_or(Value::is_null))
        .collect();
    check
}

/// Verifica o documento raiz do banco.
pub fn validate_snapshot(root: &Value) -> ValidationReport {
    let Value::Object(children) = root else {
        return ValidationReport::default();
    };

    let nodes = children
        .iter()
        .filter(|(key, _)| key.starts_with(NODE_KEY_PREFIX))
        .map(|(key, value)| validate_node(key, Some(value)))
        .collect();

    ValidationReport {
        nodes,
        users_present: children.get("users").is_some_and(|u| !u.is_null()),
    }
}

/// Verifica o banco inteiro, com os nós sob `nodes_path` e `users` na raiz.
///
/// Sem nada em `nodes_path`, procura os nós na própria raiz.
pub fn validate_database(root: &Value, nodes_path: &str) -> ValidationReport {
    let pointer = format!("/{}", nodes_path.trim_matches('/'));
    let nodes = root
        .pointer(&pointer)
        .filter(|v| v.is_object())
        .unwrap_or(root);
    let mut report = validate_snapshot(nodes);
    report.users_present = root.get("users").is_some_and(|u| !u.is_null());
    report
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nós encontrados: {}", self.nodes.len())?;
        for node in &self.nodes {
            if node.is_valid() {
                writeln!(f, "  ✓ {}", node.key)?;
            } else if let Some(err) = &node.error {
                writeln!(f, "  ✗ {}: {err}", node.key)?;
            } else {
                writeln!(f, "  ✗ {}: faltando {}", node.key, node.missing.join(", "))?;
            }
        }
        writeln!(
            f,
            "Árvore users: {}",
            if self.users_present { "presente" } else { "ausente" }
        )?;
        write!(
            f,
            "Resultado: {} ({}/{} válidos)",
            if self.passed() { "OK" } else { "FALHOU" },
            self.valid_count(),
            self.nodes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_node(name: &str) -> Value {
        json!({
            "nodeName": name,
            "latitude": 7.29,
            "longitude": 80.63,
            "tilt": 3.0,
            "rain": 0.0,
            "soilMoisture": 40.0
        })
    }

    #[test]
    fn complete_snapshot_passes() {
        let root = json!({
            "node_1": full_node("node_1"),
            "node_2": full_node("node_2"),
            "users": {"u1": {"favorites": {"node_1": true}}}
        });
        let report = validate_snapshot(&root);
        assert!(report.passed());
        assert!(report.users_present);
        assert_eq!(report.valid_count(), 2);
        assert!(report.to_string().contains("Resultado: OK (2/2"));
    }

    #[test]
    fn missing_fields_are_listed() {
        let root = json!({ "node_1": {"nodeName": "node_1", "tilt": 2.0} });
        let report = validate_snapshot(&root);
        assert!(!report.passed());
        assert!(!report.users_present);
        assert_eq!(
            report.nodes[0].missing,
            ["latitude", "longitude", "rain", "soilMoisture"]
        );
    }

    #[test]
    fn wrong_types_are_errors() {
        let check = validate_node("node_9", Some(&json!({"tilt": "steep"})));
        assert!(check.error.is_some());
        assert!(!check.is_valid());
    }

    #[test]
    fn empty_or_absent() {
        assert!(!validate_snapshot(&Value::Null).passed());
        assert!(!validate_snapshot(&json!({"users": {}})).passed());
        assert!(validate_node("node_1", None).error.is_some());
        assert!(validate_node("node_1", Some(&Value::Null)).error.is_some());
    }

    #[test]
    fn database_with_nodes_collection() {
        let root = json!({
            "nodes": { "node_1": full_node("node_1") },
            "users": { "u1": {} }
        });
        let report = validate_database(&root, "nodes");
        assert!(report.passed());
        assert!(report.users_present);

        let flat = json!({ "node_1": full_node("node_1") });
        let report = validate_database(&flat, "nodes");
        assert_eq!(report.nodes.len(), 1);
        assert!(!report.users_present);
    }

    #[test]
    fn null_field_counts_as_missing() {
        let mut node = full_node("node_1");
        node["rain"] = Value::Null;
        assert_eq!(validate_node("node_1", Some(&node)).missing, ["rain"]);
    }
}
