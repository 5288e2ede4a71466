//! TS/JS config module key extraction.
//!
//! Config modules usually export one object literal, either directly
//! (`export default {...}`, `module.exports = {...}`) or wrapped in a
//! helper call (`defineConfig({...})`). We walk the top-level statements
//! of the Tree-sitter syntax tree and flatten those objects into dotted
//! keys. Top-level `const` names are keys too.

use super::join_key;
use tracing::warn;
use tree_sitter::{Node, Parser};

/// Marker keys recorded when a module uses the corresponding export form.
const EXPORT_DEFAULT: &str = "export default";
const MODULE_EXPORTS: &str = "module.exports";
const DEFINE_CONFIG: &str = "defineConfig";

/// Extracts keys from TypeScript or JavaScript source.
pub fn extract_script_keys(content: &str) -> Vec<String> {
    let mut parser = Parser::new();
    let language = tree_sitter_typescript::language_typescript();
    if let Err(e) = parser.set_language(&language) {
        warn!("Failed to load TypeScript grammar: {}", e);
        return Vec::new();
    }

    let Some(tree) = parser.parse(content, None) else {
        return Vec::new();
    };

    let mut walker = ScriptWalker {
        source: content.as_bytes(),
        keys: Vec::new(),
    };

    let root = tree.root_node();
    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        walker.visit_statement(statement);
    }

    walker.keys
}

struct ScriptWalker<'a> {
    source: &'a [u8],
    keys: Vec<String>,
}

impl<'a> ScriptWalker<'a> {
    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn push_marker(&mut self, marker: &str) {
        if !self.keys.iter().any(|k| k == marker) {
            self.keys.push(marker.to_string());
        }
    }

    fn visit_statement(&mut self, node: Node) {
        match node.kind() {
            "export_statement" => self.visit_export(node),
            "lexical_declaration" | "variable_declaration" => self.visit_declaration(node),
            "expression_statement" => {
                if let Some(expr) = node.named_child(0) {
                    self.visit_top_level_expression(expr);
                }
            }
            _ => {}
        }
    }

    fn visit_export(&mut self, node: Node) {
        let mut cursor = node.walk();
        let is_default = node.children(&mut cursor).any(|c| c.kind() == "default");

        if is_default {
            self.push_marker(EXPORT_DEFAULT);
            if let Some(value) = node.child_by_field_name("value") {
                self.visit_config_value(value);
            }
        }

        if let Some(declaration) = node.child_by_field_name("declaration") {
            if matches!(
                declaration.kind(),
                "lexical_declaration" | "variable_declaration"
            ) {
                self.visit_declaration(declaration);
            }
        }
    }

    fn visit_declaration(&mut self, node: Node) {
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }

            if let Some(name) = declarator.child_by_field_name("name") {
                if name.kind() == "identifier" {
                    let name = self.text(name).to_string();
                    self.keys.push(name);
                }
            }

            // `const config = defineConfig({...})` is the exported config in disguise.
            if let Some(value) = declarator.child_by_field_name("value") {
                if self.is_define_config_call(value) {
                    self.visit_config_value(value);
                }
            }
        }
    }

    fn visit_top_level_expression(&mut self, expr: Node) {
        if expr.kind() != "assignment_expression" {
            return;
        }

        let Some(left) = expr.child_by_field_name("left") else {
            return;
        };

        if self.text(left) == MODULE_EXPORTS {
            self.push_marker(MODULE_EXPORTS);
            if let Some(right) = expr.child_by_field_name("right") {
                self.visit_config_value(right);
            }
        }
    }

    fn is_define_config_call(&self, node: Node) -> bool {
        node.kind() == "call_expression"
            && node
                .child_by_field_name("function")
                .map(|f| self.text(f).ends_with(DEFINE_CONFIG))
                .unwrap_or(false)
    }

    /// Flattens an exported configuration value.
    fn visit_config_value(&mut self, node: Node) {
        match node.kind() {
            "object" => self.collect_object_keys(node, ""),
            "parenthesized_expression" | "as_expression" | "satisfies_expression" => {
                if let Some(inner) = node.named_child(0) {
                    self.visit_config_value(inner);
                }
            }
            "call_expression" => {
                if self.is_define_config_call(node) {
                    self.push_marker(DEFINE_CONFIG);
                }
                let Some(arguments) = node.child_by_field_name("arguments") else {
                    return;
                };
                let mut cursor = arguments.walk();
                let object = arguments
                    .named_children(&mut cursor)
                    .find(|arg| arg.kind() == "object");
                if let Some(object) = object {
                    self.collect_object_keys(object, "");
                }
            }
            _ => {}
        }
    }

    fn collect_object_keys(&mut self, object: Node, prefix: &str) {
        let mut cursor = object.walk();
        for member in object.named_children(&mut cursor) {
            match member.kind() {
                "pair" => {
                    let Some(key) = member.child_by_field_name("key").and_then(|k| self.key_text(k))
                    else {
                        continue;
                    };
                    let full = join_key(prefix, &key);
                    self.keys.push(full.clone());

                    if let Some(value) = member.child_by_field_name("value") {
                        if value.kind() == "object" {
                            self.collect_object_keys(value, &full);
                        }
                    }
                }
                "shorthand_property_identifier" => {
                    let full = join_key(prefix, self.text(member));
                    self.keys.push(full);
                }
                "method_definition" => {
                    if let Some(name) = member
                        .child_by_field_name("name")
                        .and_then(|n| self.key_text(n))
                    {
                        self.keys.push(join_key(prefix, &name));
                    }
                }
                _ => {}
            }
        }
    }

    /// Returns the literal name of a property key, or None for computed keys.
    fn key_text(&self, key: Node) -> Option<String> {
        match key.kind() {
            "property_identifier" | "number" => Some(self.text(key).to_string()),
            "string" => Some(
                self.text(key)
                    .trim_matches(|c| c == '"' || c == '\'')
                    .to_string(),
            ),
            _ => None,
        }
    }
}
