//! XML text to [`Tree`] parsing.
//!
//! The produced tree follows the permissive layout the migration rules are
//! written against:
//!
//! - the root element itself is not wrapped, only its content is returned
//! - every attribute becomes a wrapped string (`ip="x"` → `{"ip": ["x"]}`)
//! - child elements are grouped by tag name, in first-occurrence order
//! - an element without attributes and child elements becomes its text
//! - text next to attributes or child elements is kept under `_`

use indexmap::IndexMap;
use roxmltree::{Document, Node, ParsingOptions};

use crate::{
    error::Result,
    tree::{Map, Tree},
};

/// Key holding the character data of mixed-content elements.
pub const TEXT_KEY: &str = "_";

/// Turns raw document text into a [`Tree`].
pub trait TreeParser {
    /// Parses `content`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not well-formed.
    fn parse(&self, content: &str) -> Result<Tree>;
}

/// [`TreeParser`] for XML documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlTreeParser;

impl TreeParser for XmlTreeParser {
    fn parse(&self, content: &str) -> Result<Tree> {
        let opt = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(content, opt)?;
        let root = doc.root_element();
        debug!("parsed XML document with root <{}>", root.tag_name().name());
        Ok(element_to_tree(root))
    }
}

fn element_to_tree(node: Node<'_, '_>) -> Tree {
    let mut map = Map::new();
    for attr in node.attributes() {
        map.insert(
            attr.name().to_string(),
            Tree::wrap(Tree::string(attr.value())),
        );
    }

    let mut children: IndexMap<String, Vec<Tree>> = IndexMap::new();
    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            children
                .entry(child.tag_name().name().to_string())
                .or_default()
                .push(element_to_tree(child));
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    if map.is_empty() && children.is_empty() {
        if text.trim().is_empty() {
            text.clear();
        }
        return Tree::string(text);
    }

    for (name, items) in children {
        push_items(&mut map, name, items);
    }
    if !text.trim().is_empty() {
        map.insert(TEXT_KEY.to_string(), Tree::string(text));
    }
    Tree::Map(map)
}

/// Store `items` under `name`, appending to an attribute of the same name.
fn push_items(map: &mut Map, name: String, mut items: Vec<Tree>) {
    if let Some(existing) = map.get_mut(&name) {
        let mut merged = existing.items().map(<[Tree]>::to_vec).unwrap_or_default();
        merged.append(&mut items);
        *existing = Tree::Seq(merged);
        return;
    }
    let value = if items.len() == 1 {
        Tree::wrap(items.remove(0))
    } else {
        Tree::Seq(items)
    };
    map.insert(name, value);
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn parse(xml: &str) -> Value {
        Value::from(XmlTreeParser.parse(xml).unwrap())
    }

    #[test]
    fn test_attributes_and_children_are_wrapped() {
        let xml = r#"<?xml version="1.0" ?>
            <Cluster masterAddress="localhost">
                <Node ip="127.0.0.1" port="20401">
                    <Window fullScreen="false">
                        <Size x="640" y="360" />
                    </Window>
                </Node>
            </Cluster>"#;
        assert_eq!(
            parse(xml),
            json!({
                "masterAddress": ["localhost"],
                "Node": [{
                    "ip": ["127.0.0.1"],
                    "port": ["20401"],
                    "Window": [{
                        "fullScreen": ["false"],
                        "Size": [{ "x": ["640"], "y": ["360"] }]
                    }]
                }]
            })
        );
    }

    #[test]
    fn test_repeated_children_form_a_sequence() {
        let tree = XmlTreeParser
            .parse(r#"<Cluster><Node ip="a"/><Node ip="b"/></Cluster>"#)
            .unwrap();
        let nodes = tree.get("Node").unwrap();
        assert!(matches!(nodes, Tree::Seq(items) if items.len() == 2));
    }

    #[test]
    fn test_text_only_elements() {
        assert_eq!(
            parse("<frustum><yaw>10</yaw><pitch/></frustum>"),
            json!({ "yaw": ["10"], "pitch": [""] })
        );
    }

    #[test]
    fn test_mixed_content_keeps_text() {
        assert_eq!(
            parse(r#"<a><b id="1">text</b></a>"#),
            json!({ "b": [{ "id": ["1"], "_": "text" }] })
        );
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(XmlTreeParser.parse("<Cluster><Node></Cluster>").is_err());
    }
}
