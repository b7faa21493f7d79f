use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rc_core::{DocumentIdentity, ElementPath, RunCodeError, SourceLocation, SourceSpan};
use roxmltree::{Document, Node, NodeType};

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorDocument {
    pub source_path: String,
    pub root: XmlElementNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElementNode),
    Text(XmlTextNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElementNode {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlNode>,
    pub location: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlTextNode {
    pub value: String,
    pub location: SourceSpan,
}

impl BehaviorDocument {
    pub fn identity(&self) -> DocumentIdentity {
        DocumentIdentity::from_source_path(&self.source_path)
    }

    pub fn element_at(&self, path: &ElementPath) -> Option<&XmlElementNode> {
        let mut current = &self.root;
        for index in &path.0 {
            current = current.element_children().nth(*index)?;
        }
        Some(current)
    }
}

impl XmlElementNode {
    pub fn element_children(&self) -> impl Iterator<Item = &XmlElementNode> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn raw_text(&self) -> Option<String> {
        let parts = self
            .children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(XmlTextNode { value, .. }) => Some(value.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect::<Vec<_>>();
        if parts.is_empty() {
            None
        } else {
            Some(parts.concat())
        }
    }
}

pub fn load_behavior_document(path: &Path) -> Result<BehaviorDocument, RunCodeError> {
    let text = fs::read_to_string(path).map_err(|error| {
        RunCodeError::new(
            "DOCUMENT_READ_ERROR",
            format!("Failed to read {}: {}", path.display(), error),
        )
    })?;
    parse_behavior_document(&path.to_string_lossy().replace('\\', "/"), &text)
}

pub fn parse_behavior_document(
    source_path: &str,
    source: &str,
) -> Result<BehaviorDocument, RunCodeError> {
    let document = Document::parse(source).map_err(|error| {
        RunCodeError::new(
            "XML_PARSE_ERROR",
            format!("{}: {}", source_path, error),
        )
    })?;

    let Some(root) = document.root().children().find(|node| node.is_element()) else {
        return Err(RunCodeError::new(
            "XML_PARSE_ERROR",
            format!("{}: XML document must contain a root element.", source_path),
        ));
    };

    Ok(BehaviorDocument {
        source_path: source_path.to_string(),
        root: parse_element(&document, root),
    })
}

fn parse_element(document: &Document<'_>, node: Node<'_, '_>) -> XmlElementNode {
    let mut attributes = BTreeMap::new();
    for attribute in node.attributes() {
        attributes.insert(attribute.name().to_string(), attribute.value().to_string());
    }

    let mut children = Vec::new();
    for child in node.children() {
        match child.node_type() {
            NodeType::Element => children.push(XmlNode::Element(parse_element(document, child))),
            NodeType::Text => {
                let value = child.text().unwrap_or_default().to_string();
                if value.is_empty() {
                    continue;
                }
                children.push(XmlNode::Text(XmlTextNode {
                    value,
                    location: node_span(document, child.range().start, child.range().end),
                }));
            }
            _ => {}
        }
    }

    XmlElementNode {
        name: node.tag_name().name().to_string(),
        attributes,
        children,
        location: node_span(document, node.range().start, node.range().end),
    }
}

fn node_span(document: &Document<'_>, start: usize, end: usize) -> SourceSpan {
    let start_pos = document.text_pos_at(start);
    let end_pos = document.text_pos_at(end);
    SourceSpan {
        start: SourceLocation {
            line: start_pos.row as usize,
            column: start_pos.col as usize,
        },
        end: SourceLocation {
            line: end_pos.row as usize,
            column: end_pos.col as usize,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"<HBProfile>
  <Name>Grind</Name>
  <QuestOrder>
    <CustomBehavior File="RunCode" Code="ctx.log(`a`);" />
    <While Condition="true">
      <CustomBehavior File="RunCode"><![CDATA[ if 1 < 2 { ctx.log("b"); } ]]></CustomBehavior>
    </While>
  </QuestOrder>
</HBProfile>"#;

    #[test]
    fn parse_builds_tree_with_attributes_and_text() {
        let document = parse_behavior_document("grind.xml", PROFILE).expect("xml should parse");
        assert_eq!(document.source_path, "grind.xml");
        assert_eq!(document.root.name, "HBProfile");
        assert_eq!(document.root.element_children().count(), 2);

        let quest_order = document
            .element_at(&ElementPath(vec![1]))
            .expect("quest order");
        assert_eq!(quest_order.name, "QuestOrder");

        let inline = document
            .element_at(&ElementPath(vec![1, 0]))
            .expect("inline element");
        assert_eq!(inline.attr("Code"), Some("ctx.log(`a`);"));
        assert_eq!(inline.raw_text(), None);
        assert!(inline.location.start.line >= 4);
    }

    #[test]
    fn cdata_block_is_kept_unescaped() {
        let document = parse_behavior_document("grind.xml", PROFILE).expect("xml should parse");
        let nested = document
            .element_at(&ElementPath(vec![1, 1, 0]))
            .expect("nested element");
        assert_eq!(
            nested.raw_text().as_deref(),
            Some(r#" if 1 < 2 { ctx.log("b"); } "#)
        );
    }

    #[test]
    fn element_at_returns_none_for_out_of_range_path() {
        let document = parse_behavior_document("grind.xml", PROFILE).expect("xml should parse");
        assert!(document.element_at(&ElementPath(vec![7])).is_none());
        assert!(document.element_at(&ElementPath::root()).is_some());
    }

    #[test]
    fn identity_depends_on_source_path_only() {
        let first = parse_behavior_document("a.xml", "<A/>").expect("parse");
        let second = parse_behavior_document("a.xml", "<A><B/></A>").expect("parse");
        let third = parse_behavior_document("b.xml", "<A/>").expect("parse");
        assert_eq!(first.identity(), second.identity());
        assert_ne!(first.identity(), third.identity());
    }

    #[test]
    fn parse_returns_error_for_invalid_xml() {
        let error = parse_behavior_document("broken.xml", "<Profile>")
            .expect_err("invalid xml should fail");
        assert_eq!(error.code, "XML_PARSE_ERROR");
        assert!(error.message.starts_with("broken.xml"));
    }

    #[test]
    fn parse_returns_error_when_root_element_is_missing() {
        let error = parse_behavior_document("empty.xml", "<?xml version=\"1.0\"?><!---->")
            .expect_err("missing root element should fail");
        assert_eq!(error.code, "XML_PARSE_ERROR");
    }

    #[test]
    fn load_reads_document_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("profile.xml");
        fs::write(&path, PROFILE).expect("write profile");

        let document = load_behavior_document(&path).expect("load should pass");
        assert!(document.source_path.ends_with("profile.xml"));

        let error = load_behavior_document(&dir.path().join("missing.xml"))
            .expect_err("missing file should fail");
        assert_eq!(error.code, "DOCUMENT_READ_ERROR");
    }
}
