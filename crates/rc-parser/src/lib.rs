mod xml;

pub use xml::{
    load_behavior_document, parse_behavior_document, BehaviorDocument, XmlElementNode, XmlNode,
    XmlTextNode,
};
