use rc_core::{ElementPath, RunCodeOptions, ScriptElement};
use rc_parser::{BehaviorDocument, XmlElementNode};

use crate::extract::{empty_code_error, extract_snippet};

// Engine elements are leaves; nothing nested inside one is scanned.
pub fn aggregate_document(
    document: &BehaviorDocument,
    options: &RunCodeOptions,
) -> Vec<ScriptElement> {
    let mut elements = Vec::new();
    collect(&document.root, ElementPath::root(), options, &mut elements);
    elements
}

fn collect(
    element: &XmlElementNode,
    path: ElementPath,
    options: &RunCodeOptions,
    out: &mut Vec<ScriptElement>,
) {
    if let Some(snippet) = extract_snippet(element, options) {
        if snippet.code.trim().is_empty() {
            let recovered = empty_code_error(element, options);
            tracing::debug!(element = %path, error = %recovered, "empty engine element");
        }
        out.push(ScriptElement {
            path,
            code: snippet.code,
            kind: snippet.kind,
            document_order: out.len(),
            location: element.location.clone(),
        });
        return;
    }

    for (index, child) in element.element_children().enumerate() {
        collect(child, path.child(index), options, out);
    }
}
