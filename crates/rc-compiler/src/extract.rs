use rc_core::error::EXTRACTION_ERROR;
use rc_core::{RunCodeError, RunCodeOptions, ScriptKind};
use rc_parser::XmlElementNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub code: String,
    pub kind: ScriptKind,
}

pub fn is_engine_element(element: &XmlElementNode, options: &RunCodeOptions) -> bool {
    element.name == options.element_name
        && element.attr(&options.discriminator_attr) == Some(options.engine_id.as_str())
}

// `None` for elements of other behaviors.
pub fn extract_snippet(element: &XmlElementNode, options: &RunCodeOptions) -> Option<Snippet> {
    if !is_engine_element(element, options) {
        return None;
    }

    let kind = match element.attr(&options.type_attr) {
        Some(marker) if marker.trim().eq_ignore_ascii_case(&options.definition_token) => {
            ScriptKind::Definition
        }
        _ => ScriptKind::Statement,
    };

    let code = match element.attr(&options.code_attr) {
        Some(inline) if !inline.trim().is_empty() => inline.to_string(),
        _ => element.raw_text().unwrap_or_default(),
    };

    Some(Snippet { code, kind })
}

// Recovered, not returned: the element still resolves to a no-op.
pub fn empty_code_error(element: &XmlElementNode, options: &RunCodeOptions) -> RunCodeError {
    RunCodeError::with_span(
        EXTRACTION_ERROR,
        format!(
            "<{}> has no \"{}\" attribute or text; treated as a no-op.",
            element.name, options.code_attr
        ),
        element.location.clone(),
    )
}
