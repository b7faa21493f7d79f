use std::sync::Arc;

use rc_compiler::{CompiledArtifact, ScriptCallable};
use rc_core::{
    error::{COMPILE_ERROR, ELEMENT_NOT_FOUND, HANDLE_NOT_FOUND},
    render_diagnostics, ElementPath, RunCodeError, ScriptElement, ScriptKind,
};
use rc_parser::BehaviorDocument;

use crate::cache::CacheEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSlot {
    Statement { ordinal: usize },
    Inert,
}

pub fn locate_element(elements: &[ScriptElement], path: &ElementPath) -> Option<ElementSlot> {
    let mut ordinal = 0usize;
    for element in elements {
        if &element.path == path {
            if element.kind == ScriptKind::Definition || element.is_empty() {
                return Some(ElementSlot::Inert);
            }
            return Some(ElementSlot::Statement { ordinal });
        }
        if element.consumes_ordinal() {
            ordinal += 1;
        }
    }
    None
}

#[derive(Clone)]
pub struct ResolvedCallable {
    pub artifact: Arc<CompiledArtifact>,
    pub handle: Arc<dyn ScriptCallable>,
    pub ordinal: usize,
    pub source_path: String,
    pub element: ElementPath,
}

impl std::fmt::Debug for ResolvedCallable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCallable")
            .field("artifact", &self.artifact.artifact_name)
            .field("handle", &self.handle.name())
            .field("ordinal", &self.ordinal)
            .field("element", &self.element)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Dispatch {
    Callable(ResolvedCallable),
    Inert,
}

pub(crate) fn resolve(
    entry: &CacheEntry,
    document: &BehaviorDocument,
    elements: &[ScriptElement],
    path: &ElementPath,
) -> Result<Dispatch, RunCodeError> {
    let artifact = match entry {
        CacheEntry::Compiled(artifact) => artifact,
        CacheEntry::Failed(diagnostics) => {
            return Err(RunCodeError::new(
                COMPILE_ERROR,
                format!(
                    "Document \"{}\" failed to compile:\n{}",
                    document.source_path,
                    render_diagnostics(diagnostics)
                ),
            ));
        }
    };

    let ordinal = match locate_element(elements, path) {
        Some(ElementSlot::Statement { ordinal }) => ordinal,
        Some(ElementSlot::Inert) => return Ok(Dispatch::Inert),
        None => {
            return Err(RunCodeError::new(
                ELEMENT_NOT_FOUND,
                format!(
                    "Element {} of \"{}\" is not a RunCode element.",
                    path, document.source_path
                ),
            ));
        }
    };

    let Some(handle) = artifact.handle(ordinal) else {
        let span = document
            .element_at(path)
            .map(|element| element.location.clone());
        let message = format!(
            "Handle not found for element {} of \"{}\": ordinal {} but artifact {} has {} callables.",
            path,
            document.source_path,
            ordinal,
            artifact.artifact_name,
            artifact.handles.len()
        );
        return Err(match span {
            Some(span) => RunCodeError::with_span(HANDLE_NOT_FOUND, message, span),
            None => RunCodeError::new(HANDLE_NOT_FOUND, message),
        });
    };

    Ok(Dispatch::Callable(ResolvedCallable {
        artifact: Arc::clone(artifact),
        handle: Arc::clone(handle),
        ordinal,
        source_path: document.source_path.clone(),
        element: path.clone(),
    }))
}
