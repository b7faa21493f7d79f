use rc_core::{Diagnostic, DocumentIdentity, ElementPath, ScriptElement, ScriptKind, SourceSpan};

pub const PREAMBLE: &str = "\
// runcode preamble
fn rc_sleep(ctx, ms) { ctx.wait(ms) }
fn rc_query(ctx, name) { ctx.query(name, []) }
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSegment {
    pub start_line: usize,
    pub end_line: usize,
    pub path: ElementPath,
    pub kind: ScriptKind,
    pub location: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub identity: DocumentIdentity,
    pub source: String,
    pub callable_names: Vec<String>,
    pub segments: Vec<UnitSegment>,
    pub prelude_len: usize,
}

impl CompilationUnit {
    // Preamble and definitions only. Lines match `source`.
    pub fn prelude(&self) -> &str {
        &self.source[..self.prelude_len]
    }

    pub fn locate(&self, mut diagnostic: Diagnostic) -> Diagnostic {
        if let Some(line) = diagnostic.line {
            diagnostic.origin = self
                .segments
                .iter()
                .find(|segment| segment.start_line <= line && line <= segment.end_line)
                .map(|segment| segment.location.clone());
        }
        diagnostic
    }
}

struct UnitWriter {
    source: String,
    line: usize,
}

impl UnitWriter {
    fn new() -> Self {
        Self {
            source: String::new(),
            line: 1,
        }
    }

    fn push(&mut self, text: &str) {
        self.source.push_str(text);
        self.line += text.matches('\n').count();
    }

    fn push_line(&mut self, text: &str) {
        self.push(text);
        self.push("\n");
    }
}

pub fn synthesize_unit(identity: &DocumentIdentity, elements: &[ScriptElement]) -> CompilationUnit {
    let mut writer = UnitWriter::new();
    let mut segments = Vec::new();
    let mut callable_names = Vec::new();

    writer.push(PREAMBLE);
    writer.push_line(&format!("// scope: {}", identity.scope_name()));

    for element in elements {
        if element.kind != ScriptKind::Definition || element.is_empty() {
            continue;
        }
        writer.push_line("");
        let start_line = writer.line;
        writer.push_line(&element.code);
        segments.push(UnitSegment {
            start_line,
            end_line: writer.line - 1,
            path: element.path.clone(),
            kind: ScriptKind::Definition,
            location: element.location.clone(),
        });
    }

    let prelude_len = writer.source.len();

    for element in elements.iter().filter(|element| element.consumes_ordinal()) {
        let name = identity.callable_name(callable_names.len());
        writer.push_line("");
        let start_line = writer.line;
        writer.push_line(&format!("fn {}(ctx) {{", name));
        writer.push_line(&terminate_statement(&element.code));
        writer.push_line("}");
        segments.push(UnitSegment {
            start_line,
            end_line: writer.line - 1,
            path: element.path.clone(),
            kind: ScriptKind::Statement,
            location: element.location.clone(),
        });
        callable_names.push(name);
    }

    CompilationUnit {
        identity: identity.clone(),
        source: writer.source,
        callable_names,
        segments,
        prelude_len,
    }
}

fn terminate_statement(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.ends_with(';') {
        trimmed.to_string()
    } else {
        format!("{};", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(order: usize, code: &str, kind: ScriptKind) -> ScriptElement {
        ScriptElement {
            path: ElementPath(vec![order]),
            code: code.to_string(),
            kind,
            document_order: order,
            location: SourceSpan {
                start: rc_core::SourceLocation {
                    line: 10 + order,
                    column: 5,
                },
                end: rc_core::SourceLocation {
                    line: 10 + order,
                    column: 40,
                },
            },
        }
    }

    fn identity() -> DocumentIdentity {
        DocumentIdentity::from_source_path("synth.xml")
    }

    #[test]
    fn empty_statements_consume_no_ordinal() {
        let elements = vec![
            element(0, "a;", ScriptKind::Statement),
            element(1, "", ScriptKind::Statement),
            element(2, "b;", ScriptKind::Statement),
        ];
        let unit = synthesize_unit(&identity(), &elements);
        assert_eq!(
            unit.callable_names,
            vec![identity().callable_name(0), identity().callable_name(1)]
        );
        assert!(unit
            .source
            .contains(&format!("fn {}(ctx) {{\na;\n}}", identity().callable_name(0))));
        assert!(unit
            .source
            .contains(&format!("fn {}(ctx) {{\nb;\n}}", identity().callable_name(1))));
        assert!(!unit.source.contains(&identity().callable_name(2)));
    }

    #[test]
    fn whitespace_only_statement_is_empty() {
        let elements = vec![
            element(0, "  \n\t", ScriptKind::Statement),
            element(1, "go();", ScriptKind::Statement),
        ];
        let unit = synthesize_unit(&identity(), &elements);
        assert_eq!(unit.callable_names, vec![identity().callable_name(0)]);
        assert!(unit.source.contains("go();"));
    }

    #[test]
    fn definitions_are_verbatim_and_unwrapped() {
        let definition = "fn double(x) {\n    x * 2\n}";
        let elements = vec![
            element(0, "first();", ScriptKind::Statement),
            element(1, definition, ScriptKind::Definition),
            element(2, "second();", ScriptKind::Statement),
        ];
        let unit = synthesize_unit(&identity(), &elements);

        assert!(unit.source.starts_with(PREAMBLE));
        assert!(unit.source.contains(definition));
        assert_eq!(unit.callable_names.len(), 2);
        assert_eq!(unit.source.matches("(ctx) {").count(), 2);

        let definition_at = unit.source.find(definition).expect("definition present");
        let first_callable_at = unit
            .source
            .find(&unit.callable_names[0])
            .expect("callable present");
        assert!(definition_at < first_callable_at);
    }

    #[test]
    fn prelude_stops_before_the_first_callable() {
        let elements = vec![
            element(0, "let counter = 0;", ScriptKind::Definition),
            element(1, "counter += 1", ScriptKind::Statement),
        ];
        let unit = synthesize_unit(&identity(), &elements);
        let prelude = unit.prelude();

        assert!(prelude.starts_with(PREAMBLE));
        assert!(prelude.contains("let counter = 0;"));
        assert!(!prelude.contains(&unit.callable_names[0]));
        assert!(unit.source.starts_with(prelude));
    }

    #[test]
    fn missing_terminator_is_appended_once() {
        assert_eq!(terminate_statement("  go()  "), "go();");
        assert_eq!(terminate_statement("go();\n"), "go();");
        assert_eq!(terminate_statement("if x { y(); }"), "if x { y(); };");
    }

    #[test]
    fn unit_names_its_scope_after_the_identity() {
        let unit = synthesize_unit(&identity(), &[]);
        assert!(unit
            .source
            .contains(&format!("// scope: {}", identity().scope_name())));
        assert!(unit.callable_names.is_empty());
        assert!(unit.segments.is_empty());
    }

    #[test]
    fn segments_map_unit_lines_back_to_elements() {
        let elements = vec![
            element(0, "fn helper() {\n  1\n}", ScriptKind::Definition),
            element(1, "helper();", ScriptKind::Statement),
        ];
        let unit = synthesize_unit(&identity(), &elements);
        let lines = unit.source.lines().collect::<Vec<_>>();

        for segment in &unit.segments {
            assert!(segment.start_line <= segment.end_line);
        }
        let definition = &unit.segments[0];
        assert_eq!(lines[definition.start_line - 1], "fn helper() {");
        assert_eq!(lines[definition.end_line - 1], "}");

        let statement = &unit.segments[1];
        assert_eq!(
            lines[statement.start_line - 1],
            format!("fn {}(ctx) {{", unit.callable_names[0])
        );
        assert_eq!(lines[statement.start_line], "helper();");

        let mut diagnostic = Diagnostic::new("bad");
        diagnostic.line = Some(statement.start_line + 1);
        let located = unit.locate(diagnostic);
        assert_eq!(
            located.origin.map(|span| span.start.line),
            Some(11)
        );
    }
}
