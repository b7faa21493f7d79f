use rc_compiler::{aggregate_document, synthesize_unit, RhaiCompiler, UnitCompiler};
use rc_core::RunCodeError;

use crate::{json_string, load_documents, load_options, CheckArgs};

pub(crate) fn run_check(args: CheckArgs) -> Result<i32, RunCodeError> {
    let options = load_options(args.source.config.as_deref())?;
    let documents = load_documents(&args.source.document)?;
    let compiler = RhaiCompiler::new(&options);

    let mut failed = 0usize;
    let mut lines = Vec::new();
    for document in &documents {
        let identity = document.identity();
        let unit = synthesize_unit(&identity, &aggregate_document(document, &options));
        let artifact_name = identity.artifact_name();

        match compiler.compile(&unit, &artifact_name) {
            Ok(artifact) => lines.push(format!(
                "CHECK:{}|OK|{}",
                document.source_path,
                artifact.handles.len()
            )),
            Err(diagnostics) => {
                failed += 1;
                tracing::error!(
                    fatal = true,
                    document = %document.source_path,
                    diagnostics = diagnostics.len(),
                    "document failed to compile"
                );
                lines.push(format!(
                    "CHECK:{}|ERROR|{}",
                    document.source_path,
                    diagnostics.len()
                ));
                lines.extend(diagnostics.iter().map(|diagnostic| {
                    format!("DIAGNOSTIC_JSON:{}", json_string(&diagnostic.to_string()))
                }));
            }
        }
    }

    println!("{}", if failed == 0 { "RESULT:OK" } else { "RESULT:FAILURE" });
    for line in lines {
        println!("{}", line);
    }
    Ok(if failed == 0 { 0 } else { 1 })
}
