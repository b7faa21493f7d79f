use rc_compiler::{aggregate_document, synthesize_unit};
use rc_core::{RunCodeError, ScriptKind};
use rc_runtime::{locate_element, ElementSlot};

use crate::{json_string, load_documents, load_options, InspectArgs};

pub(crate) fn run_inspect(args: InspectArgs) -> Result<i32, RunCodeError> {
    let options = load_options(args.source.config.as_deref())?;
    let documents = load_documents(&args.source.document)?;

    println!("RESULT:OK");
    for document in &documents {
        let identity = document.identity();
        let elements = aggregate_document(document, &options);
        println!("DOCUMENT:{}|{}", document.source_path, identity);

        for element in &elements {
            let kind = match element.kind {
                ScriptKind::Statement => "STATEMENT",
                ScriptKind::Definition => "DEFINITION",
            };
            let ordinal = match locate_element(&elements, &element.path) {
                Some(ElementSlot::Statement { ordinal }) => identity.callable_name(ordinal),
                _ => "-".to_string(),
            };
            println!(
                "ELEMENT:{}|{}|{}|{}",
                element.path,
                kind,
                ordinal,
                json_string(&element.code)
            );
        }

        let unit = synthesize_unit(&identity, &elements);
        println!("UNIT_JSON:{}", json_string(&unit.source));
    }
    Ok(0)
}
