use rc_compiler::{aggregate_document, AwaitRequest};
use rc_core::{HostValue, RunCodeError};
use rc_parser::BehaviorDocument;
use rc_runtime::{AwaitHost, AwaitPoll, NodeStatus, RunCodeEngine, RunCodeNode, SessionBus};

use crate::{json_string, load_documents, load_options, RunArgs};

#[derive(Debug, Default)]
pub(crate) struct ImmediateAwaitHost {
    pub(crate) settled: usize,
}

impl AwaitHost for ImmediateAwaitHost {
    fn poll_await(&mut self, request: &AwaitRequest) -> AwaitPoll {
        self.settled += 1;
        tracing::info!(op = %request.op, args = request.args.len(), "await settled");
        AwaitPoll::Ready(HostValue::Null)
    }
}

#[derive(Debug, Default)]
struct RunSummary {
    success: usize,
    failure: usize,
    running: usize,
}

pub(crate) fn run_documents(args: RunArgs) -> Result<i32, RunCodeError> {
    let options = load_options(args.source.config.as_deref())?;
    let documents = load_documents(&args.source.document)?;
    let mut engine = RunCodeEngine::new(options)?;
    let mut bus = SessionBus::new();
    let mut host = ImmediateAwaitHost::default();

    let mut summary = RunSummary::default();
    let mut lines = Vec::new();
    for document in &documents {
        run_document(
            &mut engine,
            &mut bus,
            &mut host,
            document,
            args.max_ticks,
            &mut summary,
            &mut lines,
        );
    }
    engine.end_session(&mut bus);

    let ok = summary.failure == 0 && summary.running == 0;
    println!("{}", if ok { "RESULT:OK" } else { "RESULT:FAILURE" });
    for line in lines {
        println!("{}", line);
    }
    println!(
        "SUMMARY:{}|{}|{}",
        summary.success, summary.failure, summary.running
    );
    Ok(if ok { 0 } else { 1 })
}

fn run_document(
    engine: &mut RunCodeEngine,
    bus: &mut SessionBus,
    host: &mut ImmediateAwaitHost,
    document: &BehaviorDocument,
    max_ticks: usize,
    summary: &mut RunSummary,
    lines: &mut Vec<String>,
) {
    lines.push(format!("DOCUMENT:{}", document.source_path));
    for element in aggregate_document(document, engine.options()) {
        let mut node = RunCodeNode::new(element.path);
        let mut status = NodeStatus::Running;
        for _ in 0..max_ticks.max(1) {
            status = node.tick(engine, bus, document, host);
            if status != NodeStatus::Running {
                break;
            }
        }

        let line = match status {
            NodeStatus::Success => {
                summary.success += 1;
                let value = node.last_value().cloned().unwrap_or(HostValue::Null);
                format!(
                    "ELEMENT:{}|SUCCESS|{}",
                    node.path(),
                    serde_json::to_string(&value).unwrap_or_else(|_| "null".to_string())
                )
            }
            NodeStatus::Failure => {
                summary.failure += 1;
                let (code, message) = node
                    .last_error()
                    .map(|error| (error.code.clone(), error.message.clone()))
                    .unwrap_or_default();
                format!(
                    "ELEMENT:{}|FAILURE|{}|{}",
                    node.path(),
                    code,
                    json_string(&message)
                )
            }
            NodeStatus::Running => {
                summary.running += 1;
                tracing::warn!(
                    element = %node.path(),
                    max_ticks,
                    "element abandoned while running"
                );
                format!("ELEMENT:{}|RUNNING", node.path())
            }
        };
        lines.push(line);
    }
}
