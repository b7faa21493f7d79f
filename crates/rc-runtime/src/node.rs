use rc_core::{ElementPath, HostValue, RunCodeError};
use rc_parser::BehaviorDocument;

use crate::dispatch::Dispatch;
use crate::engine::RunCodeEngine;
use crate::executor::{AwaitHost, ScriptTask, TaskPoll};
use crate::lifecycle::SessionEvents;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Running,
    Success,
    Failure,
}

enum NodeState {
    Idle,
    Running(ScriptTask),
    Done(NodeStatus),
}

pub struct RunCodeNode {
    path: ElementPath,
    state: NodeState,
    last_error: Option<RunCodeError>,
    last_value: Option<HostValue>,
}

impl RunCodeNode {
    pub fn new(path: ElementPath) -> Self {
        Self {
            path,
            state: NodeState::Idle,
            last_error: None,
            last_value: None,
        }
    }

    pub fn path(&self) -> &ElementPath {
        &self.path
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, NodeState::Done(_))
    }

    pub fn last_error(&self) -> Option<&RunCodeError> {
        self.last_error.as_ref()
    }

    pub fn last_value(&self) -> Option<&HostValue> {
        self.last_value.as_ref()
    }

    // Dropping a running task cancels its pending await.
    pub fn reset(&mut self) {
        self.state = NodeState::Idle;
        self.last_error = None;
        self.last_value = None;
    }

    pub fn tick(
        &mut self,
        engine: &mut RunCodeEngine,
        events: &mut dyn SessionEvents,
        document: &BehaviorDocument,
        host: &mut dyn AwaitHost,
    ) -> NodeStatus {
        match &mut self.state {
            NodeState::Done(status) => return *status,
            NodeState::Running(task) => {
                let poll = task.poll(host);
                return self.settle(poll);
            }
            NodeState::Idle => {}
        }

        let resolved = match engine.dispatch(events, document, &self.path) {
            Ok(Dispatch::Callable(resolved)) => resolved,
            Ok(Dispatch::Inert) => {
                self.last_value = Some(HostValue::Null);
                return self.finish(NodeStatus::Success);
            }
            Err(error) => return self.fail(error),
        };

        let mut task = match engine.start_task(&resolved) {
            Ok(task) => task,
            Err(error) => return self.fail(error),
        };
        let poll = task.poll(host);
        self.state = NodeState::Running(task);
        self.settle(poll)
    }

    fn settle(&mut self, poll: TaskPoll) -> NodeStatus {
        match poll {
            TaskPoll::Pending => NodeStatus::Running,
            TaskPoll::Ready(Ok(value)) => {
                self.last_value = Some(value);
                self.finish(NodeStatus::Success)
            }
            TaskPoll::Ready(Err(error)) => self.fail(error),
        }
    }

    fn fail(&mut self, error: RunCodeError) -> NodeStatus {
        if error.is_fatal() {
            tracing::error!(fatal = true, element = %self.path, code = %error.code, "{}", error.message);
        } else {
            tracing::error!(element = %self.path, code = %error.code, "{}", error.message);
        }
        self.last_error = Some(error);
        self.finish(NodeStatus::Failure)
    }

    fn finish(&mut self, status: NodeStatus) -> NodeStatus {
        self.state = NodeState::Done(status);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::AwaitPoll;
    use crate::lifecycle::SessionBus;
    use rc_compiler::AwaitRequest;
    use rc_core::{error::ELEMENT_NOT_FOUND, RunCodeOptions};
    use rc_parser::parse_behavior_document;

    struct ImmediateHost;

    impl AwaitHost for ImmediateHost {
        fn poll_await(&mut self, _request: &AwaitRequest) -> AwaitPoll {
            AwaitPoll::Ready(HostValue::Null)
        }
    }

    fn document(body: &str) -> BehaviorDocument {
        parse_behavior_document("node.xml", &format!("<Behavior>{}</Behavior>", body))
            .expect("document should parse")
    }

    #[test]
    fn done_node_does_not_dispatch_again() {
        let doc = document(r#"<CustomBehavior File="RunCode" Code="1 + 1"/>"#);
        let mut engine = RunCodeEngine::new(RunCodeOptions::default()).expect("engine");
        let mut bus = SessionBus::new();
        let mut node = RunCodeNode::new(ElementPath(vec![0]));

        assert_eq!(
            node.tick(&mut engine, &mut bus, &doc, &mut ImmediateHost),
            NodeStatus::Success
        );
        engine.end_session(&mut bus);
        assert_eq!(
            node.tick(&mut engine, &mut bus, &doc, &mut ImmediateHost),
            NodeStatus::Success
        );
        assert!(!engine.is_active());
    }

    #[test]
    fn lookup_failure_fails_node_until_reset() {
        let doc = document(r#"<Wait/><CustomBehavior File="RunCode" Code="1"/>"#);
        let mut engine = RunCodeEngine::new(RunCodeOptions::default()).expect("engine");
        let mut bus = SessionBus::new();
        let mut node = RunCodeNode::new(ElementPath(vec![0]));

        assert_eq!(
            node.tick(&mut engine, &mut bus, &doc, &mut ImmediateHost),
            NodeStatus::Failure
        );
        assert_eq!(
            node.last_error().map(|error| error.code.as_str()),
            Some(ELEMENT_NOT_FOUND)
        );

        node.reset();
        assert!(node.last_error().is_none());
        assert!(!node.is_done());
    }
}
