use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use rc_compiler::{AwaitRequest, ContextInfo, ElementContext, HostFunctionRegistry, Suspender};
use rc_core::{error::RUNTIME_ERROR, HostValue, RunCodeError};

use crate::dispatch::ResolvedCallable;

#[derive(Debug, Clone, PartialEq)]
pub enum AwaitPoll {
    Pending,
    Ready(HostValue),
    Failed(String),
}

/// Advances the operations snippets wait on. Polled once per scheduling step
/// while a snippet is suspended.
pub trait AwaitHost {
    fn poll_await(&mut self, request: &AwaitRequest) -> AwaitPoll;
}

#[derive(Debug)]
pub enum TaskPoll {
    Pending,
    Ready(Result<HostValue, RunCodeError>),
}

enum WorkerEvent {
    Await(AwaitRequest),
    Finished(Result<HostValue, String>),
}

enum Resume {
    Value(HostValue),
    Fail(String),
}

struct ChannelSuspender {
    events: Sender<WorkerEvent>,
    resumes: Mutex<Receiver<Resume>>,
}

impl Suspender for ChannelSuspender {
    fn suspend(&self, request: AwaitRequest) -> Result<HostValue, String> {
        let op = request.op.clone();
        self.events
            .send(WorkerEvent::Await(request))
            .map_err(|_| format!("Await \"{}\" cancelled: scheduler is gone.", op))?;
        match self.resumes.lock().recv() {
            Ok(Resume::Value(value)) => Ok(value),
            Ok(Resume::Fail(message)) => Err(message),
            Err(_) => Err(format!("Await \"{}\" cancelled.", op)),
        }
    }
}

#[derive(Debug)]
enum TaskState {
    Running,
    Waiting(AwaitRequest),
    Finished,
}

// Only one side runs at a time: the caller blocks in poll() while the worker
// runs, and the worker blocks while suspended.
pub struct ScriptTask {
    label: String,
    events: Receiver<WorkerEvent>,
    resumes: Sender<Resume>,
    state: TaskState,
}

impl ScriptTask {
    pub fn start(
        resolved: &ResolvedCallable,
        host_functions: Arc<dyn HostFunctionRegistry>,
    ) -> Result<Self, RunCodeError> {
        let (event_tx, event_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();
        let suspender = ChannelSuspender {
            events: event_tx.clone(),
            resumes: Mutex::new(resume_rx),
        };
        let ctx = ElementContext::new(
            ContextInfo {
                source_path: resolved.source_path.clone(),
                identity: resolved.artifact.identity.clone(),
                element: resolved.element.clone(),
                ordinal: resolved.ordinal,
            },
            host_functions,
            Arc::new(suspender),
        );

        let label = format!("{} {}", resolved.source_path, resolved.element);
        let handle = Arc::clone(&resolved.handle);
        thread::Builder::new()
            .name(format!("runcode-{}", handle.name()))
            .spawn(move || {
                let result = handle.invoke(ctx);
                let _ = event_tx.send(WorkerEvent::Finished(result));
            })
            .map_err(|error| {
                RunCodeError::new(
                    RUNTIME_ERROR,
                    format!("Failed to start snippet {}: {}", label, error),
                )
            })?;

        tracing::debug!(element = %label, callable = resolved.handle.name(), "snippet started");
        Ok(Self {
            label,
            events: event_rx,
            resumes: resume_tx,
            state: TaskState::Running,
        })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, TaskState::Finished)
    }

    pub fn awaiting(&self) -> Option<&AwaitRequest> {
        match &self.state {
            TaskState::Waiting(request) => Some(request),
            _ => None,
        }
    }

    pub fn poll(&mut self, host: &mut dyn AwaitHost) -> TaskPoll {
        if let TaskState::Waiting(request) = &self.state {
            let resume = match host.poll_await(request) {
                AwaitPoll::Pending => return TaskPoll::Pending,
                AwaitPoll::Ready(value) => Resume::Value(value),
                AwaitPoll::Failed(message) => Resume::Fail(message),
            };
            let _ = self.resumes.send(resume);
            self.state = TaskState::Running;
        }

        if self.is_finished() {
            return TaskPoll::Ready(Err(RunCodeError::new(
                RUNTIME_ERROR,
                format!("Snippet {} was polled after it finished.", self.label),
            )));
        }

        match self.events.recv() {
            Ok(WorkerEvent::Await(request)) => {
                tracing::trace!(element = %self.label, op = %request.op, "snippet suspended");
                self.state = TaskState::Waiting(request);
                TaskPoll::Pending
            }
            Ok(WorkerEvent::Finished(result)) => {
                self.state = TaskState::Finished;
                TaskPoll::Ready(result.map_err(|message| {
                    RunCodeError::new(
                        RUNTIME_ERROR,
                        format!("Snippet {} failed: {}", self.label, message),
                    )
                }))
            }
            Err(_) => {
                self.state = TaskState::Finished;
                TaskPoll::Ready(Err(RunCodeError::new(
                    RUNTIME_ERROR,
                    format!("Snippet {} stopped without reporting a result.", self.label),
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_compiler::{CompiledArtifact, EmptyHostFunctionRegistry, ScriptCallable};
    use rc_core::{DocumentIdentity, ElementPath};

    struct FnCallable<F> {
        name: String,
        body: F,
    }

    impl<F> ScriptCallable for FnCallable<F>
    where
        F: Fn(ElementContext) -> Result<HostValue, String> + Send + Sync,
    {
        fn name(&self) -> &str {
            &self.name
        }

        fn invoke(&self, ctx: ElementContext) -> Result<HostValue, String> {
            (self.body)(ctx)
        }
    }

    fn resolved<F>(body: F) -> ResolvedCallable
    where
        F: Fn(ElementContext) -> Result<HostValue, String> + Send + Sync + 'static,
    {
        let identity = DocumentIdentity::from_source_path("exec.xml");
        let handle: Arc<dyn ScriptCallable> = Arc::new(FnCallable {
            name: identity.callable_name(0),
            body,
        });
        ResolvedCallable {
            artifact: Arc::new(CompiledArtifact {
                artifact_name: "RunCode_exec".to_string(),
                identity,
                source: String::new(),
                handles: vec![Arc::clone(&handle)],
            }),
            handle,
            ordinal: 0,
            source_path: "exec.xml".to_string(),
            element: ElementPath(vec![0]),
        }
    }

    struct CountdownHost {
        delay: usize,
        polls: usize,
        settled: usize,
    }

    impl AwaitHost for CountdownHost {
        fn poll_await(&mut self, _request: &AwaitRequest) -> AwaitPoll {
            self.polls += 1;
            if self.polls < self.delay {
                return AwaitPoll::Pending;
            }
            self.polls = 0;
            self.settled += 1;
            AwaitPoll::Ready(HostValue::Number(self.settled as f64))
        }
    }

    fn start(resolved: &ResolvedCallable) -> ScriptTask {
        ScriptTask::start(resolved, Arc::new(EmptyHostFunctionRegistry::default()))
            .expect("task should start")
    }

    #[test]
    fn snippet_without_awaits_finishes_on_first_poll() {
        let resolved = resolved(|_ctx| Ok(HostValue::Bool(true)));
        let mut task = start(&resolved);
        let mut host = CountdownHost {
            delay: 1,
            polls: 0,
            settled: 0,
        };
        match task.poll(&mut host) {
            TaskPoll::Ready(Ok(value)) => assert_eq!(value, HostValue::Bool(true)),
            other => panic!("unexpected poll result: {:?}", other),
        }
        assert!(task.is_finished());
    }

    #[test]
    fn suspended_snippet_resumes_with_host_value() {
        let resolved = resolved(|ctx| {
            let first = ctx_wait(&ctx, 100.0)?;
            let second = ctx_wait(&ctx, 200.0)?;
            Ok(HostValue::Array(vec![first, second]))
        });
        let mut task = start(&resolved);
        let mut host = CountdownHost {
            delay: 2,
            polls: 0,
            settled: 0,
        };

        assert!(matches!(task.poll(&mut host), TaskPoll::Pending));
        assert_eq!(task.awaiting(), Some(&AwaitRequest::wait(100.0)));
        assert!(matches!(task.poll(&mut host), TaskPoll::Pending));
        assert!(matches!(task.poll(&mut host), TaskPoll::Pending));
        assert_eq!(task.awaiting(), Some(&AwaitRequest::wait(200.0)));
        assert!(matches!(task.poll(&mut host), TaskPoll::Pending));

        match task.poll(&mut host) {
            TaskPoll::Ready(Ok(value)) => assert_eq!(
                value,
                HostValue::Array(vec![HostValue::Number(1.0), HostValue::Number(2.0)])
            ),
            other => panic!("unexpected poll result: {:?}", other),
        }
    }

    #[test]
    fn failed_await_raises_inside_the_snippet() {
        struct FailingHost;
        impl AwaitHost for FailingHost {
            fn poll_await(&mut self, _request: &AwaitRequest) -> AwaitPoll {
                AwaitPoll::Failed("path blocked".to_string())
            }
        }

        let resolved = resolved(|ctx| ctx_wait(&ctx, 5.0));
        let mut task = start(&resolved);
        assert!(matches!(task.poll(&mut FailingHost), TaskPoll::Pending));
        match task.poll(&mut FailingHost) {
            TaskPoll::Ready(Err(error)) => {
                assert_eq!(error.code, RUNTIME_ERROR);
                assert!(error.message.contains("path blocked"));
            }
            other => panic!("unexpected poll result: {:?}", other),
        }
    }

    #[test]
    fn dropping_a_suspended_task_cancels_the_await() {
        let (done_tx, done_rx) = mpsc::channel();
        let done_tx = Mutex::new(done_tx);
        let resolved = resolved(move |ctx| {
            let outcome = ctx_wait(&ctx, 1.0);
            let _ = done_tx.lock().send(outcome.clone());
            outcome
        });
        let mut task = start(&resolved);
        let mut host = CountdownHost {
            delay: 100,
            polls: 0,
            settled: 0,
        };
        assert!(matches!(task.poll(&mut host), TaskPoll::Pending));
        drop(task);

        let outcome = done_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("worker should observe cancellation");
        assert!(outcome.expect_err("await should be cancelled").contains("cancelled"));
    }

    #[test]
    fn polling_a_finished_task_reports_an_error() {
        let resolved = resolved(|_ctx| Ok(HostValue::Null));
        let mut task = start(&resolved);
        let mut host = CountdownHost {
            delay: 1,
            polls: 0,
            settled: 0,
        };
        assert!(matches!(task.poll(&mut host), TaskPoll::Ready(Ok(_))));
        assert!(matches!(task.poll(&mut host), TaskPoll::Ready(Err(_))));
    }

    fn ctx_wait(ctx: &ElementContext, ms: f64) -> Result<HostValue, String> {
        ctx.suspend(AwaitRequest::wait(ms))
    }
}
