use std::fmt;
use std::sync::Arc;

use rc_core::{DocumentIdentity, ElementPath, HostValue, RunCodeError};

pub trait HostFunctionRegistry: Send + Sync {
    fn call(&self, name: &str, args: &[HostValue]) -> Result<HostValue, RunCodeError>;
    fn names(&self) -> &[String];
}

#[derive(Debug, Default)]
pub struct EmptyHostFunctionRegistry {
    names: Vec<String>,
}

impl HostFunctionRegistry for EmptyHostFunctionRegistry {
    fn call(&self, name: &str, _args: &[HostValue]) -> Result<HostValue, RunCodeError> {
        Err(RunCodeError::new(
            "HOST_FUNCTION_MISSING",
            format!("Host function \"{}\" is not registered.", name),
        ))
    }

    fn names(&self) -> &[String] {
        &self.names
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AwaitRequest {
    pub op: String,
    pub args: Vec<HostValue>,
}

impl AwaitRequest {
    pub fn wait(ms: f64) -> Self {
        Self {
            op: "wait".to_string(),
            args: vec![HostValue::Number(ms)],
        }
    }
}

pub trait Suspender: Send + Sync {
    fn suspend(&self, request: AwaitRequest) -> Result<HostValue, String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub source_path: String,
    pub identity: DocumentIdentity,
    pub element: ElementPath,
    pub ordinal: usize,
}

#[derive(Clone)]
pub struct ElementContext {
    pub(crate) info: Arc<ContextInfo>,
    host_functions: Arc<dyn HostFunctionRegistry>,
    suspender: Arc<dyn Suspender>,
}

impl ElementContext {
    pub fn new(
        info: ContextInfo,
        host_functions: Arc<dyn HostFunctionRegistry>,
        suspender: Arc<dyn Suspender>,
    ) -> Self {
        Self {
            info: Arc::new(info),
            host_functions,
            suspender,
        }
    }

    pub fn info(&self) -> &ContextInfo {
        &self.info
    }

    pub fn suspend(&self, request: AwaitRequest) -> Result<HostValue, String> {
        self.suspender.suspend(request)
    }

    pub fn query(&self, name: &str, args: &[HostValue]) -> Result<HostValue, RunCodeError> {
        self.host_functions.call(name, args)
    }

    pub fn has_query(&self, name: &str) -> bool {
        self.host_functions.names().iter().any(|known| known == name)
    }
}

impl fmt::Debug for ElementContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementContext")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
