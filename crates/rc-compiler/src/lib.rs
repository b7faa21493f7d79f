mod aggregate;
mod compile;
mod context;
mod extract;
mod rhai_bridge;
mod synthesize;

pub use aggregate::aggregate_document;
pub use compile::{CompiledArtifact, RhaiCompiler, ScriptCallable, UnitCompiler};
pub use context::{
    AwaitRequest, ContextInfo, ElementContext, EmptyHostFunctionRegistry, HostFunctionRegistry,
    Suspender,
};
pub use extract::{empty_code_error, extract_snippet, is_engine_element, Snippet};
pub use rhai_bridge::{dynamic_to_host_value, host_value_to_dynamic, result_to_host_value};
pub use synthesize::{synthesize_unit, CompilationUnit, UnitSegment, PREAMBLE};
