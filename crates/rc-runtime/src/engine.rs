use std::sync::Arc;

use rc_compiler::{
    aggregate_document, synthesize_unit, CompiledArtifact, EmptyHostFunctionRegistry,
    HostFunctionRegistry, RhaiCompiler, UnitCompiler,
};
use rc_core::{render_diagnostics, DocumentIdentity, ElementPath, RunCodeError, RunCodeOptions};
use rc_parser::BehaviorDocument;

use crate::cache::CacheEntry;
use crate::dispatch::{resolve, Dispatch, ResolvedCallable};
use crate::executor::ScriptTask;
use crate::lifecycle::{Lifecycle, SessionEvents};

pub struct RunCodeEngine {
    options: RunCodeOptions,
    compiler: Arc<dyn UnitCompiler>,
    host_functions: Arc<dyn HostFunctionRegistry>,
    lifecycle: Lifecycle,
}

impl RunCodeEngine {
    pub fn new(options: RunCodeOptions) -> Result<Self, RunCodeError> {
        let compiler = Arc::new(RhaiCompiler::new(&options));
        Self::with_compiler(options, compiler)
    }

    pub fn with_compiler(
        options: RunCodeOptions,
        compiler: Arc<dyn UnitCompiler>,
    ) -> Result<Self, RunCodeError> {
        options.validate()?;
        Ok(Self {
            options,
            compiler,
            host_functions: Arc::new(EmptyHostFunctionRegistry::default()),
            lifecycle: Lifecycle::new(),
        })
    }

    pub fn with_host_functions(mut self, host_functions: Arc<dyn HostFunctionRegistry>) -> Self {
        self.host_functions = host_functions;
        self
    }

    pub fn options(&self) -> &RunCodeOptions {
        &self.options
    }

    pub fn host_functions(&self) -> Arc<dyn HostFunctionRegistry> {
        Arc::clone(&self.host_functions)
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn activate(&mut self, events: &mut dyn SessionEvents) {
        self.lifecycle.activate(events);
    }

    // Running tasks keep their own artifact reference.
    pub fn end_session(&mut self, events: &mut dyn SessionEvents) {
        self.lifecycle.end_session(events);
    }

    pub fn dispatch(
        &mut self,
        events: &mut dyn SessionEvents,
        document: &BehaviorDocument,
        path: &ElementPath,
    ) -> Result<Dispatch, RunCodeError> {
        let identity = document.identity();
        let session = self.lifecycle.activate(events);
        let entry = match session.cache.get(&identity) {
            Some(entry) => entry.clone(),
            None => {
                let entry = compile_document(
                    self.compiler.as_ref(),
                    &self.options,
                    document,
                    &identity,
                );
                session.cache.insert(identity.clone(), entry).clone()
            }
        };

        let elements = aggregate_document(document, &self.options);
        let dispatch = resolve(&entry, document, &elements, path)?;
        if let Dispatch::Callable(resolved) = &dispatch {
            tracing::debug!(
                document = %document.source_path,
                element = %path,
                callable = resolved.handle.name(),
                "dispatched"
            );
        }
        Ok(dispatch)
    }

    pub fn start_task(&self, resolved: &ResolvedCallable) -> Result<ScriptTask, RunCodeError> {
        ScriptTask::start(resolved, self.host_functions())
    }

    pub fn is_compiled(&self, identity: &DocumentIdentity) -> bool {
        self.cached_artifact(identity).is_some()
    }

    pub fn cached_artifact(&self, identity: &DocumentIdentity) -> Option<Arc<CompiledArtifact>> {
        match self.lifecycle.session()?.cache().get(identity)? {
            CacheEntry::Compiled(artifact) => Some(Arc::clone(artifact)),
            CacheEntry::Failed(_) => None,
        }
    }

    pub fn cache_entry(&self, identity: &DocumentIdentity) -> Option<CacheEntry> {
        self.lifecycle.session()?.cache().get(identity).cloned()
    }
}

fn compile_document(
    compiler: &dyn UnitCompiler,
    options: &RunCodeOptions,
    document: &BehaviorDocument,
    identity: &DocumentIdentity,
) -> CacheEntry {
    let elements = aggregate_document(document, options);
    let unit = synthesize_unit(identity, &elements);
    let artifact_name = identity.artifact_name();
    tracing::info!(
        document = %document.source_path,
        elements = elements.len(),
        callables = unit.callable_names.len(),
        artifact = %artifact_name,
        "compiling runcode document"
    );

    match compiler.compile(&unit, &artifact_name) {
        Ok(artifact) => {
            tracing::info!(artifact = %artifact.artifact_name, "runcode document compiled");
            CacheEntry::Compiled(Arc::new(artifact))
        }
        Err(diagnostics) => {
            tracing::error!(
                fatal = true,
                document = %document.source_path,
                "runcode document failed to compile:\n{}",
                render_diagnostics(&diagnostics)
            );
            CacheEntry::Failed(Arc::new(diagnostics))
        }
    }
}
