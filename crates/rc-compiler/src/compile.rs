use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rc_core::{Diagnostic, DocumentIdentity, HostValue, RunCodeOptions};
use rhai::{CallFnOptions, Dynamic, Engine, EvalAltResult, ParseError, Scope, AST};

use crate::context::ElementContext;
use crate::rhai_bridge::{register_context_api, result_to_host_value};
use crate::synthesize::CompilationUnit;

pub trait ScriptCallable: Send + Sync {
    fn name(&self) -> &str;
    fn invoke(&self, ctx: ElementContext) -> Result<HostValue, String>;
}

// handles[i] backs the statement with ordinal i.
pub struct CompiledArtifact {
    pub artifact_name: String,
    pub identity: DocumentIdentity,
    pub source: String,
    pub handles: Vec<Arc<dyn ScriptCallable>>,
}

impl CompiledArtifact {
    pub fn handle(&self, ordinal: usize) -> Option<&Arc<dyn ScriptCallable>> {
        self.handles.get(ordinal)
    }
}

impl fmt::Debug for CompiledArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledArtifact")
            .field("artifact_name", &self.artifact_name)
            .field("identity", &self.identity)
            .field(
                "handles",
                &self
                    .handles
                    .iter()
                    .map(|handle| handle.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

pub trait UnitCompiler: Send + Sync {
    fn compile(
        &self,
        unit: &CompilationUnit,
        artifact_name: &str,
    ) -> Result<CompiledArtifact, Vec<Diagnostic>>;
}

// Variables declared by definitions live in `scope` as shared cells, so a
// write from one statement is seen by every later call.
struct UnitInstance {
    engine: Arc<Engine>,
    ast: AST,
    scope: Scope<'static>,
}

struct RhaiCallable {
    instance: Arc<UnitInstance>,
    name: String,
}

impl ScriptCallable for RhaiCallable {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, ctx: ElementContext) -> Result<HostValue, String> {
        let mut scope = self.instance.scope.clone();
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let result = self
            .instance
            .engine
            .call_fn_with_options::<Dynamic>(
                options,
                &mut scope,
                &self.instance.ast,
                &self.name,
                (ctx,),
            )
            .map_err(|error| error.to_string())?;
        Ok(result_to_host_value(result))
    }
}

pub struct RhaiCompiler {
    engine: Arc<Engine>,
    scratch_dir: Option<PathBuf>,
}

impl RhaiCompiler {
    pub fn new(options: &RunCodeOptions) -> Self {
        let mut engine = Engine::new();
        engine.set_strict_variables(true);
        if options.max_operations > 0 {
            engine.set_max_operations(options.max_operations);
        }
        register_context_api(&mut engine);
        Self {
            engine: Arc::new(engine),
            scratch_dir: options.scratch_dir.clone(),
        }
    }

    fn emit_scratch(&self, unit: &CompilationUnit, artifact_name: &str) -> Result<(), Diagnostic> {
        let Some(dir) = &self.scratch_dir else {
            return Ok(());
        };
        let path = dir.join(format!("{}.rhai", artifact_name));
        fs::create_dir_all(dir)
            .and_then(|_| fs::write(&path, &unit.source))
            .map_err(|error| {
                Diagnostic::new(format!(
                    "Failed to write unit to {}: {}",
                    path.display(),
                    error
                ))
            })?;
        tracing::debug!(path = %path.display(), "wrote compilation unit");
        Ok(())
    }

    fn instantiate(&self, unit: &CompilationUnit) -> Result<Scope<'static>, Vec<Diagnostic>> {
        let prelude = self
            .engine
            .compile(unit.prelude())
            .map_err(|error| vec![parse_diagnostic(unit, &error)])?;

        let mut defined = Scope::new();
        self.engine
            .run_ast_with_scope(&mut defined, &prelude)
            .map_err(|error| vec![instantiation_diagnostic(unit, &error)])?;

        let mut scope = Scope::new();
        for (name, is_constant, value) in defined.iter() {
            if is_constant {
                scope.push_constant_dynamic(name.to_string(), value);
            } else {
                scope.push_dynamic(name.to_string(), value.into_shared());
            }
        }
        Ok(scope)
    }
}

fn parse_diagnostic(unit: &CompilationUnit, error: &ParseError) -> Diagnostic {
    unit.locate(Diagnostic {
        message: error.err_type().to_string(),
        line: error.position().line(),
        origin: None,
    })
}

fn instantiation_diagnostic(unit: &CompilationUnit, error: &EvalAltResult) -> Diagnostic {
    unit.locate(Diagnostic {
        message: format!("Unit instantiation failed: {}", error),
        line: error.position().line(),
        origin: None,
    })
}

impl UnitCompiler for RhaiCompiler {
    fn compile(
        &self,
        unit: &CompilationUnit,
        artifact_name: &str,
    ) -> Result<CompiledArtifact, Vec<Diagnostic>> {
        self.emit_scratch(unit, artifact_name)
            .map_err(|diagnostic| vec![diagnostic])?;

        let scope = self.instantiate(unit)?;
        let ast = self
            .engine
            .compile_with_scope(&scope, &unit.source)
            .map_err(|error| vec![parse_diagnostic(unit, &error)])?;

        let defined = ast
            .iter_functions()
            .filter(|function| function.params.len() == 1)
            .map(|function| function.name.to_string())
            .collect::<BTreeSet<_>>();
        let missing = unit
            .callable_names
            .iter()
            .filter(|name| !defined.contains(*name))
            .map(|name| Diagnostic::new(format!("Generated callable \"{}\" is missing.", name)))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(missing);
        }

        let instance = Arc::new(UnitInstance {
            engine: Arc::clone(&self.engine),
            ast,
            scope,
        });
        let handles = unit
            .callable_names
            .iter()
            .map(|name| {
                Arc::new(RhaiCallable {
                    instance: Arc::clone(&instance),
                    name: name.clone(),
                }) as Arc<dyn ScriptCallable>
            })
            .collect();

        Ok(CompiledArtifact {
            artifact_name: artifact_name.to_string(),
            identity: unit.identity.clone(),
            source: unit.source.clone(),
            handles,
        })
    }
}
