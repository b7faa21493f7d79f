use std::collections::BTreeMap;

use rc_core::{HostValue, RunCodeError};
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map, Position, FLOAT, INT};

use crate::context::{AwaitRequest, ElementContext};

pub fn host_value_to_dynamic(value: &HostValue) -> Dynamic {
    match value {
        HostValue::Null => Dynamic::UNIT,
        HostValue::Bool(value) => Dynamic::from_bool(*value),
        HostValue::Number(value) => {
            if value.fract().abs() < f64::EPSILON && value.abs() < INT::MAX as f64 {
                Dynamic::from_int(*value as INT)
            } else {
                Dynamic::from_float(*value as FLOAT)
            }
        }
        HostValue::String(value) => Dynamic::from(value.clone()),
        HostValue::Array(values) => {
            let array = values.iter().map(host_value_to_dynamic).collect::<Array>();
            Dynamic::from_array(array)
        }
        HostValue::Map(values) => {
            let mut map = Map::new();
            for (key, value) in values {
                map.insert(key.clone().into(), host_value_to_dynamic(value));
            }
            Dynamic::from_map(map)
        }
    }
}

pub fn dynamic_to_host_value(value: Dynamic) -> Result<HostValue, RunCodeError> {
    let value = value.flatten();
    if value.is_unit() {
        return Ok(HostValue::Null);
    }
    if value.is::<bool>() {
        return Ok(HostValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(HostValue::Number(value.cast::<INT>() as f64));
    }
    if value.is::<FLOAT>() {
        return Ok(HostValue::Number(value.cast::<FLOAT>()));
    }
    if value.is::<ImmutableString>() {
        return Ok(HostValue::String(
            value.cast::<ImmutableString>().to_string(),
        ));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_host_value(item)?);
        }
        return Ok(HostValue::Array(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.to_string(), dynamic_to_host_value(value)?);
        }
        return Ok(HostValue::Map(out));
    }

    Err(RunCodeError::new(
        "VALUE_UNSUPPORTED",
        format!("Unsupported script value type \"{}\".", value.type_name()),
    ))
}

// Lossy: values with no host shape become Null.
pub fn result_to_host_value(value: Dynamic) -> HostValue {
    let value = value.flatten();
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        return HostValue::Array(array.into_iter().map(result_to_host_value).collect());
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        return HostValue::Map(
            map.into_iter()
                .map(|(key, value)| (key.to_string(), result_to_host_value(value)))
                .collect(),
        );
    }
    dynamic_to_host_value(value).unwrap_or(HostValue::Null)
}

fn runtime_error(message: impl Into<String>) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        Dynamic::from(message.into()),
        Position::NONE,
    ))
}

fn array_to_host_values(args: Array) -> Result<Vec<HostValue>, Box<EvalAltResult>> {
    args.into_iter()
        .map(|arg| dynamic_to_host_value(arg).map_err(|error| runtime_error(error.message)))
        .collect()
}

fn suspend(
    ctx: &ElementContext,
    request: AwaitRequest,
) -> Result<Dynamic, Box<EvalAltResult>> {
    let value = ctx.suspend(request).map_err(runtime_error)?;
    Ok(host_value_to_dynamic(&value))
}

fn query(
    ctx: &ElementContext,
    name: &str,
    args: Array,
) -> Result<Dynamic, Box<EvalAltResult>> {
    let args = array_to_host_values(args)?;
    let value = ctx
        .query(name, &args)
        .map_err(|error| runtime_error(error.to_string()))?;
    Ok(host_value_to_dynamic(&value))
}

pub(crate) fn register_context_api(engine: &mut Engine) {
    engine.register_type_with_name::<ElementContext>("ElementContext");

    engine.register_fn(
        "wait",
        |ctx: &mut ElementContext, ms: INT| -> Result<Dynamic, Box<EvalAltResult>> {
            suspend(ctx, AwaitRequest::wait(ms as f64))
        },
    );
    engine.register_fn(
        "wait",
        |ctx: &mut ElementContext, ms: FLOAT| -> Result<Dynamic, Box<EvalAltResult>> {
            suspend(ctx, AwaitRequest::wait(ms))
        },
    );
    engine.register_fn(
        "await_op",
        |ctx: &mut ElementContext, op: ImmutableString| -> Result<Dynamic, Box<EvalAltResult>> {
            suspend(
                ctx,
                AwaitRequest {
                    op: op.to_string(),
                    args: Vec::new(),
                },
            )
        },
    );
    engine.register_fn(
        "await_op",
        |ctx: &mut ElementContext,
         op: ImmutableString,
         args: Array|
         -> Result<Dynamic, Box<EvalAltResult>> {
            let args = array_to_host_values(args)?;
            suspend(
                ctx,
                AwaitRequest {
                    op: op.to_string(),
                    args,
                },
            )
        },
    );
    engine.register_fn(
        "query",
        |ctx: &mut ElementContext,
         name: ImmutableString,
         args: Array|
         -> Result<Dynamic, Box<EvalAltResult>> { query(ctx, name.as_str(), args) },
    );
    engine.register_fn(
        "query",
        |ctx: &mut ElementContext, name: ImmutableString| -> Result<Dynamic, Box<EvalAltResult>> {
            query(ctx, name.as_str(), Array::new())
        },
    );
    engine.register_fn(
        "has_query",
        |ctx: &mut ElementContext, name: ImmutableString| ctx.has_query(name.as_str()),
    );
    engine.register_fn("log", |ctx: &mut ElementContext, message: Dynamic| {
        tracing::info!(
            document = %ctx.info.source_path,
            element = %ctx.info.element,
            "{}",
            message
        );
    });
    engine.register_get("ordinal", |ctx: &mut ElementContext| ctx.info.ordinal as INT);
    engine.register_get("document", |ctx: &mut ElementContext| {
        ctx.info.source_path.clone()
    });
    engine.register_get("element", |ctx: &mut ElementContext| {
        ctx.info.element.to_string()
    });
}
