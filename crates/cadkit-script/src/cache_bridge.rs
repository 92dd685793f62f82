//! `cached(Fn("builder"), [args])` for scripts
//!
//! A script builder is identified by its function name plus a digest of the
//! script that is running, so editing the script invalidates its entries.

use crate::workshop::Workshop;
use cadkit_cache::{BuilderId, CacheArg, CacheCall, CacheError};
use cadkit_core::{Artifact, Compound, Shape};
use rhai::{Array, Dynamic, EvalAltResult, FnPtr, Map, NativeCallContext};
use std::collections::BTreeMap;

/// Why a cached build did not produce an artifact
enum BuildFailure {
    Cache(CacheError),
    /// The builder itself failed; passed back to the script untouched
    Eval(Box<EvalAltResult>),
}

impl From<CacheError> for BuildFailure {
    fn from(e: CacheError) -> Self {
        BuildFailure::Cache(e)
    }
}

/// Convert a script value into a cache-key argument
pub fn dynamic_to_arg(value: &Dynamic) -> Result<CacheArg, CacheError> {
    if value.is_unit() {
        return Ok(CacheArg::Unit);
    }
    if let Ok(b) = value.as_bool() {
        return Ok(CacheArg::Bool(b));
    }
    if let Ok(i) = value.as_int() {
        return Ok(CacheArg::Int(i));
    }
    if let Ok(f) = value.as_float() {
        return Ok(CacheArg::Float(f));
    }
    if let Ok(c) = value.as_char() {
        return Ok(CacheArg::Str(c.to_string()));
    }
    if value.is_string() {
        return Ok(CacheArg::Str(value.to_string()));
    }
    if let Some(shape) = value.clone().try_cast::<Shape>() {
        return Ok(CacheArg::Shape(shape));
    }
    if let Some(items) = value.clone().try_cast::<Array>() {
        return items
            .iter()
            .map(dynamic_to_arg)
            .collect::<Result<Vec<_>, _>>()
            .map(CacheArg::List);
    }
    if let Some(map) = value.clone().try_cast::<Map>() {
        return map_to_args(&map).map(CacheArg::Map);
    }
    Err(CacheError::UnsupportedArgument {
        found: value.type_name().to_string(),
    })
}

fn map_to_args(map: &Map) -> Result<BTreeMap<String, CacheArg>, CacheError> {
    map.iter()
        .map(|(k, v)| Ok((k.to_string(), dynamic_to_arg(v)?)))
        .collect()
}

/// A shape becomes a solid, an array of shapes a compound
pub fn dynamic_to_artifact(value: Dynamic) -> Result<Artifact, CacheError> {
    let found = value.type_name().to_string();
    let unsupported = || CacheError::UnsupportedCacheType {
        found: found.clone(),
    };

    if value.is::<Shape>() {
        return value.try_cast::<Shape>().map(Artifact::Solid).ok_or_else(unsupported);
    }
    let items = value.try_cast::<Array>().ok_or_else(unsupported)?;
    items
        .into_iter()
        .map(|item| item.try_cast::<Shape>())
        .collect::<Option<Vec<_>>>()
        .map(|parts| Artifact::Compound(Compound::new(parts)))
        .ok_or_else(unsupported)
}

pub fn artifact_to_dynamic(artifact: Artifact) -> Dynamic {
    match artifact {
        Artifact::Solid(shape) => Dynamic::from(shape),
        Artifact::Compound(compound) => compound
            .parts()
            .iter()
            .cloned()
            .map(Dynamic::from)
            .collect::<Array>()
            .into(),
    }
}

/// Call `builder` through the artifact cache.
///
/// With `kwargs`, the map is passed to the builder as one extra trailing
/// argument.
pub fn cached(
    shop: &Workshop,
    ctx: &NativeCallContext,
    builder: &FnPtr,
    args: Array,
    kwargs: Option<Map>,
) -> Result<Dynamic, Box<EvalAltResult>> {
    let fingerprint = shop.current_frame().map(|f| f.digest).unwrap_or_default();
    let to_script_err = |e: CacheError| -> Box<EvalAltResult> { e.to_string().into() };

    let mut call = CacheCall::new(BuilderId::new(builder.fn_name()).with_fingerprint(fingerprint));
    for value in builder.curry().iter().chain(args.iter()) {
        call.args.push(dynamic_to_arg(value).map_err(to_script_err)?);
    }
    if let Some(kwargs) = &kwargs {
        call.kwargs = map_to_args(kwargs).map_err(to_script_err)?;
    }

    let mut call_args = args;
    if let Some(kwargs) = kwargs {
        call_args.push(Dynamic::from_map(kwargs));
    }

    let built = shop.cache().get_or_build(&call, || {
        let value = builder
            .call_within_context::<Dynamic>(ctx, call_args)
            .map_err(BuildFailure::Eval)?;
        dynamic_to_artifact(value).map_err(BuildFailure::Cache)
    });

    match built {
        Ok(artifact) => Ok(artifact_to_dynamic(artifact)),
        Err(BuildFailure::Eval(err)) => Err(err),
        Err(BuildFailure::Cache(err @ CacheError::WriteFailed { .. })) => {
            // Caching is an optimisation; the part itself is fine
            tracing::warn!("{}", err);
            err.into_artifact()
                .map(artifact_to_dynamic)
                .ok_or_else(|| "cache write failed".into())
        }
        Err(BuildFailure::Cache(err)) => Err(to_script_err(err)),
    }
}
