//! Rhai API for exporting, showing, importing and caching parts
//!
//! ```rhai
//! let plate = cuboid(60.0, 40.0, 2.0);
//! plate.export_part("flat");
//!
//! let strip = import_part("command_strip_plate.rhai", "flat-female");
//! let hook = cached(Fn("make_hook"), [12.0, 3]);
//! show(plate.union(hook));
//! ```

use crate::cache_bridge;
use crate::runner;
use crate::workshop::Workshop;
use cadkit_core::Shape;
use rhai::{Array, Dynamic, Engine, EvalAltResult, FnPtr, ImmutableString, Map, NativeCallContext};
use std::sync::Arc;

type RhaiResult<T> = Result<T, Box<EvalAltResult>>;

fn export_shape(shop: &Workshop, ctx: &NativeCallContext, shape: Shape, name: &str) -> RhaiResult<Shape> {
    match shop.export(&shape, name) {
        Ok(None) => Ok(shape),
        // Uncatchable, so `try` blocks in the script cannot swallow it
        Ok(Some(exit)) => Err(EvalAltResult::ErrorTerminated(Dynamic::from(exit), ctx.call_position()).into()),
        Err(e) => Err(e.to_string().into()),
    }
}

fn import_shape(shop: &Workshop, ctx: &NativeCallContext, script: &str, name: &str) -> RhaiResult<Shape> {
    let path = shop.resolve_part(script);
    runner::import_part(ctx.engine(), shop, &path, name).map_err(|e| e.to_string().into())
}

/// Register the workshop functions. Every closure shares `shop`.
pub fn register_part_api(engine: &mut Engine, shop: &Arc<Workshop>) {
    // === Export ===
    let s = Arc::clone(shop);
    engine.register_fn("export_part", move |ctx: NativeCallContext, shape: Shape| {
        export_shape(&s, &ctx, shape, "")
    });
    let s = Arc::clone(shop);
    engine.register_fn(
        "export_part",
        move |ctx: NativeCallContext, shape: Shape, name: ImmutableString| {
            export_shape(&s, &ctx, shape, name.as_str())
        },
    );

    // === Display ===
    let s = Arc::clone(shop);
    engine.register_fn("show", move |shape: Shape| -> Shape {
        s.show(&shape);
        shape
    });

    // === Import ===
    let s = Arc::clone(shop);
    engine.register_fn(
        "import_part",
        move |ctx: NativeCallContext, script: ImmutableString| {
            import_shape(&s, &ctx, script.as_str(), "")
        },
    );
    let s = Arc::clone(shop);
    engine.register_fn(
        "import_part",
        move |ctx: NativeCallContext, script: ImmutableString, name: ImmutableString| {
            import_shape(&s, &ctx, script.as_str(), name.as_str())
        },
    );

    // === Cache ===
    let s = Arc::clone(shop);
    engine.register_fn(
        "cached",
        move |ctx: NativeCallContext, builder: FnPtr, args: Array| -> RhaiResult<Dynamic> {
            cache_bridge::cached(&s, &ctx, &builder, args, None)
        },
    );
    let s = Arc::clone(shop);
    engine.register_fn(
        "cached",
        move |ctx: NativeCallContext, builder: FnPtr, args: Array, kwargs: Map| -> RhaiResult<Dynamic> {
            cache_bridge::cached(&s, &ctx, &builder, args, Some(kwargs))
        },
    );
}
