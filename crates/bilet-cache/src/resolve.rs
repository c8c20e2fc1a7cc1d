//! Value resolvers: auxiliary callables that contribute runtime-derived
//! values to a cache key, or run purely for their side effects.
//!
//! Three kinds exist:
//!
//! - [`ParamResolver`] — invoked with template arguments where any template
//!   string naming a runtime argument is substituted by that argument's
//!   value. Its return value is discarded by the dispatcher; it exists to
//!   enforce things (an invalid token must fail the request before any
//!   cache traffic happens).
//! - [`WriterResolver`] — its return value becomes key material. Wraps a
//!   `ParamResolver` when the computation needs runtime arguments, or a
//!   bare thunk when it does not.
//! - `Effect` — a plain thunk run for side effects only.
//!
//! Resolver errors carry the caller's own error type `E` and propagate
//! untouched; the aspects never swallow them.

use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Boxed future returned by resolver targets.
pub type ResolverFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

type TargetFn<E> = Arc<dyn Fn(Vec<Value>, Map<String, Value>) -> ResolverFuture<Value, E> + Send + Sync>;
type ThunkFn<T, E> = Arc<dyn Fn() -> ResolverFuture<T, E> + Send + Sync>;

/// A resolver invoked with substituted template arguments.
///
/// Template arguments are cloned per invocation before substitution, so one
/// configured resolver can serve concurrent requests without leaking values
/// between them.
pub struct ParamResolver<E> {
    target: TargetFn<E>,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

impl<E> ParamResolver<E> {
    /// Wrap a target callable. Template arguments are attached with
    /// [`arg`](Self::arg) and [`kwarg`](Self::kwarg).
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(Vec<Value>, Map<String, Value>) -> ResolverFuture<Value, E> + Send + Sync + 'static,
    {
        Self {
            target: Arc::new(target),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    /// Append a positional template argument. A string value naming a
    /// runtime argument is substituted at call time.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Attach a named template argument, substituted the same way.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub(crate) async fn call(&self, runtime: &Map<String, Value>) -> Result<Value, E> {
        let mut args = self.args.clone();
        let mut kwargs = self.kwargs.clone();
        substitute_args(&mut args, runtime);
        substitute_kwargs(&mut kwargs, runtime);
        (self.target)(args, kwargs).await
    }
}

impl<E> Clone for ParamResolver<E> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            args: self.args.clone(),
            kwargs: self.kwargs.clone(),
        }
    }
}

impl<E> std::fmt::Debug for ParamResolver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamResolver")
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .finish_non_exhaustive()
    }
}

enum WriterTarget<E> {
    Param(ParamResolver<E>),
    Thunk(ThunkFn<Value, E>),
}

/// A resolver whose return value is folded into the cache key.
pub struct WriterResolver<E> {
    target: WriterTarget<E>,
}

impl<E> WriterResolver<E> {
    /// Capture the result of a bare computation (e.g. "current user id").
    pub fn new<F>(thunk: F) -> Self
    where
        F: Fn() -> ResolverFuture<Value, E> + Send + Sync + 'static,
    {
        Self {
            target: WriterTarget::Thunk(Arc::new(thunk)),
        }
    }

    /// Capture the result of a [`ParamResolver`], giving the computation
    /// access to substituted runtime arguments.
    pub fn from_param(param: ParamResolver<E>) -> Self {
        Self {
            target: WriterTarget::Param(param),
        }
    }

    pub(crate) async fn call(&self, runtime: &Map<String, Value>) -> Result<Value, E> {
        match &self.target {
            WriterTarget::Param(param) => param.call(runtime).await,
            WriterTarget::Thunk(thunk) => thunk().await,
        }
    }
}

impl<E> Clone for WriterResolver<E> {
    fn clone(&self) -> Self {
        Self {
            target: match &self.target {
                WriterTarget::Param(p) => WriterTarget::Param(p.clone()),
                WriterTarget::Thunk(t) => WriterTarget::Thunk(Arc::clone(t)),
            },
        }
    }
}

impl<E> std::fmt::Debug for WriterResolver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            WriterTarget::Param(p) => f.debug_tuple("WriterResolver").field(p).finish(),
            WriterTarget::Thunk(_) => f.write_str("WriterResolver(thunk)"),
        }
    }
}

/// One configured resolver slot on an aspect.
pub enum Resolver<E> {
    /// Run with substituted arguments; result discarded.
    Param(ParamResolver<E>),
    /// Run and fold the result into the key material.
    Writer(WriterResolver<E>),
    /// Run for side effects only.
    Effect(ThunkFn<(), E>),
}

impl<E> Resolver<E> {
    pub fn param(param: ParamResolver<E>) -> Self {
        Self::Param(param)
    }

    pub fn writer(writer: WriterResolver<E>) -> Self {
        Self::Writer(writer)
    }

    pub fn effect<F>(thunk: F) -> Self
    where
        F: Fn() -> ResolverFuture<(), E> + Send + Sync + 'static,
    {
        Self::Effect(Arc::new(thunk))
    }
}

impl<E> Clone for Resolver<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Param(p) => Self::Param(p.clone()),
            Self::Writer(w) => Self::Writer(w.clone()),
            Self::Effect(t) => Self::Effect(Arc::clone(t)),
        }
    }
}

impl<E> std::fmt::Debug for Resolver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Param(p) => f.debug_tuple("Resolver::Param").field(p).finish(),
            Self::Writer(w) => f.debug_tuple("Resolver::Writer").field(w).finish(),
            Self::Effect(_) => f.write_str("Resolver::Effect"),
        }
    }
}

/// Run every resolver in order against the bound runtime arguments.
///
/// Only Writer results are accumulated; Param and Effect resolvers run for
/// their side effects and their return values are dropped.
pub async fn launch<E>(
    resolvers: &[Resolver<E>],
    runtime: &Map<String, Value>,
) -> Result<Vec<Value>, E> {
    let mut produced = Vec::new();
    for resolver in resolvers {
        match resolver {
            Resolver::Writer(writer) => produced.push(writer.call(runtime).await?),
            Resolver::Param(param) => {
                param.call(runtime).await?;
            }
            Resolver::Effect(thunk) => thunk().await?,
        }
    }
    Ok(produced)
}

/// Assemble the key-material map for one invocation: Writer results under a
/// private slot, substituted data templates under another. Empty collections
/// are left out so "no resolvers" and "resolvers that produced nothing"
/// derive the same key.
pub(crate) async fn build_key_material<E>(
    resolvers: &[Resolver<E>],
    data: &[Value],
    runtime: &Map<String, Value>,
) -> Result<Map<String, Value>, E> {
    let mut parameters = Map::new();

    if !resolvers.is_empty() {
        let produced = launch(resolvers, runtime).await?;
        if !produced.is_empty() {
            parameters.insert("__resolved__".to_string(), Value::Array(produced));
        }
    }

    if !data.is_empty() {
        let mut templates = data.to_vec();
        substitute_args(&mut templates, runtime);
        parameters.insert("__data__".to_string(), Value::Array(templates));
    }

    Ok(parameters)
}

/// Substitute template strings naming runtime arguments with their values.
/// One level deep: nested containers are left untouched.
pub(crate) fn substitute_args(templates: &mut [Value], runtime: &Map<String, Value>) {
    for slot in templates.iter_mut() {
        if let Value::String(name) = slot {
            if let Some(replacement) = runtime.get(name.as_str()) {
                *slot = replacement.clone();
            }
        }
    }
}

fn substitute_kwargs(templates: &mut Map<String, Value>, runtime: &Map<String, Value>) {
    for (_, slot) in templates.iter_mut() {
        if let Value::String(name) = slot {
            if let Some(replacement) = runtime.get(name.as_str()) {
                *slot = replacement.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct TestError(&'static str);

    fn runtime(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn param_templates_are_substituted() {
        let resolver: ParamResolver<TestError> = ParamResolver::new(|args, kwargs| {
            Box::pin(async move {
                assert_eq!(args, vec![json!("abc"), json!("not_an_arg")]);
                assert_eq!(kwargs.get("token"), Some(&json!("abc")));
                Ok(Value::Null)
            })
        })
        .arg("auth_token")
        .arg("not_an_arg")
        .kwarg("token", "auth_token");

        let rt = runtime(&[("auth_token", json!("abc"))]);
        resolver.call(&rt).await.unwrap();
    }

    #[tokio::test]
    async fn substitution_is_one_level_deep() {
        let resolver: ParamResolver<TestError> = ParamResolver::new(|args, _| {
            Box::pin(async move {
                // the nested list is not recursed into
                assert_eq!(args, vec![json!(["auth_token"])]);
                Ok(Value::Null)
            })
        })
        .arg(json!(["auth_token"]));

        let rt = runtime(&[("auth_token", json!("abc"))]);
        resolver.call(&rt).await.unwrap();
    }

    #[tokio::test]
    async fn templates_do_not_leak_between_calls() {
        let resolver: ParamResolver<TestError> = ParamResolver::new(|args, _| {
            Box::pin(async move { Ok(args.into_iter().next().unwrap_or(Value::Null)) })
        })
        .arg("auth_token");

        let first = resolver
            .call(&runtime(&[("auth_token", json!("first"))]))
            .await
            .unwrap();
        let second = resolver
            .call(&runtime(&[("auth_token", json!("second"))]))
            .await
            .unwrap();
        assert_eq!(first, json!("first"));
        assert_eq!(second, json!("second"));
    }

    #[tokio::test]
    async fn launch_collects_only_writer_results() {
        static PARAM_CALLS: AtomicUsize = AtomicUsize::new(0);

        let resolvers: Vec<Resolver<TestError>> = vec![
            Resolver::param(ParamResolver::new(|_, _| {
                Box::pin(async {
                    PARAM_CALLS.fetch_add(1, Ordering::SeqCst);
                    Ok(json!("discarded"))
                })
            })),
            Resolver::writer(WriterResolver::new(|| {
                Box::pin(async { Ok(json!(7)) })
            })),
            Resolver::effect(|| Box::pin(async { Ok(()) })),
        ];

        let produced = launch(&resolvers, &Map::new()).await.unwrap();
        assert_eq!(produced, vec![json!(7)]);
        assert_eq!(PARAM_CALLS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn writer_delegates_runtime_args_to_wrapped_param() {
        let writer: WriterResolver<TestError> =
            WriterResolver::from_param(
                ParamResolver::new(|args, _| {
                    Box::pin(async move { Ok(args.into_iter().next().unwrap_or(Value::Null)) })
                })
                .arg("user_id"),
            );

        let value = writer
            .call(&runtime(&[("user_id", json!(42))]))
            .await
            .unwrap();
        assert_eq!(value, json!(42));
    }

    #[tokio::test]
    async fn resolver_errors_propagate() {
        let resolvers: Vec<Resolver<TestError>> = vec![Resolver::param(ParamResolver::new(
            |_, _| Box::pin(async { Err(TestError("bad token")) }),
        ))];

        let err = launch(&resolvers, &Map::new()).await.unwrap_err();
        assert_eq!(err, TestError("bad token"));
    }

    #[tokio::test]
    async fn key_material_skips_empty_slots() {
        let material =
            build_key_material::<TestError>(&[], &[], &Map::new()).await.unwrap();
        assert!(material.is_empty());

        let material = build_key_material::<TestError>(
            &[],
            &[json!("event_id")],
            &runtime(&[("event_id", json!(3))]),
        )
        .await
        .unwrap();
        assert_eq!(material["__data__"], json!([3]));
    }
}
