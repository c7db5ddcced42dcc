#![allow(dead_code)]

use decorum_core::{
    decorator_body, target_invoker, ClassMetadata, DecoratorBody, DecoratorId, DelegatePoint,
    Delegate, Dispatcher, InvocationError, ResolvedChain,
};
use decorum_types::{parse_type_ref, MethodSignature, TypeDecl, TypeHierarchy, TypeRef};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

pub type Trace = Arc<Mutex<Vec<String>>>;

pub fn ty(text: &str) -> TypeRef {
    parse_type_ref(text).unwrap()
}

pub fn m() -> MethodSignature {
    MethodSignature::nullary("m")
}

pub fn n() -> MethodSignature {
    MethodSignature::nullary("n")
}

/// `Service` declares `m()` and `n()`
pub fn service_hierarchy() -> TypeHierarchy {
    let mut h = TypeHierarchy::default();
    h.declare(TypeDecl::interface("Service").method(m()).method(n()))
        .unwrap();
    h
}

/// Decorator of `Service` with a body for each method in `implements`
pub fn service_decorator(id: &str, implements: &[MethodSignature]) -> ClassMetadata {
    let mut class = ClassMetadata::decorator(id)
        .decorates(ty("Service"))
        .delegate(DelegatePoint::new(ty("Service")));
    for method in [m(), n()] {
        class = if implements.contains(&method) {
            class.implements(method)
        } else {
            class.abstract_method(method)
        };
    }
    class
}

/// Bodies that record their name, forward, and wrap the result as `name(inner)`
pub fn wrapping_dispatcher(chain: Arc<ResolvedChain>, trace: &Trace) -> Dispatcher<(), String> {
    let mut bodies: FxHashMap<DecoratorId, Arc<dyn DecoratorBody<(), String>>> =
        FxHashMap::default();
    for descriptor in chain.decorators() {
        let name = descriptor.id().to_string();
        let trace = Arc::clone(trace);
        bodies.insert(
            descriptor.id().clone(),
            decorator_body(
                move |method: &MethodSignature, delegate: &Delegate<(), String>, args| {
                    trace.lock().unwrap().push(format!("{}.{}", name, method.name));
                    let inner = delegate.invoke(method, args)?;
                    Ok(format!("{}({})", name, inner))
                },
            ),
        );
    }
    let trace = Arc::clone(trace);
    let target = target_invoker(move |method: &MethodSignature, _: ()| {
        trace.lock().unwrap().push(format!("target.{}", method.name));
        Ok::<_, InvocationError>("target".to_string())
    });
    Dispatcher::bind(chain, &bodies, target).unwrap()
}

pub fn ids(chain: &ResolvedChain) -> Vec<String> {
    chain
        .decorators()
        .iter()
        .map(|d| d.id().to_string())
        .collect()
}

pub fn recorded(trace: &Trace) -> Vec<String> {
    trace.lock().unwrap().clone()
}
