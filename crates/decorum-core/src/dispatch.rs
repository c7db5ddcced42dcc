//! Invocation dispatch through a decorator chain.
//!
//! A [`Dispatcher`] pairs a resolved chain with one body per decorator and
//! the target invoker. Each business call creates a fresh frame that moves
//! through three states:
//!
//! ```text
//! IDLE --enter--> RUNNING --call returns--> CLOSED
//! ```
//!
//! While the frame is running, the decorator currently executing holds a
//! [`Delegate`] bound to `(frame, position)`. Invoking it searches forward
//! from `position + 1` for the next decorator implementing the method and
//! falls through to the target when there is none. Each invocation searches
//! from the handle's own position, so calling the delegate repeatedly from
//! one body reaches the same next decorator every time.
//!
//! Dispatch is entered only after interceptors for the call have finished.

use crate::descriptor::{DecoratorDescriptor, DecoratorId};
use crate::error::{DeploymentError, IllegalStateError, InvocationError};
use crate::resolver::ResolvedChain;
use decorum_types::MethodSignature;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Body of a decorator: the methods it implements
pub trait DecoratorBody<A, R>: Send + Sync {
    /// Run the decorator's implementation of `method`
    fn call(
        &self,
        method: &MethodSignature,
        delegate: &Delegate<A, R>,
        args: A,
    ) -> Result<R, InvocationError>;
}

impl<A, R, F> DecoratorBody<A, R> for F
where
    F: Fn(&MethodSignature, &Delegate<A, R>, A) -> Result<R, InvocationError> + Send + Sync,
{
    fn call(
        &self,
        method: &MethodSignature,
        delegate: &Delegate<A, R>,
        args: A,
    ) -> Result<R, InvocationError> {
        self(method, delegate, args)
    }
}

/// The real method call on the managed instance
pub trait TargetInvoker<A, R>: Send + Sync {
    /// Invoke `method` on the target
    fn invoke(&self, method: &MethodSignature, args: A) -> Result<R, InvocationError>;
}

impl<A, R, F> TargetInvoker<A, R> for F
where
    F: Fn(&MethodSignature, A) -> Result<R, InvocationError> + Send + Sync,
{
    fn invoke(&self, method: &MethodSignature, args: A) -> Result<R, InvocationError> {
        self(method, args)
    }
}

/// Box a closure as a decorator body
pub fn decorator_body<A, R, F>(f: F) -> Arc<dyn DecoratorBody<A, R>>
where
    A: 'static,
    R: 'static,
    F: Fn(&MethodSignature, &Delegate<A, R>, A) -> Result<R, InvocationError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Box a closure as a target invoker
pub fn target_invoker<A, R, F>(f: F) -> Arc<dyn TargetInvoker<A, R>>
where
    A: 'static,
    R: 'static,
    F: Fn(&MethodSignature, A) -> Result<R, InvocationError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Lifecycle of one invocation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Created, not yet started
    Idle,
    /// A decorator or the target is executing
    Running,
    /// The call returned
    Closed,
}

impl FrameState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => FrameState::Idle,
            1 => FrameState::Running,
            _ => FrameState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            FrameState::Idle => 0,
            FrameState::Running => 1,
            FrameState::Closed => 2,
        }
    }
}

/// Active position while the target itself is executing
const TARGET_ACTIVE: usize = usize::MAX;

/// A resolved chain bound to decorator bodies and a target
pub struct Dispatcher<A, R> {
    chain: Arc<ResolvedChain>,
    bodies: Arc<[Arc<dyn DecoratorBody<A, R>>]>,
    target: Arc<dyn TargetInvoker<A, R>>,
}

impl<A, R> Clone for Dispatcher<A, R> {
    fn clone(&self) -> Self {
        Dispatcher {
            chain: Arc::clone(&self.chain),
            bodies: Arc::clone(&self.bodies),
            target: Arc::clone(&self.target),
        }
    }
}

impl<A, R> fmt::Debug for Dispatcher<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl<A, R> Dispatcher<A, R> {
    /// Bind a chain to the bodies of its decorators and to the target
    ///
    /// Every decorator in the chain needs a body in `bodies`.
    pub fn bind(
        chain: Arc<ResolvedChain>,
        bodies: &FxHashMap<DecoratorId, Arc<dyn DecoratorBody<A, R>>>,
        target: Arc<dyn TargetInvoker<A, R>>,
    ) -> Result<Self, DeploymentError> {
        let bound = chain
            .decorators()
            .iter()
            .map(|descriptor| {
                bodies.get(descriptor.id()).cloned().ok_or_else(|| {
                    DeploymentError::UnboundDecorator {
                        decorator: descriptor.id().clone(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dispatcher {
            chain,
            bodies: bound.into(),
            target,
        })
    }

    /// The chain calls go through
    pub fn chain(&self) -> &Arc<ResolvedChain> {
        &self.chain
    }

    /// Run a business call through the chain
    ///
    /// Starts at the first decorator implementing `method`, or calls the
    /// target directly when none does. The frame is closed when this
    /// returns, whatever the outcome.
    pub fn enter(&self, method: &MethodSignature, args: A) -> Result<R, InvocationError> {
        let frame = Arc::new(Frame {
            dispatcher: self.clone(),
            method: method.clone(),
            state: AtomicU8::new(FrameState::Idle.as_u8()),
            active: AtomicUsize::new(TARGET_ACTIVE),
        });

        let _close = CloseOnDrop(frame.as_ref());
        frame.set_state(FrameState::Running);
        trace!(method = %method, chain = self.chain.len(), "entering decorator chain");
        forward(&frame, 0, method, args)
    }

    fn next_implementing(&self, floor: usize, method: &MethodSignature) -> Option<usize> {
        self.chain
            .decorators()
            .iter()
            .enumerate()
            .skip(floor)
            .find(|(_, descriptor)| descriptor.implements(method))
            .map(|(index, _)| index)
    }

    fn descriptor(&self, position: usize) -> &DecoratorDescriptor {
        &self.chain.decorators()[position]
    }
}

/// Per-call state shared by the delegate handles of one call
struct Frame<A, R> {
    dispatcher: Dispatcher<A, R>,
    method: MethodSignature,
    state: AtomicU8,
    active: AtomicUsize,
}

impl<A, R> Frame<A, R> {
    fn state(&self) -> FrameState {
        FrameState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: FrameState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn describe_active(&self, active: usize) -> String {
        if active == TARGET_ACTIVE {
            "the target".to_string()
        } else {
            format!("decorator {}", self.dispatcher.descriptor(active).id())
        }
    }
}

struct CloseOnDrop<'f, A, R>(&'f Frame<A, R>);

impl<A, R> Drop for CloseOnDrop<'_, A, R> {
    fn drop(&mut self) {
        self.0.set_state(FrameState::Closed);
    }
}

struct RestoreActive<'f> {
    active: &'f AtomicUsize,
    previous: usize,
}

impl Drop for RestoreActive<'_> {
    fn drop(&mut self) {
        self.active.store(self.previous, Ordering::Release);
    }
}

/// Run the first decorator at or after `floor` implementing `method`, or the
/// target if there is none
fn forward<A, R>(
    frame: &Arc<Frame<A, R>>,
    floor: usize,
    method: &MethodSignature,
    args: A,
) -> Result<R, InvocationError> {
    let dispatcher = &frame.dispatcher;

    match dispatcher.next_implementing(floor, method) {
        Some(position) => {
            let previous = frame.active.swap(position, Ordering::AcqRel);
            let _restore = RestoreActive {
                active: &frame.active,
                previous,
            };
            trace!(
                method = %method,
                decorator = %dispatcher.descriptor(position).id(),
                position,
                "invoking decorator"
            );
            let delegate = Delegate {
                frame: Arc::clone(frame),
                position,
            };
            dispatcher.bodies[position].call(method, &delegate, args)
        }
        None => {
            let previous = frame.active.swap(TARGET_ACTIVE, Ordering::AcqRel);
            let _restore = RestoreActive {
                active: &frame.active,
                previous,
            };
            trace!(method = %method, "invoking target");
            dispatcher.target.invoke(method, args)
        }
    }
}

/// Handle a decorator uses to call whatever comes after it in the chain
///
/// Bound to the frame of one call and the decorator's position in the
/// chain. Cloning is allowed, but the handle only works while its call is
/// running and its decorator is the one executing.
pub struct Delegate<A, R> {
    frame: Arc<Frame<A, R>>,
    position: usize,
}

impl<A, R> Clone for Delegate<A, R> {
    fn clone(&self) -> Self {
        Delegate {
            frame: Arc::clone(&self.frame),
            position: self.position,
        }
    }
}

impl<A, R> fmt::Debug for Delegate<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("decorator", self.decorator())
            .field("position", &self.position)
            .field("state", &self.state())
            .finish()
    }
}

impl<A, R> Delegate<A, R> {
    /// Decorator this handle belongs to
    pub fn decorator(&self) -> &DecoratorId {
        self.frame.dispatcher.descriptor(self.position).id()
    }

    /// Position of the owning decorator in the chain
    pub fn position(&self) -> usize {
        self.position
    }

    /// State of the owning call
    pub fn state(&self) -> FrameState {
        self.frame.state()
    }

    /// Method the owning call was entered with
    pub fn entry_method(&self) -> &MethodSignature {
        &self.frame.method
    }

    /// Forward `method` to the next decorator implementing it, or the target
    pub fn invoke(&self, method: &MethodSignature, args: A) -> Result<R, InvocationError> {
        match self.frame.state() {
            FrameState::Running => {}
            FrameState::Idle => {
                return Err(IllegalStateError::FrameNotStarted {
                    decorator: self.decorator().clone(),
                }
                .into())
            }
            FrameState::Closed => {
                return Err(IllegalStateError::FrameClosed {
                    decorator: self.decorator().clone(),
                    method: self.frame.method.clone(),
                }
                .into())
            }
        }

        let active = self.frame.active.load(Ordering::Acquire);
        if active != self.position {
            return Err(IllegalStateError::NotActive {
                decorator: self.decorator().clone(),
                active: self.frame.describe_active(active),
            }
            .into());
        }

        forward(&self.frame, self.position + 1, method, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Enablement;
    use crate::metadata::{ClassMetadata, DelegatePoint};
    use crate::registry::RegistryBuilder;
    use crate::resolver::{Resolver, TargetDescriptor};
    use crate::validator::Validator;
    use decorum_types::{TypeDecl, TypeHierarchy, TypeRef};
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn m() -> MethodSignature {
        MethodSignature::nullary("m")
    }

    fn chain(implementing: &[(&str, bool)]) -> Arc<ResolvedChain> {
        let mut h = TypeHierarchy::default();
        h.declare(TypeDecl::interface("Service").method(m())).unwrap();
        let validator = Validator::new(&h);
        let mut builder = RegistryBuilder::new();
        for (priority, (id, implements)) in implementing.iter().enumerate() {
            let mut class = ClassMetadata::decorator(*id)
                .decorates(TypeRef::raw("Service"))
                .delegate(DelegatePoint::new(TypeRef::raw("Service")));
            if *implements {
                class = class.implements(m());
            } else {
                class = class.abstract_method(m());
            }
            let descriptor = validator
                .validate(&class, Enablement::GlobalPriority(priority as i32))
                .unwrap();
            builder.register(descriptor).unwrap();
        }
        let resolver = Resolver::new(Arc::new(builder.freeze()), Arc::new(h));
        resolver.resolve(&TargetDescriptor::new("app", [TypeRef::raw("Service")]))
    }

    fn tracing_dispatcher(chain: Arc<ResolvedChain>, trace: &Trace) -> Dispatcher<(), String> {
        let mut bodies = FxHashMap::default();
        for descriptor in chain.decorators() {
            let id = descriptor.id().clone();
            let trace = Arc::clone(trace);
            let name = id.to_string();
            bodies.insert(
                id,
                decorator_body(move |method: &MethodSignature, delegate: &Delegate<(), String>, args| {
                    trace.lock().unwrap().push(name.clone());
                    let inner = delegate.invoke(method, args)?;
                    Ok(format!("{}({})", name, inner))
                }),
            );
        }
        let target_trace = Arc::clone(trace);
        let target = target_invoker(move |_: &MethodSignature, _| {
            target_trace.lock().unwrap().push("target".to_string());
            Ok("target".to_string())
        });
        Dispatcher::bind(chain, &bodies, target).unwrap()
    }

    #[test]
    fn test_empty_chain_calls_target() {
        let trace = Trace::default();
        let dispatcher = tracing_dispatcher(chain(&[]), &trace);
        assert_eq!(dispatcher.enter(&m(), ()).unwrap(), "target");
        assert_eq!(*trace.lock().unwrap(), vec!["target"]);
    }

    #[test]
    fn test_forward_only_delegation() {
        let trace = Trace::default();
        let dispatcher =
            tracing_dispatcher(chain(&[("D1", true), ("D2", true), ("D3", true)]), &trace);
        assert_eq!(dispatcher.enter(&m(), ()).unwrap(), "D1(D2(D3(target)))");
        assert_eq!(*trace.lock().unwrap(), vec!["D1", "D2", "D3", "target"]);
    }

    #[test]
    fn test_skips_decorators_without_body() {
        let trace = Trace::default();
        let dispatcher =
            tracing_dispatcher(chain(&[("D1", true), ("D2", false), ("D3", true)]), &trace);
        assert_eq!(dispatcher.enter(&m(), ()).unwrap(), "D1(D3(target))");
    }

    #[test]
    fn test_bind_requires_every_body() {
        let resolved = chain(&[("D1", true)]);
        let bodies: FxHashMap<DecoratorId, Arc<dyn DecoratorBody<(), ()>>> = FxHashMap::default();
        let target = target_invoker(|_: &MethodSignature, _| Ok(()));
        assert!(matches!(
            Dispatcher::bind(resolved, &bodies, target),
            Err(DeploymentError::UnboundDecorator { .. })
        ));
    }

    #[test]
    fn test_frame_closes_on_error() {
        let resolved = chain(&[("D1", true)]);
        let stash: Arc<Mutex<Option<Delegate<(), ()>>>> = Arc::default();
        let body_stash = Arc::clone(&stash);
        let mut bodies = FxHashMap::default();
        bodies.insert(
            DecoratorId::new("D1"),
            decorator_body(move |_: &MethodSignature, delegate: &Delegate<(), ()>, _| {
                *body_stash.lock().unwrap() = Some(delegate.clone());
                Err(InvocationError::failed("boom"))
            }),
        );
        let target = target_invoker(|_: &MethodSignature, _| Ok(()));
        let dispatcher = Dispatcher::bind(resolved, &bodies, target).unwrap();

        let err = dispatcher.enter(&m(), ()).unwrap_err();
        assert_eq!(err.to_string(), "boom");

        let stale = stash.lock().unwrap().take().unwrap();
        assert_eq!(stale.state(), FrameState::Closed);
        assert!(matches!(
            stale.invoke(&m(), ()),
            Err(InvocationError::IllegalState(IllegalStateError::FrameClosed { .. }))
        ));
    }
}
