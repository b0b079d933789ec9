//! Landmark Provider - lazy, memoized face/hand model pipelines
//!
//! Model loading is the only slow step in the whole engine (runtime +
//! weights download). It happens once per [`ModelKind`]; every later
//! `initialize` call, including ones racing the first load, resolves to the
//! same handle. A failed load is memoized as well: the session surfaces it
//! once as "AR unavailable" and never retries in the background.
//!
//! Backends are plugged in through [`ModelLoader`] and [`LandmarkModel`].
//! The frame type `F` is whatever the backend consumes (a video element on
//! the web, a test fixture natively).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use log::{debug, info, warn};

use super::landmarks::{LandmarkSet, ModelKind};
use crate::error::ArError;
use crate::platform::PlatformCapabilities;

// ============================================================================
// BACKEND TRAITS
// ============================================================================

/// A loaded landmark model able to run per-frame inference
pub trait LandmarkModel<F> {
    /// Run detection on one frame.
    ///
    /// `Ok(None)` means no subject in frame, which is normal.
    fn detect<'a>(
        &'a mut self,
        frame: &'a F,
    ) -> LocalBoxFuture<'a, Result<Option<LandmarkSet>, ArError>>;

    /// Drop per-session state (timestamps, tracking ROI). Weights stay loaded.
    fn release(&mut self) {}
}

/// Produces models for a kind. Called at most once per kind per provider.
pub trait ModelLoader<F> {
    fn load(&self, kind: ModelKind)
        -> LocalBoxFuture<'static, Result<Box<dyn LandmarkModel<F>>, ArError>>;
}

/// Loader used when the environment cannot run tracking at all.
///
/// Keeps the provider interface identical on unsupported platforms; every
/// load resolves to a capability error.
pub struct UnavailableLoader {
    reason: String,
}

impl UnavailableLoader {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl<F: 'static> ModelLoader<F> for UnavailableLoader {
    fn load(
        &self,
        _kind: ModelKind,
    ) -> LocalBoxFuture<'static, Result<Box<dyn LandmarkModel<F>>, ArError>> {
        future::ready(Err(ArError::Capability(self.reason.clone()))).boxed_local()
    }
}

// ============================================================================
// HANDLE
// ============================================================================

/// Ready model for one kind. Cheap to clone; all clones share the model.
pub struct ModelHandle<F> {
    kind: ModelKind,
    model: Rc<RefCell<Box<dyn LandmarkModel<F>>>>,
}

impl<F> Clone for ModelHandle<F> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            model: Rc::clone(&self.model),
        }
    }
}

impl<F> ModelHandle<F> {
    fn new(kind: ModelKind, model: Box<dyn LandmarkModel<F>>) -> Self {
        Self {
            kind,
            model: Rc::new(RefCell::new(model)),
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// True when both handles point at the same loaded model
    pub fn same_model(&self, other: &ModelHandle<F>) -> bool {
        Rc::ptr_eq(&self.model, &other.model)
    }

    /// Release per-session detector state at session end.
    ///
    /// Returns false while an inference holds the model; the caller retries
    /// once that inference has finished.
    pub fn release(&self) -> bool {
        match self.model.try_borrow_mut() {
            Ok(mut model) => {
                model.release();
                true
            }
            Err(_) => {
                warn!("{} model busy during release, deferring", self.kind);
                false
            }
        }
    }
}

// ============================================================================
// PROVIDER
// ============================================================================

type SharedLoad<F> = Shared<LocalBoxFuture<'static, Result<ModelHandle<F>, ArError>>>;

/// Owns the memoized model pipelines for every kind
pub struct LandmarkProvider<F> {
    loader: Rc<dyn ModelLoader<F>>,
    slots: RefCell<HashMap<ModelKind, SharedLoad<F>>>,
}

impl<F: 'static> LandmarkProvider<F> {
    pub fn new(loader: Rc<dyn ModelLoader<F>>) -> Self {
        Self {
            loader,
            slots: RefCell::new(HashMap::new()),
        }
    }

    /// Capability-gated factory.
    ///
    /// Without camera and GPU the returned provider still has the full
    /// interface, but every `initialize` fails with a capability error.
    pub fn for_capabilities(caps: &PlatformCapabilities, loader: Rc<dyn ModelLoader<F>>) -> Self {
        match caps.tracking_blocker() {
            None => Self::new(loader),
            Some(reason) => {
                info!("Landmark tracking disabled: {}", reason);
                Self::new(Rc::new(UnavailableLoader::new(reason)))
            }
        }
    }

    /// Load (once) and return the model for `kind`
    pub async fn initialize(&self, kind: ModelKind) -> Result<ModelHandle<F>, ArError> {
        let pending = {
            let mut slots = self.slots.borrow_mut();
            slots
                .entry(kind)
                .or_insert_with(|| {
                    info!("Loading {} landmark model", kind);
                    self.loader
                        .load(kind)
                        .map(move |loaded| loaded.map(|model| ModelHandle::new(kind, model)))
                        .boxed_local()
                        .shared()
                })
                .clone()
        };

        let result = pending.await;
        match &result {
            Ok(_) => debug!("{} landmark model ready", kind),
            Err(err) => warn!("{} landmark model unavailable: {}", kind, err),
        }
        result
    }

    /// Whether a load for `kind` has been started (successful or not)
    pub fn is_requested(&self, kind: ModelKind) -> bool {
        self.slots.borrow().contains_key(&kind)
    }

    /// Run inference for one frame.
    ///
    /// Never fails: no subject, a backend error, or a model still busy with
    /// the previous frame all come back as `None`. The busy case is how
    /// stale frames get dropped instead of queued.
    #[allow(clippy::await_holding_refcell_ref)]
    pub async fn infer(&self, handle: &ModelHandle<F>, frame: &F) -> Option<LandmarkSet> {
        let mut model = match handle.model.try_borrow_mut() {
            Ok(model) => model,
            Err(_) => {
                debug!("{} inference in flight, dropping frame", handle.kind);
                return None;
            }
        };

        match model.detect(frame).await {
            Ok(Some(set)) if set.kind() == handle.kind => Some(set),
            Ok(Some(set)) => {
                warn!("{} model returned {} landmarks, ignoring", handle.kind, set.kind());
                None
            }
            Ok(None) => None,
            Err(err) => {
                warn!("{} inference failed: {}", handle.kind, err);
                None
            }
        }
    }

    /// Forget every memoized model (weights included)
    pub fn teardown(&self) {
        let dropped = self.slots.borrow_mut().drain().count();
        if dropped > 0 {
            info!("Landmark provider torn down ({} pipelines)", dropped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::landmarks::Landmark;
    use futures::executor::block_on;
    use std::cell::Cell;

    /// Frame fixture: `Some(points)` has a subject, `None` is empty
    type Frame = Option<Vec<Landmark>>;

    struct EchoModel {
        kind: ModelKind,
        released: Rc<Cell<bool>>,
    }

    impl LandmarkModel<Frame> for EchoModel {
        fn detect<'a>(
            &'a mut self,
            frame: &'a Frame,
        ) -> LocalBoxFuture<'a, Result<Option<LandmarkSet>, ArError>> {
            let kind = self.kind;
            let out = frame.as_ref().map(|pts| LandmarkSet::new(kind, pts.clone()));
            future::ready(Ok(out)).boxed_local()
        }

        fn release(&mut self) {
            self.released.set(true);
        }
    }

    struct CountingLoader {
        loads: Rc<Cell<usize>>,
        released: Rc<Cell<bool>>,
        fail: bool,
    }

    impl ModelLoader<Frame> for CountingLoader {
        fn load(
            &self,
            kind: ModelKind,
        ) -> LocalBoxFuture<'static, Result<Box<dyn LandmarkModel<Frame>>, ArError>> {
            self.loads.set(self.loads.get() + 1);
            if self.fail {
                return future::ready(Err(ArError::ModelLoad {
                    kind,
                    reason: "wasm runtime missing".into(),
                }))
                .boxed_local();
            }
            let model: Box<dyn LandmarkModel<Frame>> = Box::new(EchoModel {
                kind,
                released: Rc::clone(&self.released),
            });
            future::ready(Ok(model)).boxed_local()
        }
    }

    fn provider(fail: bool) -> (LandmarkProvider<Frame>, Rc<Cell<usize>>, Rc<Cell<bool>>) {
        let loads = Rc::new(Cell::new(0));
        let released = Rc::new(Cell::new(false));
        let loader = CountingLoader {
            loads: Rc::clone(&loads),
            released: Rc::clone(&released),
            fail,
        };
        (LandmarkProvider::new(Rc::new(loader)), loads, released)
    }

    #[test]
    fn test_initialize_is_memoized_per_kind() {
        let (provider, loads, _) = provider(false);
        let a = block_on(provider.initialize(ModelKind::Face)).unwrap();
        let b = block_on(provider.initialize(ModelKind::Face)).unwrap();
        assert!(a.same_model(&b));
        assert_eq!(loads.get(), 1);

        let hand = block_on(provider.initialize(ModelKind::Hand)).unwrap();
        assert_eq!(hand.kind(), ModelKind::Hand);
        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn test_concurrent_initialize_shares_one_load() {
        let (provider, loads, _) = provider(false);
        let (a, b) = block_on(futures::future::join(
            provider.initialize(ModelKind::Hand),
            provider.initialize(ModelKind::Hand),
        ));
        assert!(a.unwrap().same_model(&b.unwrap()));
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn test_failed_load_is_memoized() {
        let (provider, loads, _) = provider(true);
        let first = block_on(provider.initialize(ModelKind::Face));
        let second = block_on(provider.initialize(ModelKind::Face));
        assert!(matches!(first, Err(ArError::ModelLoad { .. })));
        assert_eq!(first.err(), second.err());
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn test_unavailable_platform_fails_with_capability_error() {
        let loads = Rc::new(Cell::new(0));
        let loader = CountingLoader {
            loads: Rc::clone(&loads),
            released: Rc::new(Cell::new(false)),
            fail: false,
        };
        let caps = PlatformCapabilities { camera: false, gpu: true, ..Default::default() };
        let provider = LandmarkProvider::for_capabilities(&caps, Rc::new(loader));

        let err = block_on(provider.initialize(ModelKind::Face)).err().unwrap();
        assert_eq!(err, ArError::Capability("camera not available".into()));
        assert!(err.is_fatal());
        assert_eq!(loads.get(), 0);
    }

    #[test]
    fn test_infer_empty_frame_is_none() {
        let (provider, _, _) = provider(false);
        let handle = block_on(provider.initialize(ModelKind::Face)).unwrap();
        assert_eq!(block_on(provider.infer(&handle, &None)), None);

        let frame = Some(vec![Landmark::new(0.5, 0.5)]);
        let set = block_on(provider.infer(&handle, &frame)).unwrap();
        assert_eq!(set.kind(), ModelKind::Face);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_busy_model_drops_frame() {
        let (provider, _, _) = provider(false);
        let handle = block_on(provider.initialize(ModelKind::Face)).unwrap();
        let _busy = handle.model.borrow_mut();
        let frame = Some(vec![Landmark::new(0.5, 0.5)]);
        assert_eq!(block_on(provider.infer(&handle, &frame)), None);
        assert!(!handle.release());
    }

    #[test]
    fn test_release_and_teardown() {
        let (provider, loads, released) = provider(false);
        let handle = block_on(provider.initialize(ModelKind::Hand)).unwrap();
        assert!(handle.release());
        assert!(released.get());
        assert!(provider.is_requested(ModelKind::Hand));

        // Released handles keep weights; a new session reuses them
        let again = block_on(provider.initialize(ModelKind::Hand)).unwrap();
        assert!(again.same_model(&handle));
        assert_eq!(loads.get(), 1);

        provider.teardown();
        assert!(!provider.is_requested(ModelKind::Hand));
        block_on(provider.initialize(ModelKind::Hand)).unwrap();
        assert_eq!(loads.get(), 2);
    }
}
