//! Session driver - connects the landmark provider to a try-on session
//!
//! At most one inference is in flight. A frame that arrives while the
//! previous one is still being processed is dropped, never queued, so the
//! overlay always follows the newest frame the model could take.
//!
//! The session is only borrowed between awaits; JS may call calibration or
//! end while inference is pending.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, info};

use super::tryon::{FrameOutput, TryOnSession};
use crate::error::ArError;
use crate::tracking::{LandmarkProvider, LandmarkSet};

/// Clears the in-flight flag even if the frame future is dropped mid-await
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn claim(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct SessionDriver<F: 'static> {
    provider: Rc<LandmarkProvider<F>>,
    session: RefCell<TryOnSession<F>>,
    in_flight: Cell<bool>,
}

impl<F: 'static> SessionDriver<F> {
    pub fn new(provider: Rc<LandmarkProvider<F>>, session: TryOnSession<F>) -> Self {
        Self {
            provider,
            session: RefCell::new(session),
            in_flight: Cell::new(false),
        }
    }

    /// Load the model the session needs. No-op for native viewer sessions.
    ///
    /// A failure is also recorded on the session as its terminal state.
    pub async fn prepare(&self) -> Result<(), ArError> {
        let Some(kind) = self.session.borrow().model_kind() else {
            return Ok(());
        };

        match self.provider.initialize(kind).await {
            Ok(handle) => {
                self.session.borrow_mut().attach_model(handle);
                Ok(())
            }
            Err(err) => {
                self.session.borrow_mut().fail(&err);
                Err(err)
            }
        }
    }

    /// Run inference on `frame` and advance the session.
    ///
    /// `None` means the frame was dropped: inference still busy with an
    /// earlier frame, or the model not attached yet.
    pub async fn tick(&self, frame: &F, width: f32, height: f32, now_ms: f64) -> Option<FrameOutput> {
        let handle = {
            let session = self.session.borrow();
            if session.model_kind().is_none() {
                return Some(FrameOutput::Hidden);
            }
            session.model()?.clone()
        };

        let Some(_guard) = InFlight::claim(&self.in_flight) else {
            debug!("Frame at {:.0}ms dropped, inference in flight", now_ms);
            return None;
        };

        let landmarks = self.provider.infer(&handle, frame).await;
        drop(handle);

        let mut session = self.session.borrow_mut();
        if session.is_ended() {
            // Model borrow is gone; finish what end() could not
            session.finish_release();
            return Some(FrameOutput::Hidden);
        }
        let viewport = session.viewport(width, height);
        Some(session.on_frame(landmarks.as_ref(), &viewport, now_ms))
    }

    /// Advance the session with landmarks produced outside the provider
    pub fn push(&self, landmarks: Option<&LandmarkSet>, width: f32, height: f32, now_ms: f64) -> FrameOutput {
        let mut session = self.session.borrow_mut();
        let viewport = session.viewport(width, height);
        session.on_frame(landmarks, &viewport, now_ms)
    }

    pub fn with_session<R>(&self, f: impl FnOnce(&mut TryOnSession<F>) -> R) -> R {
        f(&mut self.session.borrow_mut())
    }

    /// End the session. Cached model weights stay with the provider.
    pub fn end(&self) {
        self.session.borrow_mut().end();
        info!("Session driver stopped");
    }
}
