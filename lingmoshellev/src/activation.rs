//! Launch feedback from `org_kde_lingmo_activation_feedback`.

use log::trace;
use wayland_client::Proxy;

pub use crate::window_management::{org_kde_lingmo_activation, org_kde_lingmo_activation_feedback};

use org_kde_lingmo_activation::OrgKdeLingmoActivation;
use org_kde_lingmo_activation_feedback::OrgKdeLingmoActivationFeedback;

pub trait ActivationHandle {
    fn activation_id(&self) -> u32;
    fn release_handle(&self);
}

pub trait ActivationFeedbackHandle {
    type Activation: ActivationHandle;

    fn release_handle(&self);
}

impl ActivationHandle for OrgKdeLingmoActivation {
    fn activation_id(&self) -> u32 {
        self.id().protocol_id()
    }
    fn release_handle(&self) {
        self.destroy();
    }
}

impl ActivationFeedbackHandle for OrgKdeLingmoActivationFeedback {
    type Activation = OrgKdeLingmoActivation;

    fn release_handle(&self) {
        self.destroy();
    }
}

/// Events of one `org_kde_lingmo_activation`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationWireEvent {
    AppId(String),
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationEvent {
    Started(u32),
    ApplicationId { activation: u32, app_id: String },
    Finished(u32),
}

#[derive(Debug)]
pub struct Activation<A: ActivationHandle> {
    handle: A,
    app_id: String,
}

impl<A: ActivationHandle> Activation<A> {
    pub fn id(&self) -> u32 {
        self.handle.activation_id()
    }

    /// Empty until the compositor names the launching application
    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

#[derive(Debug)]
pub struct ActivationFeedback<F: ActivationFeedbackHandle> {
    handle: Option<F>,
    activations: Vec<Activation<F::Activation>>,
    events: Vec<ActivationEvent>,
}

impl<F: ActivationFeedbackHandle> ActivationFeedback<F> {
    pub fn new(handle: F) -> Self {
        Self {
            handle: Some(handle),
            activations: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    pub fn activations(&self) -> &[Activation<F::Activation>] {
        &self.activations
    }

    pub fn activation(&self, id: u32) -> Option<&Activation<F::Activation>> {
        self.activations.iter().find(|activation| activation.id() == id)
    }

    pub fn take_events(&mut self) -> Vec<ActivationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn handle_activation_created(&mut self, handle: F::Activation) {
        let id = handle.activation_id();
        trace!("activation {id} started");
        self.activations.push(Activation {
            handle,
            app_id: String::new(),
        });
        self.events.push(ActivationEvent::Started(id));
    }

    pub fn handle_activation_event(&mut self, id: u32, event: ActivationWireEvent) {
        trace!("activation {id} event: {event:?}");
        let Some(index) = self.activations.iter().position(|a| a.id() == id) else {
            return;
        };
        match event {
            ActivationWireEvent::AppId(app_id) => {
                self.activations[index].app_id = app_id.clone();
                self.events.push(ActivationEvent::ApplicationId {
                    activation: id,
                    app_id,
                });
            }
            ActivationWireEvent::Finished => {
                self.events.push(ActivationEvent::Finished(id));
                let activation = self.activations.remove(index);
                activation.handle.release_handle();
            }
        }
    }

    pub fn release(&mut self) {
        for activation in self.activations.drain(..) {
            activation.handle.release_handle();
        }
        if let Some(handle) = self.handle.take() {
            handle.release_handle();
        }
    }

    /// Drops everything without sending destructors
    pub fn destroy(&mut self) {
        self.activations.clear();
        self.handle = None;
    }
}
