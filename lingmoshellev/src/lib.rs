//! # Lingmo desktop shell bindings with a winit like event loop
//!
//! Wraps the `org_kde_lingmo_*` protocol objects (window management, virtual
//! desktops, shell surfaces and activation feedback) into wrappers that cache
//! the compositor's state and queue change notifications for the caller.
//!
//! Min example is under
//!
//! ```rust, no_run
//! use lingmoshellev::*;
//!
//! fn main() {
//!     let ev = LingmoClient::new()
//!         .with_fallback_icon("wayland")
//!         .build()
//!         .unwrap();
//!
//!     ev.running(|event, state| {
//!         match event {
//!             LingmoEvent::WindowManagement(WindowManagementEvent::WindowCreated(id)) => {
//!                 let window = state
//!                     .window_management()
//!                     .and_then(|wm| wm.window(&id));
//!                 if let Some(window) = window {
//!                     println!("{}: {}", window.app_id(), window.title());
//!                 }
//!                 ReturnData::None
//!             }
//!             LingmoEvent::WindowManagement(WindowManagementEvent::ActiveWindowChanged(id)) => {
//!                 println!("active window: {id:?}");
//!                 ReturnData::None
//!             }
//!             _ => ReturnData::None,
//!         }
//!     })
//!     .unwrap();
//! }
//! ```
//!
pub mod activation;
mod client;
pub mod icon;
pub mod shell;
pub mod stacking_order;
pub mod state;
pub mod virtual_desktop;
pub mod window;
pub mod window_management;
pub mod window_model;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{
    BoundShell, BoundVirtualDesktopManagement, BoundWindowManagement, LingmoClient,
    LingmoEventLoop, LingmoState,
};
pub use icon::{IconFormat, IconImage, WindowIcon};
pub use shell::{PanelBehavior, ShellSurfaceEvent, SurfaceRole};
pub use state::{Rect, WindowState};
pub use window::{LingmoWindow, WindowChange, WindowId};
pub use window_management::{WindowManagement, WindowManagementEvent};
pub use window_model::{ModelEvent, ModelRole, ModelValue, WindowModel};

pub use calloop;

use activation::ActivationEvent;
use virtual_desktop::VirtualDesktopEvent;

use wayland_client::{
    ConnectError, DispatchError,
    globals::{BindError, GlobalError},
};

#[derive(Debug, thiserror::Error)]
pub enum LingmoEventError {
    #[error("connect error")]
    ConnectError(#[from] ConnectError),
    #[error("Global Error")]
    GlobalError(#[from] GlobalError),
    #[error("Bind Error")]
    BindError(#[from] BindError),
    #[error("Error during queue")]
    DispatchError(#[from] DispatchError),
    #[error("pipe or thread creation failed")]
    Io(#[from] std::io::Error),
    #[error("Event Loop Error")]
    EventLoopError(#[from] calloop::Error),
    #[error("{0} is not set up or has already been released")]
    InvalidHandle(&'static str),
}

/// Which bound global a [`LingmoEvent::GlobalRemoved`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LingmoGlobal {
    WindowManagement,
    VirtualDesktopManagement,
    Shell,
    ActivationFeedback,
}

/// Notifications delivered to the callback passed to [`LingmoEventLoop::running`]
#[derive(Debug, Clone, PartialEq)]
pub enum LingmoEvent {
    WindowManagement(WindowManagementEvent),
    VirtualDesktop(VirtualDesktopEvent),
    ShellSurface {
        /// protocol id of the `org_kde_lingmo_surface`
        surface: u32,
        event: ShellSurfaceEvent,
    },
    Activation(ActivationEvent),
    /// the compositor withdrew a global this client had bound
    GlobalRemoved(LingmoGlobal),
}

/// What the event handler wants the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnData {
    #[default]
    None,
    RequestExit,
}

pub mod reexport {
    pub use crate::activation::org_kde_lingmo_activation::OrgKdeLingmoActivation;
    pub use crate::activation::org_kde_lingmo_activation_feedback::OrgKdeLingmoActivationFeedback;
    pub use crate::shell::org_kde_lingmo_shell::OrgKdeLingmoShell;
    pub use crate::shell::org_kde_lingmo_surface::OrgKdeLingmoSurface;
    pub use crate::virtual_desktop::org_kde_lingmo_virtual_desktop::OrgKdeLingmoVirtualDesktop;
    pub use crate::virtual_desktop::org_kde_lingmo_virtual_desktop_management::OrgKdeLingmoVirtualDesktopManagement;
    pub use crate::window_management::org_kde_lingmo_stacking_order::OrgKdeLingmoStackingOrder;
    pub use crate::window_management::org_kde_lingmo_window::OrgKdeLingmoWindow;
    pub use crate::window_management::org_kde_lingmo_window_management::OrgKdeLingmoWindowManagement;
    pub mod wayland_client {
        pub use wayland_client::{
            Connection, QueueHandle,
            protocol::{wl_output::WlOutput, wl_surface::WlSurface},
        };
    }
}
