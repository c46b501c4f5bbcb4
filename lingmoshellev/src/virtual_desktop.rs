//! `org_kde_lingmo_virtual_desktop_management` and its desktops.

use log::{debug, trace};
use wayland_client::Proxy;

use crate::LingmoEventError;

pub use generated::{org_kde_lingmo_virtual_desktop, org_kde_lingmo_virtual_desktop_management};

use org_kde_lingmo_virtual_desktop::OrgKdeLingmoVirtualDesktop;

#[allow(
    non_snake_case,
    non_upper_case_globals,
    non_camel_case_types,
    dead_code,
    unused_imports
)]
mod generated {
    use wayland_client;
    use wayland_client::protocol::*;

    pub mod __interfaces {
        use wayland_backend;
        use wayland_client::protocol::__interfaces::*;
        wayland_scanner::generate_interfaces!("protocols/lingmo-virtual-desktop.xml");
    }
    use self::__interfaces::*;

    wayland_scanner::generate_client_code!("protocols/lingmo-virtual-desktop.xml");
}

pub trait VirtualDesktopManagementHandle {
    type Desktop: VirtualDesktopHandle;

    fn protocol_version(&self) -> u32;
    fn get_virtual_desktop(&self, id: &str) -> Self::Desktop;
    fn request_create_virtual_desktop(&self, name: &str, position: u32);
    fn request_remove_virtual_desktop(&self, id: &str);
}

pub trait VirtualDesktopHandle {
    fn request_activate(&self);
}

impl VirtualDesktopHandle for OrgKdeLingmoVirtualDesktop {
    fn request_activate(&self) {
        OrgKdeLingmoVirtualDesktop::request_activate(self);
    }
}

/// Events of the management global
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagementEvent {
    DesktopCreated { id: String, position: u32 },
    DesktopRemoved(String),
    Rows(u32),
    Done,
}

/// Events of one `org_kde_lingmo_virtual_desktop`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesktopEvent {
    DesktopId(String),
    Name(String),
    Activated,
    Deactivated,
    Done,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualDesktopEvent {
    DesktopCreated { id: String, position: u32 },
    DesktopRemoved(String),
    RowsChanged(u32),
    /// the management global finished a batch of changes
    Done,
    NameChanged(String),
    Activated(String),
    Deactivated(String),
    /// a desktop finished sending its properties
    DesktopDone(String),
    /// the desktop object itself reported its removal
    Removed(String),
    /// the compositor removed the global
    InterfaceRemoved,
}

#[derive(Debug)]
pub struct VirtualDesktop<D: VirtualDesktopHandle> {
    handle: D,
    id: String,
    name: String,
    active: bool,
}

impl<D: VirtualDesktopHandle> VirtualDesktop<D> {
    fn new(handle: D, id: String) -> Self {
        Self {
            handle,
            id,
            name: String::new(),
            active: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle(&self) -> &D {
        &self.handle
    }

    pub fn request_activate(&self) {
        self.handle.request_activate();
    }

    /// Returns the notification this event produces
    fn apply(&mut self, event: DesktopEvent) -> Option<VirtualDesktopEvent> {
        match event {
            DesktopEvent::DesktopId(id) => {
                if id != self.id {
                    debug!("virtual desktop {} renamed its id to {id}", self.id);
                }
                None
            }
            DesktopEvent::Name(name) => {
                if name == self.name {
                    return None;
                }
                self.name = name;
                Some(VirtualDesktopEvent::NameChanged(self.id.clone()))
            }
            DesktopEvent::Activated => {
                if self.active {
                    return None;
                }
                self.active = true;
                Some(VirtualDesktopEvent::Activated(self.id.clone()))
            }
            DesktopEvent::Deactivated => {
                if !self.active {
                    return None;
                }
                self.active = false;
                Some(VirtualDesktopEvent::Deactivated(self.id.clone()))
            }
            DesktopEvent::Done => Some(VirtualDesktopEvent::DesktopDone(self.id.clone())),
            DesktopEvent::Removed => Some(VirtualDesktopEvent::Removed(self.id.clone())),
        }
    }
}

#[derive(Debug)]
pub struct VirtualDesktopManagement<H: VirtualDesktopManagementHandle> {
    handle: Option<H>,
    /// ordered by position
    desktops: Vec<VirtualDesktop<H::Desktop>>,
    /// requested through [`Self::get_virtual_desktop`], not announced yet
    detached: Vec<VirtualDesktop<H::Desktop>>,
    rows: u32,
    events: Vec<VirtualDesktopEvent>,
}

impl<H: VirtualDesktopManagementHandle> VirtualDesktopManagement<H> {
    pub fn new(handle: H) -> Self {
        Self {
            handle: Some(handle),
            desktops: Vec::new(),
            detached: Vec::new(),
            rows: 1,
            events: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    fn handle(&self) -> Result<&H, LingmoEventError> {
        debug_assert!(
            self.handle.is_some(),
            "request on a released org_kde_lingmo_virtual_desktop_management"
        );
        self.handle.as_ref().ok_or(LingmoEventError::InvalidHandle(
            "org_kde_lingmo_virtual_desktop_management",
        ))
    }

    pub fn desktops(&self) -> &[VirtualDesktop<H::Desktop>] {
        &self.desktops
    }

    pub fn desktop(&self, id: &str) -> Option<&VirtualDesktop<H::Desktop>> {
        self.desktops.iter().find(|desktop| desktop.id == id)
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn take_events(&mut self) -> Vec<VirtualDesktopEvent> {
        std::mem::take(&mut self.events)
    }

    /// The desktop with `id`, requesting its object if none exists yet.
    /// An empty id names no desktop.
    pub fn get_virtual_desktop(
        &mut self,
        id: &str,
    ) -> Result<Option<&VirtualDesktop<H::Desktop>>, LingmoEventError> {
        if id.is_empty() {
            return Ok(None);
        }
        if let Some(index) = self.desktops.iter().position(|desktop| desktop.id == id) {
            return Ok(Some(&self.desktops[index]));
        }
        let index = match self.detached.iter().position(|desktop| desktop.id == id) {
            Some(index) => index,
            None => {
                let desktop = self.handle()?.get_virtual_desktop(id);
                self.detached.push(VirtualDesktop::new(desktop, id.to_owned()));
                self.detached.len() - 1
            }
        };
        Ok(Some(&self.detached[index]))
    }

    pub fn request_create_virtual_desktop(
        &self,
        name: &str,
        position: u32,
    ) -> Result<(), LingmoEventError> {
        self.handle()?.request_create_virtual_desktop(name, position);
        Ok(())
    }

    pub fn request_remove_virtual_desktop(&self, id: &str) -> Result<(), LingmoEventError> {
        self.handle()?.request_remove_virtual_desktop(id);
        Ok(())
    }

    pub fn handle_event(&mut self, event: ManagementEvent) {
        trace!("virtual desktop management event: {event:?}");
        match event {
            ManagementEvent::DesktopCreated { id, position } => {
                let desktop = if let Some(index) = self.desktops.iter().position(|d| d.id == id) {
                    self.desktops.remove(index)
                } else if let Some(index) = self.detached.iter().position(|d| d.id == id) {
                    self.detached.remove(index)
                } else {
                    let Some(handle) = self.handle.as_ref() else {
                        return;
                    };
                    VirtualDesktop::new(handle.get_virtual_desktop(&id), id.clone())
                };
                let index = (position as usize).min(self.desktops.len());
                self.desktops.insert(index, desktop);
                self.events
                    .push(VirtualDesktopEvent::DesktopCreated { id, position });
            }
            ManagementEvent::DesktopRemoved(id) => {
                let before = self.desktops.len();
                self.desktops.retain(|desktop| desktop.id != id);
                if self.desktops.len() == before {
                    debug!("removal of unknown virtual desktop {id}");
                    return;
                }
                self.events.push(VirtualDesktopEvent::DesktopRemoved(id));
            }
            ManagementEvent::Rows(0) => debug!("ignoring zero virtual desktop rows"),
            ManagementEvent::Rows(rows) => {
                if self.rows != rows {
                    self.rows = rows;
                    self.events.push(VirtualDesktopEvent::RowsChanged(rows));
                }
            }
            ManagementEvent::Done => self.events.push(VirtualDesktopEvent::Done),
        }
    }

    pub fn handle_desktop_event(&mut self, id: &str, event: DesktopEvent) {
        trace!("virtual desktop {id} event: {event:?}");
        let desktop = self
            .desktops
            .iter_mut()
            .chain(self.detached.iter_mut())
            .find(|desktop| desktop.id == id);
        let Some(desktop) = desktop else {
            return;
        };
        if let Some(event) = desktop.apply(event) {
            self.events.push(event);
        }
    }

    pub fn global_removed(&mut self) {
        self.events.push(VirtualDesktopEvent::InterfaceRemoved);
    }

    pub fn release(&mut self) {
        self.handle = None;
        self.desktops.clear();
        self.detached.clear();
    }
}
