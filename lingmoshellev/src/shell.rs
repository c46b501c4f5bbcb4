//! `org_kde_lingmo_shell` and its per surface extension `org_kde_lingmo_surface`.

use log::debug;
use wayland_client::Proxy;

use crate::LingmoEventError;

pub use generated::{org_kde_lingmo_shell, org_kde_lingmo_surface};

use org_kde_lingmo_surface::OrgKdeLingmoSurface;

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
        wayland_scanner::generate_interfaces!("protocols/lingmo-shell.xml");
    }
    use self::__interfaces::*;

    wayland_scanner::generate_client_code!("protocols/lingmo-shell.xml");
}

const SKIP_TASKBAR_SINCE: u32 = 2;
const AUTO_HIDE_SINCE: u32 = 4;
const SKIP_SWITCHER_SINCE: u32 = 5;
const CRITICAL_NOTIFICATION_SINCE: u32 = 6;
const OPEN_UNDER_CURSOR_SINCE: u32 = 7;
const APPLET_POPUP_SINCE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceRole {
    #[default]
    Normal,
    Desktop,
    Panel,
    OnScreenDisplay,
    Notification,
    ToolTip,
    CriticalNotification,
    AppletPopup,
}

impl SurfaceRole {
    pub const fn wire_value(self) -> u32 {
        match self {
            SurfaceRole::Normal => 0,
            SurfaceRole::Desktop => 1,
            SurfaceRole::Panel => 2,
            SurfaceRole::OnScreenDisplay => 3,
            SurfaceRole::Notification => 4,
            SurfaceRole::ToolTip => 5,
            SurfaceRole::CriticalNotification => 6,
            SurfaceRole::AppletPopup => 7,
        }
    }

    /// What to send to a surface of `version`, plus a panel behaviour that has
    /// to go out first
    fn for_version(self, version: u32) -> (SurfaceRole, Option<PanelBehavior>) {
        match self {
            SurfaceRole::CriticalNotification if version < CRITICAL_NOTIFICATION_SINCE => {
                (SurfaceRole::Notification, None)
            }
            // applet popups used to be panels
            SurfaceRole::AppletPopup if version < APPLET_POPUP_SINCE => {
                (SurfaceRole::Panel, Some(PanelBehavior::WindowsGoBelow))
            }
            role => (role, None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PanelBehavior {
    #[default]
    AlwaysVisible,
    AutoHide,
    WindowsCanCover,
    WindowsGoBelow,
}

impl PanelBehavior {
    pub const fn wire_value(self) -> u32 {
        match self {
            PanelBehavior::AlwaysVisible => 1,
            PanelBehavior::AutoHide => 2,
            PanelBehavior::WindowsCanCover => 3,
            PanelBehavior::WindowsGoBelow => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellSurfaceEvent {
    AutoHidePanelHidden,
    AutoHidePanelShown,
}

pub trait ShellHandle {
    type Surface: ShellSurfaceHandle;
    /// the client surface a shell surface extends
    type WlSurface: PartialEq + Clone;

    fn get_surface(&self, surface: &Self::WlSurface) -> Self::Surface;
}

pub trait ShellSurfaceHandle {
    fn protocol_version(&self) -> u32;
    fn surface_id(&self) -> u32;
    fn set_role(&self, role: u32);
    fn set_panel_behavior(&self, behavior: u32);
    fn set_position(&self, x: i32, y: i32);
    fn set_skip_taskbar(&self, skip: bool);
    fn set_skip_switcher(&self, skip: bool);
    fn panel_auto_hide_hide(&self);
    fn panel_auto_hide_show(&self);
    fn set_panel_takes_focus(&self, takes_focus: bool);
    fn open_under_cursor(&self);
    fn release_handle(&self);
}

impl ShellSurfaceHandle for OrgKdeLingmoSurface {
    fn protocol_version(&self) -> u32 {
        self.version()
    }
    fn surface_id(&self) -> u32 {
        self.id().protocol_id()
    }
    fn set_role(&self, role: u32) {
        OrgKdeLingmoSurface::set_role(self, role);
    }
    fn set_panel_behavior(&self, behavior: u32) {
        OrgKdeLingmoSurface::set_panel_behavior(self, behavior);
    }
    fn set_position(&self, x: i32, y: i32) {
        OrgKdeLingmoSurface::set_position(self, x, y);
    }
    fn set_skip_taskbar(&self, skip: bool) {
        OrgKdeLingmoSurface::set_skip_taskbar(self, skip as u32);
    }
    fn set_skip_switcher(&self, skip: bool) {
        OrgKdeLingmoSurface::set_skip_switcher(self, skip as u32);
    }
    fn panel_auto_hide_hide(&self) {
        OrgKdeLingmoSurface::panel_auto_hide_hide(self);
    }
    fn panel_auto_hide_show(&self) {
        OrgKdeLingmoSurface::panel_auto_hide_show(self);
    }
    fn set_panel_takes_focus(&self, takes_focus: bool) {
        OrgKdeLingmoSurface::set_panel_takes_focus(self, takes_focus as u32);
    }
    fn open_under_cursor(&self) {
        OrgKdeLingmoSurface::open_under_cursor(self);
    }
    fn release_handle(&self) {
        self.destroy();
    }
}

/// Shell extension of one client surface
#[derive(Debug)]
pub struct LingmoShellSurface<S: ShellSurfaceHandle> {
    handle: Option<S>,
    role: SurfaceRole,
    panel_auto_hidden: bool,
}

impl<S: ShellSurfaceHandle> LingmoShellSurface<S> {
    pub fn new(handle: S) -> Self {
        Self {
            handle: Some(handle),
            role: SurfaceRole::Normal,
            panel_auto_hidden: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    pub fn id(&self) -> Option<u32> {
        self.handle.as_ref().map(ShellSurfaceHandle::surface_id)
    }

    pub fn handle_ref(&self) -> Option<&S> {
        self.handle.as_ref()
    }

    fn handle(&self) -> Result<&S, LingmoEventError> {
        debug_assert!(
            self.handle.is_some(),
            "request on a released org_kde_lingmo_surface"
        );
        self.handle
            .as_ref()
            .ok_or(LingmoEventError::InvalidHandle("org_kde_lingmo_surface"))
    }

    fn versioned(&self, since: u32, request: &str) -> Result<Option<&S>, LingmoEventError> {
        let handle = self.handle()?;
        if handle.protocol_version() < since {
            debug!(
                "{request} needs org_kde_lingmo_surface v{since}, compositor has v{}",
                handle.protocol_version()
            );
            return Ok(None);
        }
        Ok(Some(handle))
    }

    /// Roles the compositor is too old for are replaced by their predecessor;
    /// [`Self::role`] still reports `role`.
    pub fn set_role(&mut self, role: SurfaceRole) -> Result<(), LingmoEventError> {
        let handle = self.handle()?;
        let (sent, behavior) = role.for_version(handle.protocol_version());
        if sent != role {
            debug!("surface role {role:?} sent as {sent:?}");
        }
        if let Some(behavior) = behavior {
            handle.set_panel_behavior(behavior.wire_value());
        }
        handle.set_role(sent.wire_value());
        self.role = role;
        Ok(())
    }

    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    pub fn set_panel_behavior(&self, behavior: PanelBehavior) -> Result<(), LingmoEventError> {
        self.handle()?.set_panel_behavior(behavior.wire_value());
        Ok(())
    }

    /// Global compositor coordinates
    pub fn set_position(&self, x: i32, y: i32) -> Result<(), LingmoEventError> {
        self.handle()?.set_position(x, y);
        Ok(())
    }

    pub fn open_under_cursor(&self) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(OPEN_UNDER_CURSOR_SINCE, "open_under_cursor")? {
            handle.open_under_cursor();
        }
        Ok(())
    }

    pub fn set_skip_taskbar(&self, skip: bool) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(SKIP_TASKBAR_SINCE, "set_skip_taskbar")? {
            handle.set_skip_taskbar(skip);
        }
        Ok(())
    }

    pub fn set_skip_switcher(&self, skip: bool) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(SKIP_SWITCHER_SINCE, "set_skip_switcher")? {
            handle.set_skip_switcher(skip);
        }
        Ok(())
    }

    /// Only meaningful for panels with [`PanelBehavior::AutoHide`]
    pub fn request_hide_auto_hiding_panel(&self) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(AUTO_HIDE_SINCE, "panel_auto_hide_hide")? {
            handle.panel_auto_hide_hide();
        }
        Ok(())
    }

    pub fn request_show_auto_hiding_panel(&self) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(AUTO_HIDE_SINCE, "panel_auto_hide_show")? {
            handle.panel_auto_hide_show();
        }
        Ok(())
    }

    pub fn set_panel_takes_focus(&self, takes_focus: bool) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(AUTO_HIDE_SINCE, "set_panel_takes_focus")? {
            handle.set_panel_takes_focus(takes_focus);
        }
        Ok(())
    }

    pub fn is_panel_auto_hidden(&self) -> bool {
        self.panel_auto_hidden
    }

    pub fn handle_event(&mut self, event: ShellSurfaceEvent) {
        self.panel_auto_hidden = matches!(event, ShellSurfaceEvent::AutoHidePanelHidden);
    }

    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.release_handle();
        }
    }

    pub fn destroy(&mut self) {
        self.handle = None;
    }
}

#[derive(Debug)]
pub struct LingmoShell<H: ShellHandle> {
    handle: Option<H>,
    surfaces: Vec<(H::WlSurface, LingmoShellSurface<H::Surface>)>,
    events: Vec<(u32, ShellSurfaceEvent)>,
}

impl<H: ShellHandle> LingmoShell<H> {
    pub fn new(handle: H) -> Self {
        Self {
            handle: Some(handle),
            surfaces: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// The shell surface of `surface`, created on first use
    pub fn create_surface(
        &mut self,
        surface: &H::WlSurface,
    ) -> Result<&mut LingmoShellSurface<H::Surface>, LingmoEventError> {
        let index = match self.position(surface) {
            Some(index) => index,
            None => {
                debug_assert!(self.handle.is_some(), "request on a released org_kde_lingmo_shell");
                let handle = self
                    .handle
                    .as_ref()
                    .ok_or(LingmoEventError::InvalidHandle("org_kde_lingmo_shell"))?;
                let shell_surface = LingmoShellSurface::new(handle.get_surface(surface));
                self.surfaces.push((surface.clone(), shell_surface));
                self.surfaces.len() - 1
            }
        };
        Ok(&mut self.surfaces[index].1)
    }

    pub fn surface(&self, surface: &H::WlSurface) -> Option<&LingmoShellSurface<H::Surface>> {
        self.position(surface).map(|index| &self.surfaces[index].1)
    }

    pub fn surface_mut(
        &mut self,
        surface: &H::WlSurface,
    ) -> Option<&mut LingmoShellSurface<H::Surface>> {
        self.position(surface)
            .map(|index| &mut self.surfaces[index].1)
    }

    /// Release the shell surface of `surface`, e.g. before destroying it
    pub fn remove_surface(&mut self, surface: &H::WlSurface) {
        if let Some(index) = self.position(surface) {
            let (_, mut shell_surface) = self.surfaces.remove(index);
            shell_surface.release();
        }
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &LingmoShellSurface<H::Surface>> {
        self.surfaces.iter().map(|(_, surface)| surface)
    }

    pub fn handle_surface_event(&mut self, surface_id: u32, event: ShellSurfaceEvent) {
        log::trace!("shell surface {surface_id} event: {event:?}");
        if let Some((_, surface)) = self
            .surfaces
            .iter_mut()
            .find(|(_, surface)| surface.id() == Some(surface_id))
        {
            surface.handle_event(event);
        }
        self.events.push((surface_id, event));
    }

    pub fn take_events(&mut self) -> Vec<(u32, ShellSurfaceEvent)> {
        std::mem::take(&mut self.events)
    }

    /// Release every surface, then forget the shell
    pub fn release(&mut self) {
        if self.handle.take().is_none() {
            return;
        }
        for (_, surface) in self.surfaces.iter_mut() {
            surface.release();
        }
        self.surfaces.clear();
    }

    pub fn destroy(&mut self) {
        if self.handle.take().is_none() {
            return;
        }
        for (_, surface) in self.surfaces.iter_mut() {
            surface.destroy();
        }
        self.surfaces.clear();
    }

    fn position(&self, surface: &H::WlSurface) -> Option<usize> {
        self.surfaces.iter().position(|(wl, _)| wl == surface)
    }
}
