use std::fmt;
use std::os::fd::BorrowedFd;

use log::debug;

use crate::LingmoEventError;
use crate::icon::WindowIcon;
use crate::state::{Rect, WindowState};

pub(crate) const MOVE_RESIZE_SINCE: u32 = 3;
pub(crate) const DESTROY_SINCE: u32 = 4;
pub(crate) const ICON_SINCE: u32 = 7;
pub(crate) const VIRTUAL_DESKTOPS_SINCE: u32 = 8;
pub(crate) const ACTIVITIES_SINCE: u32 = 14;
pub(crate) const SEND_TO_OUTPUT_SINCE: u32 = 15;

/// Stable compositor assigned window identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self(uuid.into())
    }

    /// Identity of a window announced through the deprecated numeric `window` event
    pub fn legacy(internal_id: u32) -> Self {
        Self(format!("legacy-{internal_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for WindowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for WindowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The requests a window record sends. Implemented by `OrgKdeLingmoWindow`.
pub trait WindowHandle: PartialEq {
    type Surface;
    type Output;

    fn protocol_version(&self) -> u32;
    fn set_state(&self, flags: WindowState, state: WindowState);
    fn close(&self);
    fn request_move(&self);
    fn request_resize(&self);
    fn get_icon(&self, fd: BorrowedFd<'_>);
    fn request_enter_virtual_desktop(&self, id: &str);
    fn request_enter_new_virtual_desktop(&self);
    fn request_leave_virtual_desktop(&self, id: &str);
    fn request_enter_activity(&self, id: &str);
    fn request_leave_activity(&self, id: &str);
    fn set_minimized_geometry(&self, panel: &Self::Surface, geometry: Rect);
    fn unset_minimized_geometry(&self, panel: &Self::Surface);
    fn send_to_output(&self, output: &Self::Output);
    /// send the destructor
    fn release_handle(&self);
}

/// Events of one `org_kde_lingmo_window`, after decoding from the wire
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent<H> {
    TitleChanged(String),
    AppIdChanged(String),
    PidChanged(u32),
    ResourceNameChanged(String),
    StateChanged(u32),
    /// deprecated numeric desktop, ignored
    VirtualDesktopChanged(i32),
    ThemedIconNameChanged(String),
    Unmapped,
    InitialState,
    ParentWindow(Option<H>),
    Geometry(Rect),
    ClientGeometry(Rect),
    IconChanged,
    VirtualDesktopEntered(String),
    VirtualDesktopLeft(String),
    ApplicationMenu {
        service_name: String,
        object_path: String,
    },
    ActivityEntered(String),
    ActivityLeft(String),
}

/// Which cached field of a window changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowChange {
    Title,
    AppId,
    Pid,
    ResourceName,
    Active,
    Minimized,
    Maximized,
    Fullscreen,
    KeepAbove,
    KeepBelow,
    OnAllDesktops,
    DemandsAttention,
    Closeable,
    Minimizeable,
    Maximizeable,
    Fullscreenable,
    SkipTaskbar,
    SkipSwitcher,
    Shadeable,
    Shaded,
    Movable,
    Resizable,
    VirtualDesktopChangeable,
    Icon,
    Geometry,
    ClientGeometry,
    ParentWindow,
    ApplicationMenu,
    VirtualDesktopEntered(String),
    VirtualDesktopLeft(String),
    ActivityEntered(String),
    ActivityLeft(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationMenu {
    pub service_name: String,
    pub object_path: String,
}

/// Cached state of one compositor window
#[derive(Debug)]
pub struct LingmoWindow<H: WindowHandle> {
    handle: Option<H>,
    uuid: WindowId,
    internal_id: u32,
    title: String,
    app_id: String,
    pid: u32,
    resource_name: String,
    state: WindowState,
    icon: WindowIcon,
    icon_generation: u64,
    geometry: Rect,
    client_geometry: Rect,
    virtual_desktops: Vec<String>,
    activities: Vec<String>,
    parent: Option<WindowId>,
    application_menu: ApplicationMenu,
    unmapped: bool,
}

impl<H: WindowHandle> LingmoWindow<H> {
    pub fn new(handle: H, internal_id: u32, uuid: WindowId) -> Self {
        Self {
            handle: Some(handle),
            uuid,
            internal_id,
            title: String::new(),
            app_id: String::new(),
            pid: 0,
            resource_name: String::new(),
            state: WindowState::empty(),
            icon: WindowIcon::None,
            icon_generation: 0,
            geometry: Rect::default(),
            client_geometry: Rect::default(),
            virtual_desktops: Vec::new(),
            activities: Vec::new(),
            parent: None,
            application_menu: ApplicationMenu::default(),
            unmapped: false,
        }
    }

    pub fn uuid(&self) -> &WindowId {
        &self.uuid
    }

    /// deprecated numeric id, zero for windows announced by uuid only
    pub fn internal_id(&self) -> u32 {
        self.internal_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.contains(WindowState::ACTIVE)
    }

    pub fn is_minimized(&self) -> bool {
        self.state.contains(WindowState::MINIMIZED)
    }

    pub fn is_maximized(&self) -> bool {
        self.state.contains(WindowState::MAXIMIZED)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.state.contains(WindowState::FULLSCREEN)
    }

    pub fn is_keep_above(&self) -> bool {
        self.state.contains(WindowState::KEEP_ABOVE)
    }

    pub fn is_keep_below(&self) -> bool {
        self.state.contains(WindowState::KEEP_BELOW)
    }

    /// Before version 8 this is the state flag, afterwards an empty desktop set.
    pub fn is_on_all_desktops(&self) -> bool {
        match self.handle.as_ref() {
            Some(handle) if handle.protocol_version() >= VIRTUAL_DESKTOPS_SINCE => {
                self.virtual_desktops.is_empty()
            }
            _ => self.state.contains(WindowState::ON_ALL_DESKTOPS),
        }
    }

    pub fn is_demanding_attention(&self) -> bool {
        self.state.contains(WindowState::DEMANDS_ATTENTION)
    }

    pub fn is_closeable(&self) -> bool {
        self.state.contains(WindowState::CLOSEABLE)
    }

    pub fn is_minimizeable(&self) -> bool {
        self.state.contains(WindowState::MINIMIZABLE)
    }

    pub fn is_maximizeable(&self) -> bool {
        self.state.contains(WindowState::MAXIMIZABLE)
    }

    pub fn is_fullscreenable(&self) -> bool {
        self.state.contains(WindowState::FULLSCREENABLE)
    }

    pub fn skip_taskbar(&self) -> bool {
        self.state.contains(WindowState::SKIP_TASKBAR)
    }

    pub fn skip_switcher(&self) -> bool {
        self.state.contains(WindowState::SKIP_SWITCHER)
    }

    pub fn is_shadeable(&self) -> bool {
        self.state.contains(WindowState::SHADEABLE)
    }

    pub fn is_shaded(&self) -> bool {
        self.state.contains(WindowState::SHADED)
    }

    pub fn is_movable(&self) -> bool {
        self.state.contains(WindowState::MOVABLE)
    }

    pub fn is_resizable(&self) -> bool {
        self.state.contains(WindowState::RESIZABLE)
    }

    pub fn is_virtual_desktop_changeable(&self) -> bool {
        self.state.contains(WindowState::VIRTUAL_DESKTOP_CHANGEABLE)
    }

    pub fn icon(&self) -> &WindowIcon {
        &self.icon
    }

    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    pub fn client_geometry(&self) -> Rect {
        self.client_geometry
    }

    /// empty means the window is on every desktop
    pub fn virtual_desktops(&self) -> &[String] {
        &self.virtual_desktops
    }

    /// empty means the window is on every activity
    pub fn activities(&self) -> &[String] {
        &self.activities
    }

    pub fn parent(&self) -> Option<&WindowId> {
        self.parent.as_ref()
    }

    pub fn application_menu(&self) -> &ApplicationMenu {
        &self.application_menu
    }

    pub fn is_unmapped(&self) -> bool {
        self.unmapped
    }

    /// false once unmapped or released
    pub fn is_valid(&self) -> bool {
        self.handle.is_some() && !self.unmapped
    }

    pub fn handle_ref(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    fn handle(&self) -> Result<&H, LingmoEventError> {
        let handle = self.handle.as_ref().filter(|_| !self.unmapped);
        debug_assert!(
            handle.is_some(),
            "request on window {} after it was unmapped or released",
            self.uuid
        );
        handle.ok_or(LingmoEventError::InvalidHandle("org_kde_lingmo_window"))
    }

    /// The handle if it speaks at least `since`; `None` means skip the request.
    fn versioned(&self, since: u32, request: &str) -> Result<Option<&H>, LingmoEventError> {
        let handle = self.handle()?;
        if handle.protocol_version() < since {
            debug!(
                "{request} needs org_kde_lingmo_window v{since}, compositor has v{}",
                handle.protocol_version()
            );
            return Ok(None);
        }
        Ok(Some(handle))
    }

    fn toggle(&self, flag: WindowState) -> Result<(), LingmoEventError> {
        let handle = self.handle()?;
        let target = if self.state.contains(flag) {
            WindowState::empty()
        } else {
            flag
        };
        handle.set_state(flag, target);
        Ok(())
    }

    pub fn request_activate(&self) -> Result<(), LingmoEventError> {
        self.handle()?.set_state(WindowState::ACTIVE, WindowState::ACTIVE);
        Ok(())
    }

    pub fn request_close(&self) -> Result<(), LingmoEventError> {
        self.handle()?.close();
        Ok(())
    }

    pub fn request_move(&self) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(MOVE_RESIZE_SINCE, "request_move")? {
            handle.request_move();
        }
        Ok(())
    }

    pub fn request_resize(&self) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(MOVE_RESIZE_SINCE, "request_resize")? {
            handle.request_resize();
        }
        Ok(())
    }

    pub fn request_toggle_keep_above(&self) -> Result<(), LingmoEventError> {
        self.toggle(WindowState::KEEP_ABOVE)
    }

    pub fn request_toggle_keep_below(&self) -> Result<(), LingmoEventError> {
        self.toggle(WindowState::KEEP_BELOW)
    }

    pub fn request_toggle_minimized(&self) -> Result<(), LingmoEventError> {
        self.toggle(WindowState::MINIMIZED)
    }

    pub fn request_toggle_maximized(&self) -> Result<(), LingmoEventError> {
        self.toggle(WindowState::MAXIMIZED)
    }

    pub fn request_toggle_fullscreen(&self) -> Result<(), LingmoEventError> {
        self.toggle(WindowState::FULLSCREEN)
    }

    pub fn request_toggle_shaded(&self) -> Result<(), LingmoEventError> {
        self.toggle(WindowState::SHADED)
    }

    pub fn request_enter_virtual_desktop(&self, id: &str) -> Result<(), LingmoEventError> {
        if let Some(handle) =
            self.versioned(VIRTUAL_DESKTOPS_SINCE, "request_enter_virtual_desktop")?
        {
            handle.request_enter_virtual_desktop(id);
        }
        Ok(())
    }

    pub fn request_enter_new_virtual_desktop(&self) -> Result<(), LingmoEventError> {
        if let Some(handle) =
            self.versioned(VIRTUAL_DESKTOPS_SINCE, "request_enter_new_virtual_desktop")?
        {
            handle.request_enter_new_virtual_desktop();
        }
        Ok(())
    }

    pub fn request_leave_virtual_desktop(&self, id: &str) -> Result<(), LingmoEventError> {
        if let Some(handle) =
            self.versioned(VIRTUAL_DESKTOPS_SINCE, "request_leave_virtual_desktop")?
        {
            handle.request_leave_virtual_desktop(id);
        }
        Ok(())
    }

    pub fn request_enter_activity(&self, id: &str) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(ACTIVITIES_SINCE, "request_enter_activity")? {
            handle.request_enter_activity(id);
        }
        Ok(())
    }

    pub fn request_leave_activity(&self, id: &str) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(ACTIVITIES_SINCE, "request_leave_activity")? {
            handle.request_leave_activity(id);
        }
        Ok(())
    }

    /// Where the window minimizes to, relative to `panel`
    pub fn set_minimized_geometry(
        &self,
        panel: &H::Surface,
        geometry: Rect,
    ) -> Result<(), LingmoEventError> {
        self.handle()?.set_minimized_geometry(panel, geometry);
        Ok(())
    }

    pub fn unset_minimized_geometry(&self, panel: &H::Surface) -> Result<(), LingmoEventError> {
        self.handle()?.unset_minimized_geometry(panel);
        Ok(())
    }

    /// Ignored below version 15
    pub fn send_to_output(&self, output: &H::Output) -> Result<(), LingmoEventError> {
        if let Some(handle) = self.versioned(SEND_TO_OUTPUT_SINCE, "send_to_output")? {
            handle.send_to_output(output);
        }
        Ok(())
    }

    /// Apply a property event. Lifecycle, parent and icon transfer events are
    /// owned by the registry and yield nothing here.
    pub(crate) fn apply(&mut self, event: WindowEvent<H>) -> Vec<WindowChange> {
        match event {
            WindowEvent::TitleChanged(title) => {
                replace(&mut self.title, title, WindowChange::Title)
            }
            WindowEvent::AppIdChanged(app_id) => {
                replace(&mut self.app_id, app_id, WindowChange::AppId)
            }
            WindowEvent::PidChanged(pid) => replace(&mut self.pid, pid, WindowChange::Pid),
            WindowEvent::ResourceNameChanged(name) => {
                replace(&mut self.resource_name, name, WindowChange::ResourceName)
            }
            WindowEvent::StateChanged(flags) => {
                let state = WindowState::from_wire(flags);
                let changes = self.state.changes_to(state);
                self.state = state;
                changes
            }
            WindowEvent::ThemedIconNameChanged(name) => {
                let icon = if name.is_empty() {
                    WindowIcon::None
                } else {
                    WindowIcon::Themed(name)
                };
                replace(&mut self.icon, icon, WindowChange::Icon)
            }
            WindowEvent::Geometry(geometry) => {
                replace(&mut self.geometry, geometry, WindowChange::Geometry)
            }
            WindowEvent::ClientGeometry(geometry) => replace(
                &mut self.client_geometry,
                geometry,
                WindowChange::ClientGeometry,
            ),
            WindowEvent::ApplicationMenu {
                service_name,
                object_path,
            } => replace(
                &mut self.application_menu,
                ApplicationMenu {
                    service_name,
                    object_path,
                },
                WindowChange::ApplicationMenu,
            ),
            WindowEvent::VirtualDesktopEntered(id) => {
                if self.virtual_desktops.contains(&id) {
                    return Vec::new();
                }
                self.virtual_desktops.push(id.clone());
                let mut changes = vec![WindowChange::VirtualDesktopEntered(id)];
                if self.virtual_desktops.len() == 1 {
                    changes.push(WindowChange::OnAllDesktops);
                }
                changes
            }
            WindowEvent::VirtualDesktopLeft(id) => {
                let before = self.virtual_desktops.len();
                self.virtual_desktops.retain(|desktop| *desktop != id);
                if self.virtual_desktops.len() == before {
                    return Vec::new();
                }
                let mut changes = vec![WindowChange::VirtualDesktopLeft(id)];
                if self.virtual_desktops.is_empty() {
                    changes.push(WindowChange::OnAllDesktops);
                }
                changes
            }
            WindowEvent::ActivityEntered(id) => {
                if self.activities.contains(&id) {
                    return Vec::new();
                }
                self.activities.push(id.clone());
                vec![WindowChange::ActivityEntered(id)]
            }
            WindowEvent::ActivityLeft(id) => {
                let before = self.activities.len();
                self.activities.retain(|activity| *activity != id);
                if self.activities.len() == before {
                    return Vec::new();
                }
                vec![WindowChange::ActivityLeft(id)]
            }
            WindowEvent::VirtualDesktopChanged(_)
            | WindowEvent::Unmapped
            | WindowEvent::InitialState
            | WindowEvent::ParentWindow(_)
            | WindowEvent::IconChanged => Vec::new(),
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<WindowId>) -> bool {
        if self.parent == parent {
            return false;
        }
        self.parent = parent;
        true
    }

    pub(crate) fn set_icon(&mut self, icon: WindowIcon) -> bool {
        if self.icon == icon {
            return false;
        }
        self.icon = icon;
        true
    }

    /// Start a new icon transfer; replies tagged with an older generation are stale.
    pub(crate) fn next_icon_generation(&mut self) -> u64 {
        self.icon_generation += 1;
        self.icon_generation
    }

    pub(crate) fn icon_generation(&self) -> u64 {
        self.icon_generation
    }

    pub(crate) fn mark_unmapped(&mut self) {
        self.unmapped = true;
    }

    /// Send the destructor (version 4+) and drop the handle
    pub(crate) fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.protocol_version() >= DESTROY_SINCE {
                handle.release_handle();
            }
        }
    }

    /// Drop the handle without telling the compositor
    pub(crate) fn destroy(&mut self) {
        self.handle = None;
    }
}

fn replace<T: PartialEq>(field: &mut T, value: T, change: WindowChange) -> Vec<WindowChange> {
    if *field == value {
        return Vec::new();
    }
    *field = value;
    vec![change]
}
