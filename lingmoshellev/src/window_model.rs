//! Row oriented view over [`WindowManagement`] for list based task managers.
//!
//! The model only stores window ids; values are read from the registry on
//! demand. Feed it every [`WindowManagementEvent`] in order and forward the
//! returned [`ModelEvent`]s to the view.

use log::warn;

use crate::LingmoEventError;
use crate::icon::WindowIcon;
use crate::state::Rect;
use crate::window::{LingmoWindow, WindowChange, WindowHandle, WindowId};
use crate::window_management::{ManagementHandle, WindowManagement, WindowManagementEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelRole {
    /// the title
    Display,
    /// the icon
    Decoration,
    AppId,
    IsActive,
    IsFullscreenable,
    IsFullscreen,
    IsMaximizable,
    IsMaximized,
    IsMinimizable,
    IsMinimized,
    IsKeepAbove,
    IsKeepBelow,
    IsOnAllDesktops,
    IsDemandingAttention,
    SkipTaskbar,
    IsShadeable,
    IsShaded,
    IsMovable,
    IsResizable,
    IsVirtualDesktopChangeable,
    IsCloseable,
    Geometry,
    Pid,
    SkipSwitcher,
    VirtualDesktops,
    Uuid,
}

impl ModelRole {
    pub const ALL: [ModelRole; 26] = [
        ModelRole::Display,
        ModelRole::Decoration,
        ModelRole::AppId,
        ModelRole::IsActive,
        ModelRole::IsFullscreenable,
        ModelRole::IsFullscreen,
        ModelRole::IsMaximizable,
        ModelRole::IsMaximized,
        ModelRole::IsMinimizable,
        ModelRole::IsMinimized,
        ModelRole::IsKeepAbove,
        ModelRole::IsKeepBelow,
        ModelRole::IsOnAllDesktops,
        ModelRole::IsDemandingAttention,
        ModelRole::SkipTaskbar,
        ModelRole::IsShadeable,
        ModelRole::IsShaded,
        ModelRole::IsMovable,
        ModelRole::IsResizable,
        ModelRole::IsVirtualDesktopChangeable,
        ModelRole::IsCloseable,
        ModelRole::Geometry,
        ModelRole::Pid,
        ModelRole::SkipSwitcher,
        ModelRole::VirtualDesktops,
        ModelRole::Uuid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelRole::Display => "display",
            ModelRole::Decoration => "decoration",
            ModelRole::AppId => "AppId",
            ModelRole::IsActive => "IsActive",
            ModelRole::IsFullscreenable => "IsFullscreenable",
            ModelRole::IsFullscreen => "IsFullscreen",
            ModelRole::IsMaximizable => "IsMaximizable",
            ModelRole::IsMaximized => "IsMaximized",
            ModelRole::IsMinimizable => "IsMinimizable",
            ModelRole::IsMinimized => "IsMinimized",
            ModelRole::IsKeepAbove => "IsKeepAbove",
            ModelRole::IsKeepBelow => "IsKeepBelow",
            ModelRole::IsOnAllDesktops => "IsOnAllDesktops",
            ModelRole::IsDemandingAttention => "IsDemandingAttention",
            ModelRole::SkipTaskbar => "SkipTaskbar",
            ModelRole::IsShadeable => "IsShadeable",
            ModelRole::IsShaded => "IsShaded",
            ModelRole::IsMovable => "IsMovable",
            ModelRole::IsResizable => "IsResizable",
            ModelRole::IsVirtualDesktopChangeable => "IsVirtualDesktopChangeable",
            ModelRole::IsCloseable => "IsCloseable",
            ModelRole::Geometry => "Geometry",
            ModelRole::Pid => "Pid",
            ModelRole::SkipSwitcher => "SkipSwitcher",
            ModelRole::VirtualDesktops => "VirtualDesktops",
            ModelRole::Uuid => "Uuid",
        }
    }

    /// The role a field change invalidates, if the model shows that field
    pub fn for_change(change: &WindowChange) -> Option<ModelRole> {
        let role = match change {
            WindowChange::Title => ModelRole::Display,
            WindowChange::Icon => ModelRole::Decoration,
            WindowChange::AppId => ModelRole::AppId,
            WindowChange::Pid => ModelRole::Pid,
            WindowChange::Active => ModelRole::IsActive,
            WindowChange::Fullscreenable => ModelRole::IsFullscreenable,
            WindowChange::Fullscreen => ModelRole::IsFullscreen,
            WindowChange::Maximizeable => ModelRole::IsMaximizable,
            WindowChange::Maximized => ModelRole::IsMaximized,
            WindowChange::Minimizeable => ModelRole::IsMinimizable,
            WindowChange::Minimized => ModelRole::IsMinimized,
            WindowChange::KeepAbove => ModelRole::IsKeepAbove,
            WindowChange::KeepBelow => ModelRole::IsKeepBelow,
            WindowChange::OnAllDesktops => ModelRole::IsOnAllDesktops,
            WindowChange::DemandsAttention => ModelRole::IsDemandingAttention,
            WindowChange::SkipTaskbar => ModelRole::SkipTaskbar,
            WindowChange::SkipSwitcher => ModelRole::SkipSwitcher,
            WindowChange::Shadeable => ModelRole::IsShadeable,
            WindowChange::Shaded => ModelRole::IsShaded,
            WindowChange::Movable => ModelRole::IsMovable,
            WindowChange::Resizable => ModelRole::IsResizable,
            WindowChange::VirtualDesktopChangeable => ModelRole::IsVirtualDesktopChangeable,
            WindowChange::Closeable => ModelRole::IsCloseable,
            WindowChange::Geometry => ModelRole::Geometry,
            WindowChange::VirtualDesktopEntered(_) | WindowChange::VirtualDesktopLeft(_) => {
                ModelRole::VirtualDesktops
            }
            WindowChange::ResourceName
            | WindowChange::ClientGeometry
            | WindowChange::ParentWindow
            | WindowChange::ApplicationMenu
            | WindowChange::ActivityEntered(_)
            | WindowChange::ActivityLeft(_) => return None,
        };
        Some(role)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelValue {
    String(String),
    Bool(bool),
    U32(u32),
    Rect(Rect),
    StringList(Vec<String>),
    Icon(WindowIcon),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    RowsInserted { first: usize, last: usize },
    RowsRemoved { first: usize, last: usize },
    DataChanged { row: usize, role: ModelRole },
    Reset,
}

#[derive(Debug, Default)]
pub struct WindowModel {
    rows: Vec<WindowId>,
}

impl WindowModel {
    /// Start with every window the registry already knows
    pub fn new<M: ManagementHandle>(management: &WindowManagement<M>) -> Self {
        Self {
            rows: management
                .windows()
                .iter()
                .map(|window| window.uuid().clone())
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_of(&self, uuid: &WindowId) -> Option<usize> {
        self.rows.iter().position(|row| row == uuid)
    }

    pub fn uuid_at(&self, row: usize) -> Option<&WindowId> {
        self.rows.get(row)
    }

    pub fn role_names() -> Vec<(ModelRole, &'static str)> {
        ModelRole::ALL.iter().map(|role| (*role, role.name())).collect()
    }

    pub fn handle_event(&mut self, event: &WindowManagementEvent) -> Option<ModelEvent> {
        match event {
            WindowManagementEvent::WindowCreated(uuid) => {
                if self.row_of(uuid).is_some() {
                    return None;
                }
                let row = self.rows.len();
                self.rows.push(uuid.clone());
                Some(ModelEvent::RowsInserted {
                    first: row,
                    last: row,
                })
            }
            WindowManagementEvent::WindowUnmapped(uuid) => {
                let row = self.row_of(uuid)?;
                self.rows.remove(row);
                Some(ModelEvent::RowsRemoved {
                    first: row,
                    last: row,
                })
            }
            WindowManagementEvent::WindowChanged { window, change } => {
                let role = ModelRole::for_change(change)?;
                let row = self.row_of(window)?;
                Some(ModelEvent::DataChanged { row, role })
            }
            WindowManagementEvent::InterfaceAboutToBeReleased
            | WindowManagementEvent::InterfaceAboutToBeDestroyed => {
                self.rows.clear();
                Some(ModelEvent::Reset)
            }
            _ => None,
        }
    }

    pub fn window<'a, M: ManagementHandle>(
        &self,
        management: &'a WindowManagement<M>,
        row: usize,
    ) -> Option<&'a LingmoWindow<M::Window>> {
        management.window(self.rows.get(row)?)
    }

    pub fn data<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
        role: ModelRole,
    ) -> Option<ModelValue> {
        self.window(management, row).map(|window| value(window, role))
    }

    /// Every role of `row` except display and decoration
    pub fn item_data<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
    ) -> Vec<(ModelRole, ModelValue)> {
        let Some(window) = self.window(management, row) else {
            return Vec::new();
        };
        ModelRole::ALL
            .iter()
            .filter(|role| !matches!(role, ModelRole::Display | ModelRole::Decoration))
            .map(|role| (*role, value(window, *role)))
            .collect()
    }

    fn with_row<M, F>(&self, management: &WindowManagement<M>, row: usize, request: F)
    where
        M: ManagementHandle,
        F: FnOnce(&LingmoWindow<M::Window>) -> Result<(), LingmoEventError>,
    {
        if let Some(window) = self.window(management, row) {
            if let Err(err) = request(window) {
                warn!("request on row {row} failed: {err}");
            }
        }
    }

    pub fn request_activate<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
    ) {
        self.with_row(management, row, |window| window.request_activate());
    }

    pub fn request_close<M: ManagementHandle>(&self, management: &WindowManagement<M>, row: usize) {
        self.with_row(management, row, |window| window.request_close());
    }

    pub fn request_move<M: ManagementHandle>(&self, management: &WindowManagement<M>, row: usize) {
        self.with_row(management, row, |window| window.request_move());
    }

    pub fn request_resize<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
    ) {
        self.with_row(management, row, |window| window.request_resize());
    }

    pub fn request_enter_virtual_desktop<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
        id: &str,
    ) {
        self.with_row(management, row, |window| {
            window.request_enter_virtual_desktop(id)
        });
    }

    pub fn request_toggle_keep_above<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
    ) {
        self.with_row(management, row, |window| window.request_toggle_keep_above());
    }

    pub fn request_toggle_keep_below<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
    ) {
        self.with_row(management, row, |window| window.request_toggle_keep_below());
    }

    pub fn request_toggle_minimized<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
    ) {
        self.with_row(management, row, |window| window.request_toggle_minimized());
    }

    pub fn request_toggle_maximized<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
    ) {
        self.with_row(management, row, |window| window.request_toggle_maximized());
    }

    pub fn request_toggle_fullscreen<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
    ) {
        self.with_row(management, row, |window| window.request_toggle_fullscreen());
    }

    pub fn request_toggle_shaded<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
    ) {
        self.with_row(management, row, |window| window.request_toggle_shaded());
    }

    pub fn set_minimized_geometry<M: ManagementHandle>(
        &self,
        management: &WindowManagement<M>,
        row: usize,
        panel: &<M::Window as WindowHandle>::Surface,
        geometry: Rect,
    ) {
        self.with_row(management, row, |window| {
            window.set_minimized_geometry(panel, geometry)
        });
    }
}

fn value<H: WindowHandle>(window: &LingmoWindow<H>, role: ModelRole) -> ModelValue {
    match role {
        ModelRole::Display => ModelValue::String(window.title().to_owned()),
        ModelRole::Decoration => ModelValue::Icon(window.icon().clone()),
        ModelRole::AppId => ModelValue::String(window.app_id().to_owned()),
        ModelRole::Pid => ModelValue::U32(window.pid()),
        ModelRole::IsActive => ModelValue::Bool(window.is_active()),
        ModelRole::IsFullscreenable => ModelValue::Bool(window.is_fullscreenable()),
        ModelRole::IsFullscreen => ModelValue::Bool(window.is_fullscreen()),
        ModelRole::IsMaximizable => ModelValue::Bool(window.is_maximizeable()),
        ModelRole::IsMaximized => ModelValue::Bool(window.is_maximized()),
        ModelRole::IsMinimizable => ModelValue::Bool(window.is_minimizeable()),
        ModelRole::IsMinimized => ModelValue::Bool(window.is_minimized()),
        ModelRole::IsKeepAbove => ModelValue::Bool(window.is_keep_above()),
        ModelRole::IsKeepBelow => ModelValue::Bool(window.is_keep_below()),
        ModelRole::IsOnAllDesktops => ModelValue::Bool(window.is_on_all_desktops()),
        ModelRole::IsDemandingAttention => ModelValue::Bool(window.is_demanding_attention()),
        ModelRole::SkipTaskbar => ModelValue::Bool(window.skip_taskbar()),
        ModelRole::SkipSwitcher => ModelValue::Bool(window.skip_switcher()),
        ModelRole::IsShadeable => ModelValue::Bool(window.is_shadeable()),
        ModelRole::IsShaded => ModelValue::Bool(window.is_shaded()),
        ModelRole::IsMovable => ModelValue::Bool(window.is_movable()),
        ModelRole::IsResizable => ModelValue::Bool(window.is_resizable()),
        ModelRole::IsVirtualDesktopChangeable => {
            ModelValue::Bool(window.is_virtual_desktop_changeable())
        }
        ModelRole::IsCloseable => ModelValue::Bool(window.is_closeable()),
        ModelRole::Geometry => ModelValue::Rect(window.geometry()),
        ModelRole::VirtualDesktops => ModelValue::StringList(window.virtual_desktops().to_vec()),
        ModelRole::Uuid => ModelValue::String(window.uuid().to_string()),
    }
}
