//! Scripted protocol handles that record every request they are asked to send.

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::Write;
use std::os::fd::BorrowedFd;
use std::rc::Rc;

use crate::activation::{ActivationFeedbackHandle, ActivationHandle};
use crate::icon::PNG_SIGNATURE;
use crate::shell::{ShellHandle, ShellSurfaceHandle};
use crate::stacking_order::StackingOrderToken;
use crate::state::{Rect, WindowState};
use crate::virtual_desktop::{VirtualDesktopHandle, VirtualDesktopManagementHandle};
use crate::window::{WindowHandle, WindowId};
use crate::window_management::ManagementHandle;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Request {
    ShowDesktop(bool),
    GetWindow { internal_id: u32, uuid: WindowId },
    GetWindowByUuid(WindowId),
    GetStackingOrder(StackingOrderToken),
    SetState {
        window: u32,
        flags: WindowState,
        state: WindowState,
    },
    Close(u32),
    Move(u32),
    Resize(u32),
    GetIcon(u32),
    EnterVirtualDesktop(u32, String),
    EnterNewVirtualDesktop(u32),
    LeaveVirtualDesktop(u32, String),
    EnterActivity(u32, String),
    LeaveActivity(u32, String),
    SetMinimizedGeometry {
        window: u32,
        panel: u32,
        geometry: Rect,
    },
    UnsetMinimizedGeometry {
        window: u32,
        panel: u32,
    },
    SendToOutput {
        window: u32,
        output: u32,
    },
    DestroyWindow(u32),

    GetSurface(u32),
    SetRole { surface: u32, role: u32 },
    SetPanelBehavior { surface: u32, behavior: u32 },
    SetPosition { surface: u32, x: i32, y: i32 },
    SetSkipTaskbar(u32, bool),
    SetSkipSwitcher(u32, bool),
    PanelAutoHideHide(u32),
    PanelAutoHideShow(u32),
    SetPanelTakesFocus(u32, bool),
    OpenUnderCursor(u32),
    DestroySurface(u32),

    GetVirtualDesktop(String),
    CreateVirtualDesktop { name: String, position: u32 },
    RemoveVirtualDesktop(String),
    ActivateVirtualDesktop(String),

    DestroyActivation(u32),
    DestroyActivationFeedback,
}

pub(crate) type RequestLog = Rc<RefCell<Vec<Request>>>;

pub(crate) fn tiny_png(width: u32, height: u32) -> Vec<u8> {
    let mut data = PNG_SIGNATURE.to_vec();
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    // crc is not checked
    data.extend_from_slice(&[0; 4]);
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(b"IEND");
    data.extend_from_slice(&[0; 4]);
    data
}

fn qstring(data: &mut Vec<u8>, text: &str) {
    let units: Vec<u16> = text.encode_utf16().collect();
    data.extend_from_slice(&(units.len() as u32 * 2).to_be_bytes());
    for unit in units {
        data.extend_from_slice(&unit.to_be_bytes());
    }
}

/// A `QIcon` as `QPixmapIconEngine` serializes it, `None` entries are null images
pub(crate) fn qicon_pixmaps(entries: &[Option<Vec<u8>>]) -> Vec<u8> {
    let mut data = Vec::new();
    qstring(&mut data, "QPixmapIconEngine");
    data.extend_from_slice(&(entries.len() as i32).to_be_bytes());
    for entry in entries {
        match entry {
            Some(png) => {
                data.extend_from_slice(&1i32.to_be_bytes());
                data.extend_from_slice(png);
            }
            None => data.extend_from_slice(&0i32.to_be_bytes()),
        }
        // null file name, size, mode and state
        data.extend_from_slice(&u32::MAX.to_be_bytes());
        data.extend_from_slice(&[0; 16]);
    }
    data
}

/// A `QIcon` from an engine that only stores a theme name
pub(crate) fn qicon_themed(engine: &str, name: &str) -> Vec<u8> {
    let mut data = Vec::new();
    qstring(&mut data, engine);
    qstring(&mut data, name);
    data
}

#[derive(Debug, Clone)]
pub(crate) struct MockWindow {
    pub id: u32,
    pub version: u32,
    log: RequestLog,
    /// written into the icon pipe, nothing is written when `None`
    icon: Rc<RefCell<Option<Vec<u8>>>>,
}

impl MockWindow {
    pub fn new(id: u32, version: u32, log: RequestLog) -> Self {
        Self {
            id,
            version,
            log,
            icon: Rc::default(),
        }
    }

    fn push(&self, request: Request) {
        self.log.borrow_mut().push(request);
    }
}

impl PartialEq for MockWindow {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl WindowHandle for MockWindow {
    type Surface = u32;
    type Output = u32;

    fn protocol_version(&self) -> u32 {
        self.version
    }
    fn set_state(&self, flags: WindowState, state: WindowState) {
        self.push(Request::SetState {
            window: self.id,
            flags,
            state,
        });
    }
    fn close(&self) {
        self.push(Request::Close(self.id));
    }
    fn request_move(&self) {
        self.push(Request::Move(self.id));
    }
    fn request_resize(&self) {
        self.push(Request::Resize(self.id));
    }
    fn get_icon(&self, fd: BorrowedFd<'_>) {
        self.push(Request::GetIcon(self.id));
        if let Some(data) = self.icon.borrow().as_ref() {
            let mut file = File::from(fd.try_clone_to_owned().expect("dup icon fd"));
            file.write_all(data).expect("write icon");
        }
    }
    fn request_enter_virtual_desktop(&self, id: &str) {
        self.push(Request::EnterVirtualDesktop(self.id, id.to_owned()));
    }
    fn request_enter_new_virtual_desktop(&self) {
        self.push(Request::EnterNewVirtualDesktop(self.id));
    }
    fn request_leave_virtual_desktop(&self, id: &str) {
        self.push(Request::LeaveVirtualDesktop(self.id, id.to_owned()));
    }
    fn request_enter_activity(&self, id: &str) {
        self.push(Request::EnterActivity(self.id, id.to_owned()));
    }
    fn request_leave_activity(&self, id: &str) {
        self.push(Request::LeaveActivity(self.id, id.to_owned()));
    }
    fn set_minimized_geometry(&self, panel: &u32, geometry: Rect) {
        self.push(Request::SetMinimizedGeometry {
            window: self.id,
            panel: *panel,
            geometry,
        });
    }
    fn unset_minimized_geometry(&self, panel: &u32) {
        self.push(Request::UnsetMinimizedGeometry {
            window: self.id,
            panel: *panel,
        });
    }
    fn send_to_output(&self, output: &u32) {
        self.push(Request::SendToOutput {
            window: self.id,
            output: *output,
        });
    }
    fn release_handle(&self) {
        self.push(Request::DestroyWindow(self.id));
    }
}

#[derive(Debug)]
pub(crate) struct MockManagement {
    pub version: u32,
    pub log: RequestLog,
    next_window: Cell<u32>,
    icon: Rc<RefCell<Option<Vec<u8>>>>,
}

impl MockManagement {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            log: RequestLog::default(),
            next_window: Cell::new(0),
            icon: Rc::default(),
        }
    }

    /// payload every window created from now on writes into its icon pipe
    pub fn set_icon_payload(&self, data: Option<Vec<u8>>) {
        *self.icon.borrow_mut() = data;
    }

    /// A window handle the registry has not created itself, e.g. a parent
    /// reference taken from an event.
    pub fn foreign_window(&self, id: u32) -> MockWindow {
        MockWindow::new(id, self.version, self.log.clone())
    }

    fn create_window(&self) -> MockWindow {
        let id = self.next_window.get() + 1;
        self.next_window.set(id);
        MockWindow {
            id,
            version: self.version,
            log: self.log.clone(),
            icon: self.icon.clone(),
        }
    }
}

impl ManagementHandle for MockManagement {
    type Window = MockWindow;

    fn protocol_version(&self) -> u32 {
        self.version
    }
    fn show_desktop(&self, show: bool) {
        self.log.borrow_mut().push(Request::ShowDesktop(show));
    }
    fn get_window(&self, internal_id: u32, uuid: &WindowId) -> MockWindow {
        self.log.borrow_mut().push(Request::GetWindow {
            internal_id,
            uuid: uuid.clone(),
        });
        self.create_window()
    }
    fn get_window_by_uuid(&self, uuid: &WindowId) -> MockWindow {
        self.log
            .borrow_mut()
            .push(Request::GetWindowByUuid(uuid.clone()));
        self.create_window()
    }
    fn get_stacking_order(&self, token: StackingOrderToken) {
        self.log.borrow_mut().push(Request::GetStackingOrder(token));
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockSurface {
    pub id: u32,
    pub version: u32,
    log: RequestLog,
}

impl MockSurface {
    fn push(&self, request: Request) {
        self.log.borrow_mut().push(request);
    }
}

impl ShellSurfaceHandle for MockSurface {
    fn protocol_version(&self) -> u32 {
        self.version
    }
    fn surface_id(&self) -> u32 {
        self.id
    }
    fn set_role(&self, role: u32) {
        self.push(Request::SetRole {
            surface: self.id,
            role,
        });
    }
    fn set_panel_behavior(&self, behavior: u32) {
        self.push(Request::SetPanelBehavior {
            surface: self.id,
            behavior,
        });
    }
    fn set_position(&self, x: i32, y: i32) {
        self.push(Request::SetPosition {
            surface: self.id,
            x,
            y,
        });
    }
    fn set_skip_taskbar(&self, skip: bool) {
        self.push(Request::SetSkipTaskbar(self.id, skip));
    }
    fn set_skip_switcher(&self, skip: bool) {
        self.push(Request::SetSkipSwitcher(self.id, skip));
    }
    fn panel_auto_hide_hide(&self) {
        self.push(Request::PanelAutoHideHide(self.id));
    }
    fn panel_auto_hide_show(&self) {
        self.push(Request::PanelAutoHideShow(self.id));
    }
    fn set_panel_takes_focus(&self, takes_focus: bool) {
        self.push(Request::SetPanelTakesFocus(self.id, takes_focus));
    }
    fn open_under_cursor(&self) {
        self.push(Request::OpenUnderCursor(self.id));
    }
    fn release_handle(&self) {
        self.push(Request::DestroySurface(self.id));
    }
}

#[derive(Debug)]
pub(crate) struct MockShell {
    pub version: u32,
    pub log: RequestLog,
    next_surface: Cell<u32>,
}

impl MockShell {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            log: RequestLog::default(),
            next_surface: Cell::new(100),
        }
    }
}

impl ShellHandle for MockShell {
    type Surface = MockSurface;
    /// the protocol id of a `wl_surface`
    type WlSurface = u32;

    fn get_surface(&self, surface: &u32) -> MockSurface {
        self.log.borrow_mut().push(Request::GetSurface(*surface));
        let id = self.next_surface.get() + 1;
        self.next_surface.set(id);
        MockSurface {
            id,
            version: self.version,
            log: self.log.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockDesktop {
    pub id: String,
    log: RequestLog,
}

impl VirtualDesktopHandle for MockDesktop {
    fn request_activate(&self) {
        self.log
            .borrow_mut()
            .push(Request::ActivateVirtualDesktop(self.id.clone()));
    }
}

#[derive(Debug)]
pub(crate) struct MockDesktopManagement {
    pub version: u32,
    pub log: RequestLog,
}

impl MockDesktopManagement {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            log: RequestLog::default(),
        }
    }
}

impl VirtualDesktopManagementHandle for MockDesktopManagement {
    type Desktop = MockDesktop;

    fn protocol_version(&self) -> u32 {
        self.version
    }
    fn get_virtual_desktop(&self, id: &str) -> MockDesktop {
        self.log
            .borrow_mut()
            .push(Request::GetVirtualDesktop(id.to_owned()));
        MockDesktop {
            id: id.to_owned(),
            log: self.log.clone(),
        }
    }
    fn request_create_virtual_desktop(&self, name: &str, position: u32) {
        self.log.borrow_mut().push(Request::CreateVirtualDesktop {
            name: name.to_owned(),
            position,
        });
    }
    fn request_remove_virtual_desktop(&self, id: &str) {
        self.log
            .borrow_mut()
            .push(Request::RemoveVirtualDesktop(id.to_owned()));
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockActivation {
    pub id: u32,
    pub log: RequestLog,
}

impl ActivationHandle for MockActivation {
    fn activation_id(&self) -> u32 {
        self.id
    }
    fn release_handle(&self) {
        self.log.borrow_mut().push(Request::DestroyActivation(self.id));
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockActivationFeedback {
    pub log: RequestLog,
}

impl ActivationFeedbackHandle for MockActivationFeedback {
    type Activation = MockActivation;

    fn release_handle(&self) {
        self.log
            .borrow_mut()
            .push(Request::DestroyActivationFeedback);
    }
}
