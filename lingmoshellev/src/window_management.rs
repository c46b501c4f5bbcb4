//! Client side of `org_kde_lingmo_window_management`.
//!
//! [`WindowManagement`] keeps the live window list. New windows are announced
//! by the management global; the matching `org_kde_lingmo_window` object is
//! only requested from an idle callback once the announcing event has been
//! fully dispatched. Each record tracks its own properties, while the registry
//! owns everything that spans windows: the active window, parent links, the
//! stacking order and the show desktop flag.

use std::collections::VecDeque;
use std::os::fd::BorrowedFd;

use log::{debug, trace, warn};
use wayland_client::Proxy;
use wayland_client::protocol::wl_output::WlOutput;
use wayland_client::protocol::wl_surface::WlSurface;

use crate::LingmoEventError;
use crate::icon::{IconFetcher, IconReply, WindowIcon};
use crate::stacking_order::{StackingOrderEvent, StackingOrderToken, StackingOrderTracker};
use crate::state::{Rect, WindowState};
use crate::window::{ICON_SINCE, LingmoWindow, WindowChange, WindowEvent, WindowHandle, WindowId};

pub use generated::{
    org_kde_lingmo_activation, org_kde_lingmo_activation_feedback, org_kde_lingmo_stacking_order,
    org_kde_lingmo_window, org_kde_lingmo_window_management,
};

use org_kde_lingmo_window::OrgKdeLingmoWindow;

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
        wayland_scanner::generate_interfaces!("protocols/lingmo-window-management.xml");
    }
    use self::__interfaces::*;

    wayland_scanner::generate_client_code!("protocols/lingmo-window-management.xml");
}

pub(crate) const GET_STACKING_ORDER_SINCE: u32 = 17;

const SHOW_DESKTOP_DISABLED: u32 = 0;
const SHOW_DESKTOP_ENABLED: u32 = 1;

/// The requests the registry sends to the management global
pub trait ManagementHandle {
    type Window: WindowHandle;

    fn protocol_version(&self) -> u32;
    fn show_desktop(&self, show: bool);
    /// `uuid` is the identity the new window is tracked under
    fn get_window(&self, internal_id: u32, uuid: &WindowId) -> Self::Window;
    fn get_window_by_uuid(&self, uuid: &WindowId) -> Self::Window;
    /// Request a stacking order object whose events carry `token`
    fn get_stacking_order(&self, token: StackingOrderToken);
}

impl WindowHandle for OrgKdeLingmoWindow {
    type Surface = WlSurface;
    type Output = WlOutput;

    fn protocol_version(&self) -> u32 {
        self.version()
    }

    fn set_state(&self, flags: WindowState, state: WindowState) {
        OrgKdeLingmoWindow::set_state(self, flags.bits(), state.bits());
    }

    fn close(&self) {
        OrgKdeLingmoWindow::close(self);
    }

    fn request_move(&self) {
        OrgKdeLingmoWindow::request_move(self);
    }

    fn request_resize(&self) {
        OrgKdeLingmoWindow::request_resize(self);
    }

    fn get_icon(&self, fd: BorrowedFd<'_>) {
        OrgKdeLingmoWindow::get_icon(self, fd);
    }

    fn request_enter_virtual_desktop(&self, id: &str) {
        OrgKdeLingmoWindow::request_enter_virtual_desktop(self, id.to_owned());
    }

    fn request_enter_new_virtual_desktop(&self) {
        OrgKdeLingmoWindow::request_enter_new_virtual_desktop(self);
    }

    fn request_leave_virtual_desktop(&self, id: &str) {
        OrgKdeLingmoWindow::request_leave_virtual_desktop(self, id.to_owned());
    }

    fn request_enter_activity(&self, id: &str) {
        OrgKdeLingmoWindow::request_enter_activity(self, id.to_owned());
    }

    fn request_leave_activity(&self, id: &str) {
        OrgKdeLingmoWindow::request_leave_activity(self, id.to_owned());
    }

    fn set_minimized_geometry(&self, panel: &WlSurface, geometry: Rect) {
        // the wire carries panel relative coordinates as uint
        OrgKdeLingmoWindow::set_minimized_geometry(
            self,
            panel,
            geometry.x.max(0) as u32,
            geometry.y.max(0) as u32,
            geometry.width,
            geometry.height,
        );
    }

    fn unset_minimized_geometry(&self, panel: &WlSurface) {
        OrgKdeLingmoWindow::unset_minimized_geometry(self, panel);
    }

    fn send_to_output(&self, output: &WlOutput) {
        OrgKdeLingmoWindow::send_to_output(self, output);
    }

    fn release_handle(&self) {
        self.destroy();
    }
}

/// Events of the management global, after decoding from the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagementEvent {
    ShowDesktopChanged(u32),
    /// deprecated announcement without uuid
    Window { internal_id: u32 },
    WindowWithUuid { internal_id: u32, uuid: String },
    /// numeric ids, superseded by the uuid events and ignored
    StackingOrderChanged(Vec<u32>),
    /// `;` separated uuid list
    StackingOrderUuidChanged(String),
    /// a fresh stacking order object should be requested
    StackingOrderChanged2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowManagementEvent {
    ShowingDesktopChanged(bool),
    /// a window received its initial state and is ready to be shown
    WindowCreated(WindowId),
    WindowChanged {
        window: WindowId,
        change: WindowChange,
    },
    WindowUnmapped(WindowId),
    ActiveWindowChanged(Option<WindowId>),
    StackingOrderChanged,
    InterfaceAboutToBeReleased,
    InterfaceAboutToBeDestroyed,
    /// the compositor removed the global
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingWindow {
    internal_id: u32,
    uuid: Option<String>,
}

#[derive(Debug)]
pub struct WindowManagement<M: ManagementHandle> {
    handle: Option<M>,
    windows: Vec<LingmoWindow<M::Window>>,
    active_window: Option<WindowId>,
    showing_desktop: bool,
    stacking_order: StackingOrderTracker,
    pending: VecDeque<PendingWindow>,
    icons: IconFetcher,
    events: Vec<WindowManagementEvent>,
}

impl<M: ManagementHandle> WindowManagement<M> {
    pub fn new(handle: M, icons: IconFetcher) -> Self {
        let mut management = Self {
            handle: None,
            windows: Vec::new(),
            active_window: None,
            showing_desktop: false,
            stacking_order: StackingOrderTracker::new(),
            pending: VecDeque::new(),
            icons,
            events: Vec::new(),
        };
        if handle.protocol_version() >= GET_STACKING_ORDER_SINCE {
            let token = management.stacking_order.begin();
            handle.get_stacking_order(token);
        }
        management.handle = Some(handle);
        management
    }

    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle_ref(&self) -> Option<&M> {
        self.handle.as_ref()
    }

    fn handle(&self) -> Result<&M, LingmoEventError> {
        debug_assert!(
            self.handle.is_some(),
            "request on a released org_kde_lingmo_window_management"
        );
        self.handle.as_ref().ok_or(LingmoEventError::InvalidHandle(
            "org_kde_lingmo_window_management",
        ))
    }

    /// Windows in discovery order, unmapped ones excluded
    pub fn windows(&self) -> &[LingmoWindow<M::Window>] {
        &self.windows
    }

    pub fn window(&self, uuid: &WindowId) -> Option<&LingmoWindow<M::Window>> {
        self.windows.iter().find(|window| window.uuid() == uuid)
    }

    pub fn active_window(&self) -> Option<&LingmoWindow<M::Window>> {
        self.active_window.as_ref().and_then(|uuid| self.window(uuid))
    }

    pub fn active_window_id(&self) -> Option<&WindowId> {
        self.active_window.as_ref()
    }

    pub fn is_showing_desktop(&self) -> bool {
        self.showing_desktop
    }

    /// Bottom to top, as last published by the compositor
    pub fn stacking_order(&self) -> &[WindowId] {
        self.stacking_order.current()
    }

    /// Windows announced but not requested yet
    pub fn pending_windows(&self) -> usize {
        self.pending.len()
    }

    pub fn take_events(&mut self) -> Vec<WindowManagementEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn show_desktop(&self) -> Result<(), LingmoEventError> {
        self.set_showing_desktop(true)
    }

    pub fn hide_desktop(&self) -> Result<(), LingmoEventError> {
        self.set_showing_desktop(false)
    }

    /// Only asks; [`Self::is_showing_desktop`] follows the compositor's answer.
    pub fn set_showing_desktop(&self, show: bool) -> Result<(), LingmoEventError> {
        self.handle()?.show_desktop(show);
        Ok(())
    }

    /// Returns true when the caller has to schedule [`Self::materialize_pending`].
    pub fn handle_event(&mut self, event: ManagementEvent) -> bool {
        trace!("window management event: {event:?}");
        match event {
            ManagementEvent::ShowDesktopChanged(state) => {
                let showing = match state {
                    SHOW_DESKTOP_ENABLED => true,
                    SHOW_DESKTOP_DISABLED => false,
                    other => {
                        warn!("unknown show desktop state {other}");
                        return false;
                    }
                };
                if self.showing_desktop != showing {
                    self.showing_desktop = showing;
                    self.events
                        .push(WindowManagementEvent::ShowingDesktopChanged(showing));
                }
                false
            }
            ManagementEvent::Window { internal_id } => self.announce(internal_id, None),
            ManagementEvent::WindowWithUuid { internal_id, uuid } => {
                self.announce(internal_id, Some(uuid))
            }
            ManagementEvent::StackingOrderChanged(_) => false,
            ManagementEvent::StackingOrderUuidChanged(uuids) => {
                let list = uuids
                    .split(';')
                    .filter(|uuid| !uuid.is_empty())
                    .map(WindowId::from)
                    .collect();
                if self.stacking_order.replace(list) {
                    self.events.push(WindowManagementEvent::StackingOrderChanged);
                }
                false
            }
            ManagementEvent::StackingOrderChanged2 => {
                if let Some(handle) = self.handle.as_ref() {
                    let token = self.stacking_order.begin();
                    handle.get_stacking_order(token);
                }
                false
            }
        }
    }

    fn announce(&mut self, internal_id: u32, uuid: Option<String>) -> bool {
        let schedule = self.pending.is_empty();
        self.pending.push_back(PendingWindow { internal_id, uuid });
        schedule
    }

    /// Request the window objects of every announcement seen so far
    pub fn materialize_pending(&mut self) {
        while let Some(PendingWindow { internal_id, uuid }) = self.pending.pop_front() {
            let by_uuid = uuid.is_some();
            let uuid = uuid.map_or_else(|| WindowId::legacy(internal_id), WindowId::from);
            if self.window(&uuid).is_some() {
                debug!("window {uuid} announced twice");
                continue;
            }
            let Some(handle) = self.handle.as_ref() else {
                debug!("dropping announcement of {uuid}, management released");
                continue;
            };
            let window = if by_uuid {
                handle.get_window_by_uuid(&uuid)
            } else {
                handle.get_window(internal_id, &uuid)
            };
            debug!("materialized window {uuid}");
            self.register_window(window, internal_id, uuid);
        }
    }

    /// Add a record for `handle`. A second registration of the same uuid keeps
    /// the existing record and releases the new handle.
    pub fn register_window(
        &mut self,
        handle: M::Window,
        internal_id: u32,
        uuid: WindowId,
    ) -> &LingmoWindow<M::Window> {
        let index = match self.position(&uuid) {
            Some(index) => {
                let mut surplus = LingmoWindow::new(handle, internal_id, uuid);
                surplus.release();
                index
            }
            None => {
                self.windows
                    .push(LingmoWindow::new(handle, internal_id, uuid));
                self.windows.len() - 1
            }
        };
        &self.windows[index]
    }

    /// Drop the record, clearing the active window and every child's parent.
    /// The handle is released, so the returned record no longer accepts requests.
    pub fn unregister_window(&mut self, uuid: &WindowId) -> Option<LingmoWindow<M::Window>> {
        let index = self.position(uuid)?;
        let mut window = self.windows.remove(index);
        window.release();
        if self.active_window.as_ref() == Some(uuid) {
            self.active_window = None;
            self.events
                .push(WindowManagementEvent::ActiveWindowChanged(None));
        }
        for child in self.windows.iter_mut() {
            if child.parent() == Some(uuid) && child.set_parent(None) {
                self.events.push(WindowManagementEvent::WindowChanged {
                    window: child.uuid().clone(),
                    change: WindowChange::ParentWindow,
                });
            }
        }
        Some(window)
    }

    pub fn handle_window_event(&mut self, uuid: &WindowId, event: WindowEvent<M::Window>)
    where
        M::Window: std::fmt::Debug,
    {
        trace!("window {uuid} event: {event:?}");
        let Some(index) = self.position(uuid) else {
            debug!("event for unknown window {uuid}");
            return;
        };
        match event {
            WindowEvent::Unmapped => {
                self.windows[index].mark_unmapped();
                self.events
                    .push(WindowManagementEvent::WindowUnmapped(uuid.clone()));
                self.unregister_window(uuid);
            }
            WindowEvent::InitialState => {
                if !self.windows[index].is_unmapped() {
                    self.events
                        .push(WindowManagementEvent::WindowCreated(uuid.clone()));
                }
            }
            WindowEvent::ParentWindow(parent) => {
                let parent = parent.and_then(|parent| {
                    self.windows
                        .iter()
                        .find(|window| window.handle_ref() == Some(&parent))
                        .map(|window| window.uuid().clone())
                });
                if self.windows[index].set_parent(parent) {
                    self.notify(uuid, WindowChange::ParentWindow);
                }
            }
            WindowEvent::IconChanged => self.fetch_icon(index),
            event => {
                let changes = self.windows[index].apply(event);
                let active_changed = changes.contains(&WindowChange::Active);
                for change in changes {
                    self.notify(uuid, change);
                }
                if active_changed {
                    self.reconcile_active(index);
                }
            }
        }
    }

    fn fetch_icon(&mut self, index: usize) {
        let window = &mut self.windows[index];
        let generation = window.next_icon_generation();
        let uuid = window.uuid().clone();
        let fetched = match window.handle_ref() {
            Some(handle) if handle.protocol_version() >= ICON_SINCE => {
                self.icons.fetch(handle, uuid.clone(), generation)
            }
            _ => Err(std::io::Error::other("get_icon not supported")),
        };
        if let Err(err) = fetched {
            warn!("cannot fetch the icon of {uuid}: {err}");
            let icon = self.icons.fallback_icon();
            self.set_icon(index, icon);
        }
    }

    /// Apply an icon read by the worker thread, unless a newer fetch superseded it
    pub fn apply_icon_reply(&mut self, reply: IconReply) {
        let Some(index) = self.position(&reply.window) else {
            debug!("icon for vanished window {}", reply.window);
            return;
        };
        if self.windows[index].icon_generation() != reply.generation {
            debug!(
                "discarding stale icon generation {} of {}",
                reply.generation, reply.window
            );
            return;
        }
        let icon = match reply.icon {
            WindowIcon::None => self.icons.fallback_icon(),
            icon => icon,
        };
        self.set_icon(index, icon);
    }

    fn set_icon(&mut self, index: usize, icon: WindowIcon) {
        if self.windows[index].set_icon(icon) {
            let uuid = self.windows[index].uuid().clone();
            self.notify(&uuid, WindowChange::Icon);
        }
    }

    fn reconcile_active(&mut self, index: usize) {
        let window = &self.windows[index];
        if window.is_unmapped() {
            return;
        }
        let uuid = window.uuid();
        if window.is_active() {
            if self.active_window.as_ref() == Some(uuid) {
                return;
            }
            self.active_window = Some(uuid.clone());
            self.events
                .push(WindowManagementEvent::ActiveWindowChanged(Some(uuid.clone())));
        } else if self.active_window.as_ref() == Some(uuid) {
            self.active_window = None;
            self.events
                .push(WindowManagementEvent::ActiveWindowChanged(None));
        }
    }

    pub fn handle_stacking_order_event(
        &mut self,
        token: StackingOrderToken,
        event: StackingOrderEvent,
    ) {
        match event {
            StackingOrderEvent::Window(uuid) => {
                if !self.stacking_order.append(token, WindowId::from(uuid)) {
                    trace!("stacking order entry of a superseded batch");
                }
            }
            StackingOrderEvent::Done => {
                if self.stacking_order.finish(token) {
                    self.events.push(WindowManagementEvent::StackingOrderChanged);
                }
            }
        }
    }

    /// The compositor withdrew the global
    pub fn global_removed(&mut self) {
        self.events.push(WindowManagementEvent::Removed);
    }

    /// Release every window, then the management handle
    pub fn release(&mut self) {
        if self.handle.is_none() {
            return;
        }
        self.events
            .push(WindowManagementEvent::InterfaceAboutToBeReleased);
        for window in self.windows.iter_mut() {
            window.release();
        }
        self.teardown();
    }

    /// Like [`Self::release`] but without sending destructors, for a dead connection
    pub fn destroy(&mut self) {
        if self.handle.is_none() {
            return;
        }
        self.events
            .push(WindowManagementEvent::InterfaceAboutToBeDestroyed);
        for window in self.windows.iter_mut() {
            window.destroy();
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        self.windows.clear();
        self.pending.clear();
        self.stacking_order.clear();
        if self.active_window.take().is_some() {
            self.events
                .push(WindowManagementEvent::ActiveWindowChanged(None));
        }
        self.handle = None;
    }

    fn position(&self, uuid: &WindowId) -> Option<usize> {
        self.windows.iter().position(|window| window.uuid() == uuid)
    }

    fn notify(&mut self, uuid: &WindowId, change: WindowChange) {
        self.events.push(WindowManagementEvent::WindowChanged {
            window: uuid.clone(),
            change,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockManagement, Request, qicon_pixmaps, qicon_themed, tiny_png};

    use calloop::EventLoop;
    use calloop::channel::{self, Channel};

    fn management(version: u32) -> WindowManagement<MockManagement> {
        WindowManagement::new(MockManagement::new(version), IconFetcher::new(None, "wayland"))
    }

    fn requests(wm: &WindowManagement<MockManagement>) -> Vec<Request> {
        wm.handle_ref().unwrap().log.take()
    }

    fn map(wm: &mut WindowManagement<MockManagement>, uuid: &str) -> WindowId {
        let uuid = WindowId::from(uuid);
        wm.handle_event(ManagementEvent::WindowWithUuid {
            internal_id: 0,
            uuid: uuid.to_string(),
        });
        wm.materialize_pending();
        wm.handle_window_event(&uuid, WindowEvent::InitialState);
        uuid
    }

    fn set_state(wm: &mut WindowManagement<MockManagement>, uuid: &WindowId, state: WindowState) {
        wm.handle_window_event(uuid, WindowEvent::StateChanged(state.bits()));
    }

    fn active_changes(events: &[WindowManagementEvent]) -> Vec<Option<WindowId>> {
        events
            .iter()
            .filter_map(|event| match event {
                WindowManagementEvent::ActiveWindowChanged(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn announcements_are_deferred() {
        let mut wm = management(16);
        assert!(wm.handle_event(ManagementEvent::WindowWithUuid {
            internal_id: 1,
            uuid: "a".into()
        }));
        assert!(!wm.handle_event(ManagementEvent::Window { internal_id: 7 }));
        assert!(wm.windows().is_empty());
        assert!(requests(&wm).is_empty());

        wm.materialize_pending();
        assert_eq!(
            requests(&wm),
            vec![
                Request::GetWindowByUuid("a".into()),
                Request::GetWindow {
                    internal_id: 7,
                    uuid: WindowId::legacy(7)
                },
            ]
        );
        let ids: Vec<_> = wm.windows().iter().map(|w| w.uuid().as_str()).collect();
        assert_eq!(ids, ["a", "legacy-7"]);
        assert_eq!(wm.pending_windows(), 0);
        // nothing is announced to consumers before the initial state
        assert!(wm.take_events().is_empty());
    }

    #[test]
    fn initial_state_creates() {
        let mut wm = management(16);
        let a = map(&mut wm, "a");
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::WindowCreated(a)]
        );
    }

    #[test]
    fn register_is_idempotent() {
        let mut wm = management(16);
        let first = wm.handle_ref().unwrap().foreign_window(50);
        let second = wm.handle_ref().unwrap().foreign_window(51);
        let uuid = WindowId::from("a");
        let id = wm.register_window(first, 0, uuid.clone()).handle_ref().unwrap().id;
        let again = wm.register_window(second, 0, uuid).handle_ref().unwrap().id;
        assert_eq!(id, again);
        assert_eq!(wm.windows().len(), 1);
        assert_eq!(requests(&wm), vec![Request::DestroyWindow(51)]);
    }

    #[test]
    fn duplicate_announcement_is_not_requested_twice() {
        let mut wm = management(16);
        map(&mut wm, "a");
        requests(&wm);
        wm.handle_event(ManagementEvent::WindowWithUuid {
            internal_id: 0,
            uuid: "a".into(),
        });
        wm.materialize_pending();
        assert!(requests(&wm).is_empty());
        assert_eq!(wm.windows().len(), 1);
    }

    #[test]
    fn activation_moves_without_deactivation() {
        let mut wm = management(16);
        let a = map(&mut wm, "a");
        let b = map(&mut wm, "b");
        set_state(&mut wm, &a, WindowState::ACTIVE);
        assert_eq!(active_changes(&wm.take_events()), vec![Some(a.clone())]);

        set_state(&mut wm, &b, WindowState::ACTIVE);
        assert_eq!(active_changes(&wm.take_events()), vec![Some(b.clone())]);
        assert_eq!(wm.active_window_id(), Some(&b));

        // a's late deactivation does not touch b
        set_state(&mut wm, &a, WindowState::empty());
        assert!(active_changes(&wm.take_events()).is_empty());
        assert_eq!(wm.active_window().unwrap().uuid(), &b);

        set_state(&mut wm, &b, WindowState::empty());
        assert_eq!(active_changes(&wm.take_events()), vec![None]);
    }

    #[test]
    fn unmapping_the_active_window_clears_it() {
        let mut wm = management(16);
        let a = map(&mut wm, "a");
        let b = map(&mut wm, "b");
        set_state(&mut wm, &a, WindowState::ACTIVE);
        wm.take_events();

        wm.handle_window_event(&b, WindowEvent::Unmapped);
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::WindowUnmapped(b.clone())]
        );
        assert_eq!(wm.active_window_id(), Some(&a));

        wm.handle_window_event(&a, WindowEvent::Unmapped);
        assert_eq!(
            wm.take_events(),
            vec![
                WindowManagementEvent::WindowUnmapped(a.clone()),
                WindowManagementEvent::ActiveWindowChanged(None),
            ]
        );
        assert!(wm.windows().is_empty());
        assert_eq!(
            requests(&wm)
                .into_iter()
                .filter(|r| matches!(r, Request::DestroyWindow(_)))
                .count(),
            2
        );
    }

    #[test]
    fn parent_cleared_when_parent_unmaps() {
        let mut wm = management(16);
        let parent = map(&mut wm, "parent");
        let child = map(&mut wm, "child");
        let parent_handle = wm.window(&parent).unwrap().handle_ref().unwrap().clone();
        wm.take_events();

        wm.handle_window_event(&child, WindowEvent::ParentWindow(Some(parent_handle.clone())));
        assert_eq!(wm.window(&child).unwrap().parent(), Some(&parent));
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::WindowChanged {
                window: child.clone(),
                change: WindowChange::ParentWindow
            }]
        );
        wm.handle_window_event(&child, WindowEvent::ParentWindow(Some(parent_handle)));
        assert!(wm.take_events().is_empty());

        wm.handle_window_event(&parent, WindowEvent::Unmapped);
        assert_eq!(wm.window(&child).unwrap().parent(), None);
        assert_eq!(
            wm.take_events(),
            vec![
                WindowManagementEvent::WindowUnmapped(parent),
                WindowManagementEvent::WindowChanged {
                    window: child,
                    change: WindowChange::ParentWindow
                },
            ]
        );
    }

    #[test]
    fn unknown_parent_is_no_parent() {
        let mut wm = management(16);
        let child = map(&mut wm, "child");
        wm.take_events();
        let stranger = wm.handle_ref().unwrap().foreign_window(99);
        wm.handle_window_event(&child, WindowEvent::ParentWindow(Some(stranger)));
        assert_eq!(wm.window(&child).unwrap().parent(), None);
        assert!(wm.take_events().is_empty());
    }

    #[test]
    fn properties_notify_per_field() {
        let mut wm = management(16);
        let a = map(&mut wm, "a");
        wm.take_events();
        set_state(&mut wm, &a, WindowState::MINIMIZED | WindowState::CLOSEABLE);
        set_state(&mut wm, &a, WindowState::MINIMIZED | WindowState::CLOSEABLE);
        wm.handle_window_event(&a, WindowEvent::TitleChanged("Dolphin".into()));
        let changes: Vec<_> = wm
            .take_events()
            .into_iter()
            .map(|event| match event {
                WindowManagementEvent::WindowChanged { change, .. } => change,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            changes,
            vec![
                WindowChange::Minimized,
                WindowChange::Closeable,
                WindowChange::Title
            ]
        );
    }

    #[test]
    fn show_desktop_follows_the_compositor() {
        let mut wm = management(16);
        wm.show_desktop().unwrap();
        assert_eq!(requests(&wm), vec![Request::ShowDesktop(true)]);
        assert!(!wm.is_showing_desktop());

        wm.handle_event(ManagementEvent::ShowDesktopChanged(1));
        wm.handle_event(ManagementEvent::ShowDesktopChanged(1));
        wm.handle_event(ManagementEvent::ShowDesktopChanged(5));
        assert!(wm.is_showing_desktop());
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::ShowingDesktopChanged(true)]
        );
        wm.hide_desktop().unwrap();
        assert_eq!(requests(&wm), vec![Request::ShowDesktop(false)]);
    }

    #[test]
    fn stacking_order_batches() {
        let mut wm = management(17);
        let sent = requests(&wm);
        let [Request::GetStackingOrder(first)] = sent.as_slice() else {
            panic!("no initial stacking order request");
        };
        let first = *first;
        for uuid in ["x", "y"] {
            wm.handle_stacking_order_event(first, StackingOrderEvent::Window(uuid.into()));
        }
        assert!(wm.stacking_order().is_empty());
        wm.handle_stacking_order_event(first, StackingOrderEvent::Done);
        assert_eq!(wm.stacking_order(), [WindowId::from("x"), WindowId::from("y")]);
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::StackingOrderChanged]
        );

        wm.handle_event(ManagementEvent::StackingOrderChanged2);
        let sent = requests(&wm);
        let [Request::GetStackingOrder(second)] = sent.as_slice() else {
            panic!("no stacking order request");
        };
        let second = *second;
        for uuid in ["y", "x"] {
            wm.handle_stacking_order_event(second, StackingOrderEvent::Window(uuid.into()));
        }
        wm.handle_stacking_order_event(second, StackingOrderEvent::Done);
        assert_eq!(wm.stacking_order(), [WindowId::from("y"), WindowId::from("x")]);
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::StackingOrderChanged]
        );
    }

    #[test]
    fn legacy_stacking_order() {
        let mut wm = management(12);
        assert!(requests(&wm).is_empty());
        wm.handle_event(ManagementEvent::StackingOrderChanged(vec![1, 2]));
        assert!(wm.take_events().is_empty());
        wm.handle_event(ManagementEvent::StackingOrderUuidChanged("a;b".into()));
        wm.handle_event(ManagementEvent::StackingOrderUuidChanged("a;b".into()));
        assert_eq!(wm.stacking_order(), [WindowId::from("a"), WindowId::from("b")]);
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::StackingOrderChanged]
        );
    }

    #[test]
    fn icon_without_channel_falls_back() {
        let mut wm = management(16);
        let a = map(&mut wm, "a");
        wm.take_events();
        wm.handle_window_event(&a, WindowEvent::IconChanged);
        assert_eq!(wm.window(&a).unwrap().icon(), &WindowIcon::Themed("wayland".into()));
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::WindowChanged {
                window: a,
                change: WindowChange::Icon
            }]
        );
    }

    #[test]
    fn stale_icon_reply_is_discarded() {
        let mut wm = management(16);
        let a = map(&mut wm, "a");
        wm.handle_window_event(&a, WindowEvent::IconChanged);
        wm.handle_window_event(&a, WindowEvent::IconChanged);
        wm.take_events();
        let image = crate::icon::decode_icon(&tiny_png(8, 8)).unwrap();
        wm.apply_icon_reply(IconReply {
            window: a.clone(),
            generation: 1,
            icon: WindowIcon::Image(image.clone()),
        });
        assert!(wm.take_events().is_empty());
        wm.apply_icon_reply(IconReply {
            window: a.clone(),
            generation: 2,
            icon: WindowIcon::Image(image.clone()),
        });
        assert_eq!(wm.window(&a).unwrap().icon(), &WindowIcon::Image(image));
    }

    fn icon_loop(
        payload: Option<Vec<u8>>,
    ) -> (
        WindowManagement<MockManagement>,
        WindowId,
        EventLoop<'static, Option<IconReply>>,
        Channel<IconReply>,
    ) {
        let (sender, receiver) = channel::channel();
        let handle = MockManagement::new(16);
        handle.set_icon_payload(payload);
        let mut wm = WindowManagement::new(handle, IconFetcher::new(Some(sender), "wayland"));
        let a = map(&mut wm, "a");
        wm.take_events();
        let event_loop = EventLoop::try_new().unwrap();
        (wm, a, event_loop, receiver)
    }

    fn receive(
        event_loop: &mut EventLoop<'static, Option<IconReply>>,
        receiver: Channel<IconReply>,
    ) -> IconReply {
        event_loop
            .handle()
            .insert_source(receiver, |event, _, reply| {
                if let channel::Event::Msg(msg) = event {
                    *reply = Some(msg);
                }
            })
            .unwrap();
        let mut reply = None;
        for _ in 0..50 {
            event_loop
                .dispatch(Some(std::time::Duration::from_millis(100)), &mut reply)
                .unwrap();
            if reply.is_some() {
                break;
            }
        }
        reply.expect("icon reply")
    }

    #[test]
    fn icon_arrives_through_the_pipe() {
        let data = tiny_png(24, 24);
        let (mut wm, a, mut event_loop, receiver) = icon_loop(Some(data.clone()));
        wm.handle_window_event(&a, WindowEvent::IconChanged);
        let reply = receive(&mut event_loop, receiver);
        assert_eq!(reply.generation, 1);
        wm.apply_icon_reply(reply);
        let WindowIcon::Image(image) = wm.window(&a).unwrap().icon() else {
            panic!("expected an image icon");
        };
        assert_eq!(image.data, data);
        assert_eq!(image.width, Some(24));
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::WindowChanged {
                window: a,
                change: WindowChange::Icon
            }]
        );
    }

    #[test]
    fn serialized_qicon_arrives_through_the_pipe() {
        let png = tiny_png(32, 32);
        let stream = qicon_pixmaps(&[Some(tiny_png(16, 16)), Some(png.clone())]);
        let (mut wm, a, mut event_loop, receiver) = icon_loop(Some(stream));
        wm.handle_window_event(&a, WindowEvent::IconChanged);
        let reply = receive(&mut event_loop, receiver);
        wm.apply_icon_reply(reply);
        let WindowIcon::Image(image) = wm.window(&a).unwrap().icon() else {
            panic!("expected an image icon");
        };
        assert_eq!(image.data, png);
        assert_eq!(image.width, Some(32));
    }

    #[test]
    fn themed_qicon_arrives_through_the_pipe() {
        let stream = qicon_themed("KIconEngine", "org.lingmo.terminal");
        let (mut wm, a, mut event_loop, receiver) = icon_loop(Some(stream));
        wm.handle_window_event(&a, WindowEvent::IconChanged);
        let reply = receive(&mut event_loop, receiver);
        wm.apply_icon_reply(reply);
        assert_eq!(
            wm.window(&a).unwrap().icon(),
            &WindowIcon::Themed("org.lingmo.terminal".into())
        );
    }

    #[test]
    fn empty_pipe_uses_fallback() {
        let (mut wm, a, mut event_loop, receiver) = icon_loop(None);
        wm.handle_window_event(&a, WindowEvent::IconChanged);
        let reply = receive(&mut event_loop, receiver);
        assert!(reply.icon.is_none());
        wm.apply_icon_reply(reply);
        assert_eq!(wm.window(&a).unwrap().icon(), &WindowIcon::Themed("wayland".into()));
    }

    #[test]
    fn release_tears_down_dependents_first() {
        let mut wm = management(16);
        let a = map(&mut wm, "a");
        set_state(&mut wm, &a, WindowState::ACTIVE);
        wm.take_events();
        let log = wm.handle_ref().unwrap().log.clone();
        log.take();

        wm.release();
        assert!(!wm.is_valid());
        assert!(wm.windows().is_empty());
        assert_eq!(log.take(), vec![Request::DestroyWindow(1)]);
        assert_eq!(
            wm.take_events(),
            vec![
                WindowManagementEvent::InterfaceAboutToBeReleased,
                WindowManagementEvent::ActiveWindowChanged(None),
            ]
        );
        wm.release();
        assert!(wm.take_events().is_empty());
    }

    #[test]
    fn unregister_releases_the_handle() {
        let mut wm = management(16);
        let a = map(&mut wm, "a");
        set_state(&mut wm, &a, WindowState::ACTIVE);
        wm.take_events();
        requests(&wm);

        let window = wm.unregister_window(&a).unwrap();
        assert!(!window.is_valid());
        assert!(window.handle_ref().is_none());
        assert_eq!(requests(&wm), vec![Request::DestroyWindow(1)]);
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::ActiveWindowChanged(None)]
        );
        assert!(wm.unregister_window(&a).is_none());
    }

    #[test]
    fn destroy_sends_nothing() {
        let mut wm = management(16);
        map(&mut wm, "a");
        let log = wm.handle_ref().unwrap().log.clone();
        log.take();
        wm.take_events();
        wm.destroy();
        assert!(log.take().is_empty());
        assert_eq!(
            wm.take_events(),
            vec![WindowManagementEvent::InterfaceAboutToBeDestroyed]
        );
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "released"))]
    fn show_desktop_after_release() {
        let mut wm = management(16);
        wm.release();
        assert!(matches!(
            wm.show_desktop(),
            Err(LingmoEventError::InvalidHandle(_))
        ));
    }
}
