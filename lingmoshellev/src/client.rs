use log::{debug, info, trace, warn};
use wayland_client::{
    Connection, Dispatch, Proxy, QueueHandle, delegate_noop, event_created_child,
    globals::{GlobalList, GlobalListContents, registry_queue_init},
    protocol::{wl_registry, wl_surface::WlSurface},
};

use calloop::{EventLoop, LoopHandle, channel};
use calloop_wayland_source::WaylandSource;

use crate::activation::{
    ActivationFeedback, ActivationHandle, ActivationWireEvent,
    org_kde_lingmo_activation::{self, OrgKdeLingmoActivation},
    org_kde_lingmo_activation_feedback::{self, OrgKdeLingmoActivationFeedback},
};
use crate::icon::{DEFAULT_FALLBACK_ICON, IconFetcher, IconReply};
use crate::shell::{
    LingmoShell, ShellHandle, ShellSurfaceEvent,
    org_kde_lingmo_shell::OrgKdeLingmoShell,
    org_kde_lingmo_surface::{self, OrgKdeLingmoSurface},
};
use crate::stacking_order::{StackingOrderEvent, StackingOrderToken};
use crate::state::Rect;
use crate::virtual_desktop::{
    DesktopEvent, ManagementEvent as DesktopManagementEvent, VirtualDesktopManagement,
    VirtualDesktopManagementHandle,
    org_kde_lingmo_virtual_desktop::{self, OrgKdeLingmoVirtualDesktop},
    org_kde_lingmo_virtual_desktop_management::{self, OrgKdeLingmoVirtualDesktopManagement},
};
use crate::window::{WindowEvent, WindowId};
use crate::window_management::{
    ManagementEvent, ManagementHandle, WindowManagement,
    org_kde_lingmo_stacking_order::{self, OrgKdeLingmoStackingOrder},
    org_kde_lingmo_window::{self, OrgKdeLingmoWindow},
    org_kde_lingmo_window_management::{self, OrgKdeLingmoWindowManagement},
};
use crate::{LingmoEvent, LingmoEventError, LingmoGlobal, ReturnData};

const WINDOW_MANAGEMENT_VERSIONS: std::ops::RangeInclusive<u32> = 1..=17;
const VIRTUAL_DESKTOP_VERSIONS: std::ops::RangeInclusive<u32> = 1..=2;
const SHELL_VERSIONS: std::ops::RangeInclusive<u32> = 1..=8;
const ACTIVATION_FEEDBACK_VERSIONS: std::ops::RangeInclusive<u32> = 1..=1;

/// User data of an `org_kde_lingmo_window`
#[derive(Debug, Clone)]
pub struct WindowData {
    uuid: WindowId,
}

/// User data of an `org_kde_lingmo_stacking_order`
#[derive(Debug, Clone, Copy)]
pub struct StackingOrderData {
    token: StackingOrderToken,
}

/// User data of an `org_kde_lingmo_virtual_desktop`
#[derive(Debug, Clone)]
pub struct DesktopData {
    id: String,
}

/// The bound `org_kde_lingmo_window_management` global
#[derive(Debug)]
pub struct BoundWindowManagement {
    proxy: OrgKdeLingmoWindowManagement,
    qh: QueueHandle<LingmoState>,
}

impl BoundWindowManagement {
    pub fn proxy(&self) -> &OrgKdeLingmoWindowManagement {
        &self.proxy
    }
}

impl ManagementHandle for BoundWindowManagement {
    type Window = OrgKdeLingmoWindow;

    fn protocol_version(&self) -> u32 {
        self.proxy.version()
    }
    fn show_desktop(&self, show: bool) {
        self.proxy.show_desktop(show as u32);
    }
    fn get_window(&self, internal_id: u32, uuid: &WindowId) -> OrgKdeLingmoWindow {
        self.proxy.get_window(
            internal_id,
            &self.qh,
            WindowData { uuid: uuid.clone() },
        )
    }
    fn get_window_by_uuid(&self, uuid: &WindowId) -> OrgKdeLingmoWindow {
        self.proxy.get_window_by_uuid(
            uuid.as_str().to_owned(),
            &self.qh,
            WindowData { uuid: uuid.clone() },
        )
    }
    fn get_stacking_order(&self, token: StackingOrderToken) {
        self.proxy
            .get_stacking_order(&self.qh, StackingOrderData { token });
    }
}

/// The bound `org_kde_lingmo_virtual_desktop_management` global
#[derive(Debug)]
pub struct BoundVirtualDesktopManagement {
    proxy: OrgKdeLingmoVirtualDesktopManagement,
    qh: QueueHandle<LingmoState>,
}

impl VirtualDesktopManagementHandle for BoundVirtualDesktopManagement {
    type Desktop = OrgKdeLingmoVirtualDesktop;

    fn protocol_version(&self) -> u32 {
        self.proxy.version()
    }
    fn get_virtual_desktop(&self, id: &str) -> OrgKdeLingmoVirtualDesktop {
        self.proxy.get_virtual_desktop(
            id.to_owned(),
            &self.qh,
            DesktopData { id: id.to_owned() },
        )
    }
    fn request_create_virtual_desktop(&self, name: &str, position: u32) {
        self.proxy
            .request_create_virtual_desktop(name.to_owned(), position);
    }
    fn request_remove_virtual_desktop(&self, id: &str) {
        self.proxy.request_remove_virtual_desktop(id.to_owned());
    }
}

/// The bound `org_kde_lingmo_shell` global
#[derive(Debug)]
pub struct BoundShell {
    proxy: OrgKdeLingmoShell,
    qh: QueueHandle<LingmoState>,
}

impl ShellHandle for BoundShell {
    type Surface = OrgKdeLingmoSurface;
    type WlSurface = WlSurface;

    fn get_surface(&self, surface: &WlSurface) -> OrgKdeLingmoSurface {
        self.proxy.get_surface(surface, &self.qh, ())
    }
}

/// Build a [`LingmoEventLoop`], choosing which globals to bind
///
/// ```no_run
/// use lingmoshellev::LingmoClient;
///
/// let ev = LingmoClient::new()
///     .with_shell(false)
///     .with_fallback_icon("application-x-executable")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct LingmoClient {
    connection: Option<Connection>,
    window_management: bool,
    virtual_desktops: bool,
    shell: bool,
    activation_feedback: bool,
    fallback_icon: String,
}

impl Default for LingmoClient {
    fn default() -> Self {
        Self {
            connection: None,
            window_management: true,
            virtual_desktops: true,
            shell: true,
            activation_feedback: true,
            fallback_icon: DEFAULT_FALLBACK_ICON.to_owned(),
        }
    }
}

impl LingmoClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// use an existing connection instead of `WAYLAND_DISPLAY`
    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn with_window_management(mut self, enabled: bool) -> Self {
        self.window_management = enabled;
        self
    }

    pub fn with_virtual_desktops(mut self, enabled: bool) -> Self {
        self.virtual_desktops = enabled;
        self
    }

    pub fn with_shell(mut self, enabled: bool) -> Self {
        self.shell = enabled;
        self
    }

    pub fn with_activation_feedback(mut self, enabled: bool) -> Self {
        self.activation_feedback = enabled;
        self
    }

    /// themed icon used when a window's icon cannot be fetched
    pub fn with_fallback_icon(mut self, name: impl Into<String>) -> Self {
        self.fallback_icon = name.into();
        self
    }

    /// Connect, bind the enabled globals and set up the event loop.
    /// A global the compositor does not offer only disables its wrapper.
    pub fn build(self) -> Result<LingmoEventLoop, LingmoEventError> {
        let connection = match self.connection {
            Some(connection) => connection,
            None => Connection::connect_to_env()?,
        };
        let (globals, event_queue) = registry_queue_init::<LingmoState>(&connection)?;
        let qh = event_queue.handle();

        let event_loop: EventLoop<'static, LingmoState> = EventLoop::try_new()?;
        let loop_handle = event_loop.handle();

        let (icon_sender, icon_channel) = channel::channel::<IconReply>();
        loop_handle
            .insert_source(icon_channel, |event, _, state| {
                let channel::Event::Msg(reply) = event else {
                    return;
                };
                if let Some(wm) = state.window_management.as_mut() {
                    wm.apply_icon_reply(reply);
                }
            })
            .map_err(|e| e.error)?;

        WaylandSource::new(connection.clone(), event_queue)
            .insert(loop_handle.clone())
            .map_err(|e| e.error)?;

        let mut state = LingmoState {
            connection,
            qh: qh.clone(),
            loop_handle,
            globals: Vec::new(),
            window_management: None,
            virtual_desktops: None,
            shell: None,
            activation_feedback: None,
            messages: Vec::new(),
        };

        if self.window_management {
            if let Some(proxy) = bind_optional::<OrgKdeLingmoWindowManagement>(
                &globals,
                &qh,
                WINDOW_MANAGEMENT_VERSIONS,
            ) {
                state.remember_global(&globals, &proxy, LingmoGlobal::WindowManagement);
                let icons = IconFetcher::new(Some(icon_sender), self.fallback_icon);
                state.window_management = Some(WindowManagement::new(
                    BoundWindowManagement {
                        proxy,
                        qh: qh.clone(),
                    },
                    icons,
                ));
            }
        }
        if self.virtual_desktops {
            if let Some(proxy) = bind_optional::<OrgKdeLingmoVirtualDesktopManagement>(
                &globals,
                &qh,
                VIRTUAL_DESKTOP_VERSIONS,
            ) {
                state.remember_global(&globals, &proxy, LingmoGlobal::VirtualDesktopManagement);
                state.virtual_desktops = Some(VirtualDesktopManagement::new(
                    BoundVirtualDesktopManagement {
                        proxy,
                        qh: qh.clone(),
                    },
                ));
            }
        }
        if self.shell {
            if let Some(proxy) = bind_optional::<OrgKdeLingmoShell>(&globals, &qh, SHELL_VERSIONS)
            {
                state.remember_global(&globals, &proxy, LingmoGlobal::Shell);
                state.shell = Some(LingmoShell::new(BoundShell {
                    proxy,
                    qh: qh.clone(),
                }));
            }
        }
        if self.activation_feedback {
            if let Some(proxy) = bind_optional::<OrgKdeLingmoActivationFeedback>(
                &globals,
                &qh,
                ACTIVATION_FEEDBACK_VERSIONS,
            ) {
                state.remember_global(&globals, &proxy, LingmoGlobal::ActivationFeedback);
                state.activation_feedback = Some(ActivationFeedback::new(proxy));
            }
        }

        Ok(LingmoEventLoop { event_loop, state })
    }
}

fn bind_optional<I>(
    globals: &GlobalList,
    qh: &QueueHandle<LingmoState>,
    versions: std::ops::RangeInclusive<u32>,
) -> Option<I>
where
    I: Proxy + 'static,
    LingmoState: Dispatch<I, ()>,
{
    match globals.bind::<I, _, _>(qh, versions, ()) {
        Ok(proxy) => {
            info!("bound {} version {}", I::interface().name, proxy.version());
            Some(proxy)
        }
        Err(err) => {
            warn!("{} unavailable: {err}", I::interface().name);
            None
        }
    }
}

/// Everything the event callback can reach
#[derive(Debug)]
pub struct LingmoState {
    connection: Connection,
    qh: QueueHandle<LingmoState>,
    loop_handle: LoopHandle<'static, LingmoState>,
    /// registry names of the bound globals
    globals: Vec<(u32, LingmoGlobal)>,
    window_management: Option<WindowManagement<BoundWindowManagement>>,
    virtual_desktops: Option<VirtualDesktopManagement<BoundVirtualDesktopManagement>>,
    shell: Option<LingmoShell<BoundShell>>,
    activation_feedback: Option<ActivationFeedback<OrgKdeLingmoActivationFeedback>>,
    messages: Vec<LingmoEvent>,
}

impl LingmoState {
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn queue_handle(&self) -> &QueueHandle<LingmoState> {
        &self.qh
    }

    pub fn window_management(&self) -> Option<&WindowManagement<BoundWindowManagement>> {
        self.window_management.as_ref()
    }

    pub fn window_management_mut(
        &mut self,
    ) -> Option<&mut WindowManagement<BoundWindowManagement>> {
        self.window_management.as_mut()
    }

    pub fn virtual_desktops(
        &self,
    ) -> Option<&VirtualDesktopManagement<BoundVirtualDesktopManagement>> {
        self.virtual_desktops.as_ref()
    }

    pub fn virtual_desktops_mut(
        &mut self,
    ) -> Option<&mut VirtualDesktopManagement<BoundVirtualDesktopManagement>> {
        self.virtual_desktops.as_mut()
    }

    pub fn shell(&self) -> Option<&LingmoShell<BoundShell>> {
        self.shell.as_ref()
    }

    pub fn shell_mut(&mut self) -> Option<&mut LingmoShell<BoundShell>> {
        self.shell.as_mut()
    }

    pub fn activation_feedback(
        &self,
    ) -> Option<&ActivationFeedback<OrgKdeLingmoActivationFeedback>> {
        self.activation_feedback.as_ref()
    }

    fn remember_global<I: Proxy>(&mut self, globals: &GlobalList, proxy: &I, kind: LingmoGlobal) {
        let interface = I::interface().name;
        let name = globals.contents().with_list(|list| {
            list.iter()
                .find(|global| global.interface == interface)
                .map(|global| global.name)
        });
        match name {
            Some(name) => self.globals.push((name, kind)),
            None => debug!("no registry name for {}", proxy.id()),
        }
    }

    fn schedule_materialization(&self) {
        self.loop_handle.insert_idle(|state| {
            if let Some(wm) = state.window_management.as_mut() {
                wm.materialize_pending();
            }
        });
    }

    /// Collect whatever the wrappers queued since the last call
    fn take_events(&mut self) -> Vec<LingmoEvent> {
        let mut events = std::mem::take(&mut self.messages);
        if let Some(wm) = self.window_management.as_mut() {
            events.extend(wm.take_events().into_iter().map(LingmoEvent::WindowManagement));
        }
        if let Some(vd) = self.virtual_desktops.as_mut() {
            events.extend(vd.take_events().into_iter().map(LingmoEvent::VirtualDesktop));
        }
        if let Some(shell) = self.shell.as_mut() {
            events.extend(
                shell
                    .take_events()
                    .into_iter()
                    .map(|(surface, event)| LingmoEvent::ShellSurface { surface, event }),
            );
        }
        if let Some(feedback) = self.activation_feedback.as_mut() {
            events.extend(feedback.take_events().into_iter().map(LingmoEvent::Activation));
        }
        events
    }

    /// Release every wrapper, dependents first, and flush the destructors
    pub fn release(&mut self) {
        if let Some(feedback) = self.activation_feedback.as_mut() {
            feedback.release();
        }
        if let Some(vd) = self.virtual_desktops.as_mut() {
            vd.release();
        }
        if let Some(shell) = self.shell.as_mut() {
            shell.release();
        }
        if let Some(wm) = self.window_management.as_mut() {
            wm.release();
        }
        if let Err(err) = self.connection.flush() {
            warn!("flushing released objects failed: {err}");
        }
    }
}

/// The event loop together with its [`LingmoState`]
#[derive(Debug)]
pub struct LingmoEventLoop {
    event_loop: EventLoop<'static, LingmoState>,
    state: LingmoState,
}

impl LingmoEventLoop {
    pub fn state(&self) -> &LingmoState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut LingmoState {
        &mut self.state
    }

    /// Dispatch until the callback returns [`ReturnData::RequestExit`] or the
    /// connection fails. Events queued by requests made inside the callback are
    /// delivered before the loop blocks again.
    pub fn running<F>(mut self, mut event_handler: F) -> Result<(), LingmoEventError>
    where
        F: FnMut(LingmoEvent, &mut LingmoState) -> ReturnData,
    {
        loop {
            let events = self.state.take_events();
            if events.is_empty() {
                self.event_loop.dispatch(None, &mut self.state)?;
                continue;
            }
            for event in events {
                if let ReturnData::RequestExit = event_handler(event, &mut self.state) {
                    self.state.release();
                    return Ok(());
                }
            }
        }
    }
}

// only used for the initial roundtrip and global removal
impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for LingmoState {
    fn event(
        state: &mut Self,
        _proxy: &wl_registry::WlRegistry,
        event: <wl_registry::WlRegistry as Proxy>::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let wl_registry::Event::GlobalRemove { name } = event else {
            return;
        };
        let Some(index) = state.globals.iter().position(|(id, _)| *id == name) else {
            return;
        };
        let (_, kind) = state.globals.remove(index);
        info!("global {kind:?} removed");
        match kind {
            LingmoGlobal::WindowManagement => {
                if let Some(wm) = state.window_management.as_mut() {
                    wm.global_removed();
                }
            }
            LingmoGlobal::VirtualDesktopManagement => {
                if let Some(vd) = state.virtual_desktops.as_mut() {
                    vd.global_removed();
                }
            }
            LingmoGlobal::Shell | LingmoGlobal::ActivationFeedback => {}
        }
        state.messages.push(LingmoEvent::GlobalRemoved(kind));
    }
}

impl Dispatch<OrgKdeLingmoWindowManagement, ()> for LingmoState {
    fn event(
        state: &mut Self,
        _proxy: &OrgKdeLingmoWindowManagement,
        event: <OrgKdeLingmoWindowManagement as Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        use org_kde_lingmo_window_management::Event;
        let event = match event {
            Event::ShowDesktopChanged { state } => ManagementEvent::ShowDesktopChanged(state),
            Event::Window { id } => ManagementEvent::Window { internal_id: id },
            Event::StackingOrderChanged { ids } => ManagementEvent::StackingOrderChanged(
                ids.chunks_exact(4)
                    .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                    .collect(),
            ),
            Event::StackingOrderUuidChanged { uuids } => {
                ManagementEvent::StackingOrderUuidChanged(uuids)
            }
            Event::WindowWithUuid { id, uuid } => ManagementEvent::WindowWithUuid {
                internal_id: id,
                uuid,
            },
            Event::StackingOrderChanged2 => ManagementEvent::StackingOrderChanged2,
            _ => return,
        };
        let Some(wm) = state.window_management.as_mut() else {
            return;
        };
        if wm.handle_event(event) {
            state.schedule_materialization();
        }
    }
}

impl Dispatch<OrgKdeLingmoWindow, WindowData> for LingmoState {
    fn event(
        state: &mut Self,
        _proxy: &OrgKdeLingmoWindow,
        event: <OrgKdeLingmoWindow as Proxy>::Event,
        data: &WindowData,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        use org_kde_lingmo_window::Event;
        let event = match event {
            Event::TitleChanged { title } => WindowEvent::TitleChanged(title),
            Event::AppIdChanged { app_id } => WindowEvent::AppIdChanged(app_id),
            Event::StateChanged { flags } => WindowEvent::StateChanged(flags),
            Event::VirtualDesktopChanged { number } => WindowEvent::VirtualDesktopChanged(number),
            Event::ThemedIconNameChanged { name } => WindowEvent::ThemedIconNameChanged(name),
            Event::Unmapped => WindowEvent::Unmapped,
            Event::InitialState => WindowEvent::InitialState,
            Event::ParentWindow { parent } => WindowEvent::ParentWindow(parent),
            Event::Geometry {
                x,
                y,
                width,
                height,
            } => WindowEvent::Geometry(Rect::new(x, y, width, height)),
            Event::IconChanged => WindowEvent::IconChanged,
            Event::PidChanged { pid } => WindowEvent::PidChanged(pid),
            Event::VirtualDesktopEntered { id } => WindowEvent::VirtualDesktopEntered(id),
            Event::VirtualDesktopLeft { is } => WindowEvent::VirtualDesktopLeft(is),
            Event::ApplicationMenu {
                service_name,
                object_path,
            } => WindowEvent::ApplicationMenu {
                service_name,
                object_path,
            },
            Event::ActivityEntered { id } => WindowEvent::ActivityEntered(id),
            Event::ActivityLeft { id } => WindowEvent::ActivityLeft(id),
            Event::ResourceNameChanged { resource_name } => {
                WindowEvent::ResourceNameChanged(resource_name)
            }
            Event::ClientGeometry {
                x,
                y,
                width,
                height,
            } => WindowEvent::ClientGeometry(Rect::new(x, y, width, height)),
            _ => return,
        };
        if let Some(wm) = state.window_management.as_mut() {
            wm.handle_window_event(&data.uuid, event);
        }
    }
}

impl Dispatch<OrgKdeLingmoStackingOrder, StackingOrderData> for LingmoState {
    fn event(
        state: &mut Self,
        proxy: &OrgKdeLingmoStackingOrder,
        event: <OrgKdeLingmoStackingOrder as Proxy>::Event,
        data: &StackingOrderData,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        use org_kde_lingmo_stacking_order::Event;
        let event = match event {
            Event::Window { uuid } => StackingOrderEvent::Window(uuid),
            Event::Done => {
                proxy.destroy();
                StackingOrderEvent::Done
            }
            _ => return,
        };
        if let Some(wm) = state.window_management.as_mut() {
            wm.handle_stacking_order_event(data.token, event);
        }
    }
}

delegate_noop!(LingmoState: ignore OrgKdeLingmoShell);

impl Dispatch<OrgKdeLingmoSurface, ()> for LingmoState {
    fn event(
        state: &mut Self,
        proxy: &OrgKdeLingmoSurface,
        event: <OrgKdeLingmoSurface as Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        use org_kde_lingmo_surface::Event;
        let event = match event {
            Event::AutoHiddenPanelHidden => ShellSurfaceEvent::AutoHidePanelHidden,
            Event::AutoHiddenPanelShown => ShellSurfaceEvent::AutoHidePanelShown,
            _ => return,
        };
        if let Some(shell) = state.shell.as_mut() {
            shell.handle_surface_event(proxy.id().protocol_id(), event);
        }
    }
}

impl Dispatch<OrgKdeLingmoVirtualDesktopManagement, ()> for LingmoState {
    fn event(
        state: &mut Self,
        _proxy: &OrgKdeLingmoVirtualDesktopManagement,
        event: <OrgKdeLingmoVirtualDesktopManagement as Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        use org_kde_lingmo_virtual_desktop_management::Event;
        let event = match event {
            Event::DesktopCreated {
                desktop_id,
                position,
            } => DesktopManagementEvent::DesktopCreated {
                id: desktop_id,
                position,
            },
            Event::DesktopRemoved { desktop_id } => {
                DesktopManagementEvent::DesktopRemoved(desktop_id)
            }
            Event::Done => DesktopManagementEvent::Done,
            Event::Rows { rows } => DesktopManagementEvent::Rows(rows),
            _ => return,
        };
        if let Some(vd) = state.virtual_desktops.as_mut() {
            vd.handle_event(event);
        }
    }
}

impl Dispatch<OrgKdeLingmoVirtualDesktop, DesktopData> for LingmoState {
    fn event(
        state: &mut Self,
        _proxy: &OrgKdeLingmoVirtualDesktop,
        event: <OrgKdeLingmoVirtualDesktop as Proxy>::Event,
        data: &DesktopData,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        use org_kde_lingmo_virtual_desktop::Event;
        let event = match event {
            Event::DesktopId { desktop_id } => DesktopEvent::DesktopId(desktop_id),
            Event::Name { name } => DesktopEvent::Name(name),
            Event::Activated => DesktopEvent::Activated,
            Event::Deactivated => DesktopEvent::Deactivated,
            Event::Done => DesktopEvent::Done,
            Event::Removed => DesktopEvent::Removed,
            _ => return,
        };
        if let Some(vd) = state.virtual_desktops.as_mut() {
            vd.handle_desktop_event(&data.id, event);
        }
    }
}

impl Dispatch<OrgKdeLingmoActivationFeedback, ()> for LingmoState {
    fn event(
        state: &mut Self,
        _proxy: &OrgKdeLingmoActivationFeedback,
        event: <OrgKdeLingmoActivationFeedback as Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        let org_kde_lingmo_activation_feedback::Event::Activation { id } = event else {
            return;
        };
        match state.activation_feedback.as_mut() {
            Some(feedback) => feedback.handle_activation_created(id),
            None => id.destroy(),
        }
    }

    event_created_child!(LingmoState, OrgKdeLingmoActivationFeedback, [
        org_kde_lingmo_activation_feedback::EVT_ACTIVATION_OPCODE => (OrgKdeLingmoActivation, ())
    ]);
}

impl Dispatch<OrgKdeLingmoActivation, ()> for LingmoState {
    fn event(
        state: &mut Self,
        proxy: &OrgKdeLingmoActivation,
        event: <OrgKdeLingmoActivation as Proxy>::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        use org_kde_lingmo_activation::Event;
        let event = match event {
            Event::AppId { app_id } => ActivationWireEvent::AppId(app_id),
            Event::Finished => ActivationWireEvent::Finished,
            _ => return,
        };
        trace!("activation {} event", proxy.activation_id());
        if let Some(feedback) = state.activation_feedback.as_mut() {
            feedback.handle_activation_event(proxy.activation_id(), event);
        }
    }
}
