use lingmoshellev::virtual_desktop::VirtualDesktopEvent;
use lingmoshellev::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), LingmoEventError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let ev = LingmoClient::new()
        .with_shell(false)
        .with_fallback_icon("wayland")
        .build()?;

    let mut model: Option<WindowModel> = None;

    ev.running(move |event, state| {
        let Some(wm) = state.window_management() else {
            warn!("compositor offers no window management");
            return ReturnData::RequestExit;
        };
        let model = model.get_or_insert_with(|| WindowModel::new(wm));

        match event {
            LingmoEvent::WindowManagement(event) => {
                if let Some(change) = model.handle_event(&event) {
                    info!("model: {change:?}, {} rows", model.row_count());
                }
                match event {
                    WindowManagementEvent::WindowCreated(id) => {
                        if let Some(window) = wm.window(&id) {
                            info!(
                                "new window {id}: {} ({}) pid {}",
                                window.title(),
                                window.app_id(),
                                window.pid()
                            );
                        }
                    }
                    WindowManagementEvent::ActiveWindowChanged(Some(id)) => {
                        let title = wm.window(&id).map(LingmoWindow::title).unwrap_or_default();
                        info!("active: {title}");
                    }
                    WindowManagementEvent::StackingOrderChanged => {
                        info!("stacking order: {:?}", wm.stacking_order());
                    }
                    WindowManagementEvent::Removed => return ReturnData::RequestExit,
                    _ => {}
                }
            }
            LingmoEvent::VirtualDesktop(VirtualDesktopEvent::Done) => {
                if let Some(vd) = state.virtual_desktops() {
                    let names: Vec<_> = vd.desktops().iter().map(|d| d.name()).collect();
                    info!("{} desktop rows: {names:?}", vd.rows());
                }
            }
            LingmoEvent::Activation(event) => info!("launch feedback: {event:?}"),
            LingmoEvent::GlobalRemoved(global) => info!("{global:?} went away"),
            _ => {}
        }
        ReturnData::None
    })
}
