use eframe::egui;

use crate::common::ConnectionState;
use crate::ui::state::AppState;

#[derive(Default)]
pub struct SidebarActions {
    pub selected_peer: Option<String>,
    pub refresh: bool,
}

pub fn render(ui: &mut egui::Ui, state: &AppState) -> SidebarActions {
    let mut actions = SidebarActions::default();

    ui.heading(state.identity.as_str());
    let color = match state.connection {
        ConnectionState::Open => egui::Color32::GREEN,
        ConnectionState::Connecting => egui::Color32::YELLOW,
        ConnectionState::Idle | ConnectionState::Closed => egui::Color32::RED,
    };
    ui.horizontal(|ui| {
        ui.colored_label(color, "●");
        ui.label(state.connection.to_string());
    });

    ui.separator();
    ui.horizontal(|ui| {
        ui.label("Users:");
        if ui.small_button("Refresh").clicked() {
            actions.refresh = true;
        }
    });

    if state.peers.is_empty() {
        ui.label(egui::RichText::new("Nobody else is online").weak());
    }

    for peer in &state.peers {
        let selected = state.active_peer.as_deref() == Some(peer.as_str());
        if ui.selectable_label(selected, peer).clicked() && !selected {
            actions.selected_peer = Some(peer.clone());
        }
    }

    // a selected peer that has since left the directory stays reachable
    if let Some(active) = &state.active_peer {
        if !state.peers.contains(active) {
            ui.label(egui::RichText::new(format!("{active} (offline)")).weak().italics());
        }
    }

    if !state.notices.is_empty() {
        ui.separator();
        ui.label("Notices:");
        for notice in state.notices.iter().rev().take(5) {
            ui.label(
                egui::RichText::new(format!(
                    "[{}] {}",
                    notice.timestamp.format("%H:%M:%S"),
                    notice.text
                ))
                .small(),
            );
        }
    }

    actions
}
