use std::time::Duration;

use eframe::egui;

use crate::common::{Identity, SessionCommand};
use crate::config::AppConfig;
use crate::network::{SessionHandle, spawn_session};

use super::components::{
    chat_area, input_bar, login,
    sidebar::{self, SidebarActions},
};
use super::state::{AppState, LoginForm};

enum Screen {
    AwaitingIdentity(LoginForm),
    Ready(ChatView),
}

pub struct ChatApp {
    config: AppConfig,
    screen: Screen,
}

impl ChatApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig, identity: Option<Identity>) -> Self {
        let screen = match identity {
            Some(identity) => Screen::Ready(ChatView::start(identity, &config)),
            None => Screen::AwaitingIdentity(LoginForm::default()),
        };
        Self { config, screen }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let next = match &mut self.screen {
            Screen::AwaitingIdentity(form) => {
                let mut submitted = None;
                egui::CentralPanel::default().show(ctx, |ui| {
                    submitted = login::render(ui, form);
                });
                submitted.map(|identity| Screen::Ready(ChatView::start(identity, &self.config)))
            }
            Screen::Ready(view) => {
                view.update(ctx);
                None
            }
        };

        if let Some(next) = next {
            self.screen = next;
        }

        // session events arrive off the UI thread
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

/// The chat screen for one running session.
struct ChatView {
    state: AppState,
    session: SessionHandle,
}

impl ChatView {
    fn start(identity: Identity, config: &AppConfig) -> Self {
        log::info!("Joining as {identity}");
        let session = spawn_session(identity.clone(), config);
        Self {
            state: AppState::new(identity),
            session,
        }
    }

    fn handle_session_events(&mut self) {
        while let Ok(event) = self.session.events.try_recv() {
            self.state.apply(event);
        }
    }

    fn send_command(&mut self, command: SessionCommand) {
        if let Err(err) = self.session.commands.try_send(command) {
            log::warn!("Failed to send command to session: {err}");
        }
    }

    fn update(&mut self, ctx: &egui::Context) {
        self.handle_session_events();

        egui::SidePanel::left("peer_sidebar")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                let actions: SidebarActions = sidebar::render(ui, &self.state);
                if actions.refresh {
                    self.send_command(SessionCommand::RefreshPeers);
                }
                if let Some(peer) = actions.selected_peer {
                    if self.state.select_peer(&peer) {
                        self.send_command(SessionCommand::SelectPeer(peer));
                    }
                }
            });

        egui::TopBottomPanel::bottom("input_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            let recipient = self.state.active_peer.clone();
            if let Some(content) =
                input_bar::render(ui, &mut self.state.input_text, recipient.as_deref())
            {
                self.send_command(SessionCommand::SendMessage(content));
            }
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let title = match &self.state.active_peer {
                Some(peer) => format!("Chat with {peer}"),
                None => "Rust Relay Chat".to_string(),
            };
            ui.heading(title);
            ui.separator();
            chat_area::render(ui, &self.state.identity, &self.state.thread);
        });
    }
}
