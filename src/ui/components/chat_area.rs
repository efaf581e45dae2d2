use eframe::egui;

use crate::common::types::display_time;
use crate::common::{ChatMessage, Identity, MessageKind};

pub fn render(ui: &mut egui::Ui, identity: &Identity, thread: &[ChatMessage]) {
    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if thread.is_empty() {
                ui.label(egui::RichText::new("No messages yet").weak());
                return;
            }

            for message in thread {
                let time = display_time(&message.time);
                match message.kind {
                    MessageKind::Notification => {
                        ui.label(
                            egui::RichText::new(format!("[{time}] {}", message.content))
                                .italics()
                                .weak(),
                        );
                    }
                    MessageKind::Message => {
                        let own = message.from_user == identity.as_str();
                        ui.horizontal_wrapped(|ui| {
                            ui.label(egui::RichText::new(format!("[{time}]")).weak().small());
                            let color = if own {
                                egui::Color32::LIGHT_BLUE
                            } else {
                                egui::Color32::LIGHT_GREEN
                            };
                            let author = if own { "You" } else { message.from_user.as_str() };
                            ui.colored_label(color, format!("{author}:"));
                            ui.label(&message.content);
                        });
                    }
                }
            }
        });
}
