use eframe::egui;

use crate::common::Identity;
use crate::ui::state::LoginForm;

/// Username prompt. Stays on screen until a non-empty name is entered.
pub fn render(ui: &mut egui::Ui, form: &mut LoginForm) -> Option<Identity> {
    let mut submitted = None;

    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.heading("Rust Relay Chat");
        ui.add_space(16.0);
        ui.label("Please enter your username:");

        let response = ui.add(egui::TextEdit::singleline(&mut form.username).desired_width(220.0));
        let pressed_enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        if ui.button("Join").clicked() || pressed_enter {
            submitted = form.submit();
        }

        if let Some(error) = &form.error {
            ui.colored_label(egui::Color32::RED, error);
        }
    });

    submitted
}
