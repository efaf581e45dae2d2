use eframe::egui;

/// Message composer. Returns the typed text when the user sends it; the
/// field is cleared at that point.
pub fn render(ui: &mut egui::Ui, input_text: &mut String, recipient: Option<&str>) -> Option<String> {
    let Some(recipient) = recipient else {
        ui.label(egui::RichText::new("Pick someone on the left to start chatting").weak());
        return None;
    };

    let mut send = false;
    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(input_text)
                .hint_text(format!("Message {recipient}"))
                .desired_width(ui.available_width() - 60.0),
        );
        if ui.button("Send").clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    if send && !input_text.trim().is_empty() {
        let message = std::mem::take(input_text);
        return Some(message);
    }

    None
}
