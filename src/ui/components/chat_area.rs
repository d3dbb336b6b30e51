use eframe::egui;

use crate::ui::state::MessageLog;

/// Mỗi tin nhắn là label văn bản thuần; markup gửi qua hub được hiển thị
/// nguyên văn.
pub fn render(ui: &mut egui::Ui, log: &mut MessageLog) {
    let scroll = log.take_scroll_request();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for message in log.entries() {
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new(&message.author).strong());
                    ui.label(&message.text);
                });
                ui.add_space(4.0);
            }

            if scroll {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });
}
