use eframe::egui;

/// Trả về nội dung cần gửi khi bấm Send hoặc Enter. Ô nhập giữ nguyên,
/// chỉ bị xóa khi hub đã nhận tin nhắn.
pub fn render(ui: &mut egui::Ui, input_text: &mut String) -> Option<String> {
    let mut send = false;
    ui.horizontal(|ui| {
        let response = ui.text_edit_singleline(input_text);
        if ui.button("Send").clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    if send && !input_text.is_empty() {
        return Some(input_text.clone());
    }

    None
}
