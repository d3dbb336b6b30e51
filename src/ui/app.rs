use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{HubCommand, HubEvent, SessionId};

use super::components::{chat_area, input_bar};
use super::state::AppState;

const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub struct ChatApp {
    state: AppState,
    command_sender: mpsc::Sender<HubCommand>,
    event_receiver: mpsc::Receiver<HubEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        session_id: SessionId,
        command_sender: mpsc::Sender<HubCommand>,
        event_receiver: mpsc::Receiver<HubEvent>,
    ) -> Self {
        Self {
            state: AppState::new(session_id),
            command_sender,
            event_receiver,
        }
    }

    fn handle_hub_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                HubEvent::MessageReceived(message) => self.state.on_message_received(message),
                HubEvent::ConnectionChanged(state) => self.state.set_connection(state),
                HubEvent::MessageSent(_) => self.state.on_message_sent(),
                HubEvent::SendFailed { reason, .. } => self.state.on_send_failed(&reason),
            }
        }
    }

    fn send_command(&mut self, payload: String) {
        if let Err(err) = self
            .command_sender
            .try_send(HubCommand::SendMessage(payload))
        {
            log::warn!("Failed to send command to hub client: {err}");
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_hub_events();

        egui::TopBottomPanel::bottom("input_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            if let Some(content) = input_bar::render(ui, &mut self.state.input_text) {
                self.send_command(content);
            }
            if let Some(notice) = &self.state.notice {
                ui.colored_label(egui::Color32::LIGHT_RED, notice);
            }
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Hub Chat");
            ui.label(egui::RichText::new(format!("Session {}", self.state.session_id)).weak());
            ui.separator();
            chat_area::render(ui, &mut self.state.log);
        });

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
