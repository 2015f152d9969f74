use eframe::egui;

use crate::state::Session;
use crate::ui::{self, panels, plot, Action};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TranStackApp {
    pub session: Session,
}

impl TranStackApp {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl eframe::App for TranStackApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut actions: Vec<Action> = Vec::new();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.session, &mut actions);
        });

        // ---- Left side panel: loaded filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.session);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::transmission_plot(ui, &self.session);
        });

        // ---- Floating windows ----
        panels::stack_windows(ctx, &self.session, &mut actions);
        panels::save_prompt(ctx, &mut self.session, &mut actions);

        for action in actions {
            ui::apply(&mut self.session, action);
        }
    }
}
