use eframe::egui;

use crate::state::Session;
use crate::ui::plot::ScatterCache;
use crate::ui::{details, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct OpExplorerApp {
    pub session: Session,
    scatter: ScatterCache,
}

impl OpExplorerApp {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            scatter: ScatterCache::default(),
        }
    }
}

impl Default for OpExplorerApp {
    fn default() -> Self {
        Self::new(Session::default())
    }
}

impl eframe::App for OpExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + status ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.session);
        });

        // ---- Left side panel: conditions and plot controls ----
        egui::SidePanel::left("control_panel")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.session);
            });

        // ---- Right side panel: selected row ----
        egui::SidePanel::right("selection_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                details::selection_panel(ui, &self.session);
            });

        // ---- Central panel: scatter plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::scatter_plot(ui, &mut self.session, &mut self.scatter);
        });
    }
}
