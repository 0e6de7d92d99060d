use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Value;
use crate::state::Session;

// ---------------------------------------------------------------------------
// Selected operating point
// ---------------------------------------------------------------------------

/// Plain-text rendering of a row, one `name  value` line per column.
pub fn format_row(values: &[(String, Value)]) -> String {
    values
        .iter()
        .map(|(name, value)| format!("{name:<20}{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the full row of the most recently picked marker.
pub fn selection_panel(ui: &mut Ui, session: &Session) {
    ui.heading("Selected point");
    ui.separator();

    let Some(selection) = session.selection() else {
        ui.label("Click a point in the plot to inspect it.");
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("Row {}", selection.row));
        if ui.small_button("Copy").clicked() {
            ui.ctx().copy_text(format_row(&selection.values));
        }
    });

    ui.push_id("selection_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(90.0))
            .column(Column::remainder())
            .header(18.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Parameter");
                });
                header.col(|ui| {
                    ui.strong("Value");
                });
            })
            .body(|mut body| {
                for (name, value) in &selection.values {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(name);
                        });
                        row.col(|ui| {
                            ui.monospace(value.to_string());
                        });
                    });
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_aligned_and_si_formatted() {
        let text = format_row(&[
            ("id".into(), Value::Number(1.5e-5)),
            ("corner".into(), Value::Text("tt".into())),
            ("rout".into(), Value::Number(f64::NAN)),
        ]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("{:<20}15.00u", "id"));
        assert_eq!(lines[1], format!("{:<20}tt", "corner"));
        assert_eq!(lines[2], format!("{:<20}<missing>", "rout"));
    }
}
