use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::Colormap;
use crate::data::condition::{ConditionId, Operator};
use crate::data::projection::ThresholdDirection;
use crate::data::units::{format_si, parse_si};
use crate::state::{Session, Status};

// ---------------------------------------------------------------------------
// Left side panel – conditions, plot and sizing controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, session: &mut Session) {
    let Some(table) = session.loaded_table() else {
        ui.heading("Conditions");
        ui.separator();
        ui.label("No table loaded.");
        if ui.button("Open…").clicked() {
            open_file_dialog(session);
        }
        return;
    };

    // Clone what we need so we can mutate the session inside the closures.
    let condition_columns = table.numeric_column_names();
    let plot_columns = session
        .table()
        .map(|t| t.numeric_column_names())
        .unwrap_or_default();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            conditions_section(ui, session, &condition_columns);
            ui.add_space(8.0);
            plot_section(ui, session, &plot_columns);
            ui.add_space(8.0);
            settings_section(ui, session);
        });
}

fn column_combo(ui: &mut Ui, id: &str, current: &mut String, columns: &[String], width: f32) {
    egui::ComboBox::from_id_salt(id)
        .width(width)
        .selected_text(current.as_str())
        .show_ui(ui, |ui: &mut Ui| {
            for col in columns {
                ui.selectable_value(current, col.clone(), col);
            }
        });
}

fn conditions_section(ui: &mut Ui, session: &mut Session, columns: &[String]) {
    ui.heading("Conditions");
    ui.separator();

    let mut remove: Option<ConditionId> = None;
    if session.conditions().is_empty() {
        ui.label(RichText::new("No conditions: every point matches.").italics());
    } else {
        ui.push_id("conditions_table", |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::remainder())
                .column(Column::exact(24.0))
                .body(|mut body| {
                    for (id, cond) in session.conditions().iter() {
                        body.row(20.0, |mut row| {
                            row.col(|ui| {
                                ui.monospace(format!(
                                    "{} {} {}",
                                    cond.column(),
                                    cond.operator(),
                                    format_si(cond.threshold())
                                ));
                            });
                            row.col(|ui| {
                                if ui.small_button("✖").on_hover_text("Remove").clicked() {
                                    remove = Some(id);
                                }
                            });
                        });
                    }
                });
        });
    }
    if let Some(id) = remove {
        session.remove_condition(id);
    }

    // ---- New condition row ----
    let mut submit = false;
    ui.horizontal(|ui: &mut Ui| {
        column_combo(ui, "cond_column", &mut session.draft.column, columns, 90.0);
        egui::ComboBox::from_id_salt("cond_op")
            .width(42.0)
            .selected_text(session.draft.operator.symbol())
            .show_ui(ui, |ui: &mut Ui| {
                for op in Operator::ALL {
                    ui.selectable_value(&mut session.draft.operator, op, op.symbol());
                }
            });
        let edit = ui.add(
            egui::TextEdit::singleline(&mut session.draft.threshold)
                .desired_width(70.0)
                .hint_text("e.g. 40k"),
        );
        if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = true;
        }
    });
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Add condition").clicked() {
            submit = true;
        }
        if ui
            .add_enabled(!session.conditions().is_empty(), egui::Button::new("Clear"))
            .clicked()
        {
            session.clear_conditions();
        }
        if ui
            .add_enabled(!session.conditions().is_empty(), egui::Button::new("Copy JSON"))
            .on_hover_text("Copy the conditions for use with --conditions")
            .clicked()
        {
            match session.conditions_json() {
                Ok(json) => ui.ctx().copy_text(json),
                Err(e) => log::error!("Failed to serialize conditions: {e}"),
            }
        }
    });
    if submit {
        // Rejections are reported through the session status.
        let _ = session.add_condition_from_draft();
    }

    let view = session.view();
    let total = session.table().map_or(0, |t| t.len());
    let text = if view.is_empty() {
        RichText::new("No points match").color(Color32::from_rgb(230, 140, 40))
    } else {
        RichText::new(format!("{} / {} points match", view.len(), total))
    };
    ui.label(text);
}

fn plot_section(ui: &mut Ui, session: &mut Session, columns: &[String]) {
    ui.heading("Plot");
    ui.separator();

    egui::Grid::new("plot_grid")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("X axis");
            column_combo(ui, "plot_x", &mut session.plot_draft.x, columns, 140.0);
            ui.end_row();

            ui.label("Y axis");
            column_combo(ui, "plot_y", &mut session.plot_draft.y, columns, 140.0);
            ui.end_row();

            ui.label("Hue");
            let hue_text = session.plot_draft.hue.clone().unwrap_or_else(|| "(none)".into());
            egui::ComboBox::from_id_salt("plot_hue")
                .width(140.0)
                .selected_text(hue_text)
                .show_ui(ui, |ui: &mut Ui| {
                    ui.selectable_value(&mut session.plot_draft.hue, None, "(none)");
                    for col in columns {
                        ui.selectable_value(&mut session.plot_draft.hue, Some(col.clone()), col);
                    }
                });
            ui.end_row();

            ui.label("Colormap");
            egui::ComboBox::from_id_salt("plot_cmap")
                .width(140.0)
                .selected_text(session.display.colormap.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for cmap in Colormap::ALL {
                        ui.selectable_value(&mut session.display.colormap, cmap, cmap.to_string());
                    }
                });
            ui.end_row();
        });

    let before = session.display.clone();
    ui.checkbox(&mut session.display.only_matching, "Plot only matching points");

    let mut threshold_on = session.display.hue_threshold.is_some();
    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut threshold_on, "Hue threshold");
        let mut pct = session.display.hue_threshold.unwrap_or(0.0);
        ui.add_enabled(
            threshold_on,
            egui::DragValue::new(&mut pct).speed(1.0).range(0.0..=100.0).suffix(" %"),
        );
        session.display.hue_threshold = threshold_on.then_some(pct);
    });
    ui.add_enabled_ui(threshold_on, |ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            ui.radio_value(
                &mut session.display.threshold_direction,
                ThresholdDirection::Down,
                "hide below",
            );
            ui.radio_value(
                &mut session.display.threshold_direction,
                ThresholdDirection::Up,
                "hide above",
            );
        });
    });
    if session.display != before {
        session.rebuild_projection();
    }

    if ui.button("Plot").clicked() {
        // Rejections are reported through the session status.
        let _ = session.plot_from_draft();
    }
}

fn settings_section(ui: &mut Ui, session: &mut Session) {
    egui::CollapsingHeader::new(RichText::new("Settings").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let before = session.settings.clone();
            egui::Grid::new("settings_grid")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui: &mut Ui| {
                    ui.label("== tolerance");
                    ui.add(
                        egui::DragValue::new(&mut session.settings.tolerance_percent)
                            .speed(0.1)
                            .range(0.0..=100.0)
                            .suffix(" %"),
                    );
                    ui.end_row();

                    ui.label("Pick radius");
                    ui.add(
                        egui::DragValue::new(&mut session.settings.pick_radius)
                            .speed(0.001)
                            .range(0.0..=1.0),
                    )
                    .on_hover_text("Fraction of the visible plot span");
                    ui.end_row();

                    ui.label("Width sizing");
                    ui.checkbox(&mut session.settings.sizing, "");
                    ui.end_row();

                    ui.label("Max width");
                    ui.add_enabled(session.settings.sizing, si_drag(&mut session.settings.limits.w_max));
                    ui.end_row();

                    ui.label("Min W/L");
                    ui.add_enabled(
                        session.settings.sizing,
                        egui::DragValue::new(&mut session.settings.limits.wl_min)
                            .speed(0.05)
                            .range(0.0..=f64::MAX),
                    );
                    ui.end_row();
                });
            if session.settings != before {
                session.refresh();
            }
        });
}

/// Drag value that shows and accepts SI prefixes.
fn si_drag(value: &mut f64) -> egui::DragValue<'_> {
    let speed = (value.abs() * 0.01).max(f64::MIN_POSITIVE);
    egui::DragValue::new(value)
        .speed(speed)
        .range(0.0..=f64::MAX)
        .custom_formatter(|v, _| format_si(v))
        .custom_parser(parse_si)
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / status bar.
pub fn top_bar(ui: &mut Ui, session: &mut Session) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(session);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = session.loaded_table() {
            let name = session
                .source
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!("{name}: {} operating points", table.len()));
            if let Some(sized) = session.table().filter(|_| session.is_sized()) {
                ui.label(format!("({} sized candidates)", sized.len()));
            }
        }

        ui.separator();

        match &session.status {
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            Some(Status::Info(msg)) => {
                ui.label(msg);
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(session: &mut Session) {
    let file = rfd::FileDialog::new()
        .set_title("Open operating-point table")
        .add_filter("Supported files", &["csv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        session.load_path(&path);
    }
}
