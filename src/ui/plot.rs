use eframe::egui::{self, Color32, Sense, Ui};
use egui_plot::{Legend, MarkerShape, Plot, PlotPoints, Points};

use crate::color::HueScale;
use crate::data::projection::Projection;
use crate::data::units::format_si;
use crate::state::Session;

/// Number of colour bins used when plotting a hue column.
const HUE_BINS: usize = 64;

const MATCHED_RADIUS: f32 = 2.5;
const UNMATCHED_RADIUS: f32 = 1.0;
const MATCHED_COLOR: Color32 = Color32::from_rgb(40, 170, 70);
const UNMATCHED_COLOR: Color32 = Color32::from_rgb(200, 60, 60);
const HIGHLIGHT_COLOR: Color32 = Color32::YELLOW;

// ---------------------------------------------------------------------------
// Marker series
// ---------------------------------------------------------------------------

/// One batch of markers sharing colour and size.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub color: Color32,
    pub radius: f32,
    pub points: Vec<[f64; 2]>,
}

/// Group a projection's markers into draw batches.
///
/// Without a hue column, matching and non-matching points form two series.
/// With one, points are binned by hue (and split by match state), which keeps
/// the draw call count bounded for very large tables.
pub fn build_series(projection: &Projection) -> Vec<Series> {
    match (&projection.hue, &projection.hue_scale) {
        (Some(hue), Some(scale)) => hue_series(projection, hue, scale),
        _ => {
            let mut matched = Vec::new();
            let mut unmatched = Vec::new();
            for (p, &m) in projection.points.iter().zip(&projection.matched) {
                if m {
                    matched.push(*p);
                } else {
                    unmatched.push(*p);
                }
            }
            let mut out = vec![Series {
                name: "matching".into(),
                color: MATCHED_COLOR,
                radius: MATCHED_RADIUS,
                points: matched,
            }];
            if !unmatched.is_empty() {
                out.push(Series {
                    name: "not matching".into(),
                    color: UNMATCHED_COLOR,
                    radius: UNMATCHED_RADIUS,
                    points: unmatched,
                });
            }
            out
        }
    }
}

fn hue_series(projection: &Projection, hue: &[f64], scale: &HueScale) -> Vec<Series> {
    // Index HUE_BINS holds points with a missing hue value.
    let mut bins: Vec<[Vec<[f64; 2]>; 2]> = vec![[Vec::new(), Vec::new()]; HUE_BINS + 1];
    for ((p, &h), &m) in projection.points.iter().zip(hue).zip(&projection.matched) {
        let bin = scale.bin(h, HUE_BINS).unwrap_or(HUE_BINS);
        bins[bin][usize::from(m)].push(*p);
    }

    let mut out = Vec::new();
    for (i, [unmatched, matched]) in bins.into_iter().enumerate() {
        let color = if i == HUE_BINS {
            Color32::GRAY
        } else {
            scale.bin_color(i, HUE_BINS)
        };
        for (points, radius) in [(matched, MATCHED_RADIUS), (unmatched, UNMATCHED_RADIUS)] {
            if !points.is_empty() {
                // Unnamed: the colour bar explains hue, not the legend.
                out.push(Series {
                    name: String::new(),
                    color,
                    radius,
                    points,
                });
            }
        }
    }
    out
}

/// Series cached per projection generation.
#[derive(Default)]
pub struct ScatterCache {
    generation: Option<u64>,
    series: Vec<Series>,
}

impl ScatterCache {
    fn series_for(&mut self, session: &Session) -> &[Series] {
        let generation = session.projection_generation();
        if self.generation != Some(generation) {
            self.series = session.projection().map(build_series).unwrap_or_default();
            self.generation = Some(generation);
        }
        &self.series
    }
}

// ---------------------------------------------------------------------------
// Scatter plot (central panel)
// ---------------------------------------------------------------------------

/// Render the scatter plot and handle click-to-pick.
pub fn scatter_plot(ui: &mut Ui, session: &mut Session, cache: &mut ScatterCache) {
    if session.loaded_table().is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view operating points  (File → Open…)");
        });
        return;
    }
    let Some(projection) = session.projection() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Choose the axes and press Plot");
        });
        return;
    };

    let config = projection.config.clone();
    let hue_scale = projection.hue_scale.clone();
    let highlight = session
        .selection()
        .and_then(|sel| projection.marker_of(sel.row))
        .map(|i| projection.points[i]);
    let empty = projection.is_empty();

    let series = cache.series_for(session);

    let colorbar_width = if hue_scale.is_some() { 90.0 } else { 0.0 };
    let mut click: Option<([f64; 2], [f64; 2])> = None;

    ui.horizontal(|ui: &mut Ui| {
        let plot_size = egui::vec2(
            (ui.available_width() - colorbar_width).max(100.0),
            ui.available_height(),
        );
        ui.allocate_ui(plot_size, |ui: &mut Ui| {
            let (x_name, y_name) = (config.x.clone(), config.y.clone());
            let response = Plot::new("op_plot")
                .legend(Legend::default())
                .x_axis_label(config.x.clone())
                .y_axis_label(config.y.clone())
                .x_axis_formatter(|mark, _range| format_si(mark.value))
                .y_axis_formatter(|mark, _range| format_si(mark.value))
                .label_formatter(move |_name, value| {
                    format!(
                        "{x_name}: {}\n{y_name}: {}",
                        format_si(value.x),
                        format_si(value.y)
                    )
                })
                .allow_boxed_zoom(true)
                .allow_drag(true)
                .allow_scroll(true)
                .allow_zoom(true)
                .show(ui, |plot_ui| {
                    for s in series {
                        plot_ui.points(
                            Points::new(PlotPoints::from(s.points.clone()))
                                .name(&s.name)
                                .color(s.color)
                                .radius(s.radius)
                                .shape(MarkerShape::Circle)
                                .filled(true),
                        );
                    }
                    if let Some(p) = highlight {
                        plot_ui.points(
                            Points::new(PlotPoints::from(vec![p]))
                                .name("selected")
                                .color(HIGHLIGHT_COLOR)
                                .radius(MATCHED_RADIUS * 3.0)
                                .shape(MarkerShape::Circle)
                                .filled(false),
                        );
                    }
                });

            if response.response.clicked() {
                if let Some(pos) = response.response.interact_pointer_pos() {
                    let value = response.transform.value_from_position(pos);
                    let bounds = response.transform.bounds();
                    click = Some(([value.x, value.y], [bounds.width(), bounds.height()]));
                }
            }
        });

        if let Some(scale) = &hue_scale {
            colorbar(ui, scale);
        }
    });

    if empty {
        ui.label("No points match the current conditions.");
    }

    if let Some((at, scale)) = click {
        session.pick(at, scale);
    }
}

/// Vertical colour bar labelled with the hue range.
fn colorbar(ui: &mut Ui, scale: &HueScale) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(&scale.column);
        ui.label(format_si(scale.max));
        let height = (ui.available_height() - 30.0).max(40.0);
        let (rect, _) = ui.allocate_exact_size(egui::vec2(24.0, height), Sense::hover());
        let steps = HUE_BINS;
        let step_h = rect.height() / steps as f32;
        let painter = ui.painter();
        for i in 0..steps {
            // Top of the bar is the maximum.
            let t = 1.0 - (i as f64 + 0.5) / steps as f64;
            let top = rect.top() + i as f32 * step_h;
            let slice = egui::Rect::from_min_max(
                egui::pos2(rect.left(), top),
                egui::pos2(rect.right(), top + step_h + 0.5),
            );
            painter.rect_filled(slice, 0.0, scale.colormap.sample(t));
        }
        ui.label(format_si(scale.min));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Colormap;
    use crate::data::projection::PlotConfig;

    fn projection(hue: Option<Vec<f64>>, matched: Vec<bool>) -> Projection {
        let n = matched.len();
        let hue_scale = hue.as_ref().map(|_| HueScale {
            column: "gm".into(),
            min: 0.0,
            max: 1.0,
            colormap: Colormap::Viridis,
        });
        Projection {
            config: PlotConfig {
                x: "x".into(),
                y: "y".into(),
                hue: hue.as_ref().map(|_| "gm".into()),
            },
            rows: (0..n).collect(),
            points: (0..n).map(|i| [i as f64, i as f64]).collect(),
            matched,
            hue,
            hue_scale,
        }
    }

    #[test]
    fn plain_series_split_by_match() {
        let s = build_series(&projection(None, vec![true, false, true]));
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].points, vec![[0.0, 0.0], [2.0, 2.0]]);
        assert_eq!(s[1].points, vec![[1.0, 1.0]]);
        assert!(s[0].radius > s[1].radius);
    }

    #[test]
    fn hue_series_keep_every_point() {
        let p = projection(Some(vec![0.0, 1.0, f64::NAN, 0.5]), vec![true; 4]);
        let s = build_series(&p);
        let total: usize = s.iter().map(|s| s.points.len()).sum();
        assert_eq!(total, 4);
        assert!(s.iter().any(|s| s.color == Color32::GRAY));
    }
}
