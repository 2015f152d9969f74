use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot};

use crate::color::{filter_color, stack_color};
use crate::state::{Session, YScale};

/// Floor applied before taking log10, so exact zeros stay plottable.
const LOG_FLOOR: f64 = 1e-12;

/// Map a transmission onto the plot's y axis.
pub fn display_value(y: f64, scale: YScale) -> f64 {
    match scale {
        YScale::Linear => y,
        YScale::Log => y.max(LOG_FLOOR).log10(),
    }
}

fn points(x: &[f64], y: &[f64], scale: YScale) -> Vec<[f64; 2]> {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| [xi, display_value(yi, scale)])
        .collect()
}

// ---------------------------------------------------------------------------
// Transmission plot (central panel)
// ---------------------------------------------------------------------------

/// Render every stack's combined curve on one shared plot.
///
/// With exactly one filter loaded there is nothing to stack, so that filter
/// is drawn on its own.
pub fn transmission_plot(ui: &mut Ui, session: &Session) {
    if session.filters.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No filters loaded  (File → Open folder…)");
        });
        return;
    }

    let scale = session.y_scale;
    let wavelengths = session.grid().points();

    let mut plot = Plot::new("transmission_plot")
        .legend(Legend::default())
        .x_axis_label("Wavelength (µm)")
        .include_x(session.grid().min())
        .include_x(session.grid().max())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    plot = match scale {
        YScale::Linear => plot
            .y_axis_label("Transmission")
            .include_y(0.0)
            .include_y(1.0),
        YScale::Log => plot
            .y_axis_label("Transmission (log)")
            .include_y(0.0)
            .y_axis_formatter(|mark, _range| {
                if mark.value.fract() == 0.0 {
                    format!("1e{}", mark.value as i32)
                } else {
                    String::new()
                }
            }),
    };

    plot.show(ui, |plot_ui| {
        if session.filters.len() == 1 {
            if let Some(curve) = session.filters.iter().next() {
                plot_ui.line(
                    Line::new(points(wavelengths, &curve.samples, scale))
                        .name(&curve.name)
                        .color(filter_color())
                        .width(1.5),
                );
            }
        }

        for stack in &session.stacks {
            plot_ui.line(
                Line::new(points(wavelengths, stack.curve(), scale))
                    .name(&stack.name)
                    .color(stack_color(stack.id))
                    .width(1.5),
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn log_scale_maps_decades() {
        assert_relative_eq!(display_value(1.0, YScale::Log), 0.0);
        assert_relative_eq!(display_value(1e-4, YScale::Log), -4.0, epsilon = 1e-12);
        assert_relative_eq!(display_value(0.0, YScale::Log), -12.0, epsilon = 1e-12);
        assert_eq!(display_value(0.3, YScale::Linear), 0.3);
    }
}
