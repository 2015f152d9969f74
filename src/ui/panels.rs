use eframe::egui::{self, Color32, Context, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use super::Action;
use crate::color::stack_color;
use crate::data::stack::Stack;
use crate::state::{Session, YScale};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, session: &Session, actions: &mut Vec<Action>) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open folder…").clicked() {
                if let Some(dir) = pick_folder(session) {
                    actions.push(Action::OpenFolder(dir));
                }
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                actions.push(Action::Reload);
                ui.close_menu();
            }
        });

        ui.separator();

        let can_stack = session.filters.len() > 1;
        if ui
            .add_enabled(can_stack, egui::Button::new("Add Filter Stack"))
            .clicked()
        {
            actions.push(Action::AddStack);
        }

        ui.separator();

        if ui
            .selectable_label(session.y_scale == YScale::Log, "Log")
            .clicked()
        {
            actions.push(Action::SetScale(YScale::Log));
        }
        if ui
            .selectable_label(session.y_scale == YScale::Linear, "Linear")
            .clicked()
        {
            actions.push(Action::SetScale(YScale::Linear));
        }

        ui.separator();

        ui.label(format!(
            "{} filters, {} stacks",
            session.filters.len(),
            session.stacks.len()
        ));

        if let Some(msg) = &session.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

fn pick_folder(session: &Session) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select the transmission curve folder")
        .set_directory(&session.workdir)
        .pick_folder()
}

// ---------------------------------------------------------------------------
// Left side panel – loaded filters
// ---------------------------------------------------------------------------

pub fn side_panel(ui: &mut Ui, session: &Session) {
    ui.heading("Filters");
    ui.small(session.workdir.display().to_string());
    ui.separator();

    if session.filters.is_empty() {
        ui.label("No filters loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for curve in session.filters.iter() {
                ui.label(&curve.name);
            }

            if !session.stacks.is_empty() {
                ui.separator();
                ui.strong("Stacks");
                for stack in &session.stacks {
                    ui.label(
                        RichText::new(format!("{} = {}", stack.name, stack.formula(&session.filters)))
                            .color(stack_color(stack.id)),
                    );
                }
            }
        });
}

// ---------------------------------------------------------------------------
// One window per stack
// ---------------------------------------------------------------------------

pub fn stack_windows(ctx: &Context, session: &Session, actions: &mut Vec<Action>) {
    for stack in &session.stacks {
        egui::Window::new(RichText::new(&stack.name).color(stack_color(stack.id)))
            .id(egui::Id::new(("stack_window", stack.id.0)))
            .default_width(340.0)
            .resizable(true)
            .show(ctx, |ui: &mut Ui| {
                stack_controls(ui, session, stack, actions);
            });
    }
}

fn stack_controls(ui: &mut Ui, session: &Session, stack: &Stack, actions: &mut Vec<Action>) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Name");
        let mut name = stack.name.clone();
        if ui.text_edit_singleline(&mut name).changed() {
            actions.push(Action::Rename(stack.id, name));
        }
        if ui.button("SAVE").clicked() {
            actions.push(Action::Save(stack.id));
        }
        if ui.button("DEL").clicked() {
            actions.push(Action::Delete(stack.id));
        }
    });
    ui.separator();

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::remainder())
        .column(Column::auto())
        .column(Column::auto())
        .header(20.0, |mut header| {
            header.col(|ui: &mut Ui| {
                ui.strong("Filter");
            });
            header.col(|ui: &mut Ui| {
                ui.strong("Count");
            });
            header.col(|_ui: &mut Ui| {});
        })
        .body(|mut body| {
            for (index, curve) in session.filters.iter().enumerate() {
                let exponent = stack.exponent(index).unwrap_or(0);
                body.row(24.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        ui.label(&curve.name);
                    });
                    row.col(|ui: &mut Ui| {
                        if ui.button(format!("remove [{exponent}]")).clicked() {
                            actions.push(Action::Decrement(stack.id, index));
                        }
                    });
                    row.col(|ui: &mut Ui| {
                        if ui.button("add").clicked() {
                            actions.push(Action::Increment(stack.id, index));
                        }
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// "Save as" prompt after a name collision
// ---------------------------------------------------------------------------

pub fn save_prompt(ctx: &Context, session: &mut Session, actions: &mut Vec<Action>) {
    let Some(pending) = session.pending_save.as_mut() else {
        return;
    };

    egui::Window::new("File exists")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            ui.label(format!(
                "'{}' already exists! Would you like to change the name?",
                pending.conflict.display()
            ));
            let mut submit = false;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Save As:");
                let response = ui.text_edit_singleline(&mut pending.input);
                submit = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            });
            ui.horizontal(|ui: &mut Ui| {
                let has_name = !pending.input.trim().is_empty();
                submit |= ui.add_enabled(has_name, egui::Button::new("Save")).clicked();
                if ui.button("Cancel").clicked() {
                    actions.push(Action::CancelSave);
                }
            });
            if submit && !pending.input.trim().is_empty() {
                actions.push(Action::SaveAs(pending.stack, pending.input.trim().to_string()));
            }
        });
}
