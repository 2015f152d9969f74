use std::path::PathBuf;

use crate::data::export::SaveError;
use crate::data::stack::StackId;
use crate::state::{Session, SessionError, YScale};

pub mod panels;
pub mod plot;

// ---------------------------------------------------------------------------
// User actions
// ---------------------------------------------------------------------------

/// Something the user asked for this frame. Widgets only record actions;
/// they are applied to the [`Session`] once drawing is done.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OpenFolder(PathBuf),
    Reload,
    AddStack,
    Increment(StackId, usize),
    Decrement(StackId, usize),
    Rename(StackId, String),
    Save(StackId),
    SaveAs(StackId, String),
    CancelSave,
    Delete(StackId),
    SetScale(YScale),
}

/// Apply one action. Failures are logged and surfaced in the status line;
/// none of them are fatal.
pub fn apply(session: &mut Session, action: Action) {
    let result = match action {
        Action::OpenFolder(dir) => open_folder(session, dir),
        Action::Reload => {
            let dir = session.workdir.clone();
            session.load_directory(&dir).map(|_| ())
        }
        Action::AddStack => {
            session.add_stack();
            Ok(())
        }
        Action::Increment(id, filter) => session.increment(id, filter).map(|_| ()),
        Action::Decrement(id, filter) => session.decrement(id, filter).map(|_| ()),
        Action::Rename(id, name) => session.rename_stack(id, &name),
        Action::Save(id) => session.save_stack(id).map(|_| ()),
        Action::SaveAs(id, name) => session.save_stack_as(id, &name).map(|_| ()),
        Action::CancelSave => {
            session.cancel_save();
            Ok(())
        }
        Action::Delete(id) => session.delete_stack(id),
        Action::SetScale(scale) => {
            session.set_y_scale(scale);
            session.recombine_all();
            Ok(())
        }
    };

    match result {
        Ok(()) => {}
        // The session already opened the "Save as" prompt.
        Err(SessionError::Save(SaveError::AlreadyExists { .. })) => {}
        Err(e @ (SessionError::UnknownStack(_) | SessionError::UnknownFilter { .. })) => {
            log::error!("Ignoring event for inconsistent state: {e}");
        }
        Err(e) => {
            log::error!("{e}");
            session.status_message = Some(format!("Error: {e}"));
        }
    }
}

fn open_folder(session: &mut Session, dir: PathBuf) -> Result<(), SessionError> {
    if let Err(e) = std::env::set_current_dir(&dir) {
        log::warn!("Could not switch to {}: {e}", dir.display());
    }
    session.load_directory(&dir).map(|_| ())
}
