use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::data::export::{self, SaveError};
use crate::data::grid::WavelengthGrid;
use crate::data::loader::{CurveLoader, LoadError};
use crate::data::model::FilterSet;
use crate::data::stack::{Stack, StackId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no stack with id {0}")]
    UnknownStack(StackId),

    #[error("stack {stack} has no filter at position {index}")]
    UnknownFilter { stack: StackId, index: usize },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Save(#[from] SaveError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YScale {
    #[default]
    Log,
    Linear,
}

/// A save that hit an existing file and is waiting for another name.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub stack: StackId,
    pub conflict: PathBuf,
    /// Text currently typed into the "Save as" box.
    pub input: String,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Everything the tool knows, independent of rendering.
///
/// The GUI holds one `Session` and calls its methods with explicit
/// [`StackId`]s; nothing here is global.
pub struct Session {
    loader: CurveLoader,

    /// Where curves were loaded from and where stacks are saved.
    pub workdir: PathBuf,

    pub filters: FilterSet,

    pub stacks: Vec<Stack>,

    next_id: u64,

    pub y_scale: YScale,

    /// Set when a save collided with an existing file.
    pub pending_save: Option<PendingSave>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Session {
    pub fn new(grid: WavelengthGrid, fallback: f64, workdir: PathBuf) -> Self {
        Self {
            loader: CurveLoader::new(grid, fallback),
            workdir,
            filters: FilterSet::new(),
            stacks: Vec::new(),
            next_id: 0,
            y_scale: YScale::default(),
            pending_save: None,
            status_message: None,
        }
    }

    pub fn grid(&self) -> &WavelengthGrid {
        self.loader.grid()
    }

    // ---- Loading ----

    /// Replace the filter set with every curve file in `dir`.
    ///
    /// Existing stacks are discarded since their exponents were aligned with
    /// the old set. With more than one filter a first empty stack is created.
    /// Returns the number of files that failed to load.
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize, SessionError> {
        let report = self.loader.scan_directory(dir)?;

        if !self.stacks.is_empty() {
            log::info!("Filter set rebuilt, discarding {} stack(s)", self.stacks.len());
        }
        self.stacks.clear();
        self.pending_save = None;
        self.filters = report.filters;
        self.workdir = dir.to_path_buf();

        let failed = report.failures.len();
        self.status_message = match (self.filters.len(), failed) {
            (0, _) => Some(format!("No filters found in {}", dir.display())),
            (_, 0) => None,
            (_, n) => Some(format!("{n} file(s) could not be loaded, see log")),
        };
        if self.filters.len() > 1 {
            self.add_stack();
        }
        Ok(failed)
    }

    // ---- Stacks ----

    /// Create a stack with all exponents at zero, named `stack <n>`.
    pub fn add_stack(&mut self) -> StackId {
        let id = StackId(self.next_id);
        self.next_id += 1;
        let name = format!("stack {}", self.stacks.len());
        let stack = Stack::new(id, name, self.loader.grid(), &self.filters);
        log::debug!("Created {} ({id}) over {} filter(s)", stack.name, self.filters.len());
        self.stacks.push(stack);
        id
    }

    pub fn stack(&self, id: StackId) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.id == id)
    }

    fn stack_mut(&mut self, id: StackId) -> Result<&mut Stack, SessionError> {
        self.stacks
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SessionError::UnknownStack(id))
    }

    pub fn increment(&mut self, id: StackId, filter: usize) -> Result<u32, SessionError> {
        self.update_exponent(id, filter, Stack::increment)
    }

    pub fn decrement(&mut self, id: StackId, filter: usize) -> Result<u32, SessionError> {
        self.update_exponent(id, filter, Stack::decrement)
    }

    fn update_exponent(
        &mut self,
        id: StackId,
        filter: usize,
        op: fn(&mut Stack, usize) -> Option<u32>,
    ) -> Result<u32, SessionError> {
        let grid = self.loader.grid();
        let filters = &self.filters;
        let stack = self
            .stacks
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SessionError::UnknownStack(id))?;
        let value = op(stack, filter).ok_or(SessionError::UnknownFilter { stack: id, index: filter })?;
        stack.recombine(grid, filters);
        log::debug!("{} ({id}): filter {filter} exponent now {value}", stack.name);
        Ok(value)
    }

    pub fn rename_stack(&mut self, id: StackId, name: &str) -> Result<(), SessionError> {
        let stack = self.stack_mut(id)?;
        if stack.name != name {
            log::debug!("Renaming {} ({id}) to {name}", stack.name);
            stack.name = name.to_string();
        }
        Ok(())
    }

    pub fn delete_stack(&mut self, id: StackId) -> Result<(), SessionError> {
        let pos = self
            .stacks
            .iter()
            .position(|s| s.id == id)
            .ok_or(SessionError::UnknownStack(id))?;
        let removed = self.stacks.remove(pos);
        log::info!("Closed stack {}", removed.name);
        if self.pending_save.as_ref().is_some_and(|p| p.stack == id) {
            self.pending_save = None;
        }
        Ok(())
    }

    /// Recompute every stack's combined curve.
    pub fn recombine_all(&mut self) {
        let grid = self.loader.grid();
        for stack in &mut self.stacks {
            stack.recombine(grid, &self.filters);
        }
    }

    // ---- Saving ----

    /// Save under the stack's own name. On a name collision nothing is
    /// written and a [`PendingSave`] is opened so the user can pick another
    /// name via [`Session::save_stack_as`].
    pub fn save_stack(&mut self, id: StackId) -> Result<PathBuf, SessionError> {
        let name = self.stack(id).ok_or(SessionError::UnknownStack(id))?.name.clone();
        log::debug!("Saving csv data for {name}");
        self.save_under(id, &name)
    }

    /// Save under an alternate name after a collision. Still never overwrites.
    pub fn save_stack_as(&mut self, id: StackId, name: &str) -> Result<PathBuf, SessionError> {
        self.save_under(id, name)
    }

    fn save_under(&mut self, id: StackId, name: &str) -> Result<PathBuf, SessionError> {
        let stack = self.stack(id).ok_or(SessionError::UnknownStack(id))?;
        match export::save_curve(&self.workdir, name, self.loader.grid(), stack.curve()) {
            Ok(path) => {
                self.pending_save = None;
                self.status_message = Some(format!("Saved {}", path.display()));
                Ok(path)
            }
            Err(SaveError::AlreadyExists { path }) => {
                log::warn!("{} already exists, asking for another name", path.display());
                self.status_message = Some(format!(
                    "'{}' already exists, choose another name",
                    path.display()
                ));
                self.pending_save = Some(PendingSave {
                    stack: id,
                    conflict: path.clone(),
                    input: String::new(),
                });
                Err(SaveError::AlreadyExists { path }.into())
            }
            Err(e) => {
                self.status_message = Some(format!("Save failed: {e}"));
                Err(e.into())
            }
        }
    }

    /// Give up on a collided save. The existing file stays as it was.
    pub fn cancel_save(&mut self) {
        if let Some(pending) = self.pending_save.take() {
            log::warn!(
                "Saving failed: {} exists and no other name was given",
                pending.conflict.display()
            );
            self.status_message = Some("Save cancelled".to_string());
        }
    }

    // ---- Display ----

    pub fn set_y_scale(&mut self, scale: YScale) {
        log::debug!("Y scale set to {scale:?}");
        self.y_scale = scale;
    }

    pub fn toggle_y_scale(&mut self) {
        self.set_y_scale(match self.y_scale {
            YScale::Log => YScale::Linear,
            YScale::Linear => YScale::Log,
        });
    }
}
