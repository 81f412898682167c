//! Batch export pipeline.
//!
//! For every data row, in order: bind the row into the placeholders, hand a
//! native-resolution frame to the [`Rasterizer`], await the encoded image and
//! derive the archive entry name. Rasterization is the only await point.
//!
//! Any failure aborts the whole batch and discards what was produced so far.

mod archive;
mod filename;

pub use archive::{collapse_duplicates, write_archive};
pub use filename::{derive_filename, effective_pattern, sanitize, EXTENSION};

use std::cell::{RefCell, RefMut};
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{CertgenError, Result};
use crate::layout::ViewportTransform;
use crate::session::SceneSession;
use crate::types::{DataTable, Placeholder, Size};

/// Everything a rasterizer needs to draw one output image.
#[derive(Debug, Clone)]
pub struct ExportFrame<'a> {
    /// Zero-based data row.
    pub row_index: usize,
    /// Output size: the template's native pixel size.
    pub size: Size,
    /// Always the identity; exports never inherit the editor's pan or zoom.
    pub viewport: ViewportTransform,
    /// Placeholders in z-order with the row already bound.
    pub placeholders: Vec<&'a Placeholder>,
}

/// Turns a frame into encoded image bytes (PNG).
///
/// Implemented over `canvas.toBlob` in the browser and over a CPU raster
/// on native targets.
#[allow(async_fn_in_trait)]
pub trait Rasterizer {
    async fn rasterize(&mut self, frame: &ExportFrame<'_>) -> Result<Vec<u8>>;
}

/// One rendered image and its archive entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Cooperative cancellation, checked before each row.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where the UI finds the token of the export currently running.
///
/// A token is armed only once the export holds the state, so an export that
/// is rejected as a duplicate never replaces the running export's token.
#[derive(Debug, Clone, Default)]
pub struct CancelSlot(Rc<RefCell<Option<CancelToken>>>);

impl CancelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow `state` exclusively and arm a fresh token for the export that
    /// runs under that borrow.
    ///
    /// # Errors
    /// `ExportInProgress` if `state` is already borrowed; the armed token is
    /// left untouched.
    pub fn acquire<'a, T>(&self, state: &'a RefCell<T>) -> Result<(RefMut<'a, T>, CancelToken)> {
        let guard = state
            .try_borrow_mut()
            .map_err(|_| CertgenError::ExportInProgress)?;
        let token = CancelToken::new();
        *self.0.borrow_mut() = Some(token.clone());
        Ok((guard, token))
    }

    /// Trip the armed token, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.0.borrow().as_ref() {
            token.cancel();
        }
    }

    /// Forget the token once its export has finished.
    pub fn clear(&self) {
        *self.0.borrow_mut() = None;
    }

    pub fn is_armed(&self) -> bool {
        self.0.borrow().is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Fail with `DuplicateFilename` instead of letting the last row win.
    pub reject_duplicate_names: bool,
    pub cancel: Option<CancelToken>,
}

/// Progress report after each finished row.
#[derive(Debug, Clone, Copy)]
pub struct ExportProgress<'a> {
    pub done: usize,
    pub total: usize,
    pub filename: &'a str,
}

/// Render one artifact per row of `table`.
///
/// Checks run before any work: an empty table, then a missing template, then
/// an export already in flight. The selection is cleared and guides are
/// hidden for the duration; guide visibility is restored on every exit path.
/// Placeholders keep the last row's text afterwards.
pub async fn export<R, F>(
    session: &mut SceneSession,
    table: &DataTable,
    pattern: &str,
    rasterizer: &mut R,
    options: &ExportOptions,
    mut on_progress: F,
) -> Result<Vec<Artifact>>
where
    R: Rasterizer,
    F: FnMut(ExportProgress<'_>),
{
    if table.is_empty() {
        return Err(CertgenError::EmptyDataTable);
    }
    if session.template().is_none() {
        return Err(CertgenError::NoTemplate);
    }
    let mut scope = ExportScope::begin(session)?;
    tracing::info!(rows = table.len(), "export started");

    let result = render_rows(&mut scope, table, pattern, rasterizer, options, &mut on_progress).await;
    drop(scope);

    match &result {
        Ok(artifacts) => tracing::info!(artifacts = artifacts.len(), "export finished"),
        Err(e) => tracing::warn!(error = %e, "export aborted"),
    }
    result
}

/// Session state for the duration of one export.
///
/// Dropping the scope restores guide visibility and leaves the exporting
/// state, so a future dropped mid-row does not leave the session locked.
struct ExportScope<'a> {
    session: &'a mut SceneSession,
    guides_visible: bool,
}

impl<'a> ExportScope<'a> {
    fn begin(session: &'a mut SceneSession) -> Result<Self> {
        session.begin_export()?;
        let guides_visible = session.guides_visible();
        session.set_guides_visible(false);
        Ok(Self {
            session,
            guides_visible,
        })
    }
}

impl Deref for ExportScope<'_> {
    type Target = SceneSession;

    fn deref(&self) -> &SceneSession {
        self.session
    }
}

impl DerefMut for ExportScope<'_> {
    fn deref_mut(&mut self) -> &mut SceneSession {
        self.session
    }
}

impl Drop for ExportScope<'_> {
    fn drop(&mut self) {
        self.session.set_guides_visible(self.guides_visible);
        self.session.end_export();
    }
}

/// [`export`] followed by [`write_archive`].
pub async fn export_archive<R, F>(
    session: &mut SceneSession,
    table: &DataTable,
    pattern: &str,
    rasterizer: &mut R,
    options: &ExportOptions,
    on_progress: F,
) -> Result<Vec<u8>>
where
    R: Rasterizer,
    F: FnMut(ExportProgress<'_>),
{
    let artifacts = export(session, table, pattern, rasterizer, options, on_progress).await?;
    write_archive(&artifacts)
}

/// Archive entry names the export would produce, without rendering.
pub fn preview_filenames(table: &DataTable, pattern: &str) -> Vec<String> {
    let pattern = effective_pattern(pattern, &table.columns());
    table
        .rows()
        .iter()
        .map(|row| derive_filename(&pattern, table.headers(), row))
        .collect()
}

async fn render_rows<R, F>(
    session: &mut SceneSession,
    table: &DataTable,
    pattern: &str,
    rasterizer: &mut R,
    options: &ExportOptions,
    on_progress: &mut F,
) -> Result<Vec<Artifact>>
where
    R: Rasterizer,
    F: FnMut(ExportProgress<'_>),
{
    let size = session.template().ok_or(CertgenError::NoTemplate)?;
    let pattern = effective_pattern(pattern, &table.columns());
    let total = table.len();
    let mut artifacts = Vec::with_capacity(total);
    let mut seen = HashSet::new();

    for (row_index, row) in table.rows().iter().enumerate() {
        if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(CertgenError::Cancelled);
        }

        session.bind_row(row);
        let bytes = {
            let frame = ExportFrame {
                row_index,
                size,
                viewport: ViewportTransform::identity(),
                placeholders: session.placeholders().collect(),
            };
            rasterizer.rasterize(&frame).await?
        };

        let filename = derive_filename(&pattern, table.headers(), row);
        if options.reject_duplicate_names && !seen.insert(filename.clone()) {
            return Err(CertgenError::DuplicateFilename(filename));
        }
        tracing::debug!(row = row_index, %filename, bytes = bytes.len(), "row rendered");

        on_progress(ExportProgress {
            done: row_index + 1,
            total,
            filename: &filename,
        });
        artifacts.push(Artifact { filename, bytes });
    }
    Ok(artifacts)
}
