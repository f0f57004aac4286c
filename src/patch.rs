//! Patch lifetime: the move-only handle, its state machine and the
//! discovery hook.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use patchhost_core::{EngineError, PatchEngine, PatchPtr};

/// Lifecycle state of an instance's patch slot.
///
/// `Unloaded -> Loading -> Loaded -> Unloaded` on load and close,
/// `Loaded -> Reloading -> Loaded` on reload. A failed load or reload ends in
/// `Unloaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PatchState {
    Unloaded = 0,
    Loading = 1,
    Loaded = 2,
    Reloading = 3,
}

impl PatchState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PatchState::Loading,
            2 => PatchState::Loaded,
            3 => PatchState::Reloading,
            _ => PatchState::Unloaded,
        }
    }
}

/// Lock-free state cell, readable from any thread.
#[derive(Debug, Default)]
pub(crate) struct PatchStateCell(AtomicU8);

impl PatchStateCell {
    #[inline]
    pub(crate) fn get(&self) -> PatchState {
        PatchState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn set(&self, state: PatchState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Snapshot of a loaded patch.
///
/// `generation` grows with every successful load, so a snapshot taken before
/// a reload can be told apart from the current patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchInfo {
    pub name: String,
    pub dir: PathBuf,
    pub dollar_zero: i32,
    pub generation: u64,
}

impl PatchInfo {
    /// Full path of the patch file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

/// Owner of one open engine patch.
///
/// Not `Clone`. Closing consumes the handle, so a closed patch pointer can't
/// be read again.
pub struct PatchHandle {
    ptr: PatchPtr,
    info: PatchInfo,
    closed: bool,
}

impl PatchHandle {
    /// Open `name` in `dir`. Call inside the context gate.
    pub(crate) fn open<E: PatchEngine + ?Sized>(
        engine: &mut E,
        name: &str,
        dir: &Path,
        generation: u64,
    ) -> Result<Self, EngineError> {
        let ptr = engine.open_patch(name, dir)?;
        let dollar_zero = match engine.dollar_zero(ptr) {
            Ok(value) => value,
            Err(e) => {
                let _ = engine.close_patch(ptr);
                return Err(e);
            }
        };
        Ok(Self {
            ptr,
            info: PatchInfo {
                name: name.to_string(),
                dir: dir.to_path_buf(),
                dollar_zero,
                generation,
            },
            closed: false,
        })
    }

    /// Close the patch. Call inside the context gate.
    pub(crate) fn close<E: PatchEngine + ?Sized>(mut self, engine: &mut E) -> Result<(), EngineError> {
        self.closed = true;
        engine.close_patch(self.ptr)
    }

    #[inline]
    pub fn info(&self) -> &PatchInfo {
        &self.info
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.info.dir
    }
}

impl std::fmt::Debug for PatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchHandle")
            .field("ptr", &self.ptr)
            .field("info", &self.info)
            .finish()
    }
}

impl Drop for PatchHandle {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                "Patch '{}' ({:?}) dropped without being closed",
                self.info.name,
                self.ptr
            );
        }
    }
}

/// Discovery hook, run after every load, close and reload with the patch
/// now in place (`None` when the slot is empty).
pub trait PatchObserver: Send {
    fn patch_changed(&mut self, patch: Option<&PatchInfo>);
}

impl<F> PatchObserver for F
where
    F: FnMut(Option<&PatchInfo>) + Send,
{
    fn patch_changed(&mut self, patch: Option<&PatchInfo>) {
        self(patch)
    }
}
