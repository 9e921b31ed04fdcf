//! Render-pass resource cache
//!
//! Memoizes the framebuffer built for each target texture and the program
//! built for each shader-path pair, so the 10+ passes running every frame
//! reuse GPU objects instead of reallocating them. Tables are populated
//! lazily, grow monotonically, and are never evicted: the set of distinct
//! passes is small and fixed, so the memory cost is a small constant.
//!
//! The cache is a plain value owned by the frame loop and mutated only from
//! the render thread; no locking is involved.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use crate::render::framebuffer::{Framebuffer, FramebufferError};
use crate::render::shader::{ShaderError, ShaderProgram};

/// A get-or-create table with a construction counter
///
/// The counter exists so idempotence is checkable: resolving the same key
/// twice must construct exactly once.
pub struct MemoTable<K, V> {
    entries: HashMap<K, V>,
    misses: usize,
}

impl<K: Eq + Hash, V> MemoTable<K, V> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            misses: 0,
        }
    }

    /// Look up `key`, constructing the value on first use
    ///
    /// A failed construction leaves the table unchanged; the caller decides
    /// whether the failure is fatal (it is, for every resource cached here).
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<&V, E> {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => {
                let value = build()?;
                self.misses += 1;
                Ok(slot.insert(value))
            }
        }
    }

    /// How many values have been constructed so far
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V> Default for MemoTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-lifetime cache of framebuffers and shader programs
///
/// A given target texture always maps to exactly one framebuffer, and a
/// given shader-path pair to exactly one program, for the whole run.
pub struct RenderResourceCache {
    framebuffers: MemoTable<glow::NativeTexture, Framebuffer>,
    programs: MemoTable<(PathBuf, PathBuf), ShaderProgram>,
}

impl RenderResourceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            framebuffers: MemoTable::new(),
            programs: MemoTable::new(),
        }
    }

    /// The framebuffer rendering into `target`, built on first use
    pub fn resolve_framebuffer(
        &mut self,
        gl: &glow::Context,
        target: glow::NativeTexture,
    ) -> Result<glow::NativeFramebuffer, FramebufferError> {
        self.framebuffers
            .get_or_try_insert_with(target, || Framebuffer::for_pass_target(gl, target))
            .map(Framebuffer::raw)
    }

    /// The program for a shader-path pair, compiled on first use
    ///
    /// The vertex path is the fixed passthrough for every pipeline pass;
    /// keying on the pair keeps the table correct should a pass ever vary
    /// its vertex stage.
    pub fn resolve_program(
        &mut self,
        gl: &glow::Context,
        vert_path: &Path,
        frag_path: &Path,
    ) -> Result<glow::NativeProgram, ShaderError> {
        self.programs
            .get_or_try_insert_with((vert_path.to_path_buf(), frag_path.to_path_buf()), || {
                ShaderProgram::from_files(gl, vert_path, frag_path)
            })
            .map(ShaderProgram::raw)
    }

    /// Number of cached framebuffers
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Number of cached programs
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }
}

impl Default for RenderResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_constructs_once() {
        let mut table: MemoTable<u32, String> = MemoTable::new();
        let mut built = 0;

        let first = table
            .get_or_try_insert_with::<()>(7, || {
                built += 1;
                Ok("framebuffer".to_string())
            })
            .unwrap()
            .clone();
        let second = table
            .get_or_try_insert_with::<()>(7, || {
                built += 1;
                Ok("something else".to_string())
            })
            .unwrap()
            .clone();

        assert_eq!(first, second);
        assert_eq!(built, 1);
        assert_eq!(table.misses(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_distinct_keys_construct_separately() {
        let mut table: MemoTable<&str, u32> = MemoTable::new();

        table
            .get_or_try_insert_with::<()>("shader/a.frag", || Ok(1))
            .unwrap();
        table
            .get_or_try_insert_with::<()>("shader/b.frag", || Ok(2))
            .unwrap();

        assert_eq!(table.misses(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_failed_construction_is_not_cached() {
        let mut table: MemoTable<u32, u32> = MemoTable::new();

        let result = table.get_or_try_insert_with(1, || Err("compile error"));
        assert!(result.is_err());
        assert_eq!(table.misses(), 0);
        assert!(table.is_empty());

        // A later successful build still goes through
        let value = *table
            .get_or_try_insert_with::<&str>(1, || Ok(42))
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(table.misses(), 1);
    }
}
