//! Exclusively owned scratch directories for one compiler run.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Prefix of every scratch directory name.
pub const SCRATCH_PREFIX: &str = "faust";

const SUFFIX_ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";
const SUFFIX_LEN: usize = 6;

/// A freshly created temporary directory, removed on drop.
///
/// Files registered through [`ScratchDir::track`] are unlinked first; the
/// directory itself is then removed with `remove_dir`, so anything left
/// behind by a third party keeps it alive and is reported as a warning
/// rather than deleted blindly.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    files: Vec<PathBuf>,
}

impl ScratchDir {
    /// Creates a scratch directory under `parent`, named `<prefix>XXXXXX`.
    pub fn create_in(parent: &Path, prefix: &str) -> Result<Self> {
        Self::create_with(parent, prefix, rand::random::<u32>)
    }

    /// Same as [`ScratchDir::create_in`] with an explicit source of random
    /// words. Each attempt consumes one word; collisions draw again.
    pub fn create_with(
        parent: &Path,
        prefix: &str,
        mut next_word: impl FnMut() -> u32,
    ) -> Result<Self> {
        loop {
            let name = format!("{prefix}{}", random_suffix(next_word()));
            let path = parent.join(name);
            match make_private_dir(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "created scratch directory");
                    return Ok(Self {
                        path,
                        files: Vec::new(),
                    });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "scratch name taken, retrying");
                }
                Err(source) => return Err(Error::ScratchDir { path, source }),
            }
        }
    }

    /// Location of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers `name` as an intermediate file of this directory and
    /// returns its full path. The file does not need to exist yet.
    pub fn track(&mut self, name: impl AsRef<Path>) -> PathBuf {
        let path = self.path.join(name);
        self.files.push(path.clone());
        path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        for file in self.files.drain(..) {
            match std::fs::remove_file(&file) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %file.display(), error = %err, "failed to remove intermediate file");
                }
            }
        }
        if let Err(err) = std::fs::remove_dir(&self.path) {
            warn!(path = %self.path.display(), error = %err, "failed to remove scratch directory");
        } else {
            debug!(path = %self.path.display(), "removed scratch directory");
        }
    }
}

/// Renders the low 30 bits of `word` as six base-32 characters.
fn random_suffix(word: u32) -> String {
    (0..SUFFIX_LEN)
        .map(|i| char::from(SUFFIX_ALPHABET[((word >> (5 * i)) & 31) as usize]))
        .collect()
}

#[cfg(unix)]
fn make_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new().mode(0o700).create(path)
}

#[cfg(not(unix))]
fn make_private_dir(path: &Path) -> std::io::Result<()> {
    std::fs::DirBuilder::new().create(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(name: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "faustmd-scratch-{name}-{}-{stamp}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).expect("create test root");
        path
    }

    #[test]
    fn suffix_uses_lowercase_base32() {
        assert_eq!(random_suffix(0), "000000");
        assert_eq!(random_suffix(u32::MAX), "vvvvvv");
        // 1 | 2 << 5 | 31 << 25
        assert_eq!(random_suffix(1 | (2 << 5) | (31 << 25)), "12000v");
    }

    #[test]
    fn collision_draws_a_new_name() {
        let root = temp_root("collision");
        let taken = root.join(format!("{SCRATCH_PREFIX}000000"));
        std::fs::create_dir(&taken).expect("pre-create colliding dir");

        let mut words = vec![0_u32, 0, 1].into_iter();
        let scratch = ScratchDir::create_with(&root, SCRATCH_PREFIX, || {
            words.next().expect("ran out of words")
        })
        .expect("create scratch");
        assert_eq!(scratch.path(), root.join(format!("{SCRATCH_PREFIX}100000")));
        assert!(scratch.path().is_dir());
        assert!(taken.is_dir(), "existing directory must be left alone");

        drop(scratch);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn sequential_directories_are_distinct() {
        let root = temp_root("distinct");
        let first = ScratchDir::create_in(&root, SCRATCH_PREFIX).expect("first");
        let second = ScratchDir::create_in(&root, SCRATCH_PREFIX).expect("second");
        assert_ne!(first.path(), second.path());
        drop(first);
        drop(second);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn drop_removes_tracked_files_and_directory() {
        let root = temp_root("drop");
        let mut scratch = ScratchDir::create_in(&root, SCRATCH_PREFIX).expect("create");
        let dir = scratch.path().to_path_buf();
        let written = scratch.track("a.cpp");
        let _never_written = scratch.track("a.xml");
        std::fs::write(&written, "int x;").expect("write file");

        drop(scratch);
        assert!(!written.exists());
        assert!(!dir.exists());
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn untracked_files_keep_directory_alive() {
        let root = temp_root("untracked");
        let scratch = ScratchDir::create_in(&root, SCRATCH_PREFIX).expect("create");
        let dir = scratch.path().to_path_buf();
        std::fs::write(dir.join("stray"), "").expect("write stray");

        drop(scratch);
        assert!(dir.join("stray").is_file());
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn missing_parent_is_fatal() {
        let root = temp_root("missing-parent");
        let parent = root.join("does/not/exist");
        let err = ScratchDir::create_in(&parent, SCRATCH_PREFIX).expect_err("must fail");
        assert!(matches!(err, Error::ScratchDir { .. }));
        let _ = std::fs::remove_dir_all(root);
    }
}
