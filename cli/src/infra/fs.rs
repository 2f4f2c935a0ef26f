//! `HostFs` on the local filesystem.

use std::io::Write as _;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::HostFs;

/// Production filesystem implementation of `HostFs`.
pub struct LocalHostFs;

impl HostFs for LocalHostFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating directory {}", path.display()))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))
    }

    fn write_atomic(&self, path: &Path, content: &[u8], mode: u32) -> Result<()> {
        let tmp = temp_beside(path, content, mode)?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    fn diff_tree(&self, src: &Path, dst: &Path) -> Result<Vec<PathBuf>> {
        let mut stale = Vec::new();
        for rel in walk_files(src)? {
            let wanted = self.read(&src.join(&rel))?;
            let target = dst.join(&rel);
            if !target.exists() || self.read(&target)? != wanted {
                stale.push(rel);
            }
        }
        Ok(stale)
    }

    fn sync_tree(&self, src: &Path, dst: &Path) -> Result<usize> {
        let stale = self.diff_tree(src, dst)?;
        for rel in &stale {
            let from = src.join(rel);
            let to = dst.join(rel);
            if let Some(parent) = to.parent() {
                self.create_dir_all(parent)?;
            }
            let content = self.read(&from)?;
            let mode = self.mode(&from)?;
            self.write_atomic(&to, &content, mode)?;
        }
        Ok(stale.len())
    }

    fn stage(&self, live: &Path, content: &[u8], mode: u32) -> Result<PathBuf> {
        let tmp = temp_beside(live, content, mode)?;
        let (_, path) = tmp
            .keep()
            .map_err(|e| e.error)
            .with_context(|| format!("staging next to {}", live.display()))?;
        Ok(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::rename(from, to)
            .with_context(|| format!("renaming {} to {}", from.display(), to.display()))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).with_context(|| format!("removing file {}", path.display()))
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .with_context(|| format!("setting permissions on {}", path.display()))
    }

    fn mode(&self, path: &Path) -> Result<u32> {
        let meta =
            std::fs::metadata(path).with_context(|| format!("reading metadata of {}", path.display()))?;
        Ok(meta.permissions().mode() & 0o7777)
    }

    fn owner(&self, path: &Path) -> Result<u32> {
        let meta =
            std::fs::metadata(path).with_context(|| format!("reading metadata of {}", path.display()))?;
        Ok(meta.uid())
    }
}

/// Write `content` to a hidden temp file in `path`'s directory with `mode`.
fn temp_beside(path: &Path, content: &[u8], mode: u32) -> Result<tempfile::NamedTempFile> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map_or_else(|| "file".into(), |n| n.to_string_lossy().into_owned());
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .tempfile_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(content)
        .with_context(|| format!("writing temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("syncing temp file for {}", path.display()))?;
    std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("setting permissions on {}", tmp.path().display()))?;
    Ok(tmp)
}

/// Relative paths of every regular file under `root`, sorted.
fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];
    while let Some(rel) = pending.pop() {
        let dir = root.join(&rel);
        let entries =
            std::fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
            let kind = entry.file_type()?;
            let child = rel.join(entry.file_name());
            if kind.is_dir() {
                pending.push(child);
            } else if kind.is_file() {
                files.push(child);
            }
        }
    }
    files.sort();
    Ok(files)
}
