//! Per-instance isolation loader for pipeline archives
//!
//! Each bridge instance loads the external pipeline's shared libraries into
//! its own [`IsolationLoader`] rather than the process-wide namespace, so two
//! instances can carry two different (even incompatible) versions of the
//! pipeline without observing each other's symbols. On Unix this is dlopen
//! with `RTLD_LOCAL`; symbols the archives themselves depend on still resolve
//! against the ambient process scope, so shared runtime infrastructure stays
//! shared.

use crate::errors::LoaderError;
use libloading::Library;
use srlx_logger as logger;
use std::path::{Path, PathBuf};

/// A private symbol-resolution scope over an ordered list of archives
///
/// The loader owns the library handles; they stay open for the lifetime of
/// the loader and are closed when it is dropped. A loader is owned by exactly
/// one bridge instance and never shared.
pub struct IsolationLoader {
    libraries: Vec<Library>,
    archives: Vec<PathBuf>,
}

impl IsolationLoader {
    /// Open every archive in the list, in order
    ///
    /// Fail-fast: an empty list, a missing path, or a load failure aborts the
    /// whole construction. Archives already opened by the failed attempt are
    /// closed when the partial list is dropped, so no partial scope survives.
    pub fn open(archives: &[PathBuf]) -> Result<Self, LoaderError> {
        if archives.is_empty() {
            return Err(LoaderError::EmptyArchiveList);
        }

        let mut libraries = Vec::with_capacity(archives.len());
        for archive in archives {
            libraries.push(Self::load_archive(archive)?);
        }

        logger::debug(&format!(
            "Opened isolation scope over {} archive(s)",
            libraries.len()
        ));

        Ok(Self {
            libraries,
            archives: archives.to_vec(),
        })
    }

    /// Open archives from a platform path-list string (colon-separated on
    /// Unix, semicolon-separated on Windows)
    pub fn from_search_path(list: &str) -> Result<Self, LoaderError> {
        let archives: Vec<PathBuf> = std::env::split_paths(list)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        Self::open(&archives)
    }

    fn load_archive(path: &Path) -> Result<Library, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::ArchiveNotFound(path.to_path_buf()));
        }

        logger::debug(&format!("Loading pipeline archive: {}", path.display()));

        #[cfg(unix)]
        {
            Self::load_unix(path)
        }

        #[cfg(windows)]
        {
            Self::load_windows(path)
        }
    }

    /// Unix-specific archive loading with RTLD_LOCAL
    #[cfg(unix)]
    fn load_unix(path: &Path) -> Result<Library, LoaderError> {
        use libloading::os::unix::Library as UnixLibrary;

        // RTLD_NOW: resolve all symbols immediately so a broken archive fails
        // at init time, not mid-parse.
        // RTLD_LOCAL: keep the archive's symbols out of the global namespace,
        // which is what isolates one bridge instance's pipeline version from
        // another's.
        let flags = libc::RTLD_NOW | libc::RTLD_LOCAL;

        let library = unsafe {
            UnixLibrary::open(Some(path), flags)
                .map_err(|e| LoaderError::LoadFailed(path.to_path_buf(), e.to_string()))?
        };

        Ok(library.into())
    }

    /// Windows-specific archive loading
    #[cfg(windows)]
    fn load_windows(path: &Path) -> Result<Library, LoaderError> {
        let library = unsafe {
            Library::new(path)
                .map_err(|e| LoaderError::LoadFailed(path.to_path_buf(), e.to_string()))?
        };
        Ok(library)
    }

    /// Resolve a symbol by name, scanning the archives in list order
    ///
    /// The first archive that exports the symbol wins, mirroring search-path
    /// precedence. The returned symbol borrows the loader and cannot outlive
    /// it.
    ///
    /// # Safety
    ///
    /// The caller must spell the correct type `T` for the symbol; a mismatch
    /// is undefined behavior, exactly as with `libloading::Library::get`.
    pub unsafe fn get<T>(&self, symbol: &[u8]) -> Result<libloading::Symbol<'_, T>, LoaderError> {
        for library in &self.libraries {
            if let Ok(sym) = library.get::<T>(symbol) {
                return Ok(sym);
            }
        }
        Err(LoaderError::SymbolNotFound {
            symbol: String::from_utf8_lossy(
                symbol.strip_suffix(b"\0").unwrap_or(symbol),
            )
            .into_owned(),
            archives: self
                .archives
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// The archive locations this scope was built from, in order
    pub fn archives(&self) -> &[PathBuf] {
        &self.archives
    }
}

impl std::fmt::Debug for IsolationLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolationLoader")
            .field("archives", &self.archives)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_archive_list_is_rejected() {
        let result = IsolationLoader::open(&[]);
        assert!(matches!(result, Err(LoaderError::EmptyArchiveList)));
    }

    #[test]
    fn test_missing_archive_fails_whole_construction() {
        let result = IsolationLoader::open(&[PathBuf::from("/nonexistent/pipeline.so")]);
        assert!(matches!(result, Err(LoaderError::ArchiveNotFound(_))));
    }

    #[test]
    fn test_search_path_splitting_rejects_missing_entries() {
        // Both entries are parsed out of the list; the first missing one
        // fails construction.
        let result = IsolationLoader::from_search_path("/no/such/a.so:/no/such/b.so");
        assert!(matches!(result, Err(LoaderError::ArchiveNotFound(p)) if p.ends_with("a.so")));
    }

    #[test]
    fn test_empty_search_path_is_rejected() {
        let result = IsolationLoader::from_search_path("");
        assert!(matches!(result, Err(LoaderError::EmptyArchiveList)));
    }

    #[test]
    fn test_non_library_file_fails_to_load() {
        use std::io::Write;
        let Ok(mut file) = tempfile::NamedTempFile::new() else {
            return;
        };
        let _ = file.write_all(b"not a shared library");
        let path = file.path().to_path_buf();
        let result = IsolationLoader::open(&[path.clone()]);
        assert!(matches!(result, Err(LoaderError::LoadFailed(p, _)) if p == path));
    }
}
