//! Static file replies.
//!
//! Files that fit the body buffer are read into memory; anything larger is
//! handed to the transmitter as an open [`FileStream`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Limits;
use crate::http::response::{FileStream, Response};

pub fn serve(root: &Path, path: &str, limits: &Limits) -> Response {
    let Some(relative) = resolve(path) else {
        return Response::not_found();
    };
    let full = root.join(relative);

    // Special files such as FIFOs can block on open.
    match fs::metadata(&full) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Response::not_found(),
        Err(e) => {
            debug!(path = %full.display(), error = %e, "static file unavailable");
            return Response::not_found();
        }
    }

    let file = match open_nonblocking(&full) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %full.display(), error = %e, "static file unavailable");
            return Response::not_found();
        }
    };

    let size = match file.metadata() {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => return Response::not_found(),
        Err(e) => {
            debug!(path = %full.display(), error = %e, "stat failed");
            return Response::not_found();
        }
    };

    if size > limits.max_body as u64 {
        debug!(path = %full.display(), size, "streaming file");
        return Response::file(FileStream::new(file, size));
    }

    let mut buf = Vec::with_capacity(size as usize);
    match file.take(size).read_to_end(&mut buf) {
        Ok(n) if n as u64 == size => Response::ok(buf),
        Ok(n) => {
            warn!(path = %full.display(), expected = size, read = n, "file shrank while reading");
            Response::internal_error()
        }
        Err(e) => {
            warn!(path = %full.display(), error = %e, "reading file failed");
            Response::internal_error()
        }
    }
}

/// Opens read-only without waiting on a special file that replaced the
/// regular one after the metadata check.
fn open_nonblocking(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NONBLOCK);
    }
    options.open(path)
}

/// Maps a request target onto a path relative to the static root.
///
/// Rejects the bare root and anything that could step outside it.
fn resolve(path: &str) -> Option<PathBuf> {
    let relative = path.strip_prefix('/')?;
    if relative.is_empty() {
        return None;
    }

    let relative = Path::new(relative);
    let safe = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    safe.then(|| relative.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_strips_leading_slash() {
        assert_eq!(resolve("/a/b.txt"), Some(PathBuf::from("a/b.txt")));
    }

    #[test]
    fn resolve_rejects_parent_components() {
        assert_eq!(resolve("/../etc/passwd"), None);
        assert_eq!(resolve("/a/../../b"), None);
    }

    #[test]
    fn resolve_rejects_root_and_relative_targets() {
        assert_eq!(resolve("/"), None);
        assert_eq!(resolve("index.html"), None);
        assert_eq!(resolve("//etc/passwd"), None);
    }
}
