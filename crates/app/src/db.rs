use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct InvalidDbUrl {
    raw: String,
}

impl fmt::Display for InvalidDbUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid --db value: {}", self.raw)
    }
}

impl std::error::Error for InvalidDbUrl {}

/// Turn `sqlite:relative.db`, a bare path, or an absolute `sqlite://` URL
/// into an absolute `sqlite://` URL. In-memory and shared-cache URLs pass
/// through untouched.
pub fn normalize_sqlite_url(raw: &str) -> Result<String, InvalidDbUrl> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidDbUrl { raw: raw.to_owned() });
    }
    if is_in_memory(trimmed) || trimmed.starts_with("sqlite://") {
        return Ok(trimmed.to_owned());
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    if path_str.is_empty() {
        return Err(InvalidDbUrl { raw: raw.to_owned() });
    }
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(format!("sqlite://{}", absolute.display()))
}

/// Create the database file and its parent directories if missing.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if is_in_memory(db_url) {
        return Ok(());
    }

    let path = db_url.strip_prefix("sqlite://").ok_or_else(|| InvalidDbUrl {
        raw: db_url.to_owned(),
    })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(InvalidDbUrl {
            raw: db_url.to_owned(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn is_in_memory(url: &str) -> bool {
    url == "sqlite::memory:" || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:").unwrap(), "sqlite::memory:");
        let shared = "sqlite:file:memdb?mode=memory&cache=shared";
        assert_eq!(normalize_sqlite_url(shared).unwrap(), shared);
        assert!(prepare_sqlite_file(shared).is_ok());
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/trivia.sqlite3").unwrap();
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("data/trivia.sqlite3"));
        assert!(Path::new(url.trim_start_matches("sqlite://")).is_absolute());
    }

    #[test]
    fn blank_urls_are_rejected() {
        assert!(normalize_sqlite_url("   ").is_err());
        assert!(normalize_sqlite_url("sqlite:").is_err());
    }
}
