//! Reading documents and `key=value` arguments

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{CliError, Result};

/// Default ceiling on input size (1 MiB)
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 1024 * 1024;

/// Read a document from a file, or from stdin when `path` is `-`
///
/// Input larger than `max_size` bytes is rejected before it is parsed.
pub fn read_document(path: &Path, max_size: u64) -> Result<String> {
    let bytes = if path.as_os_str() == "-" {
        read_limited(io::stdin().lock(), max_size).map_err(CliError::from)?
    } else {
        let file = File::open(path).map_err(|e| CliError::io_at(path, e))?;
        let len = file.metadata().map_err(|e| CliError::io_at(path, e))?.len();
        if len > max_size {
            return Err(too_large(max_size));
        }
        read_limited(file, max_size).map_err(|e| CliError::io_at(path, e))?
    };

    if bytes.len() as u64 > max_size {
        return Err(too_large(max_size));
    }

    String::from_utf8(bytes).map_err(|_| CliError::usage(format!("{} is not valid UTF-8", display_name(path))))
}

fn read_limited(reader: impl Read, max_size: u64) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    // one byte past the ceiling is enough to tell it was exceeded
    reader.take(max_size.saturating_add(1)).read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn too_large(max_size: u64) -> CliError {
    CliError::usage_with_help(
        format!("Input exceeds the maximum size of {} bytes", max_size),
        "Raise the limit with --max-size or BERTH_MAX_INPUT_SIZE",
    )
}

/// Name of the input for messages
pub fn display_name(path: &Path) -> String {
    if path.as_os_str() == "-" {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

/// Parse repeated `key=value` arguments; later keys win
pub fn parse_key_values(flag: &str, args: &[String]) -> Result<IndexMap<String, String>> {
    let mut map = IndexMap::new();
    for arg in args {
        let (key, value) = arg.split_once('=').ok_or_else(|| {
            CliError::usage(format!("Invalid --{} format: '{}'. Expected key=value", flag, arg))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::usage(format!("Invalid --{} format: '{}'. Key is empty", flag, arg)));
        }
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_key_values() {
        let args = vec!["team=core".to_string(), "tier=web=1".to_string(), "team=infra".to_string()];
        let map = parse_key_values("label", &args).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["team"], "infra");
        assert_eq!(map["tier"], "web=1");
    }

    #[test]
    fn test_parse_key_values_rejects() {
        let err = parse_key_values("label", &["novalue".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Expected key=value"));
        assert!(parse_key_values("label", &["=x".to_string()]).is_err());
    }

    #[test]
    fn test_read_document_size_ceiling() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "services: {{}}").unwrap();

        assert!(read_document(file.path(), 1024).is_ok());
        let err = read_document(file.path(), 4).unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::USAGE_ERROR);
    }

    #[test]
    fn test_read_document_missing_file() {
        let err = read_document(Path::new("/nonexistent/compose.yml"), 1024).unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::IO_ERROR);
    }

    #[test]
    fn test_read_limited_stops_past_ceiling() {
        let data = vec![b'a'; 100];
        let bytes = read_limited(&data[..], 10).unwrap();
        assert_eq!(bytes.len(), 11);
    }
}
