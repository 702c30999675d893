use std::io::BufRead;
use std::path::Path;

use crate::input::InputError;
use crate::input::reader::open_maybe_gz;

/// One label per line; blank lines and `#` comments are skipped.
pub fn parse_labels_file(path: &Path) -> Result<Vec<String>, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    let mut labels = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_line(&mut buf).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if read == 0 {
            break;
        }
        let line = buf.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        labels.push(line.to_string());
    }

    if labels.is_empty() {
        return Err(InputError::InvalidInput(format!(
            "labels file {} is empty",
            path.display()
        )));
    }

    Ok(labels)
}

/// Comma-separated labels as given on the command line. Surrounding
/// whitespace is trimmed; inner spaces are part of the label.
pub fn parse_label_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
