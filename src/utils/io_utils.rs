use crate::utils::Result;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

pub fn create_writer<T, F>(output_prefix: &str, output_suffix: &str, f: F) -> Result<T>
where
    F: FnOnce(&str) -> Result<T>,
{
    let output_path = format!("{}.{}", output_prefix, output_suffix);
    f(&output_path)
}

pub fn count_lines(path: &Path) -> Result<usize> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    let mut count = 0;
    for line in BufReader::new(file).split(b'\n') {
        line.map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn count_lines_with_and_without_trailing_newline() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "a\nb\nc\n").unwrap();
        assert_eq!(count_lines(file.path()).unwrap(), 3);

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "a\nb").unwrap();
        assert_eq!(count_lines(file.path()).unwrap(), 2);

        let file = NamedTempFile::new().unwrap();
        assert_eq!(count_lines(file.path()).unwrap(), 0);
    }

    #[test]
    fn count_lines_missing_file_err() {
        assert!(count_lines(Path::new("/nonexistent/read_info.txt")).is_err());
    }
}
