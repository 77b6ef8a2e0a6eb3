use crate::error::RunError;
use std::fs;
use std::path::Path;

/// Read a rules file of `key=value` lines
///
/// Blank lines and lines starting with `#` or `!` are skipped. Keys and values are trimmed, and a
/// `:` can stand in for the `=`.
pub fn load(path: &Path) -> Result<Vec<(String, String)>, RunError> {
    let text = fs::read_to_string(path)?;
    parse(&text).map_err(|(line, message)| RunError::Properties {
        path: path.to_owned(),
        line,
        message,
    })
}

/// Parse the contents of a rules file, failing with the 1-based line number of a bad line
pub fn parse(text: &str) -> Result<Vec<(String, String)>, (usize, &'static str)> {
    let mut entries = vec![];
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .or_else(|| line.split_once(':'))
            .ok_or((number + 1, "expected `key=value`"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err((number + 1, "empty key"));
        }
        entries.push((key.to_owned(), value.trim().to_owned()));
    }
    Ok(entries)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn properties() {
        let text = "
            # Servlet
            javax.servlet = jakarta.servlet
            ! EJB
            javax.ejb.*=jakarta.ejb.*

            jakarta.servlet: [5.0,6)
        ";
        assert_eq!(
            parse(text).unwrap(),
            vec![
                ("javax.servlet".to_owned(), "jakarta.servlet".to_owned()),
                ("javax.ejb.*".to_owned(), "jakarta.ejb.*".to_owned()),
                ("jakarta.servlet".to_owned(), "[5.0,6)".to_owned()),
            ]
        );
    }

    #[test]
    fn bad_lines() {
        assert_eq!(parse("a=b\njavax.servlet\n"), Err((2, "expected `key=value`")));
        assert_eq!(parse(" = jakarta"), Err((1, "empty key")));
    }
}
