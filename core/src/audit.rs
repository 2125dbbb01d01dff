use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

lazy_static! {
    static ref SEPARATORS: Regex = Regex::new(r"[/\\]").expect("valid regex");
    static ref BREAKING: Regex = Regex::new(r#"[\s:*?"<>|\x00-\x1f]"#).expect("valid regex");
}

/// Filesystem-safe file stem for a title: separators become `.`, whitespace
/// and other path-breaking characters become `_`.
pub fn safe_file_name(title: &str) -> String {
    let name = SEPARATORS.replace_all(title, ".");
    let name = BREAKING.replace_all(&name, "_").into_owned();
    match name.as_str() {
        "" | "." | ".." => format!("_{name}"),
        _ => name,
    }
}

pub struct AuditDir {
    root: PathBuf,
}

impl AuditDir {
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        create_dir_all(root.as_ref())?;
        Ok(Self { root: root.as_ref().to_path_buf() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<safe-title>.<seq>.txt`; the sequence number keeps duplicate or
    /// colliding titles apart.
    pub fn path_for(&self, seq: u64, title: &str) -> PathBuf {
        self.root.join(format!("{}.{seq}.txt", safe_file_name(title)))
    }

    /// Write the raw token stream of one document, space separated.
    pub fn write_tokens<'a, I>(&self, seq: u64, title: &str, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = BufWriter::new(File::create(self.path_for(seq, title))?);
        for (i, tok) in tokens.into_iter().enumerate() {
            if i > 0 {
                out.write_all(b" ")?;
            }
            out.write_all(tok.as_bytes())?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn titles_become_safe_names() {
        assert_eq!(safe_file_name("AC/DC"), "AC.DC");
        assert_eq!(safe_file_name("New York City"), "New_York_City");
        assert_eq!(safe_file_name(r"a\b"), "a.b");
        assert_eq!(safe_file_name("What?"), "What_");
        assert_eq!(safe_file_name(".."), "_..");
        assert_eq!(safe_file_name(""), "_");
    }

    #[test]
    fn writes_tokens_space_separated() {
        let dir = tempdir().unwrap();
        let audit = AuditDir::create(dir.path().join("audit")).unwrap();
        audit.write_tokens(0, "Cats and/dogs", ["Cats", "are", "animals."]).unwrap();
        let text = std::fs::read_to_string(audit.path_for(0, "Cats and/dogs")).unwrap();
        assert_eq!(text, "Cats are animals.");
        assert!(audit.root().join("Cats_and.dogs.0.txt").exists());
    }

    #[test]
    fn colliding_titles_get_separate_files() {
        let dir = tempdir().unwrap();
        let audit = AuditDir::create(dir.path()).unwrap();
        audit.write_tokens(3, "A/B", ["slash"]).unwrap();
        audit.write_tokens(4, "A.B", ["dot"]).unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("A.B.3.txt")).unwrap(), "slash");
        assert_eq!(std::fs::read_to_string(dir.path().join("A.B.4.txt")).unwrap(), "dot");
    }
}
