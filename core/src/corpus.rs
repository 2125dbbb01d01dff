use crate::error::{IndexError, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const NO_AUTHOR: &str = "No author information given";
pub const NO_TIMESTAMP: &str = "No timestamp given";

/// Title prefixes of namespaces that are never indexed.
pub const EXCLUDED_PREFIXES: [&str; 2] = ["User", "File"];

/// One accepted page, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub title: String,
    pub author: String,
    pub timestamp: String,
    /// `None` when the revision carries no text body.
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub accepted: u64,
    pub excluded: u64,
    pub untitled: u64,
}

/// Case-sensitive prefix test on the first four characters of the title.
pub fn is_excluded_title(title: &str) -> bool {
    EXCLUDED_PREFIXES.iter().any(|p| title.starts_with(p))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Username,
    Timestamp,
    Text,
}

#[derive(Debug, Default)]
struct Revision {
    author: Option<String>,
    timestamp: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Default)]
struct Page {
    title: Option<String>,
    current: Option<Revision>,
    latest: Option<Revision>,
}

impl Page {
    fn set(&mut self, field: Field, value: String) {
        if field == Field::Title {
            self.title = Some(value);
            return;
        }
        let Some(rev) = self.current.as_mut() else { return };
        match field {
            Field::Username => rev.author = Some(value),
            Field::Timestamp => rev.timestamp = Some(value),
            Field::Text => rev.text = Some(value),
            Field::Title => {}
        }
    }
}

struct Capture {
    field: Field,
    depth: usize,
    value: String,
}

/// Pull reader yielding one `<page>` at a time from a `<mediawiki>`-style dump.
pub struct CorpusReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    stack: Vec<Vec<u8>>,
    page: Option<Page>,
    capture: Option<Capture>,
    stats: ReaderStats,
    seen_root: bool,
    finished: bool,
}

impl CorpusReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "opened corpus");
        Ok(Self::new(BufReader::new(f)))
    }
}

impl<R: BufRead> CorpusReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            stack: Vec::new(),
            page: None,
            capture: None,
            stats: ReaderStats::default(),
            seen_root: false,
            finished: false,
        }
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Advance to the next accepted page. `Ok(None)` once the corpus is exhausted.
    pub fn next_document(&mut self) -> Result<Option<RawDocument>> {
        if self.finished {
            return Ok(None);
        }
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(ev) => ev.into_owned(),
                Err(e) => {
                    self.finished = true;
                    return Err(e.into());
                }
            };
            match event {
                Event::Start(e) => {
                    let name = e.local_name().as_ref().to_vec();
                    self.check_root(&name)?;
                    self.open_element(name);
                }
                Event::Empty(e) => {
                    let name = e.local_name().as_ref().to_vec();
                    self.check_root(&name)?;
                    self.open_element(name);
                    if let Some(doc) = self.close_element()? {
                        return Ok(Some(doc));
                    }
                }
                Event::End(_) => {
                    if let Some(doc) = self.close_element()? {
                        return Ok(Some(doc));
                    }
                }
                Event::Text(t) => {
                    if let Some(cap) = self.capture.as_mut() {
                        cap.value.push_str(&t.unescape()?);
                    }
                }
                Event::CData(c) => {
                    if let Some(cap) = self.capture.as_mut() {
                        cap.value.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Event::Eof => {
                    self.finished = true;
                    if !self.seen_root {
                        return Err(IndexError::MalformedCorpus("no root element".into()));
                    }
                    if let Some(open) = self.stack.last() {
                        return Err(IndexError::MalformedCorpus(format!(
                            "unexpected end of corpus inside <{}>",
                            String::from_utf8_lossy(open)
                        )));
                    }
                    tracing::debug!(stats = ?self.stats, "corpus exhausted");
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    /// Pages must sit inside exactly one root element.
    fn check_root(&mut self, name: &[u8]) -> Result<()> {
        if !self.stack.is_empty() {
            return Ok(());
        }
        let problem = if self.seen_root {
            "more than one root element"
        } else if name == b"page" {
            "<page> outside a root element"
        } else {
            self.seen_root = true;
            return Ok(());
        };
        self.finished = true;
        Err(IndexError::MalformedCorpus(problem.into()))
    }

    fn parent_is(&self, depth_from_top: usize, name: &[u8]) -> bool {
        self.stack.len() > depth_from_top
            && self.stack[self.stack.len() - 1 - depth_from_top].as_slice() == name
    }

    fn open_element(&mut self, name: Vec<u8>) {
        let field = match name.as_slice() {
            b"page" => {
                self.page = Some(Page::default());
                None
            }
            b"revision" if self.parent_is(0, b"page") => {
                if let Some(page) = self.page.as_mut() {
                    page.current = Some(Revision::default());
                }
                None
            }
            b"title" if self.parent_is(0, b"page") => Some(Field::Title),
            b"timestamp" if self.parent_is(0, b"revision") => Some(Field::Timestamp),
            b"text" if self.parent_is(0, b"revision") => Some(Field::Text),
            b"username" if self.parent_is(0, b"contributor") && self.parent_is(1, b"revision") => {
                Some(Field::Username)
            }
            _ => None,
        };
        self.stack.push(name);
        if let (Some(field), Some(_)) = (field, self.page.as_ref()) {
            self.capture = Some(Capture { field, depth: self.stack.len(), value: String::new() });
        }
    }

    fn close_element(&mut self) -> Result<Option<RawDocument>> {
        let depth = self.stack.len();
        let Some(name) = self.stack.pop() else {
            return Err(IndexError::MalformedCorpus("closing tag without an open element".into()));
        };

        if self.capture.as_ref().is_some_and(|c| c.depth == depth) {
            if let (Some(cap), Some(page)) = (self.capture.take(), self.page.as_mut()) {
                page.set(cap.field, cap.value);
            }
        }

        match name.as_slice() {
            b"revision" if self.parent_is(0, b"page") => {
                if let Some(page) = self.page.as_mut() {
                    page.latest = page.current.take();
                }
                Ok(None)
            }
            b"page" => Ok(self.page.take().and_then(|page| self.finish_page(page))),
            _ => Ok(None),
        }
    }

    fn finish_page(&mut self, page: Page) -> Option<RawDocument> {
        let title = page.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let Some(title) = title else {
            self.stats.untitled += 1;
            tracing::warn!(untitled = self.stats.untitled, "skipping page without a title");
            return None;
        };
        if is_excluded_title(&title) {
            self.stats.excluded += 1;
            tracing::debug!(%title, "skipping excluded namespace");
            return None;
        }

        let rev = page.latest.unwrap_or_default();
        let author = non_blank(rev.author).unwrap_or_else(|| NO_AUTHOR.to_string());
        let timestamp = non_blank(rev.timestamp).unwrap_or_else(|| NO_TIMESTAMP.to_string());
        self.stats.accepted += 1;
        Some(RawDocument { title, author, timestamp, text: rev.text })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl<R: BufRead> Iterator for CorpusReader<R> {
    type Item = Result<RawDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_document().transpose()
    }
}
