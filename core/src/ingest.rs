use crate::audit::AuditDir;
use crate::corpus::{CorpusReader, RawDocument, ReaderStats};
use crate::error::{IndexError, Result};
use crate::index::Index;
use crate::tokenizer::{tokenize, Normalized, Normalizer, Stem};
use crossbeam::channel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Normalizer workers. 0 or 1 runs everything on the calling thread.
    pub threads: usize,
    pub channel_capacity: usize,
    /// Log progress every N committed documents. 0 disables.
    pub progress_every: u64,
    /// Mirror each document's raw tokens into this directory.
    pub audit_dir: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            channel_capacity: 256,
            progress_every: 1000,
            audit_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub documents: u64,
    pub postings: u64,
    pub rejected_noise: u64,
    pub rejected_stopwords: u64,
    pub reader: ReaderStats,
    pub elapsed: Duration,
}

struct Analyzed {
    seq: u64,
    title: String,
    author: String,
    timestamp: String,
    terms: Vec<String>,
    noise: u64,
    stopwords: u64,
}

fn analyze<S: Stem>(
    normalizer: &Normalizer<S>,
    audit: Option<&AuditDir>,
    seq: u64,
    raw: RawDocument,
) -> Analyzed {
    let text = raw.text.as_deref().unwrap_or_default();
    if let Some(audit) = audit {
        if let Err(e) = audit.write_tokens(seq, &raw.title, tokenize(text)) {
            tracing::warn!(title = %raw.title, error = %e, "audit write failed");
        }
    }

    let mut terms = Vec::new();
    let (mut noise, mut stopwords) = (0, 0);
    for token in tokenize(text) {
        match normalizer.normalize(token) {
            Normalized::Term(t) => terms.push(t),
            Normalized::Noise => noise += 1,
            Normalized::Stopword => stopwords += 1,
        }
    }
    Analyzed {
        seq,
        title: raw.title,
        author: raw.author,
        timestamp: raw.timestamp,
        terms,
        noise,
        stopwords,
    }
}

fn commit<I: Index>(
    index: &mut I,
    doc: Analyzed,
    report: &mut IngestReport,
    config: &IngestConfig,
) -> Result<()> {
    let id = index.add_document(&doc.title, &doc.author, &doc.timestamp);
    for term in &doc.terms {
        index.add_word_for_document(id, term)?;
    }
    report.documents += 1;
    report.postings += doc.terms.len() as u64;
    report.rejected_noise += doc.noise;
    report.rejected_stopwords += doc.stopwords;
    if config.progress_every > 0 && report.documents % config.progress_every == 0 {
        tracing::info!(docs = report.documents, terms = index.num_words(), "indexing progress");
    }
    Ok(())
}

/// Open the corpus at `path` and ingest it into `index`.
pub fn ingest_path<S, I>(
    path: &Path,
    normalizer: &Normalizer<S>,
    index: &mut I,
    config: &IngestConfig,
) -> Result<IngestReport>
where
    S: Stem,
    I: Index,
{
    ingest(CorpusReader::open(path)?, normalizer, index, config)
}

/// Ingest every accepted page. With more than one thread, a reader thread
/// feeds a pool of normalizer workers and the calling thread commits their
/// output strictly in corpus order, so ids match a sequential build.
pub fn ingest<R, S, I>(
    reader: CorpusReader<R>,
    normalizer: &Normalizer<S>,
    index: &mut I,
    config: &IngestConfig,
) -> Result<IngestReport>
where
    R: BufRead + Send,
    S: Stem,
    I: Index,
{
    let start = Instant::now();
    let audit = config.audit_dir.as_ref().map(AuditDir::create).transpose()?;
    let mut report = if config.threads <= 1 {
        ingest_sequential(reader, normalizer, audit.as_ref(), index, config)?
    } else {
        ingest_parallel(reader, normalizer, audit.as_ref(), index, config)?
    };
    report.elapsed = start.elapsed();
    tracing::info!(
        docs = report.documents,
        postings = report.postings,
        excluded = report.reader.excluded,
        untitled = report.reader.untitled,
        elapsed_s = report.elapsed.as_secs_f64(),
        "ingestion complete"
    );
    Ok(report)
}

fn ingest_sequential<R, S, I>(
    mut reader: CorpusReader<R>,
    normalizer: &Normalizer<S>,
    audit: Option<&AuditDir>,
    index: &mut I,
    config: &IngestConfig,
) -> Result<IngestReport>
where
    R: BufRead,
    S: Stem,
    I: Index,
{
    let mut report = IngestReport::default();
    let mut seq = 0;
    while let Some(raw) = reader.next_document()? {
        commit(index, analyze(normalizer, audit, seq, raw), &mut report, config)?;
        seq += 1;
    }
    report.reader = reader.stats();
    Ok(report)
}

fn ingest_parallel<R, S, I>(
    mut reader: CorpusReader<R>,
    normalizer: &Normalizer<S>,
    audit: Option<&AuditDir>,
    index: &mut I,
    config: &IngestConfig,
) -> Result<IngestReport>
where
    R: BufRead + Send,
    S: Stem,
    I: Index,
{
    let capacity = config.channel_capacity.max(1);
    std::thread::scope(|s| {
        let (job_tx, job_rx) = channel::bounded::<(u64, RawDocument)>(capacity);
        let (out_tx, out_rx) = channel::bounded::<Analyzed>(capacity);

        let producer = s.spawn(move || -> Result<ReaderStats> {
            let mut seq = 0;
            while let Some(raw) = reader.next_document()? {
                if job_tx.send((seq, raw)).is_err() {
                    // writer gave up, nothing left to feed
                    break;
                }
                seq += 1;
            }
            Ok(reader.stats())
        });

        let workers: Vec<_> = (0..config.threads)
            .map(|_| {
                let job_rx = job_rx.clone();
                let out_tx = out_tx.clone();
                s.spawn(move || {
                    for (seq, raw) in job_rx {
                        if out_tx.send(analyze(normalizer, audit, seq, raw)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(job_rx);
        drop(out_tx);

        let mut report = IngestReport::default();
        let mut pending: BTreeMap<u64, Analyzed> = BTreeMap::new();
        let mut next = 0u64;
        let mut failure: Option<IndexError> = None;
        'recv: for analyzed in out_rx.iter() {
            pending.insert(analyzed.seq, analyzed);
            while let Some(doc) = pending.remove(&next) {
                if let Err(e) = commit(index, doc, &mut report, config) {
                    failure = Some(e);
                    break 'recv;
                }
                next += 1;
            }
        }
        drop(out_rx);

        for worker in workers {
            if worker.join().is_err() {
                failure.get_or_insert(IndexError::StageFailed("normalizer worker panicked".into()));
            }
        }
        let stats = match producer.join() {
            Ok(res) => res,
            Err(_) => Err(IndexError::StageFailed("corpus reader panicked".into())),
        };
        if let Some(e) = failure {
            return Err(e);
        }
        report.reader = stats?;
        if !pending.is_empty() {
            return Err(IndexError::StageFailed(format!(
                "document {next} never arrived from workers"
            )));
        }
        Ok(report)
    })
}
