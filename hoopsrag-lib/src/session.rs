//! One interactive question-answering session
//!
//! A [`Session`] owns everything a run needs: the configuration, the
//! normalized documents, the immutable index built from them, the retriever
//! that embeds questions, and the answer generator. Nothing is cached in
//! process-global state; the index lives exactly as long as the session.
//!
//! With `cache.enabled`, built indexes are also saved to disk and reused by
//! later sessions when the file contents and embedding model are unchanged.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{info, warn};

use crate::config::Config;
use crate::embed::{self, Embedder};
use crate::generate::{AnswerGenerator, Generator, OpenAiGenerator, PromptTemplate};
use crate::normalize::{normalize, NormalizedDocument};
use crate::record::{read_table, RowSkip};
use crate::search::Retriever;
use crate::store::{CacheKey, IndexCache, MemoryIndex, SearchResult, VectorStore};
use crate::Result;

/// The answer to one question
#[derive(Debug, Clone)]
pub struct Reply {
    /// Model output, or the "don't know" sentinel when nothing was retrieved
    pub answer: String,
    /// Retrieved documents the answer was generated from, best first
    pub sources: Vec<SearchResult>,
}

impl Reply {
    /// Whether the language model was consulted at all
    #[must_use]
    pub fn from_context(&self) -> bool {
        !self.sources.is_empty()
    }
}

pub struct Session<E: Embedder = Box<dyn Embedder>, G: Generator = Box<dyn Generator>> {
    config: Config,
    documents: Vec<NormalizedDocument>,
    skipped: Vec<RowSkip>,
    index: MemoryIndex,
    retriever: Retriever<E>,
    answers: AnswerGenerator<G>,
}

impl Session {
    /// Start a session with the backends named in `config`.
    pub fn start(config: Config) -> Result<Self> {
        let embedder = embed::from_config(&config.embedding)?;
        let generator: Box<dyn Generator> = Box::new(OpenAiGenerator::from_config(&config.generation)?);
        Session::with_backends(config, embedder, generator)
    }
}

impl<E: Embedder, G: Generator> Session<E, G> {
    /// Start a session with explicit backends.
    ///
    /// Reads and normalizes the data file, then loads the index from the
    /// cache or builds it.
    pub fn with_backends(config: Config, embedder: E, generator: G) -> Result<Self> {
        config.validate()?;

        let mut retriever = Retriever::new(embedder);
        let answers = AnswerGenerator::new(generator, PromptTemplate::for_language(config.language));
        let (documents, skipped, index) = load(&config, &mut retriever)?;

        info!(
            path = %config.data_path.display(),
            documents = documents.len(),
            skipped = skipped.len(),
            model = index.model_name(),
            "session ready"
        );

        Ok(Self {
            config,
            documents,
            skipped,
            index,
            retriever,
            answers,
        })
    }

    /// Re-read the data file and rebuild the index if anything changed.
    ///
    /// On failure the current documents and index stay in place.
    pub fn reload(&mut self) -> Result<()> {
        let (documents, skipped, index) = load(&self.config, &mut self.retriever)?;
        self.documents = documents;
        self.skipped = skipped;
        self.index = index;
        info!(documents = self.documents.len(), "session reloaded");
        Ok(())
    }

    /// Retrieve the documents nearest to `question`.
    ///
    /// `k` defaults to the configured `top_k`.
    pub fn search(&mut self, question: &str, k: Option<usize>) -> Result<Vec<SearchResult>> {
        let k = k.unwrap_or(self.config.top_k);
        self.retriever.search(&self.index, question, k)
    }

    /// Answer `question` from the `k` nearest documents.
    ///
    /// When nothing is retrieved the "don't know" sentinel is returned
    /// without calling the model. A generation failure leaves the session
    /// usable for the next question.
    pub fn ask(&mut self, question: &str, k: Option<usize>) -> Result<Reply> {
        let sources = self.search(question, k)?;
        if sources.is_empty() {
            return Ok(Reply {
                answer: self.answers.template().unknown_answer().to_string(),
                sources,
            });
        }

        let documents: Vec<NormalizedDocument> = sources.iter().map(|r| r.document.clone()).collect();
        let answer = self.answers.answer(&documents, question)?;
        Ok(Reply { answer, sources })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Normalized documents in input order
    #[must_use]
    pub fn documents(&self) -> &[NormalizedDocument] {
        &self.documents
    }

    /// Rows dropped during normalization
    #[must_use]
    pub fn skipped(&self) -> &[RowSkip] {
        &self.skipped
    }

    #[must_use]
    pub fn index(&self) -> &MemoryIndex {
        &self.index
    }
}

type Loaded = (Vec<NormalizedDocument>, Vec<RowSkip>, MemoryIndex);

fn load<E: Embedder>(config: &Config, retriever: &mut Retriever<E>) -> Result<Loaded> {
    let delimiter = config.delimiter_byte()?;
    let table = read_table(&config.data_path, delimiter)?;
    let template = config.language.template();
    let normalized = normalize(&table, template.as_ref(), config.include_metadata);

    let key = CacheKey {
        fingerprint: table.fingerprint.clone(),
        delimiter,
        language: config.language,
        include_metadata: config.include_metadata,
        model: retriever.embedder().model_name().to_string(),
    };

    // one build per data file at a time
    let lock = build_lock(&config.data_path);
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

    let index = if config.cache.enabled {
        let cache = IndexCache::new(&config.cache.dir);
        match cache.load(&key) {
            Ok(Some(index)) if index.len() == normalized.documents.len() => {
                info!(path = %cache.path_for(&key).display(), "reusing cached index");
                index
            }
            Ok(_) => build_and_save(retriever, &normalized.documents, &cache, &key)?,
            Err(e) => {
                warn!(error = %e, "index cache unusable, rebuilding");
                build_and_save(retriever, &normalized.documents, &cache, &key)?
            }
        }
    } else {
        retriever.build(&normalized.documents)?
    };

    Ok((normalized.documents, normalized.skipped, index))
}

fn build_and_save<E: Embedder>(
    retriever: &mut Retriever<E>,
    documents: &[NormalizedDocument],
    cache: &IndexCache,
    key: &CacheKey,
) -> Result<MemoryIndex> {
    let index = retriever.build(documents)?;
    if let Err(e) = cache.save(key, &index) {
        warn!(error = %e, "could not save index cache");
    }
    Ok(index)
}

fn build_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

    let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key).or_default())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::embed::{Embedding, HashingEmbedder};
    use crate::Error;

    const CSV: &str = "Player;Tm;Data;Opp;MP;PTS;TRB;AST;STL;BLK;FG%\n\
        Jayson Tatum;BOS;2024-01-01;NYK;35;30;8;5;1;1;0.500\n\
        Jaylen Brown;BOS;2024-01-01;NYK;36;24;6;3;2;0;0.476\n\
        Bad Row;BOS;2024-01-01;NYK;36;??;6;3;2;0;0.476\n";

    struct Echo {
        calls: usize,
        fail: bool,
    }

    impl Generator for Echo {
        fn generate(&mut self, _prompt: &str) -> Result<String> {
            self.calls += 1;
            if self.fail {
                Err(Error::Generation("timeout".to_string()))
            } else {
                Ok("Jayson Tatum 30 sayı attı.".to_string())
            }
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn config(dir: &Path, csv: &str) -> Config {
        let data_path = dir.join("games.csv");
        fs::File::create(&data_path)
            .unwrap()
            .write_all(csv.as_bytes())
            .unwrap();

        let mut config = Config::default();
        config.data_path = data_path;
        config.cache.dir = dir.join("cache");
        config
    }

    /// Hashing embedder under a chosen name that counts document batches.
    struct Counting {
        inner: HashingEmbedder,
        name: String,
        document_calls: usize,
    }

    impl Embedder for Counting {
        fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
            self.document_calls += 1;
            self.inner.embed_documents(texts)
        }

        fn embed_query(&mut self, text: &str) -> Result<Embedding> {
            self.inner.embed_query(text)
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn model_name(&self) -> &str {
            &self.name
        }
    }

    fn counted_session(config: Config, name: &str) -> Session<Counting, Echo> {
        let embedder = Counting {
            inner: HashingEmbedder::new(512),
            name: name.to_string(),
            document_calls: 0,
        };
        Session::with_backends(config, embedder, Echo { calls: 0, fail: false }).unwrap()
    }

    fn session(config: Config, fail: bool) -> Session<HashingEmbedder, Echo> {
        Session::with_backends(config, HashingEmbedder::new(512), Echo { calls: 0, fail }).unwrap()
    }

    #[test]
    fn test_start_normalizes_and_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(config(dir.path(), CSV), false);

        assert_eq!(session.documents().len(), 2);
        assert_eq!(session.skipped().len(), 1);
        assert_eq!(session.skipped()[0].row, 3);
        assert_eq!(session.index().len(), 2);
    }

    #[test]
    fn test_missing_file_is_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_path = dir.path().join("missing.csv");

        let result = Session::with_backends(config, HashingEmbedder::new(8), Echo { calls: 0, fail: false });
        assert!(matches!(result, Err(Error::FileAccess { .. })));
    }

    #[test]
    fn test_ask_returns_answer_and_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(config(dir.path(), CSV), false);

        let reply = session.ask("Jayson Tatum kaç sayı attı?", Some(1)).unwrap();
        assert!(reply.from_context());
        assert!(reply.answer.contains("30"));
        assert_eq!(reply.sources.len(), 1);
        assert!(reply.sources[0].document.text.contains("Jayson Tatum"));
    }

    #[test]
    fn test_empty_retrieval_skips_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(config(dir.path(), CSV), false);

        let reply = session.ask("   ", None).unwrap();
        assert!(!reply.from_context());
        assert_eq!(reply.answer, "Bu sorunun cevabı veri setinde bulunmuyor.");
        assert_eq!(session.answers.generator().calls, 0);
    }

    #[test]
    fn test_generation_failure_keeps_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(config(dir.path(), CSV), true);

        assert!(matches!(session.ask("Tatum", None), Err(Error::Generation(_))));
        assert_eq!(session.index().len(), 2);
        assert!(!session.search("Tatum", None).unwrap().is_empty());
    }

    #[test]
    fn test_cache_skips_embedding_on_reuse() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), CSV);

        let first = counted_session(config.clone(), "hashing-512");
        assert_eq!(first.retriever.embedder().document_calls, 1);
        assert_eq!(fs::read_dir(dir.path().join("cache")).unwrap().count(), 1);

        let second = counted_session(config, "hashing-512");
        assert_eq!(second.retriever.embedder().document_calls, 0);
        assert_eq!(first.index(), second.index());
    }

    #[test]
    fn test_changed_file_or_model_rebuilds() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), CSV);
        counted_session(config.clone(), "hashing-512");

        let other_model = counted_session(config.clone(), "hashing-512-v2");
        assert_eq!(other_model.retriever.embedder().document_calls, 1);

        fs::write(&config.data_path, CSV.replace("30;8;5", "31;8;5")).unwrap();
        let edited = counted_session(config, "hashing-512");
        assert_eq!(edited.retriever.embedder().document_calls, 1);
        assert!(edited.documents()[0].text.contains("31"));
    }

    #[test]
    fn test_inconsistent_cache_file_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), CSV);
        counted_session(config.clone(), "hashing-512");

        for entry in fs::read_dir(dir.path().join("cache")).unwrap() {
            let path = entry.unwrap().path();
            let mut stored: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
            stored["index"]["entries"][1]["embedding"] = serde_json::json!([1.0]);
            fs::write(&path, serde_json::to_vec(&stored).unwrap()).unwrap();
        }

        let mut session = counted_session(config, "hashing-512");
        assert_eq!(session.retriever.embedder().document_calls, 1);
        assert_eq!(session.search("Jaylen Brown", Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_build_lock_is_shared_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.csv");
        fs::write(&path, CSV).unwrap();
        let other = dir.path().join("other.csv");
        fs::write(&other, CSV).unwrap();

        let a = build_lock(&path);
        let b = build_lock(&dir.path().join(".").join("games.csv"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &build_lock(&other)));

        let _guard = a.lock().unwrap();
        assert!(b.try_lock().is_err());
    }

    #[test]
    fn test_reload_picks_up_new_rows() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), CSV);
        let mut session = session(config.clone(), false);

        let extra = format!("{CSV}Luka Doncic;DAL;2024-01-26;ATL;44;73;10;7;1;0;0.767\n");
        fs::write(&config.data_path, extra).unwrap();
        session.reload().unwrap();

        assert_eq!(session.documents().len(), 3);
        assert_eq!(session.index().len(), 3);
    }

    #[test]
    fn test_cache_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), CSV);
        config.cache.enabled = false;

        session(config, false);
        assert!(!dir.path().join("cache").exists());
    }
}
