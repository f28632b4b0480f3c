use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use ym_core::annotate::{Annotator, JiebaTokenizer, PinyinAnnotator, Tokenizer};
use ym_core::converter::{ConvertError, ConvertOptions, Converter};
use ym_core::settings::settings;
use ym_core::store::{PronunciationStore, StoreError};

/// Shareable conversion handle: one store, one annotator, one tokenizer and
/// one set of options. Cloning is cheap and every clone converts against the
/// same store.
#[derive(Clone)]
pub struct Engine {
    store: Arc<PronunciationStore>,
    annotator: Arc<dyn Annotator>,
    tokenizer: Arc<dyn Tokenizer>,
    options: Arc<ConvertOptions>,
}

impl Engine {
    /// Engine over `store` with the default annotator and tokenizer and the
    /// options of the active settings.
    pub fn new(store: Arc<PronunciationStore>) -> Self {
        let options = match ConvertOptions::from_settings(settings()) {
            Ok(options) => options,
            Err(e) => {
                debug!(error = %e, "settings rejected, using default options");
                ConvertOptions::default()
            }
        };
        Self {
            store,
            annotator: Arc::new(PinyinAnnotator::new()),
            tokenizer: Arc::new(JiebaTokenizer::new()),
            options: Arc::new(options),
        }
    }

    /// Open (or create) a durable store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(PronunciationStore::open(path)?)))
    }

    pub fn with_annotator(mut self, annotator: impl Annotator + 'static) -> Self {
        self.annotator = Arc::new(annotator);
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Arc::new(tokenizer);
        self
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = Arc::new(options);
        self
    }

    pub fn store(&self) -> &Arc<PronunciationStore> {
        &self.store
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn convert(&self, text: &str) -> Result<String, ConvertError> {
        self.converter().convert(text)
    }

    pub fn convert_bytes(&self, bytes: &[u8]) -> Result<String, ConvertError> {
        self.converter().convert_bytes(bytes)
    }

    pub fn convert_pinyin(&self, text: &str) -> Result<String, ConvertError> {
        self.converter().convert_pinyin(text)
    }

    fn converter(&self) -> Converter<'_> {
        Converter::new(
            &self.store,
            self.annotator.as_ref(),
            self.tokenizer.as_ref(),
            &self.options,
        )
    }
}
