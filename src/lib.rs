//! Mandarin text to kana for yukkuri speech engines.
//!
//! The conversion core lives in `ym_core` and is re-exported here. This
//! crate adds the shareable [`Engine`] handle and tracing setup.

mod engine;
mod trace_init;

pub use engine::Engine;
pub use trace_init::{init_stderr_tracing, init_tracing};

pub use ym_core::{
    annotate, converter, non_hanzi, numeric, postprocess, script, segment, settings, store, tone,
};

pub use ym_core::annotate::{Annotator, JiebaTokenizer, PinyinAnnotator, Tokenizer, WholeRun};
pub use ym_core::converter::{ConvertError, ConvertOptions};
pub use ym_core::store::{Fallback, PronunciationRecord, PronunciationStore, StoreError};
pub use ym_core::tone::{FormatError, ToneContext};
