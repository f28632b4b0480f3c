use std::io::{self, BufRead};
use std::path::Path;

use yukkuri_engine::{ConvertError, Engine};

pub struct ConvertFlags {
    pub without_accent: bool,
    /// Treat each input as numbered pinyin instead of mixed text.
    pub pinyin: bool,
}

fn open_engine(store: &Path, flags: &ConvertFlags) -> Engine {
    let engine = die!(Engine::open(store), "Error opening store: {}");
    let without_accent = flags.without_accent || engine.options().without_accent;
    let options = engine.options().clone().without_accent(without_accent);
    engine.with_options(options)
}

fn convert_one(engine: &Engine, text: &str, pinyin: bool) -> Result<String, ConvertError> {
    if pinyin {
        engine.convert_pinyin(text)
    } else {
        engine.convert(text)
    }
}

/// Convert each argument, or every stdin line when there are none.
pub fn convert_cmd(store: &Path, texts: &[String], flags: &ConvertFlags) {
    let engine = open_engine(store, flags);
    if texts.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = die!(line, "Error reading stdin: {}");
            let kana = die!(convert_one(&engine, &line, flags.pinyin), "Error: {}");
            println!("{kana}");
        }
    } else {
        for text in texts {
            let kana = die!(convert_one(&engine, text, flags.pinyin), "Error: {}");
            println!("{kana}");
        }
    }
}
