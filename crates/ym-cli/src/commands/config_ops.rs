use std::fs;

use yukkuri_engine::non_hanzi::NonHanziModes;
use yukkuri_engine::settings::{self, Settings};
use yukkuri_engine::tone::ToneContext;

pub fn settings_export() {
    print!("{}", settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(settings::parse_settings_toml(&content), "Error: {}");
    println!("{}", settings_summary(&s));
}

/// Install a custom settings file before anything reads the defaults.
pub fn load_settings(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    die!(settings::init_custom(content), "Error loading {file}: {}");
}

fn settings_summary(s: &Settings) -> String {
    let modes = match NonHanziModes::from_settings(&s.non_hanzi) {
        Ok(m) => format!("{m:?}"),
        Err(e) => e.to_string(),
    };
    format!(
        "OK: convert.without_accent={}, store.wal_compact_threshold={}, pinyin_punctuation={} marks\nnon_hanzi: {modes}",
        s.convert.without_accent,
        s.store.wal_compact_threshold,
        s.pinyin_punctuation.len()
    )
}

/// Every context a pronunciation can be stored under, six per line.
pub fn tones() {
    let all: Vec<String> = ToneContext::all_valid().map(|c| c.to_string()).collect();
    for chunk in all.chunks(6) {
        println!("{}", chunk.join(" "));
    }
    println!("---");
    println!("{} contexts", all.len());
}
