use std::path::Path;

use clap::{Parser, Subcommand};

use ym_cli::commands::convert_ops::{self, ConvertFlags};
use ym_cli::commands::{config_ops, store_ops};

#[derive(Parser)]
#[command(name = "ymtool", about = "Mandarin to yukkuri kana conversion tool")]
struct Cli {
    /// Custom settings TOML, loaded before any command runs
    #[arg(long, global = true)]
    settings: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert mixed text to kana (reads stdin lines when no text is given)
    Convert {
        /// Pronunciation store file (default: ~/.local/share/yukkuri/pronunciation.ymp)
        #[arg(long)]
        store: Option<String>,
        /// Strip accent markers and normalise katakana
        #[arg(long)]
        without_accent: bool,
        /// Input text
        text: Vec<String>,
    },
    /// Convert numbered pinyin ("ni3 hao3 ,") to kana
    Pinyin {
        /// Pronunciation store file (default: ~/.local/share/yukkuri/pronunciation.ymp)
        #[arg(long)]
        store: Option<String>,
        /// Strip accent markers and normalise katakana
        #[arg(long)]
        without_accent: bool,
        /// Pinyin input
        text: Vec<String>,
    },
    /// Manage the pronunciation store
    Store {
        /// Pronunciation store file (default: ~/.local/share/yukkuri/pronunciation.ymp)
        #[arg(long)]
        file: Option<String>,
        #[command(subcommand)]
        action: StoreAction,
    },
    /// List every insertable tone context
    Tones,
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Add or replace a pronunciation
    Add {
        /// Pinyin syllable without tone
        syllable: String,
        /// Tone context (three digits, e.g. 023)
        context: String,
        /// Kana
        kana: String,
    },
    /// Search pronunciations of a syllable
    Search {
        syllable: String,
        /// Context pattern, `*` matches any tone
        #[arg(default_value = "***")]
        pattern: String,
    },
    /// Delete pronunciations of a syllable (all contexts when no pattern is given)
    Delete {
        syllable: String,
        /// Context pattern, `*` matches any tone
        pattern: Option<String>,
    },
    /// List all pronunciations
    List,
    /// Import a CSV table (拼音,声调,平假名)
    Import {
        /// CSV file
        file: String,
    },
    /// Export all pronunciations as a CSV table
    Export {
        /// Output CSV file
        file: String,
    },
}

fn store_path(store: Option<String>) -> String {
    store.unwrap_or_else(store_ops::default_store_path)
}

fn main() {
    yukkuri_engine::init_stderr_tracing();
    let cli = Cli::parse();
    if let Some(file) = &cli.settings {
        config_ops::load_settings(file);
    }

    match cli.command {
        Command::Convert {
            store,
            without_accent,
            text,
        } => {
            let flags = ConvertFlags {
                without_accent,
                pinyin: false,
            };
            convert_ops::convert_cmd(Path::new(&store_path(store)), &text, &flags)
        }
        Command::Pinyin {
            store,
            without_accent,
            text,
        } => {
            let flags = ConvertFlags {
                without_accent,
                pinyin: true,
            };
            convert_ops::convert_cmd(Path::new(&store_path(store)), &text, &flags)
        }
        Command::Store { file, action } => {
            let path_str = store_path(file);
            let path = Path::new(&path_str);
            match action {
                StoreAction::Add {
                    syllable,
                    context,
                    kana,
                } => store_ops::store_add(path, &syllable, &context, &kana),
                StoreAction::Search { syllable, pattern } => {
                    store_ops::store_search(path, &syllable, &pattern)
                }
                StoreAction::Delete { syllable, pattern } => {
                    store_ops::store_delete(path, &syllable, pattern.as_deref())
                }
                StoreAction::List => store_ops::store_list(path),
                StoreAction::Import { file } => store_ops::store_import(path, Path::new(&file)),
                StoreAction::Export { file } => store_ops::store_export(path, Path::new(&file)),
            }
        }
        Command::Tones => config_ops::tones(),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
