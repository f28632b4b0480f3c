pub mod annotate;
pub mod converter;
pub mod non_hanzi;
pub mod numeric;
pub mod postprocess;
pub mod script;
pub mod segment;
pub mod settings;
pub mod store;
pub mod tone;
