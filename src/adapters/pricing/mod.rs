pub mod toml_catalog;
