pub mod settings_store;
