pub mod explorer_runtime;
