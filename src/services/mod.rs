pub mod archive;
pub mod atomic;
pub mod backend;
pub mod collect;
pub mod config;
pub mod encoding;
pub mod filter;
pub mod pipeline;
pub mod qa;
pub mod rebuild;
pub mod session;
pub mod smart;
pub mod tokenizer;
pub mod translation_memory;
