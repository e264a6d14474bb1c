pub mod ascii;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod engine;
pub mod grouping;
pub mod merge;
pub mod numerics;
pub mod pipeline;
pub mod plot;
pub mod project;
pub mod serialization;
