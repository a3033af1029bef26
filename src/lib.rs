#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::similar_names,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

pub mod analysis;
pub mod analytics;
pub mod cache;
pub mod channels;
pub mod config;
pub mod extract;
pub mod providers;
pub mod quota;
pub mod util;

pub use config::Config;
