//! Application use cases.

mod check_links_use_case;
mod identify_bot_use_case;

pub use check_links_use_case::{CheckError, CheckLinksUseCase, CheckReport, CheckRequest};
pub use identify_bot_use_case::IdentifyBotUseCase;
