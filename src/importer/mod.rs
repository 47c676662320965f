pub mod events;
pub mod netscape;
pub mod runner;
pub mod url_clean;

pub use events::{ImportEvent, ImportEventKind, ImportSummary};
pub use netscape::{ParsedBookmark, parse_netscape_bookmarks};
pub use runner::{ImportOptions, Importer};
pub use url_clean::remove_utm_params;
