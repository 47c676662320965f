#![no_main]

use libfuzzer_sys::fuzz_target;

use bkms::importer::parse_netscape_bookmarks;

fuzz_target!(|data: &[u8]| {
    let entries = parse_netscape_bookmarks(data, true);

    let mut seen = std::collections::HashSet::new();
    for entry in &entries {
        assert!(seen.insert(entry.url.as_str()), "duplicate url {}", entry.url);
        assert!(!entry.title.is_empty());
    }
});
