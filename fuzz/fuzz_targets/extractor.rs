#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use bkms::extractor::extract;
use bkms::fetcher::PageResponse;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data).to_string();

    let response = PageResponse::from_html(Url::parse("https://example.com/article").unwrap(), html);

    // Must never panic, whatever the markup
    if let Some(article) = extract(&response) {
        assert!(!article.html.contains("<script"));
    }
});
