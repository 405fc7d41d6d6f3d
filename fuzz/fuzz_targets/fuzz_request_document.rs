//! Fuzz target for request document and config parsing.
//!
//! Goal: parsing should **never panic** on any input.
//! It may return errors, but panics are unacceptable.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_request_document
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use polsat_settings::Overrides;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(document) = polsat_app::parse_request_document(text) {
        let requests = document.to_requests();
        assert_eq!(requests.len(), document.requests.len());
    }

    if let Ok(cfg) = polsat_settings::parse_config_toml(text) {
        let _ = polsat_settings::resolve_config(cfg, Overrides::default());
    }
});
