#![no_main]

use libfuzzer_sys::fuzz_target;
use yaml_codec::{LoadOptions, dump, load_all_with_options};

// Anything that loads must dump, and the dump must load back to the same value.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(values) = load_all_with_options(text, &LoadOptions::default()) else {
        return;
    };
    for value in values {
        let Ok(out) = dump(&value) else {
            continue;
        };
        let back = yaml_codec::load(&out).expect("dumped text must load");
        // NaN never equals itself.
        if !format!("{value:?}").contains("NaN") {
            assert_eq!(back, value, "dumped:\n{out}");
        }
    }
});
