#![no_main]

use libfuzzer_sys::fuzz_target;

// Wraps the input into flow sequences and mappings in several ways.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let s = String::from_utf8_lossy(data);

    let yaml_seq = format!("[{s}]");
    let yaml_map = format!("{{{s}}}");
    let yaml_doc = format!("root: {{{s}}}\narray: [{s}]\n");

    for y in [&yaml_seq, &yaml_map, &yaml_doc] {
        let _ = yaml_codec::load(y);
        let _ = yaml_codec::load_with_options(y, &yaml_codec::load_options! { json: true });
    }
});
