#![no_main]

use libfuzzer_sys::fuzz_target;

// Biases inputs toward anchors, aliases and merge keys.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let s = String::from_utf8_lossy(data);

    let yaml_alias = format!("a: &A {s}\nb: *A\nseq: &S [1, 2, 3]\nseq_alias: *S\n");
    let yaml_merge = format!(
        "base1: &B1 {{k: 1, v: {s}}}\nbase2: &B2 {{k: 2, w: {s}}}\nmerged: {{<<: [*B1, *B2], extra: 3}}\n"
    );
    let yaml_cycle = format!("&root {{self: *root, v: {s}}}\n");

    for y in [&yaml_alias, &yaml_merge, &yaml_cycle] {
        let _ = yaml_codec::load(y);
        if let Ok(doc) = yaml_codec::load_document(y, &Default::default()) {
            let _ = yaml_codec::dump_document(&doc, &Default::default());
        }
    }
});
