#![no_main]

use libfuzzer_sys::fuzz_target;

// Large plain and block scalars. Constructed sizes stay under 1 MiB.
fuzz_target!(|data: &[u8]| {
    if data.len() < 256 {
        return;
    }
    let cap: usize = 1 << 20;
    let chunk = String::from_utf8_lossy(data);

    let mut plain = String::new();
    while plain.len() + chunk.len() <= cap {
        plain.push_str(&chunk);
    }

    let yaml_plain = format!("{plain}\n");
    let yaml_literal = format!("|\n  {plain}\n  {plain}\n");
    let yaml_folded = format!(">-\n  {plain}\n\n  {plain}\n");

    for y in [&yaml_plain, &yaml_literal, &yaml_folded] {
        if let Ok(value) = yaml_codec::load(y) {
            let _ = yaml_codec::dump(&value);
        }
    }
});
