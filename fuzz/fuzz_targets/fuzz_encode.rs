#![no_main]
use libfuzzer_sys::fuzz_target;
use num_bigint::BigUint;
use ruleasm::{Rule, RuleTable, TableOptions, TieBreak};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    // First bytes shape a small overload table; the rest is the argument.
    let declared = u32::from(data[0] % 65);
    let emit = u32::from(data[1] % 65);
    let policy = match data[2] % 4 {
        0 => TieBreak::LastDeclared,
        1 => TieBreak::FirstDeclared,
        2 => TieBreak::Narrowest,
        _ => TieBreak::Reject,
    };
    let rules = vec![
        Rule::builder("f").param("x", declared).constant(0xAu32, 4).slice("x", emit).build(),
        Rule::builder("f").param("x", declared / 2).constant(0xBu32, 4).slice("x", emit).build(),
    ];
    let Ok(table) = RuleTable::with_options("f", rules, TableOptions::mixed_widths()) else {
        return;
    };

    let arg = BigUint::from_bytes_be(&data[3..]);
    let config = ruleasm::EncoderConfig {
        tie_break: policy,
        ..ruleasm::EncoderConfig::default()
    };
    if let Ok(out) = ruleasm::encode_with(&table, &[arg], &config) {
        assert_eq!(out.bytes().len() as u64, (4 + u64::from(emit)).div_ceil(8));
    }
});
