//! Integration tests for ruleasm.
//!
//! These tests exercise the public API end-to-end: rule tables in,
//! bit-exact bytes out.

use std::sync::Arc;
use std::thread;

use num_bigint::BigUint;
use ruleasm::{
    encode, encode_one, encode_with, expand, match_rule, pack, EncodeError, Encoder,
    EncoderConfig, Invocation, Padding, Rule, RuleDefect, RuleSet, RuleTable, TableOptions,
    TieBreak,
};

fn big(v: u64) -> BigUint {
    BigUint::from(v)
}

/// `ld {x: u8} => 0x11 @ x`24`, `ld {x: u16} => 0x22 @ x`16`,
/// `ld {x: u24} => 0x33 @ x`8`.
fn fixture() -> RuleTable {
    RuleTable::with_options(
        "ld",
        vec![
            Rule::builder("ld").param("x", 8).constant(0x11u32, 8).slice("x", 24).build(),
            Rule::builder("ld").param("x", 16).constant(0x22u32, 8).slice("x", 16).build(),
            Rule::builder("ld").param("x", 24).constant(0x33u32, 8).slice("x", 8).build(),
        ],
        TableOptions::mixed_widths(),
    )
    .unwrap()
}

/// A small register-machine rule set with fixed 16-bit encodings.
fn toy_isa() -> RuleSet {
    let mut set = RuleSet::new("toy");
    set.insert(
        RuleTable::new(
            "add",
            vec![Rule::builder("add")
                .param("rd", 3)
                .param("rs", 3)
                .constant(0b0001u32, 4)
                .slice("rd", 3)
                .slice("rs", 3)
                .constant(0u32, 6)
                .build()],
        )
        .unwrap(),
    )
    .unwrap();
    set.insert(
        RuleTable::new(
            "li",
            vec![
                Rule::builder("li")
                    .param("rd", 3)
                    .param("imm", 9)
                    .constant(0b0010u32, 4)
                    .slice("rd", 3)
                    .slice("imm", 9)
                    .build(),
                Rule::builder("li")
                    .param("imm", 9)
                    .constant(0b0011u32, 4)
                    .constant(0u32, 3)
                    .slice("imm", 9)
                    .build(),
            ],
        )
        .unwrap(),
    )
    .unwrap();
    set.insert(
        RuleTable::new("halt", vec![Rule::builder("halt").constant(0xFFFFu32, 16).build()])
            .unwrap(),
    )
    .unwrap();
    set
}

// ============================================================================
// Fixture
// ============================================================================

#[test]
fn fixture_0x215_selects_u24_rule() {
    let table = fixture();
    let m = match_rule(&table, &[big(0x215)], TieBreak::LastDeclared).unwrap();
    assert_eq!(m.index, 2);
    assert_eq!(m.rule.parameters()[0].width, 24);
}

#[test]
fn fixture_0x215_encodes_to_33_15() {
    let out = encode_one(&fixture(), &[big(0x215)]).unwrap();
    assert_eq!(out.bytes(), &[0x33, 0x15]);
}

#[test]
fn fixture_value_too_wide_for_every_rule() {
    let err = encode_one(&fixture(), &[big(0x100_0000)]).unwrap_err();
    assert!(matches!(err, EncodeError::NoMatchingRule { .. }));
    assert!(err.is_no_match());
}

#[test]
fn fixture_zero_arguments_is_arity_mismatch() {
    let err = encode_one(&fixture(), &[]).unwrap_err();
    assert!(matches!(err, EncodeError::ArityMismatch { got: 0, .. }));
}

#[test]
fn fixture_two_arguments_is_arity_mismatch() {
    let err = encode_one(&fixture(), &[big(1), big(2)]).unwrap_err();
    assert!(matches!(err, EncodeError::ArityMismatch { got: 2, .. }));
}

#[test]
fn fixture_first_declared_picks_u16_rule() {
    let config = EncoderConfig {
        tie_break: TieBreak::FirstDeclared,
        ..EncoderConfig::default()
    };
    let out = encode_with(&fixture(), &[big(0x215)], &config).unwrap();
    assert_eq!(out.bytes(), &[0x22, 0x02, 0x15]);
}

#[test]
fn fixture_narrowest_picks_u8_rule_for_small_values() {
    let config = EncoderConfig {
        tie_break: TieBreak::Narrowest,
        ..EncoderConfig::default()
    };
    let out = encode_with(&fixture(), &[big(0x12)], &config).unwrap();
    assert_eq!(out.bytes(), &[0x11, 0x00, 0x00, 0x12]);
}

#[test]
fn fixture_width_conflicts_are_flagged() {
    let table = fixture();
    assert_eq!(table.width_conflicts(), vec![(1, 24), (2, 16)]);
    let strict = RuleTable::new("ld", table.rules().to_vec()).unwrap_err();
    assert!(matches!(
        strict,
        EncodeError::MalformedRule {
            rule: 1,
            defect: RuleDefect::WidthMismatch { .. },
            ..
        }
    ));
}

#[test]
fn repeated_encoding_is_identical() {
    let table = fixture();
    let first = encode_one(&table, &[big(0x215)]).unwrap();
    for _ in 0..16 {
        assert_eq!(encode_one(&table, &[big(0x215)]).unwrap(), first);
    }
}

// ============================================================================
// Pipeline pieces through the public API
// ============================================================================

#[test]
fn expand_then_pack_matches_encode() {
    let table = fixture();
    let m = match_rule(&table, &[big(0xBEEF)], TieBreak::LastDeclared).unwrap();
    let bits = expand(m.rule, &[big(0xBEEF)]);
    assert_eq!(
        pack(&bits),
        encode_one(&table, &[big(0xBEEF)]).unwrap().into_bytes()
    );
}

#[test]
fn arguments_beyond_64_bits() {
    let wide = Rule::builder("movabs")
        .param("imm", 128)
        .constant(0x48u32, 8)
        .slice("imm", 128)
        .build();
    let table = RuleTable::new("movabs", vec![wide]).unwrap();
    let imm = (big(0x0123_4567_89AB_CDEF) << 64u32) | big(0xFEDC_BA98_7654_3210);
    let out = encode_one(&table, &[imm]).unwrap();
    assert_eq!(
        out.bytes(),
        &[
            0x48, 0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76,
            0x54, 0x32, 0x10
        ]
    );
}

// ============================================================================
// Rule sets and the batch encoder
// ============================================================================

#[test]
fn toy_isa_encodes_program() {
    let mut enc = Encoder::new();
    enc.add_ruleset(toy_isa());
    enc.emit(&Invocation::new("li", [1u32, 0x1FF])).unwrap();
    enc.emit(&Invocation::new("li", [0x42u32])).unwrap();
    enc.emit(&Invocation::new("add", [1u32, 2])).unwrap();
    enc.emit(&Invocation::new("HALT", Vec::<u32>::new())).unwrap();
    let result = enc.finish().unwrap();
    // li r1, 0x1ff : 0010 001 111111111
    // li 0x42      : 0011 000 001000010
    // add r1, r2   : 0001 001 010 000000
    assert_eq!(
        result.bytes(),
        &[0x23, 0xFF, 0x30, 0x42, 0x12, 0x80, 0xFF, 0xFF]
    );
    assert_eq!(result.records().len(), 4);
    assert_eq!(result.records()[1].rule.index, 1);
}

#[test]
fn toy_isa_register_out_of_range() {
    let err = encode(&toy_isa(), &Invocation::new("add", [8u32, 0])).unwrap_err();
    assert_eq!(
        err,
        EncodeError::NoMatchingRule {
            mnemonic: "add".into(),
            rule: 0,
            arg_index: 0,
            value: big(8),
            width: 3,
        }
    );
}

#[test]
fn unknown_mnemonic_through_ruleset() {
    let err = encode(&toy_isa(), &Invocation::new("jmp", [0u32])).unwrap_err();
    assert!(matches!(err, EncodeError::UnknownMnemonic { .. }));
}

#[test]
fn batch_errors_do_not_stop_later_statements() {
    let mut enc = Encoder::new();
    enc.add_ruleset(toy_isa());
    enc.emit(&Invocation::new("add", [9u32, 0])).unwrap();
    enc.emit(&Invocation::new("halt", Vec::<u32>::new())).unwrap();
    enc.emit(&Invocation::new("li", [1u32, 2, 3])).unwrap();
    assert_eq!(enc.errors().len(), 2);
    assert_eq!(enc.bit_offset(), 16);
    let err = enc.finish().unwrap_err();
    assert!(matches!(err, EncodeError::Multiple { ref errors } if errors.len() == 2));
}

#[test]
fn reject_padding_accepts_aligned_program() {
    let mut enc = Encoder::new();
    enc.padding(Padding::Reject);
    enc.add_ruleset(toy_isa());
    enc.emit(&Invocation::new("halt", Vec::<u32>::new())).unwrap();
    assert_eq!(enc.finish().unwrap().bytes(), &[0xFF, 0xFF]);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn shared_table_across_threads() {
    let table = Arc::new(fixture());
    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let value = 0x200 + i;
                encode_one(&table, &[big(value)]).unwrap().into_bytes()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let bytes = handle.join().unwrap();
        assert_eq!(bytes, vec![0x33, i as u8]);
    }
}

#[test]
fn shared_encoder_across_threads() {
    let mut enc = Encoder::new();
    enc.add_ruleset(toy_isa());
    let enc = Arc::new(enc);
    let handles: Vec<_> = (0..4u32)
        .map(|r| {
            let enc = Arc::clone(&enc);
            thread::spawn(move || enc.encode(&Invocation::new("add", [r, r])).unwrap())
        })
        .collect();
    for handle in handles {
        let out = handle.join().unwrap();
        assert_eq!(out.bit_len(), 16);
    }
}
