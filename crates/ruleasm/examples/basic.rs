//! Basic encoding example — demonstrates the one-shot and batch APIs.
//!
//! Run with: `cargo run --example basic`

use num_bigint::BigUint;
use ruleasm::{encode_one, Encoder, EncodeError, Invocation, Rule, RuleSet, RuleTable, TableOptions};

fn main() -> Result<(), EncodeError> {
    println!("=== ruleasm basic example ===\n");

    // --- Overloaded rule table ---
    let ld = RuleTable::with_options(
        "ld",
        vec![
            Rule::builder("ld").param("x", 8).constant(0x11u32, 8).slice("x", 24).build(),
            Rule::builder("ld").param("x", 16).constant(0x22u32, 8).slice("x", 16).build(),
            Rule::builder("ld").param("x", 24).constant(0x33u32, 8).slice("x", 8).build(),
        ],
        TableOptions::mixed_widths(),
    )?;

    println!("1. Rules:");
    for rule in ld.rules() {
        println!("   {}", rule);
    }

    // --- One-shot encoding ---
    println!("\n2. One-shot encoding (ld 0x215):");
    let out = encode_one(&ld, &[BigUint::from(0x215u32)])?;
    println!("   rule {} -> {}", out.rule(), hex(out.bytes()));

    // --- Failures carry structure ---
    println!("\n3. Failures:");
    for args in [vec![], vec![BigUint::from(0x100_0000u32)]] {
        match encode_one(&ld, &args) {
            Ok(out) => println!("   unexpected success: {}", hex(out.bytes())),
            Err(e) => println!("   {}", e),
        }
    }

    // --- Batch encoding ---
    println!("\n4. Batch encoding with listing:");
    let set = RuleSet::new("demo")
        .with(ld)?
        .with(RuleTable::new(
            "halt",
            vec![Rule::builder("halt").constant(0x76u32, 8).constant(0u32, 8).build()],
        )?)?;

    let mut enc = Encoder::new();
    enc.add_ruleset(set);
    enc.emit(&Invocation::new("ld", [0x215u32]))?;
    enc.emit(&Invocation::new("ld", [0xBEEFu32]))?;
    enc.emit(&Invocation::new("halt", Vec::<u32>::new()))?;
    let result = enc.finish()?;
    for line in result.listing().lines() {
        println!("   {}", line);
    }
    println!("\n   {:X}", result);

    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
