//! dkim-keyscan CLI: batch-GCD scan of DKIM key records.
//!
//! Usage:
//!   dkim-keyscan                      Run the built-in demonstration
//!   dkim-keyscan --file=<path>        Scan records from a file, one per line
//!   dkim-keyscan --file=<path> --json Emit findings as JSON
//!
//! Set RUST_LOG=debug to see why individual records were skipped.

use std::process;

use rand::thread_rng;

use dkim_keyscan::{extract, keygen, scan_records, CompromisedKey};

/// Two real-world style DKIM records whose 512-bit moduli share a prime.
const REFERENCE_RECORDS: [&str; 2] = [
    "v=DKIM1; k=rsa; p=MFwwDQYJKoZIhvcNAQEBBQADSwAwSAJBAMBe7mWbuirQNM7FLN9MEPLZquGCdNUq8EZMPEHWudxWVpQ0Gbgkq5CXJkqubPCrplFXjSQWT9ASj7A1hh7I17kCAwEAAQ==",
    "v=DKIM1; k=rsa; p=MFwwDQYJKoZIhvcNAQEBBQADSwAwSAJBAKVkxerC5fDCyhSkvPgeh0jEEV3+rxqxYATGbpgsQeIlhI15keYO7KoixpyEV3DcLZdBlOIqeLOUt0O7CvOpG9kCAwEAAQ==",
];

struct CliConfig {
    file: Option<String>,
    json: bool,
}

fn parse_args() -> CliConfig {
    let mut config = CliConfig {
        file: None,
        json: false,
    };
    for arg in std::env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--file=") {
            config.file = Some(path.to_string());
        } else if arg == "--json" {
            config.json = true;
        } else {
            eprintln!("unknown argument: {}", arg);
            process::exit(2);
        }
    }
    config
}

fn main() {
    env_logger::init();
    let config = parse_args();

    match config.file {
        Some(path) => scan_file(&path, config.json),
        None => demo(),
    }
}

fn scan_file(path: &str, json: bool) {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            eprintln!("cannot read {}: {}", path, err);
            process::exit(1);
        }
    };
    let records: Vec<&str> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let findings = scan_records(&records);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&findings).expect("findings serialize to JSON")
        );
    } else {
        print_findings(&findings, records.len());
    }
}

fn print_findings(findings: &[CompromisedKey], total: usize) {
    if findings.is_empty() {
        println!("No shared prime factors found across {} records.", total);
        return;
    }
    println!("{} compromised keys detected!", findings.len());
    let mut sorted: Vec<&CompromisedKey> = findings.iter().collect();
    sorted.sort_by_key(|finding| finding.index);
    for finding in sorted {
        println!(
            "  index {}: {}-bit modulus factored",
            finding.index,
            finding.bit_length()
        );
        println!("    p = {}", finding.p);
        println!("    q = {}", finding.q);
    }
}

fn demo() {
    println!("=== dkim-keyscan: shared-prime batch-GCD demonstration ===\n");

    section_1_reference_records();
    section_2_generated_batch();
    section_3_legacy_exponent();
}

// -------------------------------------------------------------------------
// Section 1 — Reference records with a known shared prime
// -------------------------------------------------------------------------

fn section_1_reference_records() {
    println!("--- Section 1: Reference Records ---\n");

    let findings = scan_records(&REFERENCE_RECORDS);
    print_findings(&findings, REFERENCE_RECORDS.len());
    println!();
}

// -------------------------------------------------------------------------
// Section 2 — Freshly generated weak batch
// -------------------------------------------------------------------------

fn section_2_generated_batch() {
    println!("--- Section 2: Generated Weak Batch ---\n");

    let mut rng = thread_rng();

    // Four keys sharing one prime, one independent key, and one ed25519
    // record that extraction will skip.
    let mut records = keygen::shared_prime_records(512, 4, &mut rng);
    records.push(keygen::rsa_record(512, &mut rng));
    records.push("v=DKIM1; k=ed25519; p=11qYAYKxCrfVS/7TyWQHOg7hcvPapiMlrwIaaPcHURo=".to_string());

    println!(
        "Scanning {} records (the ed25519 record will be skipped)...",
        records.len()
    );
    let findings = scan_records(&records);
    print_findings(&findings, records.len());
    println!();
}

// -------------------------------------------------------------------------
// Section 3 — Legacy public exponent advisory
// -------------------------------------------------------------------------

fn section_3_legacy_exponent() {
    println!("--- Section 3: Legacy Exponent Advisory ---\n");

    let mut rng = thread_rng();
    let record = keygen::legacy_exponent_record(512, 17, &mut rng);
    println!("Generated key record with e=17 (run with RUST_LOG=warn to see the advisory):");

    match extract::rsa_modulus(&record) {
        Some(n) => println!("  modulus extracted anyway: {} bits", n.bits()),
        None => println!("  extraction unexpectedly failed"),
    }
    println!();
}
