//! Integration tests for first scans

use memsift::{
    Address, AddressBounds, BufferAccessor, BytePattern, Protection, ScanComparison, ScanEngine,
    ScanOperand, ScanSession, ScanSettings, ScanState, ScanValue, ScanValueType, SerialAccessor,
    TextEncoding, TextNeedle,
};
use pretty_assertions::assert_eq;

fn i32_bytes(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn collect_addresses(session: &ScanSession) -> Vec<u64> {
    session
        .store()
        .expect("session has a store")
        .iter()
        .unwrap()
        .map(|m| m.unwrap().address.as_u64())
        .collect()
}

#[test]
fn exact_integer_scan_finds_single_cell() {
    let accessor = BufferAccessor::new()
        .with_segment(Address::new(0x1000), i32_bytes(&[5, 10, 15, 20]));
    let engine = ScanEngine::new(&accessor);
    let mut session = ScanSession::new();

    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Exact,
        ScanOperand::Value(ScanValue::Integer(10)),
    )
    .with_alignment(4);
    let summary = engine.execute(&mut session, &settings).unwrap();

    assert_eq!(summary.state, ScanState::Completed);
    assert_eq!(collect_addresses(&session), vec![0x1004]);
}

#[test]
fn between_scan_is_inclusive() {
    let accessor = BufferAccessor::new()
        .with_segment(Address::new(0x1000), i32_bytes(&[4, 5, 7, 10, 11]));
    let engine = ScanEngine::new(&accessor);
    let mut session = ScanSession::new();

    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Between,
        ScanOperand::Range {
            low: ScanValue::Integer(5),
            high: ScanValue::Integer(10),
        },
    );
    engine.execute(&mut session, &settings).unwrap();

    assert_eq!(collect_addresses(&session), vec![0x1004, 0x1008, 0x100C]);
}

#[test]
fn scan_spans_multiple_regions() {
    let accessor = BufferAccessor::new()
        .with_segment(Address::new(0x1000), i32_bytes(&[42, 0]))
        .with_segment(Address::new(0x8000), i32_bytes(&[0, 42]));
    let engine = ScanEngine::new(&accessor);
    let mut session = ScanSession::new();

    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Exact,
        ScanOperand::Value(ScanValue::Integer(42)),
    );
    engine.execute(&mut session, &settings).unwrap();

    assert_eq!(collect_addresses(&session), vec![0x1000, 0x8004]);
}

#[test]
fn bounds_restrict_the_sweep() {
    let accessor = BufferAccessor::new()
        .with_segment(Address::new(0x1000), i32_bytes(&[42; 8]))
        .with_segment(Address::new(0x8000), i32_bytes(&[42; 8]));
    let engine = ScanEngine::new(&accessor);
    let mut session = ScanSession::new();

    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Exact,
        ScanOperand::Value(ScanValue::Integer(42)),
    )
    .with_bounds(AddressBounds::new(Address::new(0x8000), Address::new(0x8008)));
    engine.execute(&mut session, &settings).unwrap();

    assert_eq!(collect_addresses(&session), vec![0x8000, 0x8004]);
}

#[test]
fn region_filter_narrows_the_sweep() {
    use memsift::RegionFilter;

    let accessor = BufferAccessor::new()
        .with_protected_segment(Address::new(0x1000), i32_bytes(&[42]), Protection::read())
        .with_segment(Address::new(0x2000), i32_bytes(&[42]));
    let engine = ScanEngine::new(&accessor);
    let mut session = ScanSession::new();

    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Exact,
        ScanOperand::Value(ScanValue::Integer(42)),
    )
    .with_region_filter(RegionFilter::new().writable());
    engine.execute(&mut session, &settings).unwrap();

    assert_eq!(collect_addresses(&session), vec![0x2000]);
}

#[test]
fn unreadable_regions_are_skipped() {
    let accessor = BufferAccessor::new()
        .with_segment(Address::new(0x1000), i32_bytes(&[42]))
        .with_protected_segment(Address::new(0x2000), i32_bytes(&[42]), Protection::none());
    let engine = ScanEngine::new(&accessor);
    let mut session = ScanSession::new();

    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Exact,
        ScanOperand::Value(ScanValue::Integer(42)),
    );
    engine.execute(&mut session, &settings).unwrap();

    assert_eq!(collect_addresses(&session), vec![0x1000]);
}

#[test]
fn match_straddling_chunk_boundary_is_found_once() {
    // Default chunk size is 64 KiB; plant a match across that boundary
    let mut bytes = vec![0u8; 3 * 65536];
    let target = 65536 - 2;
    bytes[target..target + 4].copy_from_slice(&0x11223344i32.to_le_bytes());
    let accessor = BufferAccessor::new().with_segment(Address::new(0x10000), bytes);
    let engine = ScanEngine::new(&accessor);
    let mut session = ScanSession::new();

    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Exact,
        ScanOperand::Value(ScanValue::Integer(0x11223344)),
    )
    .with_alignment(2);
    let summary = engine.execute(&mut session, &settings).unwrap();

    assert_eq!(summary.matches, 1);
    assert_eq!(collect_addresses(&session), vec![0x10000 + target as u64]);
}

#[test]
fn pattern_scan_matches_wildcards() {
    let mut bytes = vec![0u8; 64];
    // Two windows that begin with 4D 5A, different tails
    bytes[0] = 0x4D;
    bytes[1] = 0x5A;
    bytes[2] = 0x90;
    bytes[3] = 0x00;
    bytes[32] = 0x4D;
    bytes[33] = 0x5A;
    bytes[34] = 0xFF;
    bytes[35] = 0x13;
    let accessor = BufferAccessor::new().with_segment(Address::new(0x4000), bytes);
    let engine = ScanEngine::new(&accessor);
    let mut session = ScanSession::new();

    let settings = ScanSettings::first_scan(
        ScanValueType::ArrayOfBytes,
        ScanComparison::Exact,
        ScanOperand::Pattern(BytePattern::from_hex_str("4D 5A ?? ??").unwrap()),
    );
    engine.execute(&mut session, &settings).unwrap();

    assert_eq!(collect_addresses(&session), vec![0x4000, 0x4020]);
}

#[test]
fn string_scan_finds_utf8_and_utf16() {
    let mut bytes = vec![0u8; 64];
    bytes[4..8].copy_from_slice(b"gold");
    // "gold" as UTF-16LE
    let wide: Vec<u8> = "gold".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    bytes[32..40].copy_from_slice(&wide);
    let accessor = BufferAccessor::new().with_segment(Address::new(0x6000), bytes);
    let engine = ScanEngine::new(&accessor);

    let mut session = ScanSession::new();
    let narrow = ScanSettings::first_scan(
        ScanValueType::String,
        ScanComparison::Exact,
        ScanOperand::Text(TextNeedle::new("gold", TextEncoding::Utf8)),
    );
    engine.execute(&mut session, &narrow).unwrap();
    assert_eq!(collect_addresses(&session), vec![0x6004]);

    let mut session = ScanSession::new();
    let wide = ScanSettings::first_scan(
        ScanValueType::String,
        ScanComparison::Exact,
        ScanOperand::Text(TextNeedle::new("gold", TextEncoding::Utf16)),
    );
    engine.execute(&mut session, &wide).unwrap();
    assert_eq!(collect_addresses(&session), vec![0x6020]);
}

#[test]
fn unknown_scan_seeds_every_aligned_address() {
    let accessor = BufferAccessor::new().with_segment(Address::new(0x1000), vec![0u8; 256]);
    let engine = ScanEngine::new(&accessor);
    let mut session = ScanSession::new();

    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Unknown,
        ScanOperand::None,
    );
    let summary = engine.execute(&mut session, &settings).unwrap();

    // 256 bytes at alignment 4, every window in bounds
    assert_eq!(summary.matches, 64);
    for m in session.store().unwrap().iter().unwrap() {
        assert!(m.unwrap().address.is_aligned(4));
    }
}

#[test]
fn serialized_accessor_yields_identical_results() {
    let bytes = i32_bytes(&[1, 7, 7, 3, 7]);
    let plain = BufferAccessor::new().with_segment(Address::new(0x1000), bytes.clone());
    let serial =
        SerialAccessor::new(BufferAccessor::new().with_segment(Address::new(0x1000), bytes));

    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Exact,
        ScanOperand::Value(ScanValue::Integer(7)),
    );

    let engine = ScanEngine::new(&plain);
    let mut plain_session = ScanSession::new();
    engine.execute(&mut plain_session, &settings).unwrap();

    let engine = ScanEngine::new(&serial);
    let mut serial_session = ScanSession::new();
    engine.execute(&mut serial_session, &settings).unwrap();

    assert_eq!(
        collect_addresses(&plain_session),
        collect_addresses(&serial_session)
    );
}

#[test]
fn validation_failure_leaves_session_untouched() {
    let accessor = BufferAccessor::new().with_segment(Address::new(0x1000), i32_bytes(&[1]));
    let engine = ScanEngine::new(&accessor);
    let mut session = ScanSession::new();

    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Exact,
        ScanOperand::Value(ScanValue::Integer(1)),
    )
    .with_alignment(0);
    assert!(engine.execute(&mut session, &settings).is_err());
    assert_eq!(session.state(), ScanState::Idle);
    assert_eq!(session.pass(), 0);
}
