//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Recovery from a clean WAL
//! - Recovery from an empty or missing WAL
//! - Corrupt blocks are skipped without losing alignment
//! - Partial writes (torn tail) are truncated
//! - Verify mode (stats only, no modification)

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use lodekv::wal::{encode_block, RecoveryResult, WalRecovery, WalWriter};
use lodekv::Operation;
use tempfile::TempDir;

const BLOCK: usize = 48;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

/// Write entries using WalWriter (produces a well-formed WAL)
fn write_entries_via_writer(path: &PathBuf, count: usize) -> Vec<Operation> {
    let mut writer = WalWriter::open(path, BLOCK).unwrap();
    let mut ops = Vec::new();
    for i in 0..count {
        let op = Operation::put(format!("key{}", i).into_bytes(), format!("value{}", i).into_bytes());
        writer.append(&op).unwrap();
        ops.push(op);
    }
    ops
}

/// Append raw bytes to the file (for crafting corruption)
fn append_raw(path: &PathBuf, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

// =============================================================================
// Recover: Clean WAL Tests
// =============================================================================

#[test]
fn test_recover_missing_file() {
    let (_temp, wal_path) = setup_temp_wal();

    let (ops, result) = WalRecovery::recover(&wal_path, BLOCK).unwrap();

    assert!(ops.is_empty());
    assert_eq!(result, RecoveryResult::default());
    assert!(!wal_path.exists());
}

#[test]
fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::File::create(&wal_path).unwrap();

    let (ops, result) = WalRecovery::recover(&wal_path, BLOCK).unwrap();

    assert!(ops.is_empty());
    assert_eq!(result.entries_recovered, 0);
    assert_eq!(result.entries_corrupted, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_multiple_entries_in_order() {
    let (_temp, wal_path) = setup_temp_wal();
    let written = write_entries_via_writer(&wal_path, 10);

    let (ops, result) = WalRecovery::recover(&wal_path, BLOCK).unwrap();

    assert_eq!(ops, written);
    assert_eq!(result.entries_recovered, 10);
    assert_eq!(result.entries_corrupted, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_preserves_tombstones() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, BLOCK).unwrap();
        writer.append(&Operation::put(b"k".to_vec(), b"v".to_vec())).unwrap();
        writer.append(&Operation::tombstone(b"k".to_vec())).unwrap();
    }

    let (ops, _) = WalRecovery::recover(&wal_path, BLOCK).unwrap();

    assert_eq!(
        ops,
        vec![
            Operation::put(b"k".to_vec(), b"v".to_vec()),
            Operation::tombstone(b"k".to_vec()),
        ]
    );
}

// =============================================================================
// Recover: Corruption Tests
// =============================================================================

#[test]
fn test_corrupt_block_is_skipped() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 2);
    append_raw(&wal_path, &[0xAB; BLOCK]);
    let after = Operation::put(b"after".to_vec(), b"ok".to_vec());
    append_raw(&wal_path, &encode_block(&after, BLOCK).unwrap());

    let (ops, result) = WalRecovery::recover(&wal_path, BLOCK).unwrap();

    assert_eq!(ops.len(), 3);
    assert_eq!(ops[2], after);
    assert_eq!(result.entries_recovered, 3);
    assert_eq!(result.entries_corrupted, 1);
    assert!(!result.was_truncated);
}

#[test]
fn test_flipped_byte_in_middle_block() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 3);

    // Damage the terminator of the second block
    let mut bytes = fs::read(&wal_path).unwrap();
    bytes[2 * BLOCK - 1] = b'X';
    fs::write(&wal_path, &bytes).unwrap();

    let (ops, result) = WalRecovery::recover(&wal_path, BLOCK).unwrap();

    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].key(), b"key0");
    assert_eq!(ops[1].key(), b"key2");
    assert_eq!(result.entries_corrupted, 1);
}

#[test]
fn test_torn_tail_is_truncated() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 4);

    // Simulate a crash halfway through the fifth block
    let partial = encode_block(&Operation::put(b"lost".to_vec(), b"x".to_vec()), BLOCK).unwrap();
    append_raw(&wal_path, &partial[..BLOCK / 2]);

    let (ops, result) = WalRecovery::recover(&wal_path, BLOCK).unwrap();

    assert_eq!(ops.len(), 4);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), (4 * BLOCK) as u64);
}

#[test]
fn test_appends_after_truncation_stay_aligned() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 1);
    append_raw(&wal_path, b"set ");

    WalRecovery::recover(&wal_path, BLOCK).unwrap();
    {
        let mut writer = WalWriter::open(&wal_path, BLOCK).unwrap();
        writer.append(&Operation::put(b"next".to_vec(), b"1".to_vec())).unwrap();
    }

    let (ops, result) = WalRecovery::recover(&wal_path, BLOCK).unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[1].key(), b"next");
    assert_eq!(result.entries_corrupted, 0);
    assert!(!result.was_truncated);
}

// =============================================================================
// Verify Mode Tests
// =============================================================================

#[test]
fn test_verify_reports_without_modifying() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 3);
    append_raw(&wal_path, &[0u8; BLOCK]);
    append_raw(&wal_path, b"torn");
    let len_before = fs::metadata(&wal_path).unwrap().len();

    let result = WalRecovery::verify(&wal_path, BLOCK).unwrap();

    assert_eq!(result.entries_recovered, 3);
    assert_eq!(result.entries_corrupted, 1);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), len_before);
}
