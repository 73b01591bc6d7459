//! Tests for the WAL block codec
//!
//! These tests verify:
//! - Exact block layout for puts and tombstones
//! - Binary-safe keys and values
//! - Size limits (RecordTooLarge)
//! - Rejection of damaged blocks

use lodekv::wal::{
    decode_block, encode_block, record_size, DEFAULT_BLOCK_SIZE, FILL_BYTE, PUT_OVERHEAD,
    TERMINATOR, TOMBSTONE_OVERHEAD,
};
use lodekv::{LodeError, Operation};

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_put_block_layout() {
    let op = Operation::put(b"ab".to_vec(), b"xyz".to_vec());
    let block = encode_block(&op, 32).unwrap();

    assert_eq!(block.len(), 32);
    assert_eq!(&block[0..4], b"set ");
    assert_eq!(&block[4..8], &2u32.to_be_bytes());
    assert_eq!(&block[8..10], b"ab");
    assert_eq!(block[10], b' ');
    assert_eq!(&block[11..15], &3u32.to_be_bytes());
    assert_eq!(&block[15..18], b"xyz");
    assert!(block[18..31].iter().all(|&b| b == FILL_BYTE));
    assert_eq!(block[31], TERMINATOR);
}

#[test]
fn test_tombstone_block_layout() {
    let op = Operation::tombstone(b"ab".to_vec());
    let block = encode_block(&op, 20).unwrap();

    assert_eq!(block.len(), 20);
    assert_eq!(&block[0..4], b"del ");
    assert_eq!(&block[4..8], &2u32.to_be_bytes());
    assert_eq!(&block[8..10], b"ab");
    assert!(block[10..19].iter().all(|&b| b == FILL_BYTE));
    assert_eq!(block[19], TERMINATOR);
}

#[test]
fn test_decode_returns_original_operation() {
    let put = Operation::put(b"user:1".to_vec(), b"alice".to_vec());
    let del = Operation::tombstone(b"user:1".to_vec());

    let put_block = encode_block(&put, DEFAULT_BLOCK_SIZE).unwrap();
    let del_block = encode_block(&del, DEFAULT_BLOCK_SIZE).unwrap();

    assert_eq!(decode_block(&put_block).unwrap(), put);
    assert_eq!(decode_block(&del_block).unwrap(), del);
}

#[test]
fn test_binary_safe_key_and_value() {
    // Bytes that collide with the tag, separator, fill and terminator
    let key = b"set \n# \x00".to_vec();
    let value = b"## \n\n#".to_vec();
    let op = Operation::put(key, value);

    let block = encode_block(&op, DEFAULT_BLOCK_SIZE).unwrap();

    assert_eq!(decode_block(&block).unwrap(), op);
}

#[test]
fn test_empty_value_is_preserved() {
    let op = Operation::put(b"k".to_vec(), Vec::new());
    let block = encode_block(&op, DEFAULT_BLOCK_SIZE).unwrap();

    assert_eq!(decode_block(&block).unwrap(), op);
}

// =============================================================================
// Size Limit Tests
// =============================================================================

#[test]
fn test_record_size() {
    assert_eq!(
        record_size(&Operation::put(b"key".to_vec(), b"value".to_vec())),
        PUT_OVERHEAD + 8
    );
    assert_eq!(
        record_size(&Operation::tombstone(b"key".to_vec())),
        TOMBSTONE_OVERHEAD + 3
    );
}

#[test]
fn test_record_exactly_filling_block() {
    let value = vec![b'v'; DEFAULT_BLOCK_SIZE - PUT_OVERHEAD - 1];
    let op = Operation::put(b"k".to_vec(), value);

    let block = encode_block(&op, DEFAULT_BLOCK_SIZE).unwrap();

    assert_eq!(block.len(), DEFAULT_BLOCK_SIZE);
    assert_eq!(decode_block(&block).unwrap(), op);
}

#[test]
fn test_record_too_large() {
    let value = vec![b'v'; DEFAULT_BLOCK_SIZE - PUT_OVERHEAD];
    let op = Operation::put(b"k".to_vec(), value);

    match encode_block(&op, DEFAULT_BLOCK_SIZE) {
        Err(LodeError::RecordTooLarge { size, limit }) => {
            assert_eq!(size, DEFAULT_BLOCK_SIZE + 1);
            assert_eq!(limit, DEFAULT_BLOCK_SIZE);
        }
        other => panic!("expected RecordTooLarge, got {:?}", other),
    }
}

// =============================================================================
// Corruption Tests
// =============================================================================

fn valid_block() -> Vec<u8> {
    encode_block(&Operation::put(b"key".to_vec(), b"value".to_vec()), 40)
        .unwrap()
        .to_vec()
}

fn assert_corrupt(block: &[u8]) {
    match decode_block(block) {
        Err(LodeError::WalCorruption(_)) => {}
        other => panic!("expected WalCorruption, got {:?}", other),
    }
}

#[test]
fn test_bad_terminator_rejected() {
    let mut block = valid_block();
    *block.last_mut().unwrap() = b'#';
    assert_corrupt(&block);
}

#[test]
fn test_unknown_tag_rejected() {
    let mut block = valid_block();
    block[0..4].copy_from_slice(b"put ");
    assert_corrupt(&block);
}

#[test]
fn test_key_length_overrun_rejected() {
    let mut block = valid_block();
    block[4..8].copy_from_slice(&1000u32.to_be_bytes());
    assert_corrupt(&block);
}

#[test]
fn test_bad_separator_rejected() {
    let mut block = valid_block();
    // "set " + len(4) + "key" puts the separator at offset 11
    block[11] = b'_';
    assert_corrupt(&block);
}

#[test]
fn test_damaged_padding_rejected() {
    let mut block = valid_block();
    block[30] = b'!';
    assert_corrupt(&block);
}

#[test]
fn test_zeroed_block_rejected() {
    assert_corrupt(&[0u8; 40]);
}

#[test]
fn test_empty_block_rejected() {
    assert_corrupt(&[]);
}
