//! UnityCN archive-payload block decryption: a stateful nibble-substitution
//! decoder with a run-length-encoded frame structure, ported from the
//! reference `ArchiveStorageDecryptor` implementation.

/// Decrypts one byte in place at `data[offset]`, advancing `offset` by one
/// and `index` by one. Returns the decrypted byte (also written back).
fn decrypt_byte(
    data: &mut [u8],
    offset: &mut usize,
    index: &mut u64,
    index_data: &[u8; 16],
    substitute_data: &[u8; 16],
) -> u8 {
    let count_byte = substitute_data[usize::from(((*index >> 2) & 3) + 4)]
        .wrapping_add(substitute_data[usize::from(*index & 3)])
        .wrapping_add(substitute_data[usize::from(((*index >> 4) & 3) + 8)])
        .wrapping_add(substitute_data[usize::from((*index as u8 >> 6) + 12)]);

    let b = data[*offset];
    let low = index_data[usize::from(b & 0xF)].wrapping_sub(count_byte) & 0xF;
    let high = index_data[usize::from(b >> 4)].wrapping_sub(count_byte);
    data[*offset] = low | high.wrapping_mul(0x10);

    let out = data[*offset];
    *offset += 1;
    *index += 1;
    out
}

/// Decodes one frame starting at `data[0..remaining]`, returning the number
/// of bytes the frame advanced. `index` is a local copy seeded from the
/// driver's running index for the duration of this one frame; see
/// [`decrypt_block`] for why the driver's own index advances by only one
/// per frame regardless of how many bytes this function consumes.
fn decrypt_frame(
    data: &mut [u8],
    mut index: u64,
    remaining: usize,
    index_data: &[u8; 16],
    substitute_data: &[u8; 16],
) -> usize {
    let mut offset = 0usize;

    let current_byte = decrypt_byte(data, &mut offset, &mut index, index_data, substitute_data);
    let mut current_byte_high = u32::from(current_byte >> 4);
    let current_byte_low = current_byte & 0xF;

    if current_byte_high == 0xF {
        loop {
            let count_byte = decrypt_byte(data, &mut offset, &mut index, index_data, substitute_data);
            current_byte_high += u32::from(count_byte);
            if count_byte != 0xFF {
                break;
            }
        }
    }

    offset += current_byte_high as usize;

    if offset < remaining {
        decrypt_byte(data, &mut offset, &mut index, index_data, substitute_data);
        decrypt_byte(data, &mut offset, &mut index, index_data, substitute_data);

        if current_byte_low == 0xF {
            loop {
                let count_byte = decrypt_byte(data, &mut offset, &mut index, index_data, substitute_data);
                if count_byte != 0xFF {
                    break;
                }
            }
        }
    }

    offset
}

/// Decrypts `data` in place using the UnityCN nibble-substitution scheme.
///
/// The driver's `index` advances by exactly one per frame regardless of how
/// many per-byte transforms happened inside that frame; the fine-grained
/// per-byte index used for `substitute_data` lookups is a local copy seeded
/// fresh at each frame. Getting these two counters swapped silently corrupts
/// any block where a frame decodes more than one byte, so this split is
/// reproduced exactly as in the reference implementation rather than
/// simplified to a single counter.
pub fn decrypt_block(
    index_data: &[u8; 16],
    substitute_data: &[u8; 16],
    data: &[u8],
    initial_index: u64,
) -> Vec<u8> {
    let mut out = data.to_vec();
    let size = out.len();
    let mut offset = 0usize;
    let mut index = initial_index;

    while offset < size {
        let advanced = decrypt_frame(
            &mut out[offset..],
            index,
            size - offset,
            index_data,
            substitute_data,
        );
        offset += advanced;
        index += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::rand_bytes;

    fn tables() -> ([u8; 16], [u8; 16]) {
        let index_data: [u8; 16] = [
            0x3, 0x1, 0x4, 0x1, 0x5, 0x9, 0x2, 0x6, 0xA, 0x5, 0x8, 0x9, 0x7, 0x9, 0x3, 0x2,
        ];
        let substitute_data: [u8; 16] = [
            0x6, 0x5, 0x3, 0x5, 0x8, 0x9, 0x7, 0x9, 0x3, 0x2, 0x3, 0x8, 0x4, 0x6, 0x2, 0x6,
        ];
        (index_data, substitute_data)
    }

    #[test]
    fn decrypt_block_output_length_matches_input() {
        let (index_data, substitute_data) = tables();
        let data = vec![0u8; 37];
        let out = decrypt_block(&index_data, &substitute_data, &data, 0);
        assert_eq!(out.len(), data.len());
    }

    #[test]
    fn decrypt_block_is_deterministic() {
        let (index_data, substitute_data) = tables();
        let data: Vec<u8> = (0..64u8).collect();
        let a = decrypt_block(&index_data, &substitute_data, &data, 7);
        let b = decrypt_block(&index_data, &substitute_data, &data, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn decrypt_block_varies_with_initial_index() {
        let (index_data, substitute_data) = tables();
        let data: Vec<u8> = (0..16u8).collect();
        let a = decrypt_block(&index_data, &substitute_data, &data, 0);
        let b = decrypt_block(&index_data, &substitute_data, &data, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn decrypt_block_handles_empty_input() {
        let (index_data, substitute_data) = tables();
        let out = decrypt_block(&index_data, &substitute_data, &[], 0);
        assert!(out.is_empty());
    }

    #[test]
    fn decrypt_block_handles_random_blocks_of_varying_length() {
        let (index_data, substitute_data) = tables();
        for len in [1usize, 7, 31, 128, 513] {
            let data = rand_bytes(len);
            let out = decrypt_block(&index_data, &substitute_data, &data, 0);
            assert_eq!(out.len(), data.len());
        }
    }
}
