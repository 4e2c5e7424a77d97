//! GOB/block texture deswizzling, ported from the reference
//! `switch_deswizzle` implementation.

use crate::error::Error;

const GOB_X_BLOCK_COUNT: u32 = 4;
const GOB_Y_BLOCK_COUNT: u32 = 8;
const BLOCKS_IN_GOB: u32 = 32;

/// Remaps a GOB-swizzled pixel buffer into linear row-major order.
///
/// The destination address is computed from a bit-interleaved decomposition
/// of the intra-GOB block index (`gob_x`/`gob_y` below); the source cursor,
/// by contrast, walks `(src_x, src_y)` in plain row-major block order and is
/// not itself GOB-addressed. Copies clamp to the remaining buffer length so
/// a truncated final block doesn't panic.
pub fn switch_deswizzle(
    data: &[u8],
    pixel_width: u32,
    width: u32,
    height: u32,
    block_width: u32,
    block_height: u32,
    gobs_per_block: u32,
) -> Result<Vec<u8>, Error> {
    if block_width == 0 || block_height == 0 {
        return Err(Error::argument("block_width and block_height must be nonzero"));
    }

    let data_size = data.len();
    let mut out = vec![0u8; data_size];

    let block_count_x = width / block_width;
    let block_count_y = height / block_height;

    let gob_count_x = block_count_x / GOB_X_BLOCK_COUNT;
    let gob_count_y = block_count_y / GOB_Y_BLOCK_COUNT;

    let block_pixel_width = block_width * pixel_width;
    let row_pixel_width = width * pixel_width;

    let mut src_x = 0u32;
    let mut src_y = 0u32;

    for y in 0..gob_count_y {
        for x in 0..gob_count_x {
            for k in 0..gobs_per_block {
                for l in 0..BLOCKS_IN_GOB {
                    let gob_x = ((l >> 3) & 0b10) | ((l >> 1) & 0b1);
                    let gob_y = ((l >> 1) & 0b110) | (l & 0b1);
                    let gob_dst_x = x * GOB_X_BLOCK_COUNT + gob_x;
                    let gob_dst_y = (y * gobs_per_block + k) * GOB_Y_BLOCK_COUNT + gob_y;

                    let mut src_offset = (src_x * block_width + src_y * block_height * width) * pixel_width;
                    let mut dst_offset = (gob_dst_x * block_width + gob_dst_y * block_height * width) * pixel_width;

                    for _by in 0..block_height {
                        let src_offset_us = src_offset as usize;
                        let dst_offset_us = dst_offset as usize;
                        if src_offset_us > data_size || dst_offset_us > data_size {
                            break;
                        }

                        let mut copy_width = block_pixel_width as usize;
                        if data_size - src_offset_us < copy_width {
                            copy_width = data_size - src_offset_us;
                        } else if data_size - dst_offset_us < copy_width {
                            copy_width = data_size - dst_offset_us;
                        }

                        out[dst_offset_us..dst_offset_us + copy_width]
                            .copy_from_slice(&data[src_offset_us..src_offset_us + copy_width]);

                        src_offset += row_pixel_width;
                        dst_offset += row_pixel_width;
                    }

                    src_x += 1;
                    if src_x >= block_count_x {
                        src_x = 0;
                        src_y += 1;
                    }
                }
            }
        }
    }

    Ok(out)
}
