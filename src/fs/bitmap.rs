//! 位图中的位操作。
//!
//! 磁盘上的位序是高位在前：第 `offset` 位位于字节 `offset / 8`，
//! 掩码为 `0x80 >> (offset % 8)`。位为 1 表示已分配。

#[inline]
fn mask(offset: u32) -> u8 {
    0x80 >> (offset % 8)
}

pub fn get_bit(bits: &[u8], offset: u32) -> bool {
    bits[(offset / 8) as usize] & mask(offset) != 0
}

pub fn set_bit(bits: &mut [u8], offset: u32) {
    bits[(offset / 8) as usize] |= mask(offset);
}

pub fn clear_bit(bits: &mut [u8], offset: u32) {
    bits[(offset / 8) as usize] &= !mask(offset);
}

/// 在 `[start, end)` 范围内按升序查找第一个空闲位（first-fit）
pub fn find_free(bits: &[u8], start: u32, end: u32) -> Option<u32> {
    let mut offset = start;
    while offset < end {
        // 整字节已满且当前位于字节边界时直接跳过
        if offset % 8 == 0 && end - offset >= 8 && bits[(offset / 8) as usize] == 0xFF {
            offset += 8;
            continue;
        }
        if !get_bit(bits, offset) {
            return Some(offset);
        }
        offset += 1;
    }
    None
}

/// 统计 `[start, end)` 范围内空闲位的个数
pub fn count_free(bits: &[u8], start: u32, end: u32) -> u32 {
    (start..end).filter(|&offset| !get_bit(bits, offset)).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_order_is_msb_first() {
        let mut bits = [0u8; 2];
        set_bit(&mut bits, 0);
        assert_eq!(bits[0], 0x80);
        set_bit(&mut bits, 7);
        assert_eq!(bits[0], 0x81);
        set_bit(&mut bits, 9);
        assert_eq!(bits[1], 0x40);
        assert!(get_bit(&bits, 9));

        clear_bit(&mut bits, 0);
        assert_eq!(bits[0], 0x01);
        // 清除已经为 0 的位不产生影响
        clear_bit(&mut bits, 0);
        assert_eq!(bits[0], 0x01);
    }

    #[test]
    fn find_free_respects_start_and_end() {
        let mut bits = [0xFFu8, 0b1110_1111, 0x00];
        assert_eq!(find_free(&bits, 0, 24), Some(11));
        assert_eq!(find_free(&bits, 12, 24), Some(16));
        assert_eq!(find_free(&bits, 0, 11), None);

        set_bit(&mut bits, 11);
        bits[2] = 0xFF;
        assert_eq!(find_free(&bits, 0, 24), None);
    }

    #[test]
    fn find_free_starts_mid_byte() {
        let bits = [0b0000_0000u8];
        assert_eq!(find_free(&bits, 5, 8), Some(5));
    }

    #[test]
    fn counts_free_bits_in_range() {
        let bits = [0b1010_0000u8, 0xFF];
        assert_eq!(count_free(&bits, 0, 8), 6);
        assert_eq!(count_free(&bits, 2, 16), 5);
    }
}
