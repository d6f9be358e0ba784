//! Center-pair strip geometry.
//!
//! Every physical strip is treated as two halves radiating from a center
//! *pair*: indices `len/2 - 1` and `len/2` both sit at distance 0.

/// Default physical strip length of the reference hardware
pub const DEFAULT_STRIP_LEN: usize = 160;

/// Index of the first LED right of the center pair
#[inline]
pub const fn center_of_strip(strip_len: usize) -> usize {
    strip_len / 2
}

/// Map an index on any physical strip onto the first strip
#[inline]
pub const fn strip_local(index: usize, strip_len: usize) -> usize {
    if strip_len == 0 { 0 } else { index % strip_len }
}

/// Distance of `index` from the center pair, in LEDs
///
/// Both center indices report 0 and the distance grows identically on
/// either side. Indices on later strips are folded onto the first one.
#[inline]
pub const fn center_pair_distance(index: usize, strip_len: usize) -> usize {
    let local = strip_local(index, strip_len);
    let center = center_of_strip(strip_len);
    if local < center {
        center - 1 - local
    } else {
        local - center
    }
}

/// Signed position relative to the center pair
///
/// The two center LEDs sit at -0.5 and +0.5, so left and right halves are
/// exact mirror images.
#[inline]
#[allow(clippy::cast_precision_loss)]
pub fn center_pair_signed_position(index: usize, strip_len: usize) -> f32 {
    let local = strip_local(index, strip_len) as f32;
    let center = center_of_strip(strip_len) as f32;
    local - (center - 0.5)
}

/// Largest distance any LED on the strip can have from the center pair
#[inline]
pub const fn max_center_distance(strip_len: usize) -> usize {
    let center = center_of_strip(strip_len);
    let right = strip_len.saturating_sub(center + 1);
    let left = center.saturating_sub(1);
    if right > left { right } else { left }
}

/// Distance from the center pair normalized to 0.0..=1.0
#[inline]
#[allow(clippy::cast_precision_loss)]
pub fn normalized_center_distance(index: usize, strip_len: usize) -> f32 {
    let max = max_center_distance(strip_len);
    if max == 0 {
        return 0.0;
    }
    let distance = center_pair_distance(index, strip_len) as f32 / max as f32;
    distance.min(1.0)
}

/// Index mirrored across the center pair on the same physical strip
#[inline]
pub const fn mirror_index(index: usize, strip_len: usize) -> usize {
    if strip_len == 0 {
        return index;
    }
    let strip_start = index - strip_local(index, strip_len);
    strip_start + (strip_len - 1 - strip_local(index, strip_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_pair_reports_zero_on_both_sides() {
        assert_eq!(center_pair_distance(79, 160), 0);
        assert_eq!(center_pair_distance(80, 160), 0);
        assert_eq!(center_pair_distance(0, 160), 79);
        assert_eq!(center_pair_distance(159, 160), 79);
    }

    #[test]
    fn second_strip_folds_onto_first() {
        assert_eq!(center_pair_distance(239, 160), 0);
        assert_eq!(center_pair_distance(240, 160), 0);
        assert_eq!(mirror_index(160, 160), 319);
    }

    #[test]
    fn signed_position_is_mirrored() {
        assert!((center_pair_signed_position(79, 160) + 0.5).abs() < f32::EPSILON);
        assert!((center_pair_signed_position(80, 160) - 0.5).abs() < f32::EPSILON);
    }
}
