//! Zone geometry and layout validation.
//!
//! A zone is a symmetric pair of index ranges around the center pair of
//! one physical strip. The same ranges are used on every physical strip.

use core::fmt;
use core::ops::RangeInclusive;

use heapless::Vec;

use crate::geometry::{DEFAULT_STRIP_LEN, center_of_strip};

/// Maximum number of zones in a layout
pub const MAX_ZONES: usize = 4;

/// Static geometry of one zone, in strip-local indices (inclusive ranges)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneSegment {
    pub zone_id: u8,
    pub left_start: u16,
    pub left_end: u16,
    pub right_start: u16,
    pub right_end: u16,
    /// LEDs covered on one strip (left + right)
    pub total_leds: u16,
}

impl ZoneSegment {
    /// Segment from the left range, mirrored to the right around the center pair
    ///
    /// Ranges that leave the left half are clamped at the center; [`validate`]
    /// rejects the result.
    pub const fn mirrored(zone_id: u8, left_start: u16, left_end: u16, strip_len: u16) -> Self {
        let center = strip_len / 2;
        let inner = center.saturating_sub(1);
        let right_start = center + inner.saturating_sub(left_end);
        let right_end = center + inner.saturating_sub(left_start);
        let left_len = left_end.saturating_sub(left_start).saturating_add(1);
        Self {
            zone_id,
            left_start,
            left_end,
            right_start,
            right_end,
            total_leds: left_len.saturating_mul(2),
        }
    }

    pub fn left_range(&self) -> RangeInclusive<usize> {
        usize::from(self.left_start)..=usize::from(self.left_end)
    }

    pub fn right_range(&self) -> RangeInclusive<usize> {
        usize::from(self.right_start)..=usize::from(self.right_end)
    }

    /// Whether a strip-local index belongs to this zone
    pub fn contains(&self, local: usize) -> bool {
        self.left_range().contains(&local) || self.right_range().contains(&local)
    }

    /// Whether the zone holds either LED of the center pair
    pub fn contains_center(&self, strip_len: usize) -> bool {
        let center = center_of_strip(strip_len);
        center > 0 && (self.contains(center - 1) || self.contains(center))
    }

    const fn left_len(&self) -> u16 {
        self.left_end.saturating_sub(self.left_start) + 1
    }

    const fn right_len(&self) -> u16 {
        self.right_end.saturating_sub(self.right_start) + 1
    }
}

/// Why a set of segments was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    Empty,
    TooManyZones,
    /// Segment at this position carries a different zone id
    ZoneIdMismatch(u8),
    /// Range leaves its half of the strip
    OutOfRange(u8),
    /// Start is after end
    Reversed(u8),
    /// Left and right halves differ in size or distance from the center
    Asymmetric(u8),
    /// Zone 0 does not include the center pair
    MissingCenter,
    /// Zone overlaps an earlier zone
    Overlap(u8),
    /// Some LEDs are not covered by any zone
    Gap,
    /// Zones are not ordered from the center outward
    Unordered(u8),
    /// `total_leds` differs from the size of the two halves
    CountMismatch(u8),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("layout has no zones"),
            Self::TooManyZones => write!(f, "layout has more than {MAX_ZONES} zones"),
            Self::ZoneIdMismatch(zone) => write!(f, "zone {zone} has a mismatched id"),
            Self::OutOfRange(zone) => write!(f, "zone {zone} is out of range"),
            Self::Reversed(zone) => write!(f, "zone {zone} has start after end"),
            Self::Asymmetric(zone) => write!(f, "zone {zone} is not symmetric"),
            Self::MissingCenter => f.write_str("zone 0 must contain the center pair"),
            Self::Overlap(zone) => write!(f, "zone {zone} overlaps another zone"),
            Self::Gap => f.write_str("layout does not cover the strip"),
            Self::Unordered(zone) => write!(f, "zone {zone} is not ordered center-outward"),
            Self::CountMismatch(zone) => write!(f, "zone {zone} has a wrong LED count"),
        }
    }
}

/// Predefined layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPreset {
    Single,
    Triple,
    Quad,
}

/// Three rings on a 160-LED strip: center 30, middle 90, outer 40 LEDs
pub const TRIPLE_LAYOUT: [ZoneSegment; 3] = [
    ZoneSegment::mirrored(0, 65, 79, 160),
    ZoneSegment::mirrored(1, 20, 64, 160),
    ZoneSegment::mirrored(2, 0, 19, 160),
];

/// Four equal rings on a 160-LED strip
pub const QUAD_LAYOUT: [ZoneSegment; 4] = [
    ZoneSegment::mirrored(0, 60, 79, 160),
    ZoneSegment::mirrored(1, 40, 59, 160),
    ZoneSegment::mirrored(2, 20, 39, 160),
    ZoneSegment::mirrored(3, 0, 19, 160),
];

/// A validated set of zone segments for one strip length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    segments: Vec<ZoneSegment, MAX_ZONES>,
    strip_len: usize,
}

impl Layout {
    /// Validate `segments` against `strip_len`
    pub fn new(segments: &[ZoneSegment], strip_len: usize) -> Result<Self, LayoutError> {
        validate(segments, strip_len)?;
        let mut stored = Vec::new();
        stored
            .extend_from_slice(segments)
            .map_err(|()| LayoutError::TooManyZones)?;
        Ok(Self {
            segments: stored,
            strip_len,
        })
    }

    /// One zone spanning the whole strip
    pub fn single(strip_len: usize) -> Self {
        let center = u16::try_from(center_of_strip(strip_len)).unwrap_or(u16::MAX / 2);
        let segment = ZoneSegment {
            zone_id: 0,
            left_start: 0,
            left_end: center.saturating_sub(1),
            right_start: center,
            right_end: (center * 2).saturating_sub(1),
            total_leds: center * 2,
        };
        let mut segments = Vec::new();
        let _ = segments.push(segment);
        Self {
            segments,
            strip_len,
        }
    }

    /// Build a predefined layout; ring layouts exist for 160-LED strips only
    pub fn preset(preset: LayoutPreset, strip_len: usize) -> Result<Self, LayoutError> {
        match preset {
            LayoutPreset::Single => Ok(Self::single(strip_len)),
            LayoutPreset::Triple => Self::new(&TRIPLE_LAYOUT, strip_len),
            LayoutPreset::Quad => Self::new(&QUAD_LAYOUT, strip_len),
        }
    }

    /// Layout used before any configuration: rings on standard strips
    pub fn default_for(strip_len: usize) -> Self {
        if strip_len == DEFAULT_STRIP_LEN {
            if let Ok(layout) = Self::new(&TRIPLE_LAYOUT, strip_len) {
                return layout;
            }
        }
        Self::single(strip_len)
    }

    pub fn segments(&self) -> &[ZoneSegment] {
        &self.segments
    }

    pub fn segment(&self, zone: u8) -> Option<&ZoneSegment> {
        self.segments.get(usize::from(zone))
    }

    pub fn zone_count(&self) -> usize {
        self.segments.len()
    }

    pub fn strip_len(&self) -> usize {
        self.strip_len
    }

    /// Reorder segments, renumbering zone ids to their new position
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn reorder(&mut self, order: &[u8]) {
        let previous = self.segments.clone();
        for (position, source) in order.iter().enumerate() {
            if let (Some(slot), Some(segment)) = (
                self.segments.get_mut(position),
                previous.get(usize::from(*source)),
            ) {
                *slot = ZoneSegment {
                    zone_id: position as u8,
                    ..*segment
                };
            }
        }
    }
}

/// Check that `segments` form a symmetric, complete, center-outward layout
#[allow(clippy::cast_possible_truncation)]
pub fn validate(segments: &[ZoneSegment], strip_len: usize) -> Result<(), LayoutError> {
    if segments.is_empty() {
        return Err(LayoutError::Empty);
    }
    if segments.len() > MAX_ZONES {
        return Err(LayoutError::TooManyZones);
    }
    let center = center_of_strip(strip_len);

    for (index, segment) in segments.iter().enumerate() {
        let zone = index as u8;
        if segment.zone_id != zone {
            return Err(LayoutError::ZoneIdMismatch(zone));
        }
        if segment.left_start > segment.left_end || segment.right_start > segment.right_end {
            return Err(LayoutError::Reversed(zone));
        }
        let left_end = usize::from(segment.left_end);
        let right_start = usize::from(segment.right_start);
        let right_end = usize::from(segment.right_end);
        if left_end >= center || right_start < center || right_end >= strip_len {
            return Err(LayoutError::OutOfRange(zone));
        }
        if segment.left_len() != segment.right_len()
            || center - 1 - left_end != right_start - center
        {
            return Err(LayoutError::Asymmetric(zone));
        }
        if u32::from(segment.total_leds)
            != u32::from(segment.left_len()) + u32::from(segment.right_len())
        {
            return Err(LayoutError::CountMismatch(zone));
        }
        if index == 0 && !segment.contains_center(strip_len) {
            return Err(LayoutError::MissingCenter);
        }
        // Halves are mirrored, so checking the left one covers both
        let overlaps = segments[..index].iter().any(|earlier| {
            segment.left_start <= earlier.left_end && earlier.left_start <= segment.left_end
        });
        if overlaps {
            return Err(LayoutError::Overlap(zone));
        }
    }

    let covered: usize = segments
        .iter()
        .map(|segment| usize::from(segment.left_len()))
        .sum();
    if covered != center {
        return Err(LayoutError::Gap);
    }

    for (index, pair) in segments.windows(2).enumerate() {
        let (inner, outer) = (&pair[0], &pair[1]);
        if inner.left_end <= outer.left_start || inner.right_start >= outer.right_start {
            return Err(LayoutError::Unordered(index as u8 + 1));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_layouts_are_valid() {
        assert_eq!(validate(&TRIPLE_LAYOUT, 160), Ok(()));
        assert_eq!(validate(&QUAD_LAYOUT, 160), Ok(()));
        assert_eq!(validate(Layout::single(160).segments(), 160), Ok(()));
    }

    #[test]
    fn test_mirrored_segment() {
        let segment = ZoneSegment::mirrored(0, 65, 79, 160);
        assert_eq!(segment.right_start, 80);
        assert_eq!(segment.right_end, 94);
        assert_eq!(segment.total_leds, 30);
    }

    #[test]
    fn test_triple_sizes() {
        let sizes: [u16; 3] = TRIPLE_LAYOUT.map(|segment| segment.total_leds);
        assert_eq!(sizes, [30, 90, 40]);
    }
}
