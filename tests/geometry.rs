mod tests {
    use lightwave_engine::geometry::{
        center_of_strip, center_pair_distance, center_pair_signed_position, max_center_distance,
        mirror_index, normalized_center_distance, strip_local,
    };

    const STRIP: usize = 160;

    #[test]
    fn test_center_pair_is_symmetric() {
        let center = center_of_strip(STRIP);
        for i in 0..center {
            assert_eq!(
                center_pair_distance(center - 1 - i, STRIP),
                center_pair_distance(center + i, STRIP),
                "asymmetric at offset {i}"
            );
            assert_eq!(center_pair_distance(center + i, STRIP), i);
        }
    }

    #[test]
    fn test_both_center_leds_are_origin() {
        assert_eq!(center_pair_distance(79, STRIP), 0);
        assert_eq!(center_pair_distance(80, STRIP), 0);
        assert_eq!(center_pair_distance(0, STRIP), 79);
        assert_eq!(center_pair_distance(159, STRIP), 79);
        assert_eq!(max_center_distance(STRIP), 79);
    }

    #[test]
    fn test_signed_position() {
        assert!((center_pair_signed_position(79, STRIP) + 0.5).abs() < f32::EPSILON);
        assert!((center_pair_signed_position(80, STRIP) - 0.5).abs() < f32::EPSILON);
        assert!(
            (center_pair_signed_position(0, STRIP) + center_pair_signed_position(159, STRIP)).abs()
                < f32::EPSILON
        );
    }

    #[test]
    fn test_second_strip_folds_onto_first() {
        assert_eq!(strip_local(160 + 5, STRIP), 5);
        assert_eq!(
            center_pair_distance(160 + 79, STRIP),
            center_pair_distance(79, STRIP)
        );
        assert_eq!(mirror_index(160, STRIP), 319);
        assert_eq!(mirror_index(79, STRIP), 80);
    }

    #[test]
    fn test_normalized_distance() {
        assert_eq!(normalized_center_distance(80, STRIP), 0.0);
        assert!((normalized_center_distance(0, STRIP) - 1.0).abs() < f32::EPSILON);
        assert!(normalized_center_distance(120, STRIP) < 1.0);
    }
}
