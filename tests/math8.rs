mod tests {
    use embassy_time::Duration;
    use lightwave_engine::math8::{
        blend8, clamp01, lerp_f32, progress8, qadd8, qsub8, scale8, unit_to_u8,
    };

    #[test]
    fn test_scale8() {
        assert_eq!(scale8(255, 128), 128);
        assert_eq!(scale8(0, 128), 0);
        assert_eq!(scale8(128, 128), 64);
        assert_eq!(scale8(128, 255), 128);
        assert_eq!(scale8(255, 255), 255);
        assert_eq!(scale8(128, 0), 0);
    }

    #[test]
    fn test_blend8() {
        assert_eq!(blend8(255, 128, 128), 191);
        assert_eq!(blend8(0, 128, 255), 128);
        assert_eq!(blend8(255, 0, 128), 127);
        assert_eq!(blend8(255, 128, 0), 255);
    }

    #[test]
    fn test_saturating_math() {
        assert_eq!(qadd8(200, 100), 255);
        assert_eq!(qadd8(100, 100), 200);
        assert_eq!(qsub8(10, 20), 0);
        assert_eq!(qsub8(30, 20), 10);
    }

    #[test]
    fn test_progress8() {
        assert_eq!(
            progress8(Duration::from_millis(0), Duration::from_millis(100)),
            0
        );
        assert_eq!(
            progress8(Duration::from_millis(50), Duration::from_millis(100)),
            127
        );
        assert_eq!(
            progress8(Duration::from_millis(100), Duration::from_millis(100)),
            255
        );
        assert_eq!(
            progress8(Duration::from_millis(10), Duration::from_millis(0)),
            255
        );
    }

    #[test]
    fn test_unit_helpers() {
        assert_eq!(unit_to_u8(0.0), 0);
        assert_eq!(unit_to_u8(0.5), 128);
        assert_eq!(unit_to_u8(1.0), 255);
        assert_eq!(unit_to_u8(7.0), 255);
        assert_eq!(clamp01(-1.0), 0.0);
        assert_eq!(clamp01(f32::NAN), 0.0);
        assert!((lerp_f32(2.0, 4.0, 0.25) - 2.5).abs() < f32::EPSILON);
    }
}
