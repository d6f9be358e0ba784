mod common;

mod tests {
    use lightwave_engine::color::{BLACK, RAINBOW, Rgb};
    use lightwave_engine::effect::{
        AnimationParams, BuiltinEffect, EffectSlot, FrameInput, FrameTiming, InitError,
        WORKING_SET_BLOCKS, WorkingSetPool, register_builtin_effects,
    };
    use lightwave_engine::narrative::NarrativeEngine;
    use lightwave_engine::registry::EffectRegistry;
    use lightwave_engine::zone::{
        BlendMode, LayoutError, LayoutPreset, QUAD_LAYOUT, TRIPLE_LAYOUT, ZoneComposer, ZoneError,
        ZoneSegment, validate,
    };

    use crate::common::{
        BLUE, BLUE_ID, FAILING_ID, GREEN, GREEN_ID, RED, RED_ID, STARVED_ID, TestEffect,
        test_registry,
    };

    const STRIP: usize = 160;
    const LEDS: usize = STRIP * 2;

    fn frame() -> FrameInput<'static> {
        FrameInput {
            palette: &RAINBOW,
            params: AnimationParams::default(),
            timing: FrameTiming::default(),
            strip_len: STRIP,
            seed: 11,
            zone: None,
        }
    }

    fn three_zones() -> (
        ZoneComposer<TestEffect, LEDS>,
        EffectRegistry<TestEffect, 8>,
    ) {
        let registry = test_registry::<8>();
        let mut composer = ZoneComposer::new(STRIP);
        composer.set_zone_effect(0, RED_ID, &registry).unwrap();
        composer.set_zone_effect(1, BLUE_ID, &registry).unwrap();
        composer.set_zone_effect(2, GREEN_ID, &registry).unwrap();
        composer.set_zone_enabled(1, true).unwrap();
        composer.set_zone_enabled(2, true).unwrap();
        composer.set_enabled(true);
        (composer, registry)
    }

    #[test]
    fn test_defaults() {
        let composer = ZoneComposer::<TestEffect, LEDS>::new(STRIP);
        assert!(!composer.is_enabled());
        assert_eq!(composer.zone_count(), 3);
        let zone = composer.zone(0).unwrap();
        assert!(zone.enabled);
        assert_eq!(zone.brightness, 255);
        assert_eq!(zone.speed, 15);
        assert_eq!(zone.palette, 0);
        assert_eq!(zone.blend_mode, BlendMode::Overwrite);
        assert!(!composer.zone(1).unwrap().enabled);

        let odd = ZoneComposer::<TestEffect, 100>::new(100);
        assert_eq!(odd.zone_count(), 1);
    }

    #[test]
    fn test_disabled_composer_leaves_buffer_untouched() {
        let registry = test_registry::<8>();
        let mut composer = ZoneComposer::<TestEffect, LEDS>::new(STRIP);
        composer.set_zone_effect(0, RED_ID, &registry).unwrap();

        let pattern: Vec<Rgb> = (0..LEDS)
            .map(|i| Rgb {
                r: i as u8,
                g: 7,
                b: 200,
            })
            .collect();
        let mut output = pattern.clone();
        let mut memory = WorkingSetPool::new();
        let report = composer.render(
            &mut output,
            &frame(),
            &[],
            &NarrativeEngine::default(),
            &mut memory,
        );
        assert_eq!(output, pattern);
        assert_eq!(report.zones_rendered, 0);
    }

    #[test]
    fn test_zones_render_into_their_rings_on_both_strips() {
        let (mut composer, _registry) = three_zones();
        let mut output = [BLACK; LEDS];
        let mut memory = WorkingSetPool::new();
        let report = composer.render(
            &mut output,
            &frame(),
            &[],
            &NarrativeEngine::default(),
            &mut memory,
        );
        assert_eq!(report.zones_rendered, 3);
        assert!(report.init_failures.is_empty());

        for strip in 0..2 {
            let base = strip * STRIP;
            assert_eq!(output[base + 79], RED);
            assert_eq!(output[base + 80], RED);
            assert_eq!(output[base + 40], BLUE);
            assert_eq!(output[base + 119], BLUE);
            assert_eq!(output[base], GREEN);
            assert_eq!(output[base + 159], GREEN);
        }
        assert!(output.iter().all(|led| *led != BLACK));
    }

    #[test]
    fn test_overwrite_layouts_cover_strip_exactly_once() {
        for layout in [&TRIPLE_LAYOUT[..], &QUAD_LAYOUT[..]] {
            for local in 0..STRIP {
                let owners = layout.iter().filter(|zone| zone.contains(local)).count();
                assert_eq!(owners, 1, "LED {local}");
            }
        }
    }

    #[test]
    fn test_zone_brightness_scales_pixels() {
        let (mut composer, _registry) = three_zones();
        composer.set_zone_brightness(0, 128).unwrap();
        let mut output = [BLACK; LEDS];
        let mut memory = WorkingSetPool::new();
        composer.render(
            &mut output,
            &frame(),
            &[],
            &NarrativeEngine::default(),
            &mut memory,
        );
        assert_eq!(output[80], Rgb { r: 128, g: 0, b: 0 });
    }

    #[test]
    fn test_disabled_zone_stays_black() {
        let (mut composer, _registry) = three_zones();
        composer.set_zone_enabled(2, false).unwrap();
        let mut output = [RED; LEDS];
        let mut memory = WorkingSetPool::new();
        let report = composer.render(
            &mut output,
            &frame(),
            &[],
            &NarrativeEngine::default(),
            &mut memory,
        );
        assert_eq!(report.zones_rendered, 2);
        assert_eq!(output[0], BLACK);
        assert_eq!(output[80], RED);
    }

    #[test]
    fn test_failed_zone_init_keeps_previous_effect() {
        let (mut composer, registry) = three_zones();
        let mut output = [BLACK; LEDS];
        let mut memory = WorkingSetPool::new();
        let narrative = NarrativeEngine::default();
        composer.render(&mut output, &frame(), &[], &narrative, &mut memory);

        composer.set_zone_effect(1, FAILING_ID, &registry).unwrap();
        assert_eq!(composer.zone(1).unwrap().effect, Some(FAILING_ID));
        let report = composer.render(&mut output, &frame(), &[], &narrative, &mut memory);
        assert_eq!(
            report.init_failures.as_slice(),
            &[(FAILING_ID, InitError::Unsupported)]
        );
        assert_eq!(composer.zone(1).unwrap().effect, Some(BLUE_ID));
        assert_eq!(output[40], BLUE);
    }

    #[test]
    fn test_exhausted_zone_rolls_back_only_that_zone() {
        let (mut composer, registry) = three_zones();
        let mut output = [BLACK; LEDS];
        let mut memory = WorkingSetPool::new();
        let narrative = NarrativeEngine::default();
        composer.render(&mut output, &frame(), &[], &narrative, &mut memory);

        composer.set_zone_effect(2, STARVED_ID, &registry).unwrap();
        let report = composer.render(&mut output, &frame(), &[], &narrative, &mut memory);
        assert_eq!(
            report.init_failures.as_slice(),
            &[(STARVED_ID, InitError::WorkingSetExhausted)]
        );
        assert_eq!(report.zones_rendered, 3);
        assert_eq!(composer.zone(2).unwrap().effect, Some(GREEN_ID));
        assert_eq!(output[0], GREEN);
        assert_eq!(output[79], RED);
    }

    #[test]
    fn test_shrinking_layout_releases_working_set() {
        let mut registry = EffectRegistry::<EffectSlot, 16>::new();
        register_builtin_effects(&mut registry).unwrap();
        let fire = BuiltinEffect::Fire.raw();
        let mut composer = ZoneComposer::<EffectSlot, LEDS>::new(STRIP);
        composer
            .set_layout_preset(LayoutPreset::Quad, registry.memory_mut())
            .unwrap();
        for zone in 0..4 {
            composer.set_zone_effect(zone, fire, &registry).unwrap();
            composer.set_zone_enabled(zone, true).unwrap();
        }
        composer.set_enabled(true);

        let mut output = [BLACK; LEDS];
        let report = composer.render(
            &mut output,
            &frame(),
            &[],
            &NarrativeEngine::default(),
            registry.memory_mut(),
        );
        assert_eq!(report.zones_rendered, 4);
        assert!(report.init_failures.is_empty());
        assert_eq!(registry.memory().available(), WORKING_SET_BLOCKS - 4);

        composer
            .set_layout_preset(LayoutPreset::Single, registry.memory_mut())
            .unwrap();
        assert_eq!(registry.memory().available(), WORKING_SET_BLOCKS - 1);
        assert_eq!(composer.zone(0).unwrap().effect, Some(fire));
        assert_eq!(composer.zone(3).unwrap().effect, None);

        composer.set_layout(&QUAD_LAYOUT, registry.memory_mut()).unwrap();
        assert_eq!(registry.memory().available(), WORKING_SET_BLOCKS - 1);
    }

    #[test]
    fn test_mirrored_segment_past_center_is_rejected() {
        let past_center = ZoneSegment::mirrored(0, 0, 90, 160);
        assert_eq!(past_center.right_start, 80);
        assert_eq!(
            validate(&[past_center], 160),
            Err(LayoutError::OutOfRange(0))
        );

        let reversed = ZoneSegment::mirrored(0, 50, 40, 160);
        assert_eq!(validate(&[reversed], 160), Err(LayoutError::Reversed(0)));

        let mut miscounted = ZoneSegment::mirrored(0, 0, 79, 160);
        assert_eq!(validate(&[miscounted], 160), Ok(()));
        miscounted.total_leds = 150;
        assert_eq!(
            validate(&[miscounted], 160),
            Err(LayoutError::CountMismatch(0))
        );
    }

    #[test]
    fn test_blend_mode_lookup() {
        for (raw, mode) in BlendMode::ALL.iter().enumerate() {
            assert_eq!(BlendMode::from_raw(raw as u8), Some(*mode));
        }
        assert_eq!(BlendMode::from_raw(8), None);
        assert_eq!(BlendMode::Screen.as_str(), "screen");
    }

    #[test]
    fn test_blend_modes() {
        let out = Rgb {
            r: 200,
            g: 100,
            b: 0,
        };
        let new = Rgb {
            r: 100,
            g: 100,
            b: 255,
        };
        assert_eq!(BlendMode::Overwrite.apply(out, new, 255), new);
        assert_eq!(
            BlendMode::Additive.apply(out, new, 255),
            Rgb {
                r: 255,
                g: 200,
                b: 255
            }
        );
        assert_eq!(BlendMode::Alpha.apply(out, new, 0), out);
        assert_eq!(BlendMode::Alpha.apply(out, new, 255), new);
        assert_eq!(
            BlendMode::Lighten.apply(out, new, 255),
            Rgb {
                r: 200,
                g: 100,
                b: 255
            }
        );
        assert_eq!(
            BlendMode::Darken.apply(out, new, 255),
            Rgb {
                r: 100,
                g: 100,
                b: 0
            }
        );
    }

    #[test]
    fn test_additive_never_wraps() {
        for a in (0..=255u8).step_by(15) {
            for b in (0..=255u8).step_by(15) {
                let out = Rgb { r: a, g: a, b: a };
                let new = Rgb { r: b, g: b, b: b };
                let mixed = BlendMode::Additive.apply(out, new, 255);
                let expected = (u16::from(a) + u16::from(b)).min(255) as u8;
                assert_eq!(mixed, Rgb {
                    r: expected,
                    g: expected,
                    b: expected
                });
            }
        }
    }

    #[test]
    fn test_invalid_layout_is_rejected_without_change() {
        let mut composer = ZoneComposer::<TestEffect, LEDS>::new(STRIP);
        let mut memory = WorkingSetPool::new();
        let before = composer.layout().clone();

        let overlapping = [
            ZoneSegment::mirrored(0, 60, 79, 160),
            ZoneSegment::mirrored(1, 0, 65, 160),
        ];
        assert_eq!(
            composer.set_layout(&overlapping, &mut memory),
            Err(LayoutError::Overlap(1))
        );
        let out_of_range = [ZoneSegment {
            zone_id: 0,
            left_start: 0,
            left_end: 79,
            right_start: 80,
            right_end: 170,
            total_leds: 171,
        }];
        assert_eq!(
            composer.set_layout(&out_of_range, &mut memory),
            Err(LayoutError::OutOfRange(0))
        );
        let gap = [ZoneSegment::mirrored(0, 40, 79, 160)];
        assert_eq!(composer.set_layout(&gap, &mut memory), Err(LayoutError::Gap));
        assert_eq!(composer.set_layout(&[], &mut memory), Err(LayoutError::Empty));
        let no_center = [
            ZoneSegment::mirrored(0, 0, 19, 160),
            ZoneSegment::mirrored(1, 20, 79, 160),
        ];
        assert_eq!(
            composer.set_layout(&no_center, &mut memory),
            Err(LayoutError::MissingCenter)
        );
        assert_eq!(composer.layout(), &before);

        assert_eq!(composer.set_layout(&QUAD_LAYOUT, &mut memory), Ok(()));
        assert_eq!(composer.zone_count(), 4);
        assert_eq!(composer.set_layout_preset(LayoutPreset::Single, &mut memory), Ok(()));
        assert_eq!(composer.zone_count(), 1);
        assert_eq!(validate(composer.layout().segments(), STRIP), Ok(()));
    }

    #[test]
    fn test_setters_reject_invalid_zones() {
        let mut composer = ZoneComposer::<TestEffect, LEDS>::new(STRIP);
        assert_eq!(
            composer.set_zone_brightness(7, 10),
            Err(ZoneError::InvalidZone(7))
        );
        let registry = test_registry::<8>();
        assert_eq!(
            composer.set_zone_effect(0, 42, &registry),
            Err(ZoneError::UnknownEffect(42))
        );

        composer.set_zone_speed(0, 0).unwrap();
        assert_eq!(composer.zone(0).unwrap().speed, 1);
        composer.set_zone_speed(0, 250).unwrap();
        assert_eq!(composer.zone(0).unwrap().speed, 100);
    }

    #[test]
    fn test_reorder_zones() {
        let (mut composer, _registry) = three_zones();
        composer.set_zone_brightness(2, 77).unwrap();

        assert_eq!(composer.reorder_zones(&[0, 1]), Err(ZoneError::InvalidOrder));
        assert_eq!(
            composer.reorder_zones(&[0, 0, 1]),
            Err(ZoneError::InvalidOrder)
        );
        assert_eq!(
            composer.reorder_zones(&[1, 0, 2]),
            Err(ZoneError::InvalidOrder)
        );

        assert_eq!(composer.reorder_zones(&[0, 2, 1]), Ok(()));
        assert_eq!(composer.zone(1).unwrap().brightness, 77);
        assert_eq!(composer.zone(1).unwrap().effect, Some(GREEN_ID));
        assert_eq!(composer.layout().segments()[1].left_start, 0);
        assert_eq!(composer.layout().segments()[1].zone_id, 1);
    }

    #[test]
    fn test_load_preset() {
        let mut registry = EffectRegistry::<EffectSlot, 16>::new();
        register_builtin_effects(&mut registry).unwrap();
        let mut composer = ZoneComposer::<EffectSlot, LEDS>::new(STRIP);

        assert_eq!(
            composer.load_preset(9, &mut registry),
            Err(ZoneError::InvalidPreset(9))
        );
        assert_eq!(composer.load_preset(3, &mut registry), Ok(()));
        assert_eq!(composer.zone_count(), 4);
        assert_eq!(
            composer.zone(0).unwrap().effect,
            Some(BuiltinEffect::Fire.raw())
        );
        assert_eq!(composer.zone(1).unwrap().blend_mode, BlendMode::Additive);

        composer.set_enabled(true);
        let mut output = [BLACK; LEDS];
        let report = composer.render(
            &mut output,
            &frame(),
            &[],
            &NarrativeEngine::default(),
            registry.memory_mut(),
        );
        assert_eq!(report.zones_rendered, 4);
        assert!(report.init_failures.is_empty());

        registry.mark_unavailable(BuiltinEffect::Heartbeat.raw());
        assert_eq!(
            composer.load_preset(4, &mut registry),
            Err(ZoneError::UnknownEffect(BuiltinEffect::Heartbeat.raw()))
        );
        assert_eq!(composer.zone_count(), 4);
    }

    #[test]
    fn test_parameter_reaches_zone_instances() {
        let (mut composer, _registry) = three_zones();
        assert_eq!(composer.set_effect_parameter(BLUE_ID, "level", 0.5), 1);
        assert_eq!(composer.set_effect_parameter(BLUE_ID, "level", 3.0), 0);

        let mut output = [BLACK; LEDS];
        let mut memory = WorkingSetPool::new();
        composer.render(
            &mut output,
            &frame(),
            &[],
            &NarrativeEngine::default(),
            &mut memory,
        );
        assert_eq!(output[40], Rgb { r: 0, g: 0, b: 127 });
        assert_eq!(output[80], RED);
    }
}
