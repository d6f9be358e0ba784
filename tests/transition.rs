mod tests {
    use embassy_time::{Duration, Instant};
    use lightwave_engine::color::Rgb;
    use lightwave_engine::easing::EasingCurve;
    use lightwave_engine::effect::{EffectSlot, register_builtin_effects};
    use lightwave_engine::registry::EffectRegistry;
    use lightwave_engine::transition::{
        TransitionEngine, TransitionError, TransitionKind, TransitionState, TransitionStep,
        compose_frames,
    };

    const STRIP: usize = 160;
    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };

    fn registry() -> EffectRegistry<EffectSlot, 16> {
        let mut registry = EffectRegistry::new();
        register_builtin_effects(&mut registry).unwrap();
        registry
    }

    fn fade(progress: f32) -> Vec<Rgb> {
        let from = [RED; STRIP];
        let to = [BLUE; STRIP];
        let mut output = vec![Rgb::default(); STRIP];
        compose_frames(
            TransitionKind::Fade,
            progress,
            progress,
            0,
            &from,
            &to,
            &mut output,
            STRIP,
        );
        output
    }

    #[test]
    fn test_fade_boundaries() {
        assert!(fade(0.0).iter().all(|led| *led == RED));
        assert!(fade(1.0).iter().all(|led| *led == BLUE));
    }

    #[test]
    fn test_fade_midpoint() {
        for led in fade(0.5) {
            assert!(led.r.abs_diff(128) <= 1, "{led:?}");
            assert_eq!(led.g, 0);
            assert!(led.b.abs_diff(128) <= 1, "{led:?}");
        }
    }

    #[test]
    fn test_every_kind_ends_on_target() {
        let from = [RED; STRIP];
        let to = [BLUE; STRIP];
        for kind in TransitionKind::ALL {
            let mut output = [Rgb::default(); STRIP];
            compose_frames(kind, 1.0, 1.0, 5, &from, &to, &mut output, STRIP);
            let mixed = output
                .iter()
                .filter(|led| led.r > 8 && led.b < 247)
                .count();
            assert_eq!(mixed, 0, "{kind:?}");
        }
    }

    #[test]
    fn test_wipe_out_is_center_symmetric() {
        let from = [RED; STRIP];
        let to = [BLUE; STRIP];
        let mut output = [Rgb::default(); STRIP];
        compose_frames(
            TransitionKind::WipeOut,
            0.5,
            0.5,
            0,
            &from,
            &to,
            &mut output,
            STRIP,
        );
        assert_eq!(output[79], BLUE);
        assert_eq!(output[80], BLUE);
        assert_eq!(output[0], RED);
        assert_eq!(output[159], RED);
        for i in 0..STRIP / 2 {
            assert_eq!(output[79 - i], output[80 + i]);
        }
    }

    #[test]
    fn test_trigger_rejects_unknown_and_same_effect() {
        let registry = registry();
        let mut engine = TransitionEngine::<STRIP>::new();
        let now = Instant::from_millis(0);

        assert_eq!(
            engine.trigger(Some(0), 42, TransitionKind::Fade, None, now, &registry),
            Err(TransitionError::UnknownEffect(42))
        );
        assert_eq!(
            engine.trigger(Some(1), 1, TransitionKind::Fade, None, now, &registry),
            Err(TransitionError::SameEffect)
        );
        assert_eq!(engine.state(), &TransitionState::Idle);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_state_machine() {
        let registry = registry();
        let mut engine = TransitionEngine::<STRIP>::new();
        let start = Instant::from_millis(500);
        engine
            .trigger(
                Some(0),
                1,
                TransitionKind::Fade,
                Some(Duration::from_millis(200)),
                start,
                &registry,
            )
            .unwrap();
        assert!(engine.is_active());
        assert_eq!(engine.active().map(|active| active.curve), Some(EasingCurve::Linear));
        assert_eq!(engine.progress(start), 0.0);

        let half = start + Duration::from_millis(100);
        assert!((engine.progress(half) - 0.5).abs() < 0.01);
        match engine.advance(half) {
            TransitionStep::Blend { from, to, raw } => {
                assert_eq!(from, Some(0));
                assert_eq!(to, 1);
                assert!((raw - 0.5).abs() < 0.01);
            }
            step => panic!("unexpected {step:?}"),
        }

        let end = start + Duration::from_millis(200);
        assert_eq!(engine.advance(end), TransitionStep::Finished { to: 1 });
        assert_eq!(engine.state(), &TransitionState::Complete { to: 1 });
        assert!(!engine.is_active());
        assert_eq!(engine.advance(end), TransitionStep::Idle);
        assert_eq!(engine.state(), &TransitionState::Idle);
    }

    #[test]
    fn test_new_trigger_supersedes_running_transition() {
        let registry = registry();
        let mut engine = TransitionEngine::<STRIP>::new();
        let now = Instant::from_millis(0);
        engine
            .trigger(Some(0), 1, TransitionKind::Iris, None, now, &registry)
            .unwrap();
        let later = now + Duration::from_millis(300);
        engine
            .trigger(Some(0), 2, TransitionKind::Dissolve, None, later, &registry)
            .unwrap();

        let active = engine.active().copied().unwrap();
        assert_eq!(active.to, 2);
        assert_eq!(active.kind, TransitionKind::Dissolve);
        assert_eq!(active.started, later);
        assert_eq!(active.duration, TransitionKind::Dissolve.default_duration());
        assert_eq!(engine.progress(later), 0.0);
    }

    #[test]
    fn test_cancel() {
        let registry = registry();
        let mut engine = TransitionEngine::<STRIP>::new();
        let now = Instant::from_millis(0);
        assert!(engine.cancel().is_none());
        engine
            .trigger(None, 3, TransitionKind::WipeIn, None, now, &registry)
            .unwrap();
        assert_eq!(engine.cancel().map(|active| active.to), Some(3));
        assert_eq!(engine.advance(now), TransitionStep::Idle);
    }

    #[test]
    fn test_kind_lookup() {
        for (raw, kind) in TransitionKind::ALL.iter().enumerate() {
            assert_eq!(TransitionKind::from_raw(raw as u8), Some(*kind));
            assert!(kind.default_duration() > Duration::from_millis(0));
        }
        assert_eq!(TransitionKind::from_raw(200), None);
        for (raw, curve) in EasingCurve::ALL.iter().enumerate() {
            assert_eq!(EasingCurve::from_raw(raw as u8), Some(*curve));
        }
        assert_eq!(EasingCurve::from_raw(EasingCurve::ALL.len() as u8), None);
        assert_eq!(
            TransitionKind::Fade.default_duration(),
            Duration::from_millis(800)
        );
    }
}
