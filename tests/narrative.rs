mod tests {
    use embassy_time::Instant;
    use lightwave_engine::NarrativeCommand;
    use lightwave_engine::narrative::{NarrativeConfig, NarrativeEngine, NarrativePhase};

    const START_MS: u64 = 10_000;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(START_MS + ms)
    }

    fn enabled_engine() -> NarrativeEngine {
        let mut engine = NarrativeEngine::default();
        engine.update(at(0));
        engine.apply(NarrativeCommand::Enable, at(0));
        engine
    }

    #[test]
    fn test_disabled_is_neutral() {
        let mut engine = NarrativeEngine::default();
        engine.update(at(1234));
        assert!(!engine.is_enabled());
        assert_eq!(engine.intensity(None), 1.0);
        assert_eq!(engine.phase(None), NarrativePhase::Hold);
        assert_eq!(engine.phase_t(None), 1.0);
        assert_eq!(engine.tempo_multiplier(), 1.0);
        assert_eq!(engine.complexity_scaling(), 1.0);
        assert!(!engine.just_entered(NarrativePhase::Hold));
    }

    #[test]
    fn test_default_cycle() {
        let config = NarrativeConfig::default();
        assert!(close(config.total(), 4.0));

        let mut engine = enabled_engine();
        engine.update(at(750));
        assert_eq!(engine.phase(None), NarrativePhase::Build);
        assert!(close(engine.phase_t(None), 0.5));
        assert!(close(engine.intensity(None), 0.25));

        engine.update(at(1600));
        assert_eq!(engine.phase(None), NarrativePhase::Hold);
        assert!(engine.just_entered(NarrativePhase::Hold));
        engine.update(at(1650));
        assert!(!engine.just_entered(NarrativePhase::Hold));

        engine.update(at(2500));
        assert_eq!(engine.phase(None), NarrativePhase::Release);

        engine.update(at(3700));
        assert_eq!(engine.phase(None), NarrativePhase::Rest);
        assert_eq!(engine.intensity(None), 0.0);

        engine.update(at(4100));
        assert_eq!(engine.phase(None), NarrativePhase::Build);
        assert!(engine.just_entered(NarrativePhase::Build));
        assert!(close(engine.cycle_t(None), 0.025));
    }

    #[test]
    fn test_tension_override() {
        let mut engine = NarrativeEngine::default();
        engine.set_tension(0.7);
        assert!(close(engine.intensity(None), 0.7));
        assert!(close(engine.tempo_multiplier(), 1.35));
        assert!(close(engine.complexity_scaling(), 0.85));

        engine.set_tension(2.0);
        assert_eq!(engine.intensity(None), 1.0);

        engine.set_tension(-1.0);
        assert_eq!(engine.tempo_multiplier(), 1.0);
    }

    #[test]
    fn test_zone_offsets() {
        let mut engine = enabled_engine();
        engine.set_zone_offset(1, 0.5);
        engine.set_zone_offset(2, 1.25);
        engine.set_zone_offset(3, -0.25);
        engine.update(at(750));

        assert_eq!(engine.phase(Some(0)), NarrativePhase::Build);
        assert_eq!(engine.phase(Some(1)), NarrativePhase::Release);
        assert!(close(engine.zone_offset(2), 0.25));
        assert!(close(engine.zone_offset(3), 0.75));
        assert_eq!(engine.zone_offset(200), 0.0);
    }

    #[test]
    fn test_pause_freezes_the_cycle() {
        let mut engine = enabled_engine();
        engine.update(at(750));
        engine.apply(NarrativeCommand::Pause, at(750));
        assert!(engine.is_paused());

        engine.update(at(2000));
        assert_eq!(engine.phase(None), NarrativePhase::Build);
        assert!(close(engine.phase_t(None), 0.5));

        engine.apply(NarrativeCommand::Resume, at(2000));
        engine.update(at(2000));
        assert!(!engine.is_paused());
        assert!(close(engine.phase_t(None), 0.5));

        engine.update(at(2750));
        assert_eq!(engine.phase(None), NarrativePhase::Hold);
    }

    #[test]
    fn test_set_phase_jumps() {
        let mut engine = enabled_engine();
        engine.update(at(100));
        engine.set_phase(NarrativePhase::Release, 1000);
        assert_eq!(engine.phase(None), NarrativePhase::Release);
        assert!(close(engine.config().release, 1.0));

        engine.update(at(600));
        assert_eq!(engine.phase(None), NarrativePhase::Release);
        assert!(close(engine.phase_t(None), 0.5));
    }

    #[test]
    fn test_trigger_restarts_build() {
        let mut engine = enabled_engine();
        engine.update(at(2500));
        engine.apply(NarrativeCommand::Trigger, at(2500));
        assert_eq!(engine.phase(None), NarrativePhase::Build);
        assert!(close(engine.cycle_t(None), 0.0));
        assert!(engine.just_entered(NarrativePhase::Build));
    }

    #[test]
    fn test_command_entry_survives_next_update() {
        let mut engine = enabled_engine();
        engine.update(at(2500));
        engine.apply(NarrativeCommand::Trigger, at(2500));
        engine.update(at(2510));
        assert!(engine.just_entered(NarrativePhase::Build));
        engine.update(at(2520));
        assert!(!engine.just_entered(NarrativePhase::Build));

        engine.apply(
            NarrativeCommand::SetPhase {
                phase: NarrativePhase::Release,
                duration_ms: 1000,
            },
            at(2520),
        );
        engine.update(at(2530));
        assert_eq!(engine.phase(None), NarrativePhase::Release);
        assert!(engine.just_entered(NarrativePhase::Release));
        engine.update(at(2540));
        assert!(!engine.just_entered(NarrativePhase::Release));
    }

    #[test]
    fn test_duration_limits() {
        let mut engine = NarrativeEngine::default();
        engine.set_durations(0.0, -1.0, f32::NAN, 2.0);
        let config = engine.config();
        assert!(close(config.build, 0.01));
        assert_eq!(config.hold, 0.0);
        assert!(close(config.release, 0.01));
        assert!(close(config.rest, 2.0));

        engine.set_phase(NarrativePhase::Hold, 5);
        assert!(close(engine.config().hold, 0.1));
        engine.set_phase(NarrativePhase::Hold, 100_000);
        assert!(close(engine.config().hold, 60.0));
    }

    #[test]
    fn test_set_tempo_scales_every_phase() {
        let mut engine = NarrativeEngine::default();
        engine.set_tempo(8.0);
        assert!(close(engine.config().build, 3.0));
        assert!(close(engine.config().rest, 1.0));
        assert!(close(engine.config().total(), 8.0));

        engine.set_tempo(0.0);
        assert!(close(engine.config().total(), 8.0));
    }

    #[test]
    fn test_stall_restarts_cycle() {
        let mut engine = enabled_engine();
        engine.update(at(30_750));
        assert_eq!(engine.phase(None), NarrativePhase::Build);
        assert!(close(engine.cycle_t(None), 0.0));
    }
}
