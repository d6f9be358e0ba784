mod tests {
    use lightwave_engine::effect::{
        BuiltinEffect, Effect, EffectCategory, EffectSlot, ParameterError, SolidEffect,
        register_builtin_effects,
    };
    use lightwave_engine::registry::{EffectRegistry, RegistryError};

    fn solid() -> EffectSlot {
        EffectSlot::Solid(SolidEffect::new())
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = EffectRegistry::<EffectSlot, 4>::new();
        assert_eq!(registry.register(3, "solid", solid), Ok(()));
        assert_eq!(
            registry.register(3, "other", solid),
            Err(RegistryError::Duplicate(3))
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.name(3), Some("solid"));
    }

    #[test]
    fn test_register_rejects_when_full() {
        let mut registry = EffectRegistry::<EffectSlot, 2>::new();
        assert_eq!(registry.register(0, "a", solid), Ok(()));
        assert_eq!(registry.register(1, "b", solid), Ok(()));
        assert_eq!(registry.register(2, "c", solid), Err(RegistryError::Full));
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_registered(2));
    }

    #[test]
    fn test_builtin_registration() {
        let mut registry = EffectRegistry::<EffectSlot, 16>::new();
        register_builtin_effects(&mut registry).unwrap();
        assert_eq!(registry.len(), BuiltinEffect::ALL.len());
        for effect in BuiltinEffect::ALL {
            assert!(registry.is_available(effect.raw()));
            assert_eq!(registry.name(effect.raw()), Some(effect.as_str()));
        }
        let fire = registry.metadata(BuiltinEffect::Fire.raw()).unwrap();
        assert_eq!(fire.category, EffectCategory::Fire);
    }

    #[test]
    fn test_unregister() {
        let mut registry = EffectRegistry::<EffectSlot, 4>::new();
        registry.register(5, "solid", solid).unwrap();
        assert_eq!(registry.unregister(5), Ok(()));
        assert_eq!(registry.unregister(5), Err(RegistryError::NotRegistered(5)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_availability_and_catalog() {
        let mut registry = EffectRegistry::<EffectSlot, 16>::new();
        register_builtin_effects(&mut registry).unwrap();
        registry.mark_unavailable(2);
        assert!(!registry.is_available(2));
        assert!(registry.is_registered(2));

        let catalog = registry.catalog(4);
        assert!(!catalog.available.contains(2));
        assert!(catalog.available.contains(1));
        assert_eq!(catalog.available.len(), BuiltinEffect::ALL.len() - 1);
        assert_eq!(catalog.name(2), Some("fire"));
        assert_eq!(catalog.palette_count, 4);

        registry.reset_availability();
        assert!(registry.is_available(2));
    }

    #[test]
    fn test_construct_builds_independent_instances() {
        let mut registry = EffectRegistry::<EffectSlot, 4>::new();
        registry.register(0, "solid", solid).unwrap();

        registry
            .instance_mut(0)
            .unwrap()
            .set_parameter("hue", 100.0)
            .unwrap();
        let fresh = registry.construct(0).unwrap();
        assert_eq!(fresh.get_parameter("hue"), Some(0.0));
        assert_eq!(
            registry.instance(0).unwrap().get_parameter("hue"),
            Some(100.0)
        );
    }

    #[test]
    fn test_parameter_validation() {
        let mut registry = EffectRegistry::<EffectSlot, 4>::new();
        registry.register(0, "solid", solid).unwrap();
        let effect = registry.instance_mut(0).unwrap();

        assert_eq!(effect.parameter_count(), 2);
        assert_eq!(effect.parameter_descriptor(0).map(|p| p.name), Some("hue"));
        assert_eq!(
            effect.set_parameter("hue", 300.0),
            Err(ParameterError::OutOfRange)
        );
        assert_eq!(
            effect.set_parameter("hue", f32::NAN),
            Err(ParameterError::NotFinite)
        );
        assert_eq!(
            effect.set_parameter("missing", 1.0),
            Err(ParameterError::Unknown)
        );
        assert_eq!(effect.get_parameter("hue"), Some(0.0));
    }
}
