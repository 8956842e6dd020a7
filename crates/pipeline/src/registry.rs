//! Shared slot for the latest published model.

use std::sync::{Arc, RwLock};

use stockcast_model::FittedModel;

/// Holds the model the most recent successful run produced.
///
/// Readers clone the `Arc` under the read lock, so serving never blocks a
/// publish for longer than the clone. Publishing takes the write lock and
/// replaces the slot wholesale; there is no partial state to observe. Only
/// the latest model is kept.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    slot: RwLock<Option<Arc<FittedModel>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published model and hand back the shared handle.
    pub fn publish(&self, model: FittedModel) -> Arc<FittedModel> {
        let model = Arc::new(model);
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::clone(&model));
        model
    }

    /// The latest published model, if any run has completed training.
    pub fn current(&self) -> Option<Arc<FittedModel>> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;

    use stockcast_core::{ForestConfig, PipelineConfig, ProductId};
    use stockcast_features::FeatureBuilder;
    use stockcast_series::CanonicalObservation;
    use stockcast_model::train;

    use super::*;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            lags: BTreeSet::from([1]),
            rolling_windows: BTreeSet::from([2]),
            min_training_rows: 5,
            forest: ForestConfig {
                n_trees: 3,
                ..ForestConfig::default()
            },
            ..PipelineConfig::default()
        }
    }

    fn test_model(days: u64) -> FittedModel {
        let product = ProductId::new();
        let base = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let observations: Vec<CanonicalObservation> = (0..days)
            .map(|d| CanonicalObservation {
                product_id: product,
                date: base + chrono::Days::new(d),
                units_sold: (d % 5) as f64 + 1.0,
                units_in: 0.0,
                units_out: 0.0,
                on_hand: Some(40.0),
                category: None,
            })
            .collect();
        let config = test_config();
        let builder = FeatureBuilder::fit(&observations, &config).unwrap();
        let rows = builder.training_set(&observations);
        train(builder, rows, &config).unwrap()
    }

    #[test]
    fn empty_registry_has_no_model() {
        assert!(ModelRegistry::new().current().is_none());
    }

    #[test]
    fn publish_hands_back_the_same_model_current_sees() {
        let registry = ModelRegistry::new();
        let published = registry.publish(test_model(20));

        let current = registry.current().unwrap();
        assert!(Arc::ptr_eq(&published, &current));
    }

    #[test]
    fn publish_replaces_the_previous_model_wholesale() {
        let registry = ModelRegistry::new();
        registry.publish(test_model(20));
        let old = registry.current().unwrap();

        let new = registry.publish(test_model(30));

        let current = registry.current().unwrap();
        assert!(Arc::ptr_eq(&new, &current));
        assert!(!Arc::ptr_eq(&old, &current));
    }

    #[test]
    fn concurrent_readers_see_the_old_or_the_new_model_never_a_torn_one() {
        let registry = ModelRegistry::new();
        let first = test_model(20);
        let second = test_model(30);
        let expected = [first.training_rows(), second.training_rows()];
        registry.publish(first);

        std::thread::scope(|scope| {
            let registry = &registry;
            let readers: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || {
                        for _ in 0..200 {
                            let model = registry.current().unwrap();
                            assert!(expected.contains(&model.training_rows()));
                        }
                    })
                })
                .collect();

            scope.spawn(move || {
                registry.publish(second);
            });

            for reader in readers {
                reader.join().unwrap();
            }
        });
    }
}
