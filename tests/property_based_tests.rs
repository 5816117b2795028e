mod common;

use clip_batch::{DatasetRef, Dispatcher, JobBuilder, JobDescriptor};
use common::*;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn builder() -> JobBuilder {
    JobBuilder::new(DatasetRef::from("States"), "OBJECTID", "/data/output", "shp")
}

proptest! {
    /// Property: N identifiers and M targets give N*M jobs, N per target, in identifier order
    #[test]
    fn job_lists_cover_every_pair_once(
        identifiers in identifier_list_strategy(),
        targets in target_list_strategy(),
    ) {
        let b = builder();
        let mut pairs = HashSet::new();
        let mut paths = HashSet::new();
        let mut total = 0;

        for target in &targets {
            let jobs = b.build(&identifiers, &DatasetRef::from(target.as_str())).unwrap();
            prop_assert_eq!(jobs.len(), identifiers.len());

            let order: Vec<_> = jobs.iter().map(|j| j.identifier.clone()).collect();
            prop_assert_eq!(&order, &identifiers);

            for job in jobs {
                prop_assert!(pairs.insert((job.target.clone(), job.identifier.clone())));
                prop_assert!(paths.insert(job.output_path.clone()));
                total += 1;
            }
        }

        prop_assert_eq!(total, identifiers.len() * targets.len());
    }

    /// Property: the same (identifier, target) always maps to the same output path
    #[test]
    fn output_paths_are_stable(identifiers in identifier_list_strategy(), target in dataset_name_strategy()) {
        let target = DatasetRef::from(target);
        let first = builder().build(&identifiers, &target).unwrap();
        let second = builder().build(&identifiers, &target).unwrap();
        prop_assert_eq!(first, second);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: a round collects one outcome per job and counts exactly the injected failures
    #[test]
    fn rounds_never_lose_outcomes(mask in failure_mask_strategy(), slots in 1usize..6) {
        let mut backend = MockBackend::new();
        for (index, fail) in mask.iter().enumerate() {
            if *fail {
                backend = backend.with_behavior(index as i64, Behavior::ReportFailure);
            }
        }

        let out = tempfile::TempDir::new().unwrap();
        let identifiers = ids(&(0..mask.len() as i64).collect::<Vec<_>>());
        let jobs: Vec<JobDescriptor> =
            JobBuilder::new(DatasetRef::from("States"), "id", out.path(), "shp")
                .build(&identifiers, &DatasetRef::from("Roads"))
                .unwrap();

        let dispatcher = Dispatcher::with_parallelism(Arc::new(backend), slots);
        let report = tokio_test::block_on(dispatcher.dispatch_round(&DatasetRef::from("Roads"), jobs))
            .unwrap();

        prop_assert!(report.is_complete());
        prop_assert_eq!(report.outcomes.len(), mask.len());
        prop_assert_eq!(report.failed_count(), mask.iter().filter(|f| **f).count());

        for (outcome, fail) in report.outcomes.iter().zip(&mask) {
            prop_assert_eq!(outcome.success, !*fail);
        }
    }
}
