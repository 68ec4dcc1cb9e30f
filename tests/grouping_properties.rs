use bcanorm::dilution::{dilution_for, DilutionTarget};
use bcanorm::plate::AbsorbanceGrid;
use bcanorm::replicate::{group_replicates, MAX_GROUPS};
use proptest::prelude::*;

fn grid_strategy() -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(0.0f64..4.0, 12), 8)
}

proptest! {
    #[test]
    fn full_plate_always_yields_32_groups(rows in grid_strategy()) {
        let grid = AbsorbanceGrid::from_values(rows).unwrap();
        let groups = group_replicates(&grid.readings());
        prop_assert_eq!(groups.len(), MAX_GROUPS);
        for g in &groups {
            let lo = g.readings.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = g.readings.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(g.mean() >= lo - 1e-12 && g.mean() <= hi + 1e-12);
        }
    }

    #[test]
    fn short_tail_drops_without_padding(rows in grid_strategy(), missing in 1usize..=2) {
        let grid = AbsorbanceGrid::from_values(rows).unwrap();
        let mut flat = grid.readings();
        flat.truncate(flat.len() - missing);
        let groups = group_replicates(&flat);
        prop_assert_eq!(groups.len(), MAX_GROUPS - 1);
        prop_assert!(groups.iter().all(|g| g.wells.iter().all(|w| w.plate_index() < flat.len())));
    }

    #[test]
    fn volumes_always_sum_to_final(conc in 1e-3f64..100.0, target in 0.1f64..5.0, final_volume in 0.01f64..2.0) {
        let t = DilutionTarget::new(target, final_volume);
        let d = dilution_for(conc, &t).unwrap();
        prop_assert!(d.sample_volume <= final_volume);
        prop_assert!(d.diluent_volume >= 0.0);
        prop_assert!((d.sample_volume + d.diluent_volume - final_volume).abs() < 1e-9);
        if conc < target * (1.0 - 1e-9) {
            prop_assert!(d.clamped);
        } else if conc > target * (1.0 + 1e-9) {
            prop_assert!(!d.clamped);
        }
    }
}
