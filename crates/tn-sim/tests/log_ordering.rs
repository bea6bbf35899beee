//! Logged times are strictly increasing and span `[t0, t_stop]`.

use proptest::prelude::*;
use tn_network::NetworkBuilder;
use tn_sim::{Method, SignalLog, Solver, SolverOptions};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn logged_times_strictly_increase(
        capacitance in 10.0f64..1e4,
        conductance in 0.0f64..50.0,
        power in -100.0f64..100.0,
        t_stop in 1.0f64..500.0,
        implicit in any::<bool>(),
    ) {
        let mut b = NetworkBuilder::new();
        b.add_reference("ambient", 293.15).unwrap();
        b.add_mass("m", capacitance, 300.0).unwrap();
        b.add_link("m", "ambient", conductance).unwrap();
        b.add_constant_source("m", power).unwrap();
        let net = b.build().unwrap();

        let method = if implicit { Method::Trapezoidal } else { Method::DormandPrince };
        let mut log = SignalLog::new();
        log.register_temperature("T", &net, "m").unwrap();
        let summary = Solver::new(&net, SolverOptions::until(t_stop).with_method(method))
            .unwrap()
            .run(&mut log)
            .unwrap();

        let times = log.get("T").unwrap().times();
        prop_assert_eq!(times[0], 0.0);
        prop_assert_eq!(*times.last().unwrap(), t_stop);
        prop_assert!(times.windows(2).all(|w| w[1] > w[0]));
        prop_assert_eq!(times.len(), summary.stats.accepted_steps + 1);
    }
}
