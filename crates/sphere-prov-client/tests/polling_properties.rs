//! Property tests for the polling budget and teardown pairing.

use proptest::prelude::*;

use sphere_prov_client::sim::{scripted, PlatformEvent, Script};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn timed_out_runs_poll_clamped_budget(timeout_ms in 0u32..5_000) {
        let (mut prov, journal) = scripted(Script::never_assigned());
        let (result, report) = prov.provision_with_report("0ne00ABCDEF", timeout_ms);
        prop_assert!(result.unwrap_err().is_timeout());
        let expected = (timeout_ms / 100).max(1);
        prop_assert_eq!(report.ticks(), expected);
        prop_assert_eq!(journal.ticks() as u32, expected);
    }

    #[test]
    fn assignment_within_budget_always_succeeds(budget in 1u32..50, offset in 0u32..50) {
        let tick = 1 + offset % budget;
        let (mut prov, journal) = scripted(Script::assign_after(tick, "h.azure-devices.net"));
        let hub = prov.provision("0cn00ABCDEF", budget * 100);
        prop_assert!(hub.is_ok());
        prop_assert_eq!(journal.ticks() as u32, tick);
    }

    #[test]
    fn attest_init_and_deinit_always_pair(
        china in any::<bool>(),
        never in any::<bool>(),
        hub_fails in any::<bool>(),
    ) {
        let mut script = if never {
            Script::never_assigned()
        } else {
            Script::default()
        };
        if hub_fails {
            script = script.with_hub_create_failure();
        }
        let (mut prov, journal) = scripted(script);
        let scope = if china { "0cn00ABCDEF" } else { "0ne00ABCDEF" };
        let result = prov.provision(scope, 200);
        drop(result);

        let inits = journal.count(|e| matches!(e, PlatformEvent::AttestInit { .. }));
        let deinits = journal.count(|e| *e == PlatformEvent::AttestDeinit);
        prop_assert_eq!(inits, 1);
        prop_assert_eq!(deinits, 1);
        prop_assert_eq!(journal.count(|e| *e == PlatformEvent::DpsDestroy), 1);
        prop_assert!(!prov.attest().is_initialized());
    }
}
