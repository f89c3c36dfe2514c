//! Acceptance checks for the built-in outcome tables and the resolver
//! laws the session depends on.

use deepsix_session::{OutcomeTable, Severity, TableSet};

/// Every total the roll engine can produce, with margin on both sides.
const TOTAL_DOMAIN: std::ops::RangeInclusive<i32> = -30..=40;

fn tables() -> &'static TableSet {
    let set = TableSet::builtin();
    set.validate().expect("built-in tables validate");
    set
}

fn check_exhaustive(table: &OutcomeTable, label: &str) {
    let ceiling = table.entries.last().unwrap();
    for total in TOTAL_DOMAIN {
        let matches = table
            .entries
            .iter()
            .filter(|entry| entry.contains(total))
            .count();
        if total > ceiling.max {
            assert_eq!(matches, 0, "{label}: total {total} above the ceiling");
            assert_eq!(table.resolve_by_total(total).id, ceiling.id);
        } else {
            assert_eq!(matches, 1, "{label}: total {total} must match exactly once");
        }
    }
}

#[test]
fn tables_are_exhaustive_over_the_total_domain() {
    let set = tables();
    check_exhaustive(&set.stress, "stress");
    check_exhaustive(&set.panic, "panic");
}

#[test]
fn bump_never_self_selects() {
    let set = tables();
    for table in [&set.stress, &set.panic] {
        for total in TOTAL_DOMAIN {
            for entry in &table.entries {
                if let Some(bumped) = table.next_distinct_higher(total, &entry.id) {
                    assert_ne!(
                        bumped.id, entry.id,
                        "bump returned the excluded id for total {total}"
                    );
                }
            }
        }
    }
}

#[test]
fn bump_targets_sit_strictly_above_the_resolved_range() {
    let set = tables();
    for table in [&set.stress, &set.panic] {
        for total in -25..=25 {
            let resolved = table.resolve_by_total(total);
            if let Some(bumped) = table.next_distinct_higher(total, &resolved.id) {
                assert!(bumped.min > resolved.max);
            }
        }
    }
}

#[test]
fn every_severity_rank_is_monotone_per_table() {
    let set = tables();
    for table in [&set.stress, &set.panic] {
        for pair in table.entries.windows(2) {
            assert!(
                pair[0].severity <= pair[1].severity,
                "severity ranks must not decrease up the table"
            );
        }
    }
}

#[test]
fn choice_sets_only_appear_on_persistent_panic_entries() {
    let set = tables();
    for entry in &set.panic.entries {
        if !entry.choices.is_empty() {
            assert!(entry.persistent, "choice entries commit as conditions");
        }
    }
    for entry in &set.stress.entries {
        assert!(entry.choices.is_empty(), "stress entries offer no choices");
    }
}

#[test]
fn severity_table_selection() {
    let set = tables();
    assert_eq!(
        set.table_for(Severity::Stress).entries[0].id,
        set.stress.entries[0].id
    );
    assert_eq!(
        set.table_for(Severity::Panic).entries[0].id,
        set.panic.entries[0].id
    );
}
