use library_seats::shifts::{overlaps, overlaps_labels, Shift};
use proptest::prelude::*;

fn shift() -> impl Strategy<Value = Shift> {
    prop::sample::select(Shift::ALL.to_vec())
}

fn shifts() -> impl Strategy<Value = Vec<Shift>> {
    prop::collection::vec(shift(), 0..6)
}

proptest! {
    #[test]
    fn shift_overlaps_itself_among_others(s in shift(), mut others in shifts()) {
        others.push(s);
        prop_assert!(overlaps(s, others));
    }

    #[test]
    fn full_day_in_booked_always_overlaps(s in shift(), mut others in shifts()) {
        others.insert(0, Shift::FullDay);
        prop_assert!(overlaps(s, others));
    }

    #[test]
    fn adding_bookings_never_frees_a_shift(s in shift(), a in shifts(), b in shifts()) {
        let before = overlaps(s, a.clone());
        let mut combined = a;
        combined.extend(b);
        prop_assert!(!before || overlaps(s, combined));
    }

    #[test]
    fn set_overlap_is_any_pairwise_overlap(s in shift(), booked in shifts()) {
        let pairwise = booked.iter().any(|&b| overlaps(s, [b]));
        prop_assert_eq!(overlaps(s, booked), pairwise);
    }

    #[test]
    fn label_entry_point_agrees_with_enum(s in shift(), booked in shifts()) {
        let labels: Vec<&str> = booked.iter().map(|b| b.label()).collect();
        prop_assert_eq!(overlaps_labels(s.label(), &labels), Ok(overlaps(s, booked)));
    }

    #[test]
    fn unknown_labels_are_rejected(label in "[a-z ]{1,12}") {
        prop_assert!(label.parse::<Shift>().is_err());
        prop_assert!(overlaps_labels("24*7", &[label.as_str()]).is_err());
    }
}

#[test]
fn disjoint_and_documented_examples() {
    assert_eq!(overlaps_labels("6:30 AM to 2 PM", &["6:30 PM to 11 PM"]), Ok(false));
    assert_eq!(overlaps_labels("2 PM to 9:30 PM", &["6:30 AM to 6:30 PM"]), Ok(true));
}

#[test]
fn every_pair_checked_in_both_directions() {
    // (a, b, overlaps(a,[b]), overlaps(b,[a]))
    let expected = [
        (Shift::Morning, Shift::Afternoon, false, false),
        (Shift::Morning, Shift::Evening, false, false),
        (Shift::Morning, Shift::Day, true, true),
        (Shift::Morning, Shift::Late, false, false),
        (Shift::Morning, Shift::Night, false, true),
        (Shift::Afternoon, Shift::Evening, true, true),
        (Shift::Afternoon, Shift::Day, true, true),
        (Shift::Afternoon, Shift::Late, true, true),
        (Shift::Afternoon, Shift::Night, false, false),
        (Shift::Evening, Shift::Day, false, false),
        (Shift::Evening, Shift::Late, true, true),
        (Shift::Evening, Shift::Night, true, true),
        (Shift::Day, Shift::Late, true, true),
        (Shift::Day, Shift::Night, false, false),
        (Shift::Late, Shift::Night, true, true),
    ];
    for (a, b, forward, backward) in expected {
        assert_eq!(overlaps(a, [b]), forward, "overlaps({a}, [{b}])");
        assert_eq!(overlaps(b, [a]), backward, "overlaps({b}, [{a}])");
    }
    for s in Shift::ALL {
        assert!(overlaps(Shift::FullDay, [s]));
        assert!(overlaps(s, [Shift::FullDay]));
    }
}
