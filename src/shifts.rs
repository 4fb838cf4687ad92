//! Каталог смен библиотеки и таблица их пересечений.
//!
//! Таблица пересечений задана бизнесом вручную и не вычисляется из времени
//! начала и конца смены. Строки таблицы хранятся как есть, включая
//! несимметричные пары.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shift {0:?}, expected one of: {list}", list = Shift::label_list())]
pub struct InvalidShiftError(pub String);

/// Смена, на которую бронируется место. На проводе передаётся меткой.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Shift {
    Morning,
    Afternoon,
    Evening,
    Day,
    Late,
    /// Переходит через полночь.
    Night,
    /// Круглосуточно, без выходных. Пересекается со всеми сменами.
    FullDay,
}

impl Shift {
    pub const ALL: [Shift; 7] = [
        Shift::Morning,
        Shift::Afternoon,
        Shift::Evening,
        Shift::Day,
        Shift::Late,
        Shift::Night,
        Shift::FullDay,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Shift::Morning => "6:30 AM to 2 PM",
            Shift::Afternoon => "2 PM to 9:30 PM",
            Shift::Evening => "6:30 PM to 11 PM",
            Shift::Day => "6:30 AM to 6:30 PM",
            Shift::Late => "2 PM to 11 PM",
            Shift::Night => "9:30 PM to 6:30 AM",
            Shift::FullDay => "24*7",
        }
    }

    /// Строка таблицы пересечений: смены, с которыми конфликтует `self`.
    /// Всегда содержит саму смену и `FullDay`.
    pub fn overlapping(self) -> &'static [Shift] {
        use Shift::*;
        match self {
            Morning => &[Morning, Day, FullDay],
            Afternoon => &[Afternoon, Evening, Day, Late, FullDay],
            Evening => &[Evening, Afternoon, Late, Night, FullDay],
            Day => &[Day, Morning, Afternoon, Late, FullDay],
            Late => &[Late, Afternoon, Evening, Day, Night, FullDay],
            // Night -> Morning есть, а Morning -> Night нет
            Night => &[Night, Evening, Late, Morning, FullDay],
            FullDay => &[Morning, Afternoon, Evening, Day, Late, Night, FullDay],
        }
    }

    fn label_list() -> String {
        Shift::ALL
            .iter()
            .map(|s| format!("{:?}", s.label()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Shift {
    type Err = InvalidShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Shift::ALL
            .into_iter()
            .find(|shift| shift.label() == trimmed)
            .ok_or_else(|| InvalidShiftError(s.to_string()))
    }
}

impl TryFrom<String> for Shift {
    type Error = InvalidShiftError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Shift> for String {
    fn from(shift: Shift) -> Self {
        shift.label().to_string()
    }
}

/// Конфликтует ли `current` хотя бы с одной из уже забронированных смен.
///
/// Если среди `booked` есть `FullDay`, ответ всегда `true`. Иначе ищем
/// пересечение строки таблицы для `current` с `booked`.
pub fn overlaps<I>(current: Shift, booked: I) -> bool
where
    I: IntoIterator<Item = Shift>,
{
    let row = current.overlapping();
    booked
        .into_iter()
        .any(|b| b == Shift::FullDay || row.contains(&b))
}

/// То же, что [`overlaps`], но для сырых меток. Любая неизвестная метка
/// (в том числе среди `booked`) даёт ошибку.
pub fn overlaps_labels(current: &str, booked: &[&str]) -> Result<bool, InvalidShiftError> {
    let current: Shift = current.parse()?;
    let booked = booked
        .iter()
        .map(|label| label.parse::<Shift>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(overlaps(current, booked))
}

/// Пары `(a, b)`, где `a` конфликтует с `b`, но `b` с `a` нет.
pub fn asymmetric_pairs() -> Vec<(Shift, Shift)> {
    let mut pairs = Vec::new();
    for a in Shift::ALL {
        for &b in a.overlapping() {
            if !b.overlapping().contains(&a) {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use Shift::*;

    // Ожидаемая матрица overlaps(row, [col]) в порядке Shift::ALL
    const MATRIX: [[bool; 7]; 7] = [
        [true, false, false, true, false, false, true],
        [false, true, true, true, true, false, true],
        [false, true, true, false, true, true, true],
        [true, true, false, true, true, false, true],
        [false, true, true, true, true, true, true],
        [true, false, true, false, true, true, true],
        [true, true, true, true, true, true, true],
    ];

    #[test]
    fn every_shift_overlaps_itself() {
        for s in Shift::ALL {
            assert!(overlaps(s, [s]), "{s} should overlap itself");
        }
    }

    #[test]
    fn full_day_overlaps_everything() {
        for s in Shift::ALL {
            assert!(overlaps(s, [FullDay]));
            assert!(overlaps(s, [Morning, FullDay]));
        }
    }

    #[test]
    fn documented_pairs() {
        assert!(!overlaps(Morning, [Evening]));
        assert!(overlaps(Afternoon, [Day]));
        assert!(!overlaps(Morning, []));
    }

    #[test]
    fn both_directions_match_table() {
        for (i, a) in Shift::ALL.into_iter().enumerate() {
            for (j, b) in Shift::ALL.into_iter().enumerate() {
                assert_eq!(overlaps(a, [b]), MATRIX[i][j], "overlaps({a}, [{b}])");
                assert_eq!(overlaps(b, [a]), MATRIX[j][i], "overlaps({b}, [{a}])");
            }
        }
    }

    #[test]
    fn night_morning_is_the_only_asymmetric_pair() {
        assert!(overlaps(Night, [Morning]));
        assert!(!overlaps(Morning, [Night]));
        assert_eq!(asymmetric_pairs(), vec![(Night, Morning)]);
    }

    #[test]
    fn parses_labels() {
        for s in Shift::ALL {
            assert_eq!(s.label().parse::<Shift>(), Ok(s));
        }
        assert_eq!(" 24*7 ".parse::<Shift>(), Ok(FullDay));
    }

    #[test]
    fn rejects_unknown_label() {
        let err = "7 AM to 1 PM".parse::<Shift>().unwrap_err();
        assert_eq!(err, InvalidShiftError("7 AM to 1 PM".to_string()));
        assert!(err.to_string().contains("\"24*7\""));
    }

    #[test]
    fn label_entry_point_rejects_unknown_booked_label() {
        assert_eq!(overlaps_labels("6:30 AM to 2 PM", &["6:30 PM to 11 PM"]), Ok(false));
        assert_eq!(overlaps_labels("2 PM to 9:30 PM", &["6:30 AM to 6:30 PM"]), Ok(true));
        assert!(overlaps_labels("2 PM to 9:30 PM", &["24x7"]).is_err());
        assert!(overlaps_labels("noon", &[]).is_err());
    }

    #[test]
    fn serde_uses_label() {
        let json = serde_json::to_string(&Night).unwrap();
        assert_eq!(json, "\"9:30 PM to 6:30 AM\"");
        let back: Shift = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Night);
        assert!(serde_json::from_str::<Shift>("\"Night\"").is_err());
    }
}
