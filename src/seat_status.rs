//! Состояние места для выбранной смены и проверка допуска брони.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::shifts::{overlaps, Shift};

pub type SeatId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown booking status {0:?}, expected Unpaid, Paid, Confirmed or discontinue")]
pub struct InvalidStatusError(pub String);

/// Статус брони места на конкретную смену.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BookingStatus {
    Unpaid,
    Paid,
    Confirmed,
    Discontinued,
}

impl BookingStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Unpaid => "Unpaid",
            BookingStatus::Paid => "Paid",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Discontinued => "discontinue",
        }
    }

    /// Занимает ли бронь с этим статусом место.
    pub const fn blocks_admission(self) -> bool {
        matches!(self, BookingStatus::Paid | BookingStatus::Confirmed)
    }

    // Confirmed > Paid > discontinue > Unpaid
    const fn rank(self) -> u8 {
        match self {
            BookingStatus::Unpaid => 0,
            BookingStatus::Discontinued => 1,
            BookingStatus::Paid => 2,
            BookingStatus::Confirmed => 3,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = InvalidStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Unpaid" => Ok(BookingStatus::Unpaid),
            "Paid" => Ok(BookingStatus::Paid),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "discontinue" => Ok(BookingStatus::Discontinued),
            _ => Err(InvalidStatusError(s.to_string())),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = InvalidStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Статусы одного места по сменам. Отсутствующая смена считается `Unpaid`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatShiftStatus(BTreeMap<Shift, BookingStatus>);

impl SeatShiftStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, shift: Shift) -> BookingStatus {
        self.0.get(&shift).copied().unwrap_or(BookingStatus::Unpaid)
    }

    pub fn set(&mut self, shift: Shift, status: BookingStatus) {
        self.0.insert(shift, status);
    }

    /// Учесть ещё одну бронь на смену. Из нескольких броней на одну смену
    /// остаётся самый сильный статус, так что `Paid`/`Confirmed` не теряются
    /// из-за более поздней неоплаченной или прекращённой брони.
    pub fn record(&mut self, shift: Shift, status: BookingStatus) {
        self.0
            .entry(shift)
            .and_modify(|current| {
                if status.rank() > current.rank() {
                    *current = status;
                }
            })
            .or_insert(status);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Shift, BookingStatus)> + '_ {
        self.0.iter().map(|(s, st)| (*s, *st))
    }

    pub fn shifts_with(&self, status: BookingStatus) -> impl Iterator<Item = Shift> + '_ {
        self.iter().filter(move |(_, st)| *st == status).map(|(s, _)| s)
    }
}

impl FromIterator<(Shift, BookingStatus)> for SeatShiftStatus {
    fn from_iter<T: IntoIterator<Item = (Shift, BookingStatus)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (shift, status) in iter {
            record.record(shift, status);
        }
        record
    }
}

/// Статусы всех мест: id места -> смена -> статус.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatStatus(BTreeMap<SeatId, SeatShiftStatus>);

impl SeatStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, seat_id: SeatId) -> Option<&SeatShiftStatus> {
        self.0.get(&seat_id)
    }

    pub fn entry(&mut self, seat_id: SeatId) -> &mut SeatShiftStatus {
        self.0.entry(seat_id).or_default()
    }

    pub fn state_of(&self, seat_id: SeatId, selected: Shift) -> SeatState {
        seat_state(self.get(seat_id), selected)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Что показывать на карте мест.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatState {
    /// Нет данных по месту.
    Unknown,
    /// Подтверждённая бронь на пересекающейся смене.
    Conflict,
    Discontinued,
    Available,
    /// Оплаченная бронь на пересекающейся смене.
    Booked,
}

impl SeatState {
    pub const fn color(self) -> &'static str {
        match self {
            SeatState::Unknown => "grey",
            SeatState::Conflict => "red",
            SeatState::Discontinued => "orange",
            SeatState::Available => "green",
            SeatState::Booked => "blue",
        }
    }

    pub const fn is_bookable(self) -> bool {
        matches!(self, SeatState::Available)
    }
}

/// Состояние места для выбранной смены. Правила проверяются по порядку,
/// срабатывает первое подходящее.
pub fn seat_state(record: Option<&SeatShiftStatus>, selected: Shift) -> SeatState {
    let Some(record) = record else {
        return SeatState::Unknown;
    };

    if record
        .shifts_with(BookingStatus::Confirmed)
        .any(|confirmed| overlaps(selected, [confirmed]))
    {
        return SeatState::Conflict;
    }

    if record.get(selected) == BookingStatus::Discontinued {
        return SeatState::Discontinued;
    }

    if overlaps(selected, record.shifts_with(BookingStatus::Paid)) {
        SeatState::Booked
    } else {
        SeatState::Available
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("shift {requested} overlaps already booked shift(s): {}", join_labels(.blocking))]
    Overlap { requested: Shift, blocking: Vec<Shift> },
}

fn join_labels(shifts: &[Shift]) -> String {
    shifts
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Занятые (`Paid`/`Confirmed`) смены места, которые конфликтуют с `requested`.
pub fn blocking_shifts(record: &SeatShiftStatus, requested: Shift) -> Vec<Shift> {
    record
        .iter()
        .filter(|(_, status)| status.blocks_admission())
        .map(|(shift, _)| shift)
        .filter(|&booked| overlaps(requested, [booked]))
        .collect()
}

/// Проверка допуска перед созданием или подтверждением брони.
pub fn admit(record: &SeatShiftStatus, requested: Shift) -> Result<(), AdmissionError> {
    let blocking = blocking_shifts(record, requested);
    if blocking.is_empty() {
        Ok(())
    } else {
        Err(AdmissionError::Overlap { requested, blocking })
    }
}
