use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Six rows of seven days. Fixed so every month renders with the same height.
pub const GRID_CELLS: usize = 42;

/// `month` is zero-based (0 = January) everywhere in this module and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    pub fn from_step(step: i64) -> Option<Self> {
        match step {
            -1 => Some(Self::Previous),
            1 => Some(Self::Next),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_current_month: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub view: YearMonth,
    pub leading: usize,
    pub days_in_month: u32,
    pub trailing: usize,
    pub cells: [CalendarDay; GRID_CELLS],
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("month must be in 0..=11, got {0}")]
    MonthOutOfRange(u32),

    #[error("year {0} is outside the supported date range")]
    YearOutOfRange(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSession {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
}

pub fn navigate(current: YearMonth, direction: Direction) -> YearMonth {
    match direction {
        Direction::Previous if current.month == 0 => YearMonth {
            year: current.year - 1,
            month: 11,
        },
        Direction::Previous => YearMonth {
            year: current.year,
            month: current.month - 1,
        },
        Direction::Next if current.month >= 11 => YearMonth {
            year: current.year + 1,
            month: 0,
        },
        Direction::Next => YearMonth {
            year: current.year,
            month: current.month + 1,
        },
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        0 | 2 | 4 | 6 | 7 | 9 | 11 => 31,
        3 | 5 | 8 | 10 => 30,
        1 if leap => 29,
        1 => 28,
        _ => 30,
    }
}

pub fn build_grid(year: i32, month: u32) -> Result<MonthGrid, CalendarError> {
    if month > 11 {
        return Err(CalendarError::MonthOutOfRange(month));
    }
    let first = NaiveDate::from_ymd_opt(year, month + 1, 1).ok_or(CalendarError::YearOutOfRange(year))?;
    let leading = first.weekday().num_days_from_sunday() as usize;
    let days = days_in_month(year, month);
    let trailing = GRID_CELLS - leading - days as usize;

    // The first cell is the last Sunday on or before day 1; the grid is the
    // 42 consecutive days from there. Check both ends so every cell exists.
    let grid_start = first
        .checked_sub_days(Days::new(leading as u64))
        .ok_or(CalendarError::YearOutOfRange(year))?;
    grid_start
        .checked_add_days(Days::new(GRID_CELLS as u64 - 1))
        .ok_or(CalendarError::YearOutOfRange(year))?;

    let cells = std::array::from_fn(|i| {
        let date = grid_start + Days::new(i as u64);
        CalendarDay {
            date,
            is_current_month: (leading..leading + days as usize).contains(&i),
        }
    });

    Ok(MonthGrid {
        view: YearMonth { year, month },
        leading,
        days_in_month: days,
        trailing,
        cells,
    })
}

impl MonthGrid {
    pub fn cell_index(&self, date: NaiveDate) -> Option<usize> {
        let start = self.cells[0].date;
        let offset = date.signed_duration_since(start).num_days();
        usize::try_from(offset).ok().filter(|i| *i < GRID_CELLS)
    }
}

/// One bucket per grid cell. Sessions outside the visible grid are dropped;
/// within a cell the input order is kept.
pub fn bucket_sessions<'a>(
    grid: &MonthGrid,
    sessions: &'a [ScheduledSession],
) -> Vec<Vec<&'a ScheduledSession>> {
    let mut buckets: Vec<Vec<&ScheduledSession>> = vec![Vec::new(); GRID_CELLS];
    for s in sessions {
        if let Some(i) = grid.cell_index(s.date) {
            buckets[i].push(s);
        }
    }
    buckets
}
