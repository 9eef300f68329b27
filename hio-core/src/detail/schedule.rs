//! Schedule table of a parallel group

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::html;
use crate::model::{ParallelGroupDate, Rhythm, Room, RoomId, weekday_from_portal_str};

const DATE_FORMAT: &str = "%d.%m.%Y";

static ROOM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"roomId=(\d+)").expect("static regex"));
// "<number> (<address>)" or "<number> (<address> (<building>))"
static ROOM_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.*?) \((.*?)(?: \((.*?)\))?\)").expect("static regex"));

static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| html::selector("li"));

/// Cells of a schedule row, identified by their `columnN` class
#[derive(Debug, Clone, Copy)]
enum Column {
    Rhythm,
    Weekday,
    Time,
    Cancellations,
    Dates,
    Participants,
    Remarks,
    Instructors,
    Room,
}

static COLUMNS: LazyLock<[Selector; 9]> = LazyLock::new(|| {
    [
        html::selector(".column1"),
        html::selector(".column2"),
        html::selector(".column3"),
        html::selector(".column4"),
        html::selector(".column5"),
        html::selector(".column6"),
        html::selector(".column7"),
        html::selector(".column8"),
        html::selector(".column9"),
    ]
});

impl Column {
    fn selector(self) -> &'static Selector {
        &COLUMNS[self as usize]
    }

    fn cell(self, row: ElementRef<'_>) -> Option<ElementRef<'_>> {
        html::first(row, self.selector())
    }

    /// Own text of the cell; a missing cell means the table layout changed.
    fn text(self, row: ElementRef<'_>) -> Result<String> {
        self.cell(row)
            .map(html::own_text)
            .ok_or_else(|| Error::not_found(format!("schedule column {:?}", self)))
    }
}

/// Parse every row of a schedule table body, registering rooms as they appear.
pub(crate) fn parse_schedule(
    body: ElementRef<'_>,
    rooms: &mut BTreeMap<RoomId, Room>,
) -> Result<Vec<ParallelGroupDate>> {
    html::child_elements(body)
        .map(|row| parse_schedule_row(row, rooms))
        .collect()
}

fn parse_schedule_row(
    row: ElementRef<'_>,
    rooms: &mut BTreeMap<RoomId, Room>,
) -> Result<ParallelGroupDate> {
    let (start_time, end_time) = parse_time_range(&Column::Time.text(row)?)?;
    let (start_date, end_date) = parse_date_range(&Column::Dates.text(row)?)?;

    let cancellations = match Column::Cancellations.cell(row) {
        Some(cell) => cell
            .select(&LIST_ITEM)
            .map(|item| parse_date(&html::text(item)))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let instructors = Column::Instructors
        .cell(row)
        .map(|cell| cell.select(&LIST_ITEM).map(html::text).collect())
        .unwrap_or_default();

    let room = match Column::Room.cell(row).and_then(html::last_element_child) {
        Some(link) => {
            let room = parse_room(link)?;
            let id = room.id;
            rooms.insert(id, room);
            Some(id)
        }
        None => None,
    };

    let remarks = Column::Remarks.text(row)?;

    Ok(ParallelGroupDate {
        rhythm: Rhythm::from_portal_str(&Column::Rhythm.text(row)?),
        weekday: weekday_from_portal_str(&Column::Weekday.text(row)?)?,
        start_time,
        end_time,
        start_date,
        end_date,
        cancellations,
        estimated_participant_count: Column::Participants.text(row)?.parse().ok(),
        remarks: (!remarks.trim().is_empty()).then_some(remarks),
        instructors,
        room,
    })
}

fn parse_room(link: ElementRef<'_>) -> Result<Room> {
    let href = link.value().attr("href").unwrap_or_default();
    let id = html::capture_id(&ROOM_ID, href)
        .ok_or_else(|| Error::not_found(format!("roomId in '{}'", href)))?;

    let label = html::text(link);
    let caps = ROOM_TEXT
        .captures(&label)
        .ok_or_else(|| Error::not_found(format!("room number and address in '{}'", label)))?;
    let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

    Ok(Room {
        id,
        number: group(1).unwrap_or_default(),
        address: group(2).unwrap_or_default(),
        building: group(3),
    })
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| Error::parse("time", s))
}

/// "08:00 - 09:30"
fn parse_time_range(s: &str) -> Result<(NaiveTime, NaiveTime)> {
    match s.split(" - ").collect::<Vec<_>>().as_slice() {
        [start, end] => Ok((parse_time(start)?, parse_time(end)?)),
        _ => Err(Error::parse("time range", s)),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| Error::parse("date", s))
}

/// "06.01.2025 - 27.01.2025", or a single date for both ends
fn parse_date_range(s: &str) -> Result<(NaiveDate, NaiveDate)> {
    match s.split(" - ").collect::<Vec<_>>().as_slice() {
        [single] => {
            let date = parse_date(single)?;
            Ok((date, date))
        }
        [start, end] => Ok((parse_date(start)?, parse_date(end)?)),
        _ => Err(Error::parse("date range", s)),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// One `<tr>` of a schedule table
    pub fn schedule_row(
        rhythm: &str,
        weekday: &str,
        time: &str,
        cancellations: &[&str],
        dates: &str,
        room: Option<(u64, &str)>,
    ) -> String {
        let cancellations: String = cancellations
            .iter()
            .map(|date| format!("<li>{}</li>", date))
            .collect();
        let room = room
            .map(|(id, label)| {
                format!(
                    r#"<span>Raum</span><a href="/qisserver/pages/startFlow.xhtml?_flowId=showRoomDetail-flow&amp;roomId={}">{}</a>"#,
                    id, label
                )
            })
            .unwrap_or_default();

        format!(
            r#"<tr>
                <td class="column1">{rhythm}</td>
                <td class="column2">{weekday}</td>
                <td class="column3">{time}</td>
                <td class="column4"><ul>{cancellations}</ul></td>
                <td class="column5">{dates}</td>
                <td class="column6">25</td>
                <td class="column7"> </td>
                <td class="column8"><ul><li> Prof. Dr. Muster </li><li>Dr. Beispiel</li></ul></td>
                <td class="column9">{room}</td>
            </tr>"#,
            rhythm = rhythm,
            weekday = weekday,
            time = time,
            cancellations = cancellations,
            dates = dates,
            room = room,
        )
    }
}
