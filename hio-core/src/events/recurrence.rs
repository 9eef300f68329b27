use chrono::TimeDelta;
use std::collections::BTreeMap;

use super::Event;
use crate::error::{Error, Result};
use crate::model::{ParallelGroup, ParallelGroupDate, Room, RoomId};

/// Location of events whose schedule row names no room
pub const NO_ROOM_GIVEN: &str = "(kein Raum angegeben)";

/// Turn every schedule row of `group` into concrete occurrences.
///
/// Periodic rows skip cancelled occurrences only. Single, block and unknown
/// rows are dropped as a whole as soon as any cancellation is listed.
pub fn expand_parallel_group(
    group: &ParallelGroup,
    id: &str,
    name: &str,
    rooms: &BTreeMap<RoomId, Room>,
) -> Result<Vec<Event>> {
    let mut events = Vec::new();

    for date in &group.dates {
        let location = match date.room {
            Some(room_id) => rooms
                .get(&room_id)
                .map(|room| format!("{}, {}", room.number, room.address))
                .ok_or_else(|| Error::not_found(format!("room {}", room_id)))?,
            None => NO_ROOM_GIVEN.to_string(),
        };
        let description = describe(group, date);

        let event = |start, end| Event {
            id: id.to_string(),
            name: name.to_string(),
            location: location.clone(),
            description: description.clone(),
            start_time: start,
            end_time: end,
        };

        match date.rhythm.step_days() {
            None => {
                if date.cancellations.is_empty() {
                    events.push(event(
                        date.start_date.and_time(date.start_time),
                        date.end_date.and_time(date.end_time),
                    ));
                }
            }
            Some(step) => {
                let mut current = date.start_date;
                loop {
                    if !date.cancellations.contains(&current) {
                        events.push(event(
                            current.and_time(date.start_time),
                            current.and_time(date.end_time),
                        ));
                    }
                    current += TimeDelta::days(step);
                    if current > date.end_date {
                        break;
                    }
                }
            }
        }
    }

    Ok(events)
}

fn describe(group: &ParallelGroup, date: &ParallelGroupDate) -> String {
    let mut description = String::new();

    let instructors = if !date.instructors.is_empty() {
        Some(&date.instructors)
    } else {
        group.instructors.as_ref().filter(|list| !list.is_empty())
    };
    if let Some(instructors) = instructors {
        let plural = if instructors.len() != 1 { "en" } else { "" };
        description.push_str(&format!("Dozent{}: {}\n", plural, instructors.join(", ")));
    }

    if let Some(number) = group.group_number {
        description.push_str(&format!("Parallelgruppe: {}\n", number));
    }

    match (date.estimated_participant_count, group.max_participant_count) {
        (Some(estimated), Some(max)) => {
            description.push_str(&format!("Teilnehmer/-innen: {} / {}\n", estimated, max));
        }
        (Some(estimated), None) => {
            description.push_str(&format!("Teilnehmer/-innen: {}\n", estimated));
        }
        (None, Some(max)) => {
            description.push_str(&format!("Max. Anzahl von Teilnehmer/-innen: {}\n", max));
        }
        (None, None) => {}
    }

    description.push_str(&format!("Rhythmus: {}\n", date.rhythm));
    description.push_str(&format!("\nOriginaler Titel: {}", group.original_title));
    description
}
