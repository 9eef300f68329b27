//! Course catalog data model
//!
//! The catalog mirrors the portal's course tree one to one. Children are owned
//! by their parents and addressed by the sibling position the portal encodes in
//! its row ids, so every map below is keyed by that position and iterates in
//! tree order.

use chrono::{NaiveDate, NaiveTime, Weekday};
use std::collections::BTreeMap;

/// Numeric unit id used by the portal for modules and module parts
pub type UnitId = u64;

/// Numeric room id used by the portal
pub type RoomId = u64;

/// Position of a node among its siblings in the portal tree
pub type SiblingKey = u32;

/// Root aggregate of one extraction run
#[derive(Debug, Clone, Default)]
pub struct CourseCatalog {
    pub faculties: Vec<Faculty>,
    pub modules: BTreeMap<UnitId, Module>,
    pub module_parts: BTreeMap<UnitId, ModulePart>,
    pub rooms: BTreeMap<RoomId, Room>,
}

#[derive(Debug, Clone)]
pub struct Faculty {
    pub name: String,
    pub study_courses: Vec<StudyCourse>,
}

#[derive(Debug, Clone)]
pub struct StudyCourse {
    pub name: String,
    /// Program code ("Prüfungsordnung"), taken from the parenthesised suffix
    pub po: String,
    pub module_groups: BTreeMap<SiblingKey, ModuleGroup>,
}

#[derive(Debug, Clone)]
pub struct ModuleGroup {
    pub name: String,
    pub sub_groups: BTreeMap<SiblingKey, ModuleGroup>,
    /// References into [`CourseCatalog::modules`]
    pub modules: BTreeMap<SiblingKey, UnitId>,
}

impl ModuleGroup {
    pub fn new(name: String) -> Self {
        Self {
            name,
            sub_groups: BTreeMap::new(),
            modules: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Module {
    pub id: UnitId,
    pub name: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub number: Option<String>,
    pub language: Option<String>,
    pub module_type: Option<ModuleType>,
    pub recommended_semester: Option<u32>,
    pub organisational_unit: Option<String>,
    /// Weekly teaching hours ("SWS")
    pub weekly_hours: Option<u32>,
    /// Duration in semesters
    pub duration: Option<u32>,
    pub interval: ModuleInterval,
    /// References into [`CourseCatalog::module_parts`]
    pub parts: BTreeMap<SiblingKey, UnitId>,
    pub sub_modules: BTreeMap<SiblingKey, SubModule>,
}

impl Module {
    pub fn new(id: UnitId, name: String) -> Self {
        Self {
            id,
            name,
            short_name: None,
            long_name: None,
            number: None,
            language: None,
            module_type: None,
            recommended_semester: None,
            organisational_unit: None,
            weekly_hours: None,
            duration: None,
            interval: ModuleInterval::Unknown,
            parts: BTreeMap::new(),
            sub_modules: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubModule {
    pub name: String,
    pub parts: BTreeMap<SiblingKey, UnitId>,
    pub sub_modules: BTreeMap<SiblingKey, SubModule>,
}

impl SubModule {
    pub fn new(name: String) -> Self {
        Self {
            name,
            parts: BTreeMap::new(),
            sub_modules: BTreeMap::new(),
        }
    }

    /// Number of parts in this sub-module and all of its descendants
    pub fn part_count(&self) -> usize {
        let mut count = self.parts.len();
        let mut stack: Vec<&SubModule> = self.sub_modules.values().collect();

        while let Some(sub_module) = stack.pop() {
            count += sub_module.parts.len();
            stack.extend(sub_module.sub_modules.values());
        }

        count
    }
}

// Exams are not modelled: their detail pages are structured differently and
// the portal data for them is sparse.
#[derive(Debug, Clone)]
pub struct ModulePart {
    pub id: UnitId,
    pub name: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub number: String,
    pub short_comment: Option<String>,
    pub organisational_unit: Option<String>,
    pub part_type: ModulePartType,
    pub interval: Option<ModuleInterval>,
    pub weekly_hours: Option<f64>,
    pub parallel_groups: Vec<ParallelGroup>,
    /// Raw enrollment period text as shown by the portal
    pub enrollment_time_ranges: Option<String>,
}

impl ModulePart {
    pub fn new(id: UnitId, name: String, number: String, part_type: ModulePartType) -> Self {
        Self {
            id,
            name,
            short_name: None,
            long_name: None,
            number,
            short_comment: None,
            organisational_unit: None,
            part_type,
            interval: None,
            weekly_hours: None,
            parallel_groups: Vec::new(),
            enrollment_time_ranges: None,
        }
    }
}

/// One concrete offering of a module part
#[derive(Debug, Clone)]
pub struct ParallelGroup {
    /// Derived by the naming rules
    pub short_name: Option<String>,
    /// Derived by the naming rules
    pub name: Option<String>,
    /// Number found in a "<n>. Parallelgruppe" marker of the title
    pub group_number: Option<u32>,
    pub weekly_hours: f64,
    pub language: Option<String>,
    pub instructors: Option<Vec<String>>,
    pub max_participant_count: Option<u32>,
    pub dates: Vec<ParallelGroupDate>,
    /// Title as published by the portal
    pub original_title: String,
}

/// One row of a parallel group's schedule table
#[derive(Debug, Clone)]
pub struct ParallelGroupDate {
    pub rhythm: Rhythm,
    pub weekday: Option<Weekday>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// First day of the range (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the range (inclusive)
    pub end_date: NaiveDate,
    pub cancellations: Vec<NaiveDate>,
    pub estimated_participant_count: Option<u32>,
    pub remarks: Option<String>,
    pub instructors: Vec<String>,
    /// Reference into [`CourseCatalog::rooms`]
    pub room: Option<RoomId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub number: String,
    pub address: String,
    pub building: Option<String>,
}

/// Recurrence pattern of a schedule row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rhythm {
    OneTime,
    Weekly,
    BiWeekly,
    TriWeekly,
    Monthly,
    Block,
    Unknown,
}

impl Rhythm {
    pub fn from_portal_str(s: &str) -> Self {
        match s {
            "Einzeltermin" => Rhythm::OneTime,
            "wöchentlich" => Rhythm::Weekly,
            "14-täglich" => Rhythm::BiWeekly,
            "dreiwöchentlich" => Rhythm::TriWeekly,
            "vierwöchentlich" => Rhythm::Monthly,
            "Blockveranstaltung" => Rhythm::Block,
            _ => {
                tracing::warn!("Unknown rhythm '{}'", s);
                Rhythm::Unknown
            }
        }
    }

    /// Days between two occurrences, `None` for non-periodic rhythms
    pub fn step_days(self) -> Option<i64> {
        match self {
            Rhythm::Weekly => Some(7),
            Rhythm::BiWeekly => Some(14),
            Rhythm::TriWeekly => Some(21),
            Rhythm::Monthly => Some(28),
            Rhythm::OneTime | Rhythm::Block | Rhythm::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rhythm::OneTime => "ONE_TIME",
            Rhythm::Weekly => "WEEKLY",
            Rhythm::BiWeekly => "BI_WEEKLY",
            Rhythm::TriWeekly => "TRI_WEEKLY",
            Rhythm::Monthly => "MONTHLY",
            Rhythm::Block => "BLOCK",
            Rhythm::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Rhythm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    Mandatory,
    Elective,
    Unknown,
}

impl ModuleType {
    pub fn from_portal_str(s: &str) -> Self {
        match s {
            "Pflicht" => ModuleType::Mandatory,
            "Wahlpflicht" => ModuleType::Elective,
            _ => ModuleType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleInterval {
    EverySemester,
    Irregular,
    OnlyDuringWinter,
    OnlyDuringSummer,
    Unknown,
}

impl Default for ModuleInterval {
    fn default() -> Self {
        ModuleInterval::Unknown
    }
}

impl ModuleInterval {
    pub fn from_portal_str(s: &str) -> Self {
        match s {
            "in jedem Semester" => ModuleInterval::EverySemester,
            "Unregelmäßig" => ModuleInterval::Irregular,
            "nur im Wintersemester" => ModuleInterval::OnlyDuringWinter,
            "nur im Sommersemester" => ModuleInterval::OnlyDuringSummer,
            _ => {
                tracing::warn!("Unknown offering interval '{}'", s);
                ModuleInterval::Unknown
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulePartType {
    Lecture,
    LectureAndExercise,
    SeminarLecture,
    Seminar,
    SmallGroupProject,
    LabExercise,
    PracticalExercise,
    TheoreticalExercise,
    Project,
    Internship,
    PracticeGroup,
    Unknown,
}

impl ModulePartType {
    pub fn from_portal_str(s: &str) -> Self {
        match s {
            "Seminaristischer Unterricht" => ModulePartType::SeminarLecture,
            "Übung" => ModulePartType::TheoreticalExercise,
            "Laborpraktikum oder Laborübung" => ModulePartType::LabExercise,
            "Seminar" => ModulePartType::Seminar,
            "Vorlesung/Übung" => ModulePartType::LectureAndExercise,
            "Projekt" => ModulePartType::Project,
            "Kleingruppenprojekt" => ModulePartType::SmallGroupProject,
            "Praktische Übung" => ModulePartType::PracticalExercise,
            "Vorlesung" | "Lehrvortrag" => ModulePartType::Lecture,
            "Praktikum" => ModulePartType::Internship,
            "Praxisgruppe" => ModulePartType::PracticeGroup,
            _ => ModulePartType::Unknown,
        }
    }
}

/// Parse the portal's two-letter German weekday abbreviation.
///
/// An empty cell means the row has no weekday; anything else unknown is fatal.
pub fn weekday_from_portal_str(s: &str) -> crate::Result<Option<Weekday>> {
    let weekday = match s {
        "Mo" => Weekday::Mon,
        "Di" => Weekday::Tue,
        "Mi" => Weekday::Wed,
        "Do" => Weekday::Thu,
        "Fr" => Weekday::Fri,
        "Sa" => Weekday::Sat,
        "So" => Weekday::Sun,
        "" => return Ok(None),
        _ => return Err(crate::Error::parse("weekday", s)),
    };
    Ok(Some(weekday))
}
