//! Naming rules for parallel groups
//!
//! Parallel group titles are free text typed in by each faculty's staff. Every
//! faculty follows its own convention, so the rules below recognise the known
//! shapes in a fixed order and derive a short name and a display name from the
//! first one that matches. Unseen shapes fall through to a generic rule; the
//! result may be imperfect but deriving a name never fails.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::ModulePart;

static GROUP_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\. Parallelgruppe").expect("static regex"));
static PROJECT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?) \(\d+\. Parallelgruppe\)").expect("static regex"));
static DOUBLE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\+\d{2} ").expect("static regex"));
static NUMBERED_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.?G - ").expect("static regex"));
static APPOINTMENT_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d*\.? ?Termingruppe").expect("static regex"));
static COUPLED_MODULES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((M ?(\d+\.)*(\d|[A-Z])+ ?\+ ?)*M ?(\d+\.)*(\d|[A-Z])+( ?\(gekoppelt\))?) ?(.*?)( ?\(\d+. Par.*|$)$")
        .expect("static regex")
});
static COUPLED_MODULES_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:M? ?(?:\d+\.)*(?:\d|[A-Z])+ ?\+ ?)*M? ?(?:\d+\.)*(?:\d|[A-Z])+(?: ?\(gekoppelt\))?) ?(.*?)(?: ?\(\d+. Par|$)")
        .expect("static regex")
});

/// Units whose parallel groups are individual projects named by their topic
const PROJECT_UNITS: [&str; 2] = ["1INF-PRO.LV-P", "1INF-AIS.LV-P"];
const LANGUAGE_COURSE_UNIT: &str = "1AI-ENG1.LV";

/// Names derived for one parallel group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupNaming {
    pub short_name: Option<String>,
    pub name: Option<String>,
    pub group_number: Option<u32>,
}

struct Title<'a> {
    raw: &'a str,
    part: &'a ModulePart,
    is_only_group: bool,
    group_number: Option<u32>,
}

impl Title<'_> {
    fn part_name(&self) -> Option<String> {
        Some(self.part.name.clone())
    }

    fn part_short_name(&self) -> Option<String> {
        self.part.short_name.clone()
    }

    /// Prefix for composed short names; the unit number stands in when the
    /// part has no short name.
    fn prefix(&self) -> &str {
        self.part.short_name.as_deref().unwrap_or(&self.part.number)
    }

    fn prefixed(&self, suffix: &str) -> Option<String> {
        Some(format!("{}/{}", self.prefix(), suffix))
    }

    fn padded_group_number(&self) -> Option<String> {
        self.group_number
            .and_then(|n| self.prefixed(&format!("{:02}", n)))
    }

    /// Match against a pattern built around the part's short name, if it has one.
    fn matches_with_short_name(&self, build: impl Fn(&str) -> String) -> bool {
        self.part
            .short_name
            .as_deref()
            .and_then(|short| Regex::new(&build(&regex::escape(short))).ok())
            .is_some_and(|re| re.is_match(self.raw))
    }

    fn starts_with_two_digits(&self) -> bool {
        let mut chars = self.raw.chars();
        matches!((chars.next(), chars.next()), (Some(a), Some(b)) if a.is_ascii_digit() && b.is_ascii_digit())
    }
}

/// First `n` characters of `s`
fn leading(s: &str, n: usize) -> &str {
    let end = s.char_indices().nth(n).map_or(s.len(), |(i, _)| i);
    &s[..end]
}

/// (short name, name)
type Derived = (Option<String>, Option<String>);

struct NamingRule {
    label: &'static str,
    applies: fn(&Title<'_>) -> bool,
    derive: fn(&Title<'_>) -> Derived,
}

static RULES: [NamingRule; 15] = [
    NamingRule {
        label: "plain",
        applies: |t| t.raw == t.part.name || t.part.short_name.as_deref() == Some(t.raw),
        derive: |t| (t.part_short_name(), t.part_name()),
    },
    NamingRule {
        label: "project",
        applies: |t| PROJECT_UNITS.contains(&t.part.number.as_str()),
        derive: |t| {
            let name = PROJECT_TITLE
                .captures(t.raw)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string());
            (None, name)
        },
    },
    NamingRule {
        label: "language course",
        applies: |t| t.part.number == LANGUAGE_COURSE_UNIT,
        derive: |t| {
            let level = t.raw.split('_').next().unwrap_or(t.raw);
            (t.prefixed(level), t.part_name())
        },
    },
    NamingRule {
        label: "elective",
        applies: |t| t.raw.starts_with("WP/WPP"),
        derive: |t| {
            let rest = t.raw.strip_prefix("WP/WPP").unwrap_or(t.raw).trim_start();
            (None, Some(rest.to_string()))
        },
    },
    NamingRule {
        label: "lecture and exercise",
        applies: |t| t.raw.starts_with("VL+Ü"),
        derive: |t| {
            let rest = t.raw.strip_prefix("VL+Ü").unwrap_or(t.raw).trim_start();
            (t.part_short_name(), Some(rest.to_string()))
        },
    },
    NamingRule {
        label: "part name prefix",
        applies: |t| t.raw.starts_with(t.part.name.as_str()),
        derive: |t| (t.part_short_name(), t.part_name()),
    },
    NamingRule {
        label: "numbered short name",
        applies: |t| t.matches_with_short_name(|short| format!(r"^\d{{2}}_+{}", short)),
        derive: |t| {
            let Some(short) = t.part.short_name.as_deref() else {
                return (None, None);
            };
            let pattern = format!(r"(\d{{2}}_+{}) ?(.*?) ?\(", regex::escape(short));
            let caps = Regex::new(&pattern).ok().and_then(|re| re.captures(t.raw));
            match caps {
                Some(caps) => {
                    let number = caps[1].split('_').next().unwrap_or_default();
                    (t.prefixed(number), Some(caps[2].to_string()))
                }
                None => (None, None),
            }
        },
    },
    NamingRule {
        label: "short name with slash",
        applies: |t| t.matches_with_short_name(|short| format!(r"^{}/\d{{2}}", short)),
        derive: |t| {
            let short = t.raw.split(' ').next().unwrap_or(t.raw);
            (Some(short.to_string()), t.part_name())
        },
    },
    NamingRule {
        label: "numbered part name with unit number",
        applies: |t| {
            let pattern = format!(
                r"^\d{{2}} {}.*{}",
                regex::escape(&t.part.name),
                regex::escape(&t.part.number)
            );
            Regex::new(&pattern).is_ok_and(|re| re.is_match(t.raw))
        },
        derive: |t| {
            let (number, rest) = t.raw.split_once(' ').unwrap_or((t.raw, t.raw));
            let name = rest.split(" (").next().unwrap_or(rest);
            (t.prefixed(number), Some(name.to_string()))
        },
    },
    NamingRule {
        label: "numbered with online marker",
        applies: |t| {
            let target = match t.part.short_name.as_deref() {
                Some(short) => format!("{}|.*{}", regex::escape(short), regex::escape(&t.part.number)),
                None => format!(".*{}", regex::escape(&t.part.number)),
            };
            let pattern = format!(r"^(\(online\) )?\d{{2}}( \(online\))? ({})", target);
            Regex::new(&pattern).is_ok_and(|re| re.is_match(t.raw))
        },
        derive: |t| {
            let rest = t.raw.strip_prefix("(online) ").unwrap_or(t.raw);
            (t.prefixed(leading(rest, 2)), t.part_name())
        },
    },
    NamingRule {
        label: "double number",
        applies: |t| DOUBLE_NUMBER.is_match(t.raw),
        derive: |t| (t.prefixed(leading(t.raw, 5)), t.part_name()),
    },
    NamingRule {
        label: "numbered group",
        applies: |t| NUMBERED_GROUP.is_match(t.raw),
        derive: |t| {
            let end = [t.raw.find('G'), t.raw.find('.')]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(t.raw.len());
            (t.prefixed(&t.raw[..end]), t.part_name())
        },
    },
    NamingRule {
        label: "appointment group",
        applies: |t| APPOINTMENT_GROUP.is_match(t.raw),
        derive: |t| {
            let short_name = if t.is_only_group {
                t.part_short_name()
            } else {
                t.padded_group_number().or_else(|| t.part_short_name())
            };
            (short_name, t.part_name())
        },
    },
    NamingRule {
        label: "coupled modules",
        applies: |t| {
            t.raw.starts_with("BABE ") || t.raw.starts_with("MASA ") || COUPLED_MODULES.is_match(t.raw)
        },
        derive: |t| {
            let cleaned = t
                .raw
                .strip_prefix("BABE ")
                .or_else(|| t.raw.strip_prefix("MASA "))
                .unwrap_or(t.raw);
            let Some(caps) = COUPLED_MODULES_PARTS.captures(cleaned) else {
                return (None, None);
            };

            let modules = &caps[1];
            let short_name = if modules.contains(' ') {
                if modules.starts_with(' ') {
                    format!("M {}", modules.trim())
                } else {
                    modules.to_string()
                }
            } else {
                // "M12" -> "M 12"
                let mut chars = modules.chars();
                let first = chars.next().map(String::from).unwrap_or_default();
                format!("{} {}", first, chars.as_str())
            };
            (Some(short_name), Some(caps[2].to_string()))
        },
    },
    NamingRule {
        label: "fallback",
        applies: |_| true,
        derive: |t| {
            let short_name = if t.starts_with_two_digits() {
                t.prefixed(leading(t.raw, 2))
            } else if !t.is_only_group && t.group_number.is_some() {
                t.padded_group_number()
            } else {
                t.part_short_name()
            };
            (short_name, t.part_name())
        },
    },
];

/// Number of a "<n>. Parallelgruppe" marker anywhere in the title
pub fn group_number(title: &str) -> Option<u32> {
    GROUP_NUMBER
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Derive the names of a parallel group of `part` from its published title.
pub fn derive_group_naming(title: &str, part: &ModulePart, is_only_group: bool) -> GroupNaming {
    let title = Title {
        raw: title,
        part,
        is_only_group,
        group_number: group_number(title),
    };

    let rule = RULES
        .iter()
        .find(|rule| (rule.applies)(&title))
        .unwrap_or(&RULES[RULES.len() - 1]);
    let (short_name, name) = (rule.derive)(&title);

    tracing::debug!(
        "Parallel group '{}' named by rule '{}': '{:?}' - '{:?}' - '{:?}'",
        title.raw,
        rule.label,
        short_name,
        name,
        title.group_number
    );

    GroupNaming {
        short_name,
        name,
        group_number: title.group_number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModulePartType;

    fn part(number: &str, name: &str, short_name: Option<&str>) -> ModulePart {
        let mut part = ModulePart::new(1, name.to_string(), number.to_string(), ModulePartType::Lecture);
        part.short_name = short_name.map(str::to_string);
        part
    }

    fn naming(title: &str, part: &ModulePart, is_only_group: bool) -> (Option<String>, Option<String>) {
        let naming = derive_group_naming(title, part, is_only_group);
        (naming.short_name, naming.name)
    }

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_group_number() {
        assert_eq!(group_number("Mathe (12. Parallelgruppe)"), Some(12));
        assert_eq!(group_number("Mathe (3. Parallelgruppe)"), Some(3));
        assert_eq!(group_number("Mathe"), None);
    }

    #[test]
    fn test_plain_title() {
        let p = part("1INF-MA1.LV", "Mathematik 1", Some("MA1"));
        assert_eq!(naming("MA1", &p, true), (some("MA1"), some("Mathematik 1")));
        assert_eq!(naming("Mathematik 1", &p, true), (some("MA1"), some("Mathematik 1")));
    }

    #[test]
    fn test_project_title() {
        let p = part("1INF-PRO.LV-P", "Projekt", Some("PRO"));
        assert_eq!(
            naming("Autonome Roboter (2. Parallelgruppe)", &p, false),
            (None, some("Autonome Roboter"))
        );
    }

    #[test]
    fn test_language_course() {
        let p = part("1AI-ENG1.LV", "Englisch 1", Some("ENG1"));
        assert_eq!(naming("B2_Gruppe 1", &p, false), (some("ENG1/B2"), some("Englisch 1")));
    }

    #[test]
    fn test_marker_prefixes() {
        let p = part("X", "Wahlfach", Some("WF"));
        assert_eq!(naming("WP/WPP Robotik", &p, false), (None, some("Robotik")));
        assert_eq!(naming("VL+Ü Analysis", &p, false), (some("WF"), some("Analysis")));
    }

    #[test]
    fn test_title_starting_with_part_name() {
        let p = part("1INF-DB.LV", "Datenbanken", Some("DB"));
        assert_eq!(
            naming("Datenbanken Gruppe Nord", &p, false),
            (some("DB"), some("Datenbanken"))
        );
    }

    #[test]
    fn test_numbered_short_name() {
        let p = part("1INF-SE.LV", "Software Engineering", Some("SE"));
        assert_eq!(
            naming("03__SE Agile Methoden (3. Parallelgruppe)", &p, false),
            (some("SE/03"), some("Agile Methoden"))
        );
    }

    #[test]
    fn test_short_name_with_slash() {
        let p = part("1EMI-ET.LV", "Elektrotechnik", Some("ET"));
        assert_eq!(naming("ET/02 Labor", &p, false), (some("ET/02"), some("Elektrotechnik")));
    }

    #[test]
    fn test_numbered_part_name_with_unit_number() {
        let p = part("1INF-BS.LV", "Betriebssysteme", Some("BS"));
        assert_eq!(
            naming("04 Betriebssysteme 1INF-BS.LV (4. Parallelgruppe)", &p, false),
            (some("BS/04"), some("Betriebssysteme 1INF-BS.LV"))
        );
    }

    #[test]
    fn test_online_variant() {
        let p = part("1INF-RN.LV", "Rechnernetze", Some("RN"));
        assert_eq!(naming("(online) 05 RN Übung", &p, false), (some("RN/05"), some("Rechnernetze")));
        assert_eq!(naming("06 (online) RN Übung", &p, false), (some("RN/06"), some("Rechnernetze")));
    }

    #[test]
    fn test_double_number_and_g_suffix() {
        let p = part("1MINF-X.LV", "Analysis", Some("AN"));
        assert_eq!(naming("01+02 Übung", &p, false), (some("AN/01+02"), some("Analysis")));
        assert_eq!(naming("3G - Übung", &p, false), (some("AN/3"), some("Analysis")));
        assert_eq!(naming("4.G - Übung", &p, false), (some("AN/4"), some("Analysis")));
    }

    #[test]
    fn test_appointment_group() {
        let p = part("1X.LV", "Recht", Some("RE"));
        assert_eq!(
            naming("Termingruppe (2. Parallelgruppe)", &p, false),
            (some("RE/02"), some("Recht"))
        );
        assert_eq!(naming("Termingruppe", &p, true), (some("RE"), some("Recht")));
    }

    #[test]
    fn test_coupled_modules() {
        let p = part("1SAUK.LV", "Grundlagen", Some("GL"));
        assert_eq!(
            naming("M 2.1 + M 2.2 (gekoppelt) Soziale Arbeit (1. Parallelgruppe)", &p, false),
            (some("M 2.1 + M 2.2 (gekoppelt)"), some("Soziale Arbeit"))
        );
        assert_eq!(naming("BABE M12 Theorie", &p, false), (some("M 12"), some("Theorie")));
    }

    #[test]
    fn test_fallback() {
        let p = part("1X.LV", "Physik", Some("PH"));
        assert_eq!(naming("07 irgendwas", &p, false), (some("PH/07"), some("Physik")));
        assert_eq!(
            naming("irgendwas (9. Parallelgruppe)", &p, false),
            (some("PH/09"), some("Physik"))
        );
        assert_eq!(
            naming("irgendwas (9. Parallelgruppe)", &p, true),
            (some("PH"), some("Physik"))
        );
    }

    #[test]
    fn test_never_panics_on_short_titles() {
        let p = part("1X.LV", "Physik", None);
        for title in ["", "1", "é", "(online) ", "WP/WPP", "VL+Ü"] {
            derive_group_naming(title, &p, false);
        }
    }
}
