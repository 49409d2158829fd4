use std::fmt;

use serde::{Deserialize, Serialize};

/// Course type code stored alongside every indexed review.
///
/// Serialized as its integer code (0-6) so metadata files and remote payloads
/// stay compatible with consumers that only know the numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum CourseCategory {
    #[default]
    Unspecified = 0,
    PhysicalEducation = 1,
    GeneralElective = 2,
    PublicRequired = 3,
    Major = 4,
    GeneralRequired = 5,
    English = 6,
}

/// Known course-type labels and the category each one maps to.
///
/// Several labels share a code. Anything not listed maps to
/// [`CourseCategory::Unspecified`].
pub const COURSE_TYPE_LABELS: &[(&str, CourseCategory)] = &[
    ("不指定", CourseCategory::Unspecified),
    ("体育课", CourseCategory::PhysicalEducation),
    ("通识选修课（公选课）", CourseCategory::GeneralElective),
    ("公共课", CourseCategory::PublicRequired),
    ("公共课（高数、线代、大物和思政课等）", CourseCategory::PublicRequired),
    ("公共必修课（高数、线代、大物和思政课等）", CourseCategory::PublicRequired),
    ("专业课程", CourseCategory::Major),
    ("通识必修课（导引课）", CourseCategory::GeneralRequired),
    ("通识必修课（导引）", CourseCategory::GeneralRequired),
    ("导引课（自科人文中国精神）", CourseCategory::GeneralRequired),
    ("英语课", CourseCategory::English),
];

impl CourseCategory {
    pub const ALL: [CourseCategory; 7] = [
        CourseCategory::Unspecified,
        CourseCategory::PhysicalEducation,
        CourseCategory::GeneralElective,
        CourseCategory::PublicRequired,
        CourseCategory::Major,
        CourseCategory::GeneralRequired,
        CourseCategory::English,
    ];

    /// Exact-match lookup of a free-text course type label.
    pub fn from_label(label: &str) -> Self {
        COURSE_TYPE_LABELS
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, category)| *category)
            .unwrap_or_default()
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_unspecified(self) -> bool {
        self == CourseCategory::Unspecified
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseCategory::Unspecified => "unspecified",
            CourseCategory::PhysicalEducation => "physical-education",
            CourseCategory::GeneralElective => "general-elective",
            CourseCategory::PublicRequired => "public-required",
            CourseCategory::Major => "major",
            CourseCategory::GeneralRequired => "general-required",
            CourseCategory::English => "english",
        }
    }
}

impl From<CourseCategory> for u8 {
    fn from(category: CourseCategory) -> Self {
        category.code()
    }
}

impl TryFrom<u8> for CourseCategory {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown course category code: {}", code))
    }
}

impl fmt::Display for CourseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.as_str())
    }
}
