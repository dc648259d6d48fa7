use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::query::{Column, ColumnKind, QueryTarget};

/// How much prior experience a course expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MinimumSkill {
    Beginner,
    Intermediate,
    Advanced,
}

impl MinimumSkill {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinimumSkill::Beginner => "beginner",
            MinimumSkill::Intermediate => "intermediate",
            MinimumSkill::Advanced => "advanced",
        }
    }
}

impl fmt::Display for MinimumSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for MinimumSkill {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "beginner" => Ok(MinimumSkill::Beginner),
            "intermediate" => Ok(MinimumSkill::Intermediate),
            "advanced" => Ok(MinimumSkill::Advanced),
            other => Err(format!("invalid minimum skill: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub weeks: i32,
    pub tuition: f64,
    #[sqlx(try_from = "String")]
    pub minimum_skill: MinimumSkill,
    pub scholarship_available: bool,
    #[serde(rename = "bootcamp")]
    pub bootcamp_id: Uuid,
    #[serde(rename = "user")]
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The slice of a bootcamp that gets embedded in course payloads.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct BootcampSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, message = "Please add a course title"))]
    pub title: String,
    #[validate(length(min = 1, message = "Please add a description"))]
    pub description: String,
    #[validate(range(min = 1, message = "Please add number of weeks"))]
    pub weeks: i32,
    #[validate(range(min = 0.0, message = "Please add a tuition cost"))]
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    #[serde(default)]
    pub scholarship_available: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, message = "Please add a course title"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Please add a description"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Please add number of weeks"))]
    pub weeks: Option<i32>,
    #[validate(range(min = 0.0, message = "Please add a tuition cost"))]
    pub tuition: Option<f64>,
    pub minimum_skill: Option<MinimumSkill>,
    pub scholarship_available: Option<bool>,
}

/// Queryable surface of the courses collection.
pub const COURSE_TARGET: QueryTarget = QueryTarget {
    table: "courses",
    columns: &[
        Column {
            name: "title",
            sql: "title",
            kind: ColumnKind::Text,
        },
        Column {
            name: "description",
            sql: "description",
            kind: ColumnKind::Text,
        },
        Column {
            name: "weeks",
            sql: "weeks",
            kind: ColumnKind::Number,
        },
        Column {
            name: "tuition",
            sql: "tuition",
            kind: ColumnKind::Number,
        },
        Column {
            name: "minimumSkill",
            sql: "minimum_skill",
            kind: ColumnKind::Text,
        },
        Column {
            name: "scholarshipAvailable",
            sql: "scholarship_available",
            kind: ColumnKind::Bool,
        },
        Column {
            name: "createdAt",
            sql: "created_at",
            kind: ColumnKind::Timestamp,
        },
    ],
    default_sort: "created_at",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_skill_round_trips_through_text() {
        for skill in [
            MinimumSkill::Beginner,
            MinimumSkill::Intermediate,
            MinimumSkill::Advanced,
        ] {
            assert_eq!(MinimumSkill::try_from(skill.to_string()), Ok(skill));
        }
    }

    #[test]
    fn minimum_skill_rejects_unknown_value() {
        assert!(MinimumSkill::try_from("expert".to_string()).is_err());
    }

    #[test]
    fn minimum_skill_serializes_lowercase() {
        let json = serde_json::to_string(&MinimumSkill::Intermediate).unwrap();
        assert_eq!(json, "\"intermediate\"");
    }
}
