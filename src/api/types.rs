use serde::Serialize;

use crate::entities::{activities, employees};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmployeeDto {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub total_entries: i32,
    pub recent_activities: Vec<ActivityDto>,
}

#[derive(Debug, Serialize)]
pub struct ActivityDto {
    pub activity_name: String,
    pub activity_category: String,
    pub entries_awarded: i32,
    pub notes: Option<String>,
    pub created_at: String,
}

impl EmployeeDto {
    pub fn from_model(employee: employees::Model, activities: Vec<activities::Model>) -> Self {
        Self {
            id: employee.id,
            name: employee.name,
            email: employee.email,
            department: employee.department,
            position: employee.position,
            total_entries: employee.total_entries,
            recent_activities: activities.into_iter().map(ActivityDto::from_model).collect(),
        }
    }
}

impl ActivityDto {
    fn from_model(activity: activities::Model) -> Self {
        Self {
            activity_name: activity.activity_name,
            activity_category: activity.activity_category,
            entries_awarded: activity.entries_awarded,
            notes: activity.notes,
            created_at: activity.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
