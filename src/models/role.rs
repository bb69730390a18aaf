//! Roles and the permission table

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Visitor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Visitor => "visitor",
        }
    }

    /// Roles that may see and manage every user's loans
    pub fn is_privileged(&self) -> bool {
        self.allows(Action::ReadAllLoans)
    }

    /// Permission table keyed by (action, role)
    pub fn allows(&self, action: Action) -> bool {
        use Action::*;
        use Role::*;

        match (action, self) {
            (ReadBooks | Borrow | ReadStats, _) => true,
            (WriteBooks | ReadAllLoans | LendToOthers | ManageLoans, Admin | Teacher) => true,
            (DeleteBooks | ReadUsers | WriteUsers, Admin) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            "visitor" => Ok(Role::Visitor),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Guarded operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ReadBooks,
    WriteBooks,
    DeleteBooks,
    ReadUsers,
    WriteUsers,
    /// List or read loans belonging to other users
    ReadAllLoans,
    Borrow,
    /// Open a loan on behalf of another user
    LendToOthers,
    /// Edit loans (due date, return date)
    ManageLoans,
    ReadStats,
}

impl Action {
    pub fn describe(&self) -> &'static str {
        match self {
            Action::ReadBooks => "read books",
            Action::WriteBooks => "edit books",
            Action::DeleteBooks => "delete books",
            Action::ReadUsers => "read users",
            Action::WriteUsers => "manage users",
            Action::ReadAllLoans => "read other users' loans",
            Action::Borrow => "borrow books",
            Action::LendToOthers => "lend books to other users",
            Action::ManageLoans => "manage loans",
            Action::ReadStats => "read statistics",
        }
    }
}
