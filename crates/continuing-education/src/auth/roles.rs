use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::admissions::domain::Admission;

use super::identity::{Group, User};
use super::rules::{
    is_admission_draft, is_registration_submitted, is_training_manager, Rule, RuleContext, Target,
};

/// Named permission, addressed by its `app_label.codename` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewAdmission,
    ChangeAdmission,
    ArchiveAdmission,
    CancelAdmission,
    ExportAdmission,
    ChangeReceivedFileState,
    LinkAdmissionToAcademicYear,
    SendNotification,
    ValidateRegistration,
    ViewTraining,
    ChangeTraining,
    ViewProspect,
    ExportProspect,
}

impl Permission {
    pub const fn ordered() -> [Self; 13] {
        [
            Self::ViewAdmission,
            Self::ChangeAdmission,
            Self::ArchiveAdmission,
            Self::CancelAdmission,
            Self::ExportAdmission,
            Self::ChangeReceivedFileState,
            Self::LinkAdmissionToAcademicYear,
            Self::SendNotification,
            Self::ValidateRegistration,
            Self::ViewTraining,
            Self::ChangeTraining,
            Self::ViewProspect,
            Self::ExportProspect,
        ]
    }

    pub const fn codename(self) -> &'static str {
        match self {
            Self::ViewAdmission => "continuing_education.view_admission",
            Self::ChangeAdmission => "continuing_education.change_admission",
            Self::ArchiveAdmission => "continuing_education.archive_admission",
            Self::CancelAdmission => "continuing_education.cancel_admission",
            Self::ExportAdmission => "continuing_education.export_admission",
            Self::ChangeReceivedFileState => "continuing_education.change_received_file_state",
            Self::LinkAdmissionToAcademicYear => {
                "continuing_education.link_admission_to_academic_year"
            }
            Self::SendNotification => "continuing_education.send_notification",
            Self::ValidateRegistration => "continuing_education.validate_registration",
            Self::ViewTraining => "continuing_education.view_continuingeducationtraining",
            Self::ChangeTraining => "continuing_education.change_continuingeducationtraining",
            Self::ViewProspect => "continuing_education.view_prospect",
            Self::ExportProspect => "continuing_education.export_prospect",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codename())
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|permission| permission.codename() == value.trim())
            .ok_or_else(|| PermissionError::UnknownPermission(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    #[error("unknown permission '{0}'")]
    UnknownPermission(String),
    #[error("user '{username}' lacks permission '{permission}'")]
    Denied {
        username: String,
        permission: Permission,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    StudentWorker,
    TrainingManager,
    Manager,
}

impl Role {
    pub const fn group(self) -> Group {
        match self {
            Self::StudentWorker => Group::StudentWorkers,
            Self::TrainingManager => Group::TrainingManagers,
            Self::Manager => Group::Managers,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::StudentWorker => "Continuing education student worker",
            Self::TrainingManager => "Continuing education training manager",
            Self::Manager => "Continuing education manager",
        }
    }

    /// Permission map bound to the role.
    pub fn rule_set(self) -> BTreeMap<Permission, Rule> {
        use Permission::*;

        match self {
            Self::StudentWorker => BTreeMap::from([
                (ViewAdmission, Rule::Always),
                (ValidateRegistration, is_registration_submitted()),
                (ChangeReceivedFileState, Rule::Always),
            ]),
            Self::TrainingManager => BTreeMap::from([
                (ViewAdmission, is_training_manager()),
                (
                    ChangeAdmission,
                    is_training_manager().and(is_admission_draft().negate()),
                ),
                (ArchiveAdmission, is_training_manager()),
                (CancelAdmission, is_training_manager()),
                (ExportAdmission, is_training_manager()),
                (ChangeReceivedFileState, is_training_manager()),
                (
                    LinkAdmissionToAcademicYear,
                    Rule::NewInstance.or(is_training_manager()),
                ),
                (SendNotification, is_training_manager()),
                (ViewTraining, is_training_manager()),
                (ChangeTraining, is_training_manager()),
                (ViewProspect, is_training_manager()),
                (ExportProspect, is_training_manager()),
            ]),
            Self::Manager => BTreeMap::from([
                (ViewAdmission, Rule::Always),
                (ChangeAdmission, is_admission_draft().negate()),
                (ValidateRegistration, is_registration_submitted()),
            ]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoleDefinition {
    pub role: Role,
    pub group: Group,
    pub rules: BTreeMap<Permission, Rule>,
}

impl From<Role> for RoleDefinition {
    fn from(role: Role) -> Self {
        Self {
            role,
            group: role.group(),
            rules: role.rule_set(),
        }
    }
}

/// Role to permission-map registry, built once at start-up and shared by
/// reference with the handlers that authorize requests.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: Vec<RoleDefinition>,
}

impl RoleRegistry {
    pub fn new(roles: Vec<RoleDefinition>) -> Self {
        Self { roles }
    }

    pub fn standard() -> Self {
        Self::new(
            [Role::StudentWorker, Role::TrainingManager, Role::Manager]
                .into_iter()
                .map(RoleDefinition::from)
                .collect(),
        )
    }

    pub fn roles(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.roles.iter()
    }

    /// Granted when a role held by the user binds the permission and its rule
    /// holds for the target.
    pub fn has_perm(&self, user: &User, permission: Permission, target: Target<'_>) -> bool {
        let context = RuleContext { user, target };
        let granted = self
            .roles
            .iter()
            .filter(|definition| user.in_group(definition.group))
            .filter_map(|definition| definition.rules.get(&permission))
            .any(|rule| rule.evaluate(&context));

        debug!(user = %user.username, %permission, granted, "permission evaluated");
        granted
    }

    /// Unknown permission names are denied.
    pub fn has_perm_by_name(&self, user: &User, permission: &str, target: Target<'_>) -> bool {
        permission
            .parse::<Permission>()
            .map(|permission| self.has_perm(user, permission, target))
            .unwrap_or(false)
    }

    pub fn check(
        &self,
        user: &User,
        permission: Permission,
        target: Target<'_>,
    ) -> Result<(), PermissionError> {
        if self.has_perm(user, permission, target) {
            Ok(())
        } else {
            Err(PermissionError::Denied {
                username: user.username.clone(),
                permission,
            })
        }
    }

    pub fn permissions_for(&self, user: &User, target: Target<'_>) -> BTreeSet<Permission> {
        Permission::ordered()
            .into_iter()
            .filter(|permission| self.has_perm(user, *permission, target))
            .collect()
    }

    pub fn can_view(&self, user: &User, admission: &Admission) -> bool {
        self.has_perm(user, Permission::ViewAdmission, Target::Admission(admission))
    }

    pub fn can_change(&self, user: &User, admission: &Admission) -> bool {
        self.has_perm(user, Permission::ChangeAdmission, Target::Admission(admission))
    }

    pub fn can_validate_registration(&self, user: &User, admission: &Admission) -> bool {
        self.has_perm(
            user,
            Permission::ValidateRegistration,
            Target::Admission(admission),
        )
    }

    pub fn can_export_admissions(&self, user: &User) -> bool {
        self.has_perm(user, Permission::ExportAdmission, Target::Nothing)
    }

    pub fn can_export_prospects(&self, user: &User) -> bool {
        self.has_perm(user, Permission::ExportProspect, Target::Nothing)
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
