use crate::domain::RoleCapabilities;

/// Record kinds covered by roles and policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Contact,
    Company,
    Project,
    Activity,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Contact => "contact",
            EntityKind::Company => "company",
            EntityKind::Project => "project",
            EntityKind::Activity => "activity",
        }
    }
}

/// Operations a session can perform on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Edit,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Edit => "edit",
            Operation::Delete => "delete",
        }
    }
}

/// Whether the role grants the operation on every record of the entity kind
pub fn role_grants(caps: &RoleCapabilities, entity: EntityKind, operation: Operation) -> bool {
    match (entity, operation) {
        (EntityKind::Contact, Operation::Create) => caps.can_create_contact,
        (EntityKind::Contact, Operation::Read) => caps.can_read_all_contact,
        (EntityKind::Contact, Operation::Edit) => caps.can_edit_all_contact,
        (EntityKind::Contact, Operation::Delete) => caps.can_delete_all_contact,

        (EntityKind::Company, Operation::Create) => caps.can_create_company,
        (EntityKind::Company, Operation::Read) => caps.can_read_all_company,
        (EntityKind::Company, Operation::Edit) => caps.can_edit_all_company,
        (EntityKind::Company, Operation::Delete) => caps.can_delete_all_company,

        (EntityKind::Project, Operation::Create) => caps.can_create_project,
        (EntityKind::Project, Operation::Read) => caps.can_read_all_project,
        (EntityKind::Project, Operation::Edit) => caps.can_edit_all_project,
        (EntityKind::Project, Operation::Delete) => caps.can_delete_all_project,

        (EntityKind::Activity, Operation::Create) => caps.can_create_activity,
        (EntityKind::Activity, Operation::Read) => caps.can_read_all_activity,
        (EntityKind::Activity, Operation::Edit) => caps.can_edit_all_activity,
        (EntityKind::Activity, Operation::Delete) => caps.can_delete_all_activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_grants_reads_matching_flag() {
        let caps = RoleCapabilities {
            can_delete_all_company: true,
            ..Default::default()
        };
        assert!(role_grants(&caps, EntityKind::Company, Operation::Delete));
        assert!(!role_grants(&caps, EntityKind::Contact, Operation::Delete));
        assert!(!role_grants(&caps, EntityKind::Company, Operation::Edit));
    }

    #[test]
    fn test_all_capabilities_grant_everything() {
        let caps = RoleCapabilities::all();
        for entity in [
            EntityKind::Contact,
            EntityKind::Company,
            EntityKind::Project,
            EntityKind::Activity,
        ] {
            for op in [
                Operation::Read,
                Operation::Create,
                Operation::Edit,
                Operation::Delete,
            ] {
                assert!(role_grants(&caps, entity, op));
            }
        }
    }
}
